//! In-memory issue tracker that records every call.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tokio::sync::Notify;

use jira_workflow::error::{AppError, Result};
use jira_workflow::platform::IssueTracker;
use jira_workflow::workflow::{
    Assignment, DueDatePolicy, MaintenanceType, NewIssueType, WorkflowRequest,
};

#[derive(Debug, Clone)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

pub struct FakeTracker {
    calls: Mutex<Vec<Call>>,
    source: Value,
    transitions: HashMap<String, Value>,
    next_issue: AtomicU32,
    failing_puts: HashSet<String>,
    failing_posts: HashSet<String>,
    fail_links: bool,
    fail_uploads: bool,
    temp_paths: Mutex<Vec<PathBuf>>,
    gate: Option<Arc<Notify>>,
}

impl FakeTracker {
    /// A tracker holding `source` as TFS-100, where new issues are numbered from TFS-101.
    pub fn new(source_fields: Value) -> Self {
        let mut transitions = HashMap::new();
        transitions.insert(
            "TFS-100".to_string(),
            json!({ "transitions": [
                { "id": "11", "name": "Close" },
                { "id": "21", "name": "TO: In Progress" }
            ]}),
        );
        Self {
            calls: Mutex::new(Vec::new()),
            source: json!({ "key": "TFS-100", "fields": source_fields }),
            transitions,
            next_issue: AtomicU32::new(101),
            failing_puts: HashSet::new(),
            failing_posts: HashSet::new(),
            fail_links: false,
            fail_uploads: false,
            temp_paths: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn with_transitions(mut self, key: &str, names: &[&str]) -> Self {
        let list: Vec<Value> = names
            .iter()
            .enumerate()
            .map(|(i, name)| json!({ "id": format!("{}", 100 + i), "name": name }))
            .collect();
        self.transitions
            .insert(key.to_string(), json!({ "transitions": list }));
        self
    }

    pub fn failing_put(mut self, path: &str) -> Self {
        self.failing_puts.insert(path.to_string());
        self
    }

    pub fn failing_post(mut self, path: &str) -> Self {
        self.failing_posts.insert(path.to_string());
        self
    }

    pub fn failing_links(mut self) -> Self {
        self.fail_links = true;
        self
    }

    pub fn failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    /// Hold every GET until the gate is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_with(&self, method: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .collect()
    }

    pub fn created_issues(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == "POST" && c.path == "/rest/api/2/issue")
            .collect()
    }

    pub fn temp_paths(&self) -> Vec<PathBuf> {
        self.temp_paths.lock().unwrap().clone()
    }

    fn record(&self, method: &'static str, path: &str, body: Option<&Value>) {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });
    }
}

fn rejected(body: &str) -> AppError {
    AppError::TrackerRequest {
        status: 400,
        body: body.to_string(),
    }
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn get(&self, path: &str) -> Result<Value> {
        self.record("GET", path, None);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let rest = path.trim_start_matches("/rest/api/2/issue/");
        if let Some(key) = rest.strip_suffix("/transitions") {
            return Ok(self
                .transitions
                .get(key)
                .cloned()
                .unwrap_or_else(|| json!({ "transitions": [] })));
        }
        if rest.starts_with("TFS-100") {
            return Ok(self.source.clone());
        }
        Err(AppError::TrackerRequest {
            status: 404,
            body: format!("No fake response for {path}"),
        })
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.record("POST", path, Some(body));
        if self.failing_posts.contains(path) {
            return Err(rejected("Operation not permitted"));
        }
        match path {
            "/rest/api/2/issue" => {
                let n = self.next_issue.fetch_add(1, Ordering::SeqCst);
                Ok(json!({ "id": n.to_string(), "key": format!("TFS-{n}") }))
            }
            "/rest/api/2/issueLink" if self.fail_links => Err(rejected("Link type not allowed")),
            _ => Ok(Value::Null),
        }
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        self.record("PUT", path, Some(body));
        if self.failing_puts.contains(path) {
            return Err(rejected("Field 'customfield_15350' cannot be set"));
        }
        Ok(Value::Null)
    }

    async fn download_to_temp_file(&self, url: &str, suggested_name: &str) -> Result<NamedTempFile> {
        self.record("DOWNLOAD", url, None);
        let mut temp = NamedTempFile::new()?;
        write!(temp, "contents of {suggested_name}")?;
        self.temp_paths.lock().unwrap().push(temp.path().to_path_buf());
        Ok(temp)
    }

    async fn upload_attachment(&self, path: &str, file: &Path, filename: &str) -> Result<Value> {
        assert!(file.exists(), "temp file must exist during upload");
        self.record("UPLOAD", path, Some(&json!({ "filename": filename })));
        if self.fail_uploads {
            return Err(rejected("Attachment too large"));
        }
        Ok(json!([{ "filename": filename }]))
    }
}

pub fn source_fields() -> Value {
    json!({
        "summary": "Quarterly extract",
        "status": { "name": "Submitted to TSO" },
        "duedate": "2025-03-01",
        "description": "Extract the quarterly figures",
        "reporter": { "name": "jdoe" },
        "attachment": [],
        "issuelinks": []
    })
}

pub fn lifeline() -> Assignment {
    Assignment::Team {
        name: "Lifeline".into(),
        assignee: "svc.lifeline".into(),
        component: "Lifeline".into(),
        team_id: "T1".into(),
    }
}

pub fn backlog() -> Assignment {
    Assignment::UnassignedBacklog {
        assignee: "backlog.user".into(),
    }
}

pub fn request(assignment: Assignment, due_date_policy: DueDatePolicy) -> WorkflowRequest {
    WorkflowRequest {
        source_issue_key: "TFS-100".into(),
        source_summary: "Quarterly extract".into(),
        new_issue_type: NewIssueType::Fcr,
        assignment,
        maintenance_type: MaintenanceType::Maintenance,
        fy_summary_issue_key: None,
        due_date_policy,
    }
}
