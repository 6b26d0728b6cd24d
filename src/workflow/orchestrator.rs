use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::{AppConfig, FieldIds};
use crate::error::{AppError, Result};
use crate::platform::jira::mapper;
use crate::platform::types::SourceIssueSnapshot;
use crate::platform::IssueTracker;
use crate::workflow::fields::{self, FieldUpdate};
use crate::workflow::report::{Outcome, ReportBuilder, ReportRow, WorkflowReport};
use crate::workflow::request::{Assignment, DueDatePolicy, WorkflowRequest};

/// Fields requested for the source issue snapshot.
const SNAPSHOT_FIELDS: &str = "summary,status,duedate,description,reporter,attachment,issuelinks";

/// How a step's failure affects the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// Failure stops the run immediately.
    Fatal,
    /// Failure is recorded as a report row and the run continues.
    BestEffort,
}

/// Instance-specific names used by the workflow.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub target_project: String,
    pub in_progress_transition: String,
    pub backlog_transition: String,
    pub back_link_type: String,
    pub fields: FieldIds,
}

impl From<&AppConfig> for WorkflowSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            target_project: config.workflow.target_project.clone(),
            in_progress_transition: config.workflow.in_progress_transition.clone(),
            backlog_transition: config.workflow.backlog_transition.clone(),
            back_link_type: config.workflow.back_link_type.clone(),
            fields: config.fields.clone(),
        }
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Runs the issue-transformation procedure against a tracker.
pub struct Orchestrator {
    tracker: Arc<dyn IssueTracker>,
    settings: WorkflowSettings,
}

impl Orchestrator {
    pub fn new(tracker: Arc<dyn IssueTracker>, settings: WorkflowSettings) -> Self {
        Self { tracker, settings }
    }

    pub async fn run(&self, request: &WorkflowRequest) -> Result<WorkflowReport> {
        self.run_streaming(request, None).await
    }

    /// Run the workflow, sending each report row to `live` as soon as it is recorded.
    ///
    /// Only request validation errors are returned as `Err`; every failure after the
    /// first tracker call ends up in the report with `overall_succeeded = false`.
    pub async fn run_streaming(
        &self,
        request: &WorkflowRequest,
        live: Option<mpsc::UnboundedSender<ReportRow>>,
    ) -> Result<WorkflowReport> {
        request.validate()?;

        tracing::info!(issue = %request.source_issue_key, "Starting workflow run");

        let mut run = Run {
            tracker: self.tracker.as_ref(),
            settings: &self.settings,
            request,
            report: ReportBuilder::new(&request.source_issue_key, live),
        };

        match run.execute().await {
            Ok(()) => {
                tracing::info!(issue = %request.source_issue_key, "Workflow run completed");
            }
            Err(e) => {
                tracing::error!(
                    issue = %request.source_issue_key,
                    error = %e,
                    "Workflow run stopped"
                );
                run.report.fail(&e);
            }
        }

        Ok(run.report.finish())
    }
}

/// Record a step result according to its policy.
///
/// Fatal failures propagate. Best-effort failures become a report row and yield `None`;
/// a missing transition is reported as a warning, anything else as a failure.
fn settle<T>(
    report: &mut ReportBuilder,
    policy: StepPolicy,
    step: &str,
    action: &str,
    result: Result<T>,
) -> Result<Option<T>> {
    match (result, policy) {
        (Ok(value), _) => Ok(Some(value)),
        (Err(e), StepPolicy::Fatal) => Err(e),
        (Err(e), StepPolicy::BestEffort) => {
            tracing::warn!(step = step, error = %e, "Best-effort step failed, continuing");
            let outcome = match e {
                AppError::TransitionNotFound { .. } => Outcome::Warning(e.to_string()),
                _ => Outcome::Failure(e.to_string()),
            };
            report.push(step, action, outcome);
            Ok(None)
        }
    }
}

/// State of a single run.
struct Run<'a> {
    tracker: &'a dyn IssueTracker,
    settings: &'a WorkflowSettings,
    request: &'a WorkflowRequest,
    report: ReportBuilder,
}

impl Run<'_> {
    async fn execute(&mut self) -> Result<()> {
        let snapshot = self.fetch_snapshot().await?;

        self.transition_source().await?;
        let (new_key, reporter) = self.clone_issue(&snapshot).await?;
        self.update_clone(&new_key, &snapshot, reporter.as_deref())
            .await?;
        self.clone_attachments(&new_key, &snapshot).await?;
        self.clone_links(&new_key, &snapshot).await?;
        self.back_link(&new_key).await?;

        Ok(())
    }

    async fn fetch_snapshot(&self) -> Result<SourceIssueSnapshot> {
        let key = &self.request.source_issue_key;
        let body = self
            .tracker
            .get(&format!("/rest/api/2/issue/{key}?fields={SNAPSHOT_FIELDS}"))
            .await?;
        mapper::map_snapshot(key, body)
    }

    async fn apply_transition(&self, key: &str, name: &str) -> Result<()> {
        let path = format!("/rest/api/2/issue/{key}/transitions");
        let transitions = self.tracker.get(&path).await?;
        let id = mapper::find_transition_id(&transitions, name).ok_or_else(|| {
            AppError::TransitionNotFound {
                issue: key.to_string(),
                transition: name.to_string(),
            }
        })?;
        self.tracker.post(&path, &fields::transition_body(&id)).await?;
        Ok(())
    }

    /// Step 1: move the source issue in progress and clear its date-tracking field.
    async fn transition_source(&mut self) -> Result<()> {
        let request = self.request;
        let key = &request.source_issue_key;
        tracing::info!(issue = %key, step = "1", "Transitioning source issue");

        let result = self
            .apply_transition(key, &self.settings.in_progress_transition)
            .await;
        settle(&mut self.report, StepPolicy::Fatal, "1", "Transition original ticket", result)?;

        let result = self
            .tracker
            .put(
                &format!("/rest/api/2/issue/{key}"),
                &fields::clear_field_body(&self.settings.fields.date_tracking),
            )
            .await;
        settle(&mut self.report, StepPolicy::Fatal, "1", "Clear date tracking", result)?;

        self.report
            .push("1", "Update original ticket", Outcome::Success);
        Ok(())
    }

    /// Step 2: create the clone. Returns its key and the source reporter, if any.
    async fn clone_issue(
        &mut self,
        snapshot: &SourceIssueSnapshot,
    ) -> Result<(String, Option<String>)> {
        tracing::info!(issue = %snapshot.key, step = "2", "Cloning issue");

        let reporter = snapshot.reporter_name().map(str::to_string);
        if reporter.is_none() {
            self.report.push(
                "2.1",
                "Capture reporter for update",
                Outcome::Warning("Reporter field not found on original issue.".to_string()),
            );
        }

        let create_fields = fields::create_fields(
            snapshot,
            self.request,
            &self.settings.target_project,
            &self.settings.fields,
        );
        let response = self
            .tracker
            .post("/rest/api/2/issue", &serde_json::json!({ "fields": create_fields }))
            .await?;
        let new_key = mapper::created_key(&response)?;

        self.report.set_new_issue_key(&new_key);
        self.report
            .push("2", format!("Create new issue {new_key}"), Outcome::Success);
        tracing::info!(issue = %snapshot.key, new_issue = %new_key, "Created cloned issue");

        Ok((new_key, reporter))
    }

    /// Step 3: one combined field update, then the backlog transition for unassigned work.
    async fn update_clone(
        &mut self,
        new_key: &str,
        snapshot: &SourceIssueSnapshot,
        reporter: Option<&str>,
    ) -> Result<()> {
        tracing::info!(new_issue = %new_key, step = "3", "Updating cloned issue fields");

        let (request, settings) = (self.request, self.settings);
        let ids = &settings.fields;
        let assignment = &request.assignment;
        let mut update = FieldUpdate::new(ids);

        update.assignment(assignment, ids);
        self.report.push(
            "3.1",
            "Set assignee",
            Outcome::Info(format!("Assigning to: {}", assignment.assignee())),
        );

        if let Assignment::Team {
            component, team_id, ..
        } = assignment
        {
            self.report.push(
                "3.2",
                "Set team & component",
                Outcome::Info(format!("Component: '{component}', Team: '{team_id}'")),
            );
        }

        if let Some(reporter) = reporter {
            update.reporter(reporter, ids);
            self.report.push(
                "3.3",
                "Set reporter fields",
                Outcome::Info(format!("Original reporter: {reporter}")),
            );
        }

        let due_date = match &request.due_date_policy {
            DueDatePolicy::UseOriginal => {
                let original = snapshot.due_date();
                self.report.push(
                    "3.4",
                    "Due date choice",
                    Outcome::Info(format!(
                        "Using original due date: {}",
                        original.unwrap_or("None found")
                    )),
                );
                original
            }
            DueDatePolicy::Manual(date) => {
                let date = date.trim();
                self.report.push(
                    "3.4",
                    "Due date choice",
                    Outcome::Info(format!("Using manual due date: {date}")),
                );
                Some(date)
            }
        };
        if let Some(date) = due_date {
            update.due_date(date, ids);
        }

        let result = self
            .tracker
            .put(&format!("/rest/api/2/issue/{new_key}"), &update.into_body())
            .await;
        if settle(&mut self.report, StepPolicy::BestEffort, "3.5", "Update all fields", result)?
            .is_some()
        {
            self.report
                .push("3.5", "Update all fields", Outcome::Success);
        }

        if let Assignment::UnassignedBacklog { .. } = assignment {
            let backlog = &settings.backlog_transition;
            let result = self.apply_transition(new_key, backlog).await;
            if settle(&mut self.report, StepPolicy::BestEffort, "3.6", "Change status", result)?
                .is_some()
            {
                self.report.push(
                    "3.6",
                    "Change status",
                    Outcome::Info(format!("Transitioned to '{backlog}'")),
                );
            }
        }

        Ok(())
    }

    /// Step 4: copy every attachment through a scratch file.
    async fn clone_attachments(
        &mut self,
        new_key: &str,
        snapshot: &SourceIssueSnapshot,
    ) -> Result<()> {
        let attachments = mapper::map_attachments(snapshot)?;
        if attachments.is_empty() {
            self.report.push(
                "4",
                "Clone attachments",
                Outcome::Info("No attachments found to clone.".to_string()),
            );
            return Ok(());
        }

        tracing::info!(new_issue = %new_key, step = "4", count = attachments.len(), "Cloning attachments");
        self.report.push(
            "4",
            format!("Found {} attachment(s) to clone.", attachments.len()),
            Outcome::Info("In progress".to_string()),
        );

        let upload_path = format!("/rest/api/2/issue/{new_key}/attachments");
        for attachment in &attachments {
            let result = self
                .copy_attachment(&upload_path, &attachment.content_url, &attachment.filename)
                .await;
            if let Err(e) = result {
                self.report.push(
                    "4",
                    format!("Cloning failed for: {}", attachment.filename),
                    Outcome::Failure(e.to_string()),
                );
                return Err(e);
            }
        }

        self.report.push(
            "4",
            format!("Cloned {} attachment(s).", attachments.len()),
            Outcome::Success,
        );
        Ok(())
    }

    async fn copy_attachment(&self, upload_path: &str, url: &str, filename: &str) -> Result<()> {
        let temp = self.tracker.download_to_temp_file(url, filename).await?;
        let uploaded = self
            .tracker
            .upload_attachment(upload_path, temp.path(), filename)
            .await;

        // The handle deletes the file on drop as well; close() surfaces the error.
        if let Err(e) = temp.close() {
            tracing::warn!(filename = filename, error = %e, "Failed to delete temporary attachment file");
        }

        uploaded.map(|_| ())
    }

    /// Step 5: recreate the source issue's links on the clone.
    async fn clone_links(&mut self, new_key: &str, snapshot: &SourceIssueSnapshot) -> Result<()> {
        let links = mapper::map_links(snapshot)?;
        if links.is_empty() {
            self.report.push(
                "5",
                "Clone links",
                Outcome::Info("No links found to clone.".to_string()),
            );
            return Ok(());
        }

        tracing::info!(new_issue = %new_key, step = "5", count = links.len(), "Cloning links");
        self.report.push(
            "5",
            format!("Found {} link(s) to clone.", links.len()),
            Outcome::Info("In progress".to_string()),
        );

        for link in &links {
            let result = self
                .tracker
                .post("/rest/api/2/issueLink", &fields::cloned_link_body(link, new_key))
                .await;
            match result {
                Ok(_) => self.report.push(
                    "5",
                    format!("Clone {} link to {}", link.type_name, link.other_key),
                    Outcome::Success,
                ),
                Err(e) => {
                    self.report.push(
                        "5",
                        format!("Linking to {} failed", link.other_key),
                        Outcome::Failure(e.to_string()),
                    );
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Step 6: link the clone back to its source.
    async fn back_link(&mut self, new_key: &str) -> Result<()> {
        let request = self.request;
        let source = &request.source_issue_key;
        tracing::info!(issue = %source, new_issue = %new_key, step = "6", "Linking clone to source");

        self.tracker
            .post(
                "/rest/api/2/issueLink",
                &fields::link_body(&self.settings.back_link_type, source, new_key),
            )
            .await?;

        self.report.push(
            "6",
            format!("Link {new_key} back to {source}"),
            Outcome::Success,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_error() -> AppError {
        AppError::TrackerRequest {
            status: 400,
            body: "Field 'assignee' cannot be set".into(),
        }
    }

    #[test]
    fn test_settle_fatal_propagates_without_row() {
        let mut report = ReportBuilder::new("TFS-100", None);
        let result: Result<()> = Err(tracker_error());
        assert!(settle(&mut report, StepPolicy::Fatal, "1", "Transition", result).is_err());
        assert!(report.finish().rows.is_empty());
    }

    #[test]
    fn test_settle_best_effort_records_failure() {
        let mut report = ReportBuilder::new("TFS-100", None);
        let result: Result<()> = Err(tracker_error());
        let settled = settle(&mut report, StepPolicy::BestEffort, "3.5", "Update all fields", result);
        assert!(matches!(settled, Ok(None)));

        let report = report.finish();
        assert!(report.overall_succeeded);
        assert!(matches!(report.rows[0].outcome, Outcome::Failure(_)));
    }

    #[test]
    fn test_settle_best_effort_missing_transition_is_warning() {
        let mut report = ReportBuilder::new("TFS-101", None);
        let result: Result<()> = Err(AppError::TransitionNotFound {
            issue: "TFS-101".into(),
            transition: "Unassigned Backlog".into(),
        });
        settle(&mut report, StepPolicy::BestEffort, "3.6", "Change status", result).unwrap();
        assert!(matches!(report.finish().rows[0].outcome, Outcome::Warning(_)));
    }

    #[test]
    fn test_settings_follow_config() {
        let mut config = AppConfig::default();
        config.workflow.target_project = "OPS".into();
        let settings = WorkflowSettings::from(&config);
        assert_eq!(settings.target_project, "OPS");
        assert_eq!(settings.back_link_type, "SMARTS Link");
    }
}
