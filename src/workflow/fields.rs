use serde_json::{json, Map, Value};

use crate::config::FieldIds;
use crate::platform::types::{IssueLink, LinkDirection, SourceIssueSnapshot};
use crate::workflow::request::{Assignment, WorkflowRequest};

/// Server-managed fields that the create endpoint rejects.
pub const READ_ONLY_FIELDS: [&str; 18] = [
    "id",
    "self",
    "key",
    "status",
    "creator",
    "created",
    "updated",
    "duedate",
    "resolutiondate",
    "workratio",
    "timespent",
    "aggregatetimespent",
    "issuelinks",
    "attachment",
    "subtasks",
    "votes",
    "watches",
    "thumbnail",
];

pub fn strip_read_only(fields: &mut Map<String, Value>) {
    for name in READ_ONLY_FIELDS {
        fields.remove(name);
    }
}

/// `{"transition": {"id": ...}}`
pub fn transition_body(id: &str) -> Value {
    json!({ "transition": { "id": id } })
}

/// `{"fields": {"<field>": null}}`
pub fn clear_field_body(field: &str) -> Value {
    let mut fields = Map::new();
    fields.insert(field.to_string(), Value::Null);
    json!({ "fields": fields })
}

/// Field map for the cloned issue: the snapshot's fields minus read-only ones,
/// with the workflow's overrides applied.
pub fn create_fields(
    snapshot: &SourceIssueSnapshot,
    request: &WorkflowRequest,
    target_project: &str,
    ids: &FieldIds,
) -> Map<String, Value> {
    let mut fields = snapshot.fields.clone();
    strip_read_only(&mut fields);

    fields.insert("project".into(), json!({ "key": target_project }));
    fields.insert(
        "summary".into(),
        json!(format!(
            "{} - {}",
            request.source_issue_key, request.source_summary
        )),
    );
    fields.insert(
        "issuetype".into(),
        json!({ "name": request.new_issue_type.jira_name() }),
    );
    fields.insert("description".into(), json!(snapshot.description()));
    fields.insert(ids.source_key.clone(), json!(request.source_issue_key));
    fields.insert(
        ids.maintenance_type.clone(),
        json!({ "value": request.maintenance_type.jira_value() }),
    );
    if let Some(fy) = request.fy_summary_issue() {
        fields.insert(ids.fy_summary_link.clone(), json!(fy));
    }

    fields
}

/// Accumulates the single combined update sent to the cloned issue.
pub struct FieldUpdate {
    fields: Map<String, Value>,
}

impl FieldUpdate {
    /// Starts with the fixed design/analysis classifications.
    pub fn new(ids: &FieldIds) -> Self {
        let mut fields = Map::new();
        fields.insert(
            ids.design_classification.clone(),
            json!([{ "value": "Design" }]),
        );
        fields.insert(
            ids.analysis_classification.clone(),
            json!([{ "value": "Analysis" }]),
        );
        Self { fields }
    }

    pub fn assignment(&mut self, assignment: &Assignment, ids: &FieldIds) {
        self.fields
            .insert("assignee".into(), json!({ "name": assignment.assignee() }));
        if let Assignment::Team {
            component, team_id, ..
        } = assignment
        {
            self.fields
                .insert("components".into(), json!([{ "name": component }]));
            self.fields.insert(ids.team_id.clone(), json!(team_id));
        }
    }

    pub fn reporter(&mut self, reporter: &str, ids: &FieldIds) {
        self.fields
            .insert("reporter".into(), json!({ "name": reporter }));
        self.fields
            .insert(ids.reporter_mirror.clone(), json!({ "name": reporter }));
    }

    pub fn due_date(&mut self, date: &str, ids: &FieldIds) {
        self.fields.insert("duedate".into(), json!(date));
        self.fields.insert(ids.due_date_mirror.clone(), json!(date));
    }

    pub fn into_body(self) -> Value {
        json!({ "fields": self.fields })
    }
}

/// Recreate `link` between `new_key` and the link's other issue, keeping direction.
pub fn cloned_link_body(link: &IssueLink, new_key: &str) -> Value {
    let (inward, outward) = match link.direction {
        LinkDirection::Outward => (new_key, link.other_key.as_str()),
        LinkDirection::Inward => (link.other_key.as_str(), new_key),
    };
    link_body(&link.type_name, inward, outward)
}

pub fn link_body(type_name: &str, inward_key: &str, outward_key: &str) -> Value {
    json!({
        "type": { "name": type_name },
        "inwardIssue": { "key": inward_key },
        "outwardIssue": { "key": outward_key }
    })
}
