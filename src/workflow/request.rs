use serde::Serialize;

use crate::config::{AppConfig, TeamConfig};
use crate::error::{AppError, Result};

/// Issue type of the cloned issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NewIssueType {
    UtilityExtract,
    Fcr,
    Ptr,
    TableUpdate,
}

impl NewIssueType {
    /// Issue type name as known to Jira.
    pub fn jira_name(self) -> &'static str {
        match self {
            NewIssueType::UtilityExtract => "Utility/Extract",
            NewIssueType::Fcr => "FCR",
            NewIssueType::Ptr => "PTR",
            NewIssueType::TableUpdate => "Table Update",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MaintenanceType {
    Maintenance,
    Enhancement,
    Fallout,
}

impl MaintenanceType {
    pub fn jira_value(self) -> &'static str {
        match self {
            MaintenanceType::Maintenance => "Maintenance",
            MaintenanceType::Enhancement => "Enhancement",
            MaintenanceType::Fallout => "Fallout",
        }
    }
}

/// Who the cloned issue is handed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Assignment {
    /// Park the issue in the unassigned backlog under a fallback user.
    UnassignedBacklog { assignee: String },
    /// Hand the issue to a team.
    Team {
        name: String,
        assignee: String,
        component: String,
        team_id: String,
    },
}

impl Assignment {
    /// Resolve an assignment from config: a named team, or the unassigned backlog
    /// when `team` is `None`.
    pub fn resolve(config: &AppConfig, team: Option<&str>) -> Result<Self> {
        match team {
            Some(name) => config
                .team(name)
                .map(Assignment::from)
                .ok_or_else(|| AppError::Validation(format!("Unknown team: {name}"))),
            None => Ok(Assignment::UnassignedBacklog {
                assignee: config.unassigned_backlog_assignee()?.to_string(),
            }),
        }
    }

    pub fn assignee(&self) -> &str {
        match self {
            Assignment::UnassignedBacklog { assignee } => assignee,
            Assignment::Team { assignee, .. } => assignee,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Assignment::UnassignedBacklog { .. } => "Unassigned backlog",
            Assignment::Team { name, .. } => name,
        }
    }
}

impl From<&TeamConfig> for Assignment {
    fn from(team: &TeamConfig) -> Self {
        Assignment::Team {
            name: team.name.clone(),
            assignee: team.assignee.clone(),
            component: team.component.clone(),
            team_id: team.team_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DueDatePolicy {
    /// Copy the due date from the source issue.
    UseOriginal,
    /// Use the supplied `YYYY-MM-DD` date.
    Manual(String),
}

/// Input of one workflow run. Built once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowRequest {
    pub source_issue_key: String,
    pub source_summary: String,
    pub new_issue_type: NewIssueType,
    pub assignment: Assignment,
    pub maintenance_type: MaintenanceType,
    pub fy_summary_issue_key: Option<String>,
    pub due_date_policy: DueDatePolicy,
}

impl WorkflowRequest {
    /// Check the request before any tracker call is made.
    pub fn validate(&self) -> Result<()> {
        if self.source_issue_key.trim().is_empty() {
            return Err(AppError::Validation(
                "Source issue key must not be empty".to_string(),
            ));
        }

        if self.assignment.assignee().trim().is_empty() {
            return Err(AppError::Validation(format!(
                "No assignee configured for '{}'",
                self.assignment.display_name()
            )));
        }

        if let DueDatePolicy::Manual(date) = &self.due_date_policy {
            let date = date.trim();
            if date.is_empty() {
                return Err(AppError::Validation(
                    "Enter a manual due date or use the original due date".to_string(),
                ));
            }
            chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
                AppError::Validation(format!("Manual due date '{date}' is not YYYY-MM-DD"))
            })?;
        }

        Ok(())
    }

    /// FY summary key, treating blank input as absent.
    pub fn fy_summary_issue(&self) -> Option<&str> {
        self.fy_summary_issue_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}
