use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AppError, Result};

/// Default config file name (without extension), looked up in the working directory.
pub const DEFAULT_CONFIG_NAME: &str = "jira-workflow";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub jira: JiraConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub fields: FieldIds,
}

#[derive(Deserialize, Serialize, Clone)]
pub struct JiraConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth: AuthConfig::default(),
            accept_invalid_certs: false,
        }
    }
}

// Manual Debug impl to avoid leaking credentials
impl std::fmt::Debug for JiraConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraConfig")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth.describe())
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

/// Credentials for the Jira REST API.
#[derive(Deserialize, Serialize, Clone, Default)]
pub struct AuthConfig {
    /// Personal access token, sent as a bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl AuthConfig {
    fn describe(&self) -> &'static str {
        match (&self.token, &self.username) {
            (Some(_), _) => "token [REDACTED]",
            (None, Some(_)) => "basic [REDACTED]",
            (None, None) => "none",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WorkflowConfig {
    #[serde(default = "default_jql")]
    pub jql: String,
    #[serde(default = "default_target_project")]
    pub target_project: String,
    #[serde(default = "default_fy_summary_issue")]
    pub fy_summary_issue: String,
    #[serde(default)]
    pub unassigned_backlog_assignee: Option<String>,
    #[serde(default = "default_in_progress_transition")]
    pub in_progress_transition: String,
    #[serde(default = "default_backlog_transition")]
    pub backlog_transition: String,
    #[serde(default = "default_back_link_type")]
    pub back_link_type: String,
    #[serde(default)]
    pub teams: Vec<TeamConfig>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            jql: default_jql(),
            target_project: default_target_project(),
            fy_summary_issue: default_fy_summary_issue(),
            unassigned_backlog_assignee: None,
            in_progress_transition: default_in_progress_transition(),
            backlog_transition: default_backlog_transition(),
            back_link_type: default_back_link_type(),
            teams: Vec::new(),
        }
    }
}

/// A team the cloned issue can be handed to.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct TeamConfig {
    pub name: String,
    pub assignee: String,
    pub component: String,
    pub team_id: String,
}

/// Custom field ids on the Jira instance.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct FieldIds {
    /// Date-tracking field cleared on the source issue.
    #[serde(default = "default_date_tracking")]
    pub date_tracking: String,
    #[serde(default = "default_source_key")]
    pub source_key: String,
    #[serde(default = "default_maintenance_type")]
    pub maintenance_type: String,
    #[serde(default = "default_fy_summary_link")]
    pub fy_summary_link: String,
    #[serde(default = "default_design_classification")]
    pub design_classification: String,
    #[serde(default = "default_analysis_classification")]
    pub analysis_classification: String,
    #[serde(default = "default_team_id")]
    pub team_id: String,
    #[serde(default = "default_reporter_mirror")]
    pub reporter_mirror: String,
    #[serde(default = "default_due_date_mirror")]
    pub due_date_mirror: String,
}

impl Default for FieldIds {
    fn default() -> Self {
        Self {
            date_tracking: default_date_tracking(),
            source_key: default_source_key(),
            maintenance_type: default_maintenance_type(),
            fy_summary_link: default_fy_summary_link(),
            design_classification: default_design_classification(),
            analysis_classification: default_analysis_classification(),
            team_id: default_team_id(),
            reporter_mirror: default_reporter_mirror(),
            due_date_mirror: default_due_date_mirror(),
        }
    }
}

fn default_base_url() -> String {
    "https://tso-jira.mcw.usmc.mil".to_string()
}

fn default_jql() -> String {
    r#"project in (JRS, MOD, MSMB, RFFKCI, TSO) AND status in ("Incoming Requirements", "Submitted to TSO")"#
        .to_string()
}

fn default_target_project() -> String {
    "TFS".to_string()
}

fn default_fy_summary_issue() -> String {
    "TFS-59109".to_string()
}

fn default_in_progress_transition() -> String {
    "TO: In Progress".to_string()
}

fn default_backlog_transition() -> String {
    "Unassigned Backlog".to_string()
}

fn default_back_link_type() -> String {
    "SMARTS Link".to_string()
}

fn default_date_tracking() -> String {
    "customfield_10519".to_string()
}

fn default_source_key() -> String {
    "customfield_10400".to_string()
}

fn default_maintenance_type() -> String {
    "customfield_10522".to_string()
}

fn default_fy_summary_link() -> String {
    "customfield_13056".to_string()
}

fn default_design_classification() -> String {
    "customfield_10523".to_string()
}

fn default_analysis_classification() -> String {
    "customfield_10512".to_string()
}

fn default_team_id() -> String {
    "customfield_15350".to_string()
}

fn default_reporter_mirror() -> String {
    "customfield_10540".to_string()
}

fn default_due_date_mirror() -> String {
    "customfield_10517".to_string()
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name(DEFAULT_CONFIG_NAME).required(false));
        }

        // Environment variable overrides with JIRA_WORKFLOW_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("JIRA_WORKFLOW")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    /// Write a starter config file. Refuses to overwrite unless `force` is set.
    pub fn write_starter(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(AppError::Config(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }

        let mut starter = AppConfig::default();
        starter.jira.auth.token = Some("<personal access token>".to_string());
        starter.workflow.unassigned_backlog_assignee = Some("<jira user id>".to_string());
        starter.workflow.teams.push(TeamConfig {
            name: "Example Team".to_string(),
            assignee: "<jira user id>".to_string(),
            component: "Example Component".to_string(),
            team_id: "<team id>".to_string(),
        });

        let contents = toml::to_string_pretty(&starter)
            .map_err(|e| AppError::Config(format!("Failed to render config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Look up a configured team by name (case-insensitive).
    pub fn team(&self, name: &str) -> Option<&TeamConfig> {
        self.workflow
            .teams
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn unassigned_backlog_assignee(&self) -> Result<&str> {
        self.workflow
            .unassigned_backlog_assignee
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config(
                    "workflow.unassigned_backlog_assignee is missing or empty".to_string(),
                )
            })
    }
}
