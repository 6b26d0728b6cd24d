use serde::Serialize;
use tokio::sync::mpsc;

/// Result of one reported action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    /// A choice or progress note rather than a result.
    Info(String),
    Warning(String),
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub step: String,
    pub action: String,
    pub outcome: Outcome,
}

impl ReportRow {
    pub fn new(step: impl Into<String>, action: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            step: step.into(),
            action: action.into(),
            outcome,
        }
    }
}

/// Step-by-step record of one workflow run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub source_issue_key: String,
    pub new_issue_key: Option<String>,
    pub rows: Vec<ReportRow>,
    pub overall_succeeded: bool,
    /// Error display and cause chain of the fatal error, if the run stopped.
    pub trace: Option<String>,
}

impl WorkflowReport {
    pub fn new(source_issue_key: &str) -> Self {
        Self {
            source_issue_key: source_issue_key.to_string(),
            new_issue_key: None,
            rows: Vec::new(),
            overall_succeeded: true,
            trace: None,
        }
    }

    pub fn fatal_row(&self) -> Option<&ReportRow> {
        self.rows.iter().find(|r| r.step == FATAL_STEP)
    }

    /// Plain-text table for terminals.
    pub fn render_text(&self) -> String {
        let mut out = format!("Workflow report for {}\n", self.source_issue_key);

        let step_width = self
            .rows
            .iter()
            .map(|r| r.step.len())
            .max()
            .unwrap_or(0)
            .max(4);
        let action_width = self
            .rows
            .iter()
            .map(|r| r.action.len())
            .max()
            .unwrap_or(0)
            .max(6);

        out.push_str(&format!(
            "{:<step_width$}  {:<action_width$}  Result\n",
            "Step", "Action"
        ));
        for row in &self.rows {
            out.push_str(&format_row(row, step_width, action_width));
            out.push('\n');
        }

        out.push_str(if self.overall_succeeded {
            "Workflow completed.\n"
        } else {
            "Workflow failed. See report for details.\n"
        });

        if let Some(trace) = &self.trace {
            out.push_str("\nTrace:\n");
            out.push_str(trace);
            out.push('\n');
        }

        out
    }
}

pub const FATAL_STEP: &str = "FATAL";

pub fn format_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Success => "Success".to_string(),
        Outcome::Info(text) => text.clone(),
        Outcome::Warning(text) => format!("Warning: {text}"),
        Outcome::Failure(text) => format!("Failed: {text}"),
    }
}

pub fn format_row(row: &ReportRow, step_width: usize, action_width: usize) -> String {
    format!(
        "{:<step_width$}  {:<action_width$}  {}",
        row.step,
        row.action,
        format_outcome(&row.outcome)
    )
}

/// Appends rows to the report and forwards each one to an optional live listener.
pub(crate) struct ReportBuilder {
    report: WorkflowReport,
    live: Option<mpsc::UnboundedSender<ReportRow>>,
}

impl ReportBuilder {
    pub fn new(source_issue_key: &str, live: Option<mpsc::UnboundedSender<ReportRow>>) -> Self {
        Self {
            report: WorkflowReport::new(source_issue_key),
            live,
        }
    }

    pub fn push(&mut self, step: &str, action: impl Into<String>, outcome: Outcome) {
        let row = ReportRow::new(step, action, outcome);
        if let Some(tx) = &self.live {
            // Listener may have gone away; the final report still has every row.
            let _ = tx.send(row.clone());
        }
        self.report.rows.push(row);
    }

    pub fn set_new_issue_key(&mut self, key: &str) {
        self.report.new_issue_key = Some(key.to_string());
    }

    pub fn fail(&mut self, error: &crate::error::AppError) {
        self.push(FATAL_STEP, error.kind(), Outcome::Failure(error.to_string()));
        self.report.overall_succeeded = false;
        self.report.trace = Some(error.trace_text());
    }

    pub fn finish(self) -> WorkflowReport {
        self.report
    }
}
