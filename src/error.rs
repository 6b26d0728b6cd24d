use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid workflow request: {0}")]
    Validation(String),

    #[error("Transition '{transition}' not found for {issue}")]
    TransitionNotFound { issue: String, transition: String },

    #[error("Jira request failed with status {status}: {body}")]
    TrackerRequest { status: u16, body: String },

    #[error("Unexpected Jira response: {0}")]
    UnexpectedResponse(String),

    #[error("A workflow run is already in progress")]
    RunInProgress,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short name of the error category, shown in the fatal report row.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "ConfigError",
            AppError::Validation(_) => "ValidationError",
            AppError::TransitionNotFound { .. } => "TransitionNotFoundError",
            AppError::TrackerRequest { .. } => "TrackerRequestError",
            AppError::RunInProgress => "RunInProgressError",
            AppError::UnexpectedResponse(_)
            | AppError::Serialization(_)
            | AppError::Http(_)
            | AppError::Io(_)
            | AppError::Internal(_) => "UnexpectedError",
        }
    }

    /// Render the error and its full cause chain for copy/paste diagnostics.
    pub fn trace_text(&self) -> String {
        let mut text = format!("{}: {self}", self.kind());
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            text.push_str(&format!("\nCaused by: {cause}"));
            source = cause.source();
        }

        let backtrace = std::backtrace::Backtrace::capture();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            text.push_str(&format!("\n\nBacktrace:\n{backtrace}"));
        }

        text
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
