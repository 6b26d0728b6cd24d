pub mod candidates;
pub mod fields;
pub mod orchestrator;
pub mod report;
pub mod request;

pub use orchestrator::{Orchestrator, StepPolicy, WorkflowSettings};
pub use report::{Outcome, ReportRow, WorkflowReport};
pub use request::{Assignment, DueDatePolicy, MaintenanceType, NewIssueType, WorkflowRequest};
