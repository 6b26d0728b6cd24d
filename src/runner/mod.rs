use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};
use crate::workflow::{Orchestrator, ReportRow, WorkflowReport, WorkflowRequest};

/// Runs workflows on a background task, one at a time.
pub struct WorkflowRunner {
    orchestrator: Arc<Orchestrator>,
    busy: Arc<AtomicBool>,
}

/// A started run: live rows plus the final report.
pub struct RunHandle {
    pub rows: mpsc::UnboundedReceiver<ReportRow>,
    task: JoinHandle<Result<WorkflowReport>>,
}

impl RunHandle {
    /// Wait for the run to finish.
    pub async fn finish(self) -> Result<WorkflowReport> {
        self.task
            .await
            .map_err(|e| AppError::Internal(format!("Workflow task panicked: {e}")))?
    }
}

/// Clears the in-flight flag when the run task ends, however it ends.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl WorkflowRunner {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Validate `request` and start it on a background task.
    ///
    /// Fails with `Validation` before anything is spawned, or with `RunInProgress`
    /// while another run is active.
    pub fn start(&self, request: WorkflowRequest) -> Result<RunHandle> {
        request.validate()?;

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(issue = %request.source_issue_key, "Rejected run, another is in progress");
            return Err(AppError::RunInProgress);
        }
        let guard = InFlight(Arc::clone(&self.busy));

        let (tx, rx) = mpsc::unbounded_channel();
        let orchestrator = Arc::clone(&self.orchestrator);

        tracing::info!(issue = %request.source_issue_key, "Starting background workflow run");
        let task = tokio::spawn(async move {
            let _guard = guard;
            orchestrator.run_streaming(&request, Some(tx)).await
        });

        Ok(RunHandle { rows: rx, task })
    }
}
