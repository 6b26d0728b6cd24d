use crate::error::Result;
use crate::platform::jira::mapper;
use crate::platform::types::IssueSummary;
use crate::platform::IssueTracker;
use crate::workflow::request::WorkflowRequest;

/// Issues waiting to be processed, as selected by the workflow JQL.
pub async fn list_candidates(tracker: &dyn IssueTracker, jql: &str) -> Result<Vec<IssueSummary>> {
    let path = format!(
        "/rest/api/2/search?jql={}&fields=summary,status,duedate",
        urlencoding::encode(jql)
    );
    let body = tracker.get(&path).await?;
    let issues = mapper::map_search_results(&body)?;
    tracing::info!(count = issues.len(), "Fetched workflow candidates");
    Ok(issues)
}

/// Validate `request`, then fill in a blank source summary from the tracker.
///
/// An invalid request fails before any tracker call.
pub async fn fill_source_summary(
    tracker: &dyn IssueTracker,
    request: &mut WorkflowRequest,
) -> Result<()> {
    request.validate()?;
    if !request.source_summary.trim().is_empty() {
        return Ok(());
    }

    let key = &request.source_issue_key;
    let body = tracker
        .get(&format!("/rest/api/2/issue/{key}?fields=summary"))
        .await?;
    let snapshot = mapper::map_snapshot(key, body)?;
    request.source_summary = snapshot.summary().unwrap_or_default().to_string();
    tracing::debug!(issue = %key, summary = %request.source_summary, "Fetched source summary");
    Ok(())
}
