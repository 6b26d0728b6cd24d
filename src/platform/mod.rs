pub mod jira;
pub mod types;

use std::path::Path;

use async_trait::async_trait;
use tempfile::NamedTempFile;

use crate::error::Result;

/// Authenticated access to the issue tracker's REST API.
///
/// Paths are relative to the configured base URL (e.g. `/rest/api/2/issue/TFS-1`).
/// Every method fails with `AppError::TrackerRequest` when the tracker answers
/// with a status of 300 or above. An empty response body maps to `Value::Null`.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn get(&self, path: &str) -> Result<serde_json::Value>;

    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<serde_json::Value>;

    async fn put(&self, path: &str, body: &serde_json::Value) -> Result<serde_json::Value>;

    /// Download an absolute attachment URL into a fresh temporary file.
    ///
    /// The file is deleted when the returned handle is dropped.
    async fn download_to_temp_file(&self, url: &str, suggested_name: &str)
        -> Result<NamedTempFile>;

    /// Upload a local file as an attachment under `filename`.
    async fn upload_attachment(
        &self,
        path: &str,
        file: &Path,
        filename: &str,
    ) -> Result<serde_json::Value>;
}
