use std::path::Path;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use tempfile::NamedTempFile;

use crate::config::JiraConfig;
use crate::error::{AppError, Result};
use crate::platform::IssueTracker;

use super::auth::authorization_header;

/// Jira Server REST v2 client.
pub struct JiraClient {
    http: Client,
    base_url: String,
    authorization: String,
}

impl JiraClient {
    pub fn new(config: &JiraConfig) -> Result<Self> {
        let authorization = authorization_header(&config.auth)?;

        let http = Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            authorization,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json")
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let mut request = self.request(method.clone(), &self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        tracing::debug!(method = %method, path = path, status = %response.status(), "Jira request");

        read_json(response).await
    }
}

/// Turn a response into JSON, mapping non-2xx statuses to `TrackerRequest`.
async fn read_json(response: Response) -> Result<serde_json::Value> {
    let status = response.status();
    let text = response.text().await?;

    if status.as_u16() >= 300 {
        return Err(AppError::TrackerRequest {
            status: status.as_u16(),
            body: text,
        });
    }

    if text.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }

    Ok(serde_json::from_str(&text)?)
}

/// Temp file suffix taken from the original filename's extension.
fn temp_suffix(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) if idx + 1 < filename.len() => &filename[idx..],
        _ => ".tmp",
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn get(&self, path: &str) -> Result<serde_json::Value> {
        self.send_json(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        self.send_json(Method::POST, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        self.send_json(Method::PUT, path, Some(body)).await
    }

    async fn download_to_temp_file(
        &self,
        url: &str,
        suggested_name: &str,
    ) -> Result<NamedTempFile> {
        let response = self.request(Method::GET, url).send().await?;
        let status = response.status();
        tracing::debug!(url = url, status = %status, "Attachment download");

        if !status.is_success() {
            return Err(AppError::TrackerRequest {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let bytes = response.bytes().await?;

        let temp = tempfile::Builder::new()
            .prefix("jira-attachment-")
            .suffix(temp_suffix(suggested_name))
            .tempfile()?;
        tokio::fs::write(temp.path(), &bytes).await?;

        Ok(temp)
    }

    async fn upload_attachment(
        &self,
        path: &str,
        file: &Path,
        filename: &str,
    ) -> Result<serde_json::Value> {
        let contents = tokio::fs::read(file).await?;

        let part = reqwest::multipart::Part::bytes(contents)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .request(Method::POST, &self.url(path))
            .header("X-Atlassian-Token", "no-check")
            .multipart(form)
            .send()
            .await?;
        tracing::debug!(path = path, filename = filename, status = %response.status(), "Attachment upload");

        read_json(response).await
    }
}
