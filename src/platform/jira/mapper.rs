use crate::error::{AppError, Result};
use crate::platform::types::{
    AttachmentRef, IssueLink, IssueSummary, LinkDirection, SourceIssueSnapshot, Transition,
};

/// Transitions listed in a `GET /issue/{key}/transitions` body.
///
/// Entries without a name or id are skipped. Numeric ids are accepted.
pub fn map_transitions(body: &serde_json::Value) -> Vec<Transition> {
    let Some(entries) = body["transitions"].as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let name = entry["name"].as_str()?;
            let id = match &entry["id"] {
                serde_json::Value::String(id) => id.clone(),
                serde_json::Value::Number(id) => id.to_string(),
                _ => {
                    tracing::debug!(name = name, "Skipping transition without id");
                    return None;
                }
            };
            Some(Transition {
                id,
                name: name.to_string(),
            })
        })
        .collect()
}

/// Find the id of the transition whose name matches `name`, ignoring case.
pub fn find_transition_id(body: &serde_json::Value, name: &str) -> Option<String> {
    let wanted = name.to_lowercase();
    map_transitions(body)
        .into_iter()
        .find(|t| t.name.to_lowercase() == wanted)
        .map(|t| t.id)
}

/// Map a `GET /issue/{key}` body into a snapshot.
pub fn map_snapshot(key: &str, body: serde_json::Value) -> Result<SourceIssueSnapshot> {
    match body {
        serde_json::Value::Object(mut issue) => match issue.remove("fields") {
            Some(serde_json::Value::Object(fields)) => Ok(SourceIssueSnapshot {
                key: key.to_string(),
                fields,
            }),
            _ => Err(AppError::UnexpectedResponse(format!(
                "Issue {key} has no fields object"
            ))),
        },
        _ => Err(AppError::UnexpectedResponse(format!(
            "Issue {key} response is not a JSON object"
        ))),
    }
}

/// Key of the issue returned by `POST /issue`.
pub fn created_key(body: &serde_json::Value) -> Result<String> {
    body.get("key")
        .and_then(|k| k.as_str())
        .map(str::to_string)
        .ok_or_else(|| AppError::UnexpectedResponse("Create issue response has no key".to_string()))
}

pub fn map_attachments(snapshot: &SourceIssueSnapshot) -> Result<Vec<AttachmentRef>> {
    let Some(entries) = snapshot.fields.get("attachment").and_then(|a| a.as_array()) else {
        return Ok(Vec::new());
    };

    entries
        .iter()
        .map(|entry| {
            let filename = entry["filename"].as_str();
            let content_url = entry["content"].as_str();
            match (filename, content_url) {
                (Some(filename), Some(content_url)) => Ok(AttachmentRef {
                    filename: filename.to_string(),
                    content_url: content_url.to_string(),
                }),
                _ => Err(AppError::UnexpectedResponse(format!(
                    "Attachment on {} is missing filename or content",
                    snapshot.key
                ))),
            }
        })
        .collect()
}

/// Links on the source issue, excluding any whose other end is the source itself
/// or that name no other issue.
pub fn map_links(snapshot: &SourceIssueSnapshot) -> Result<Vec<IssueLink>> {
    let Some(entries) = snapshot.fields.get("issuelinks").and_then(|l| l.as_array()) else {
        return Ok(Vec::new());
    };

    let mut links = Vec::new();
    for entry in entries {
        let type_name = entry["type"]["name"].as_str().ok_or_else(|| {
            AppError::UnexpectedResponse(format!("Link on {} has no type name", snapshot.key))
        })?;
        let inward = entry["inwardIssue"]["key"].as_str();
        let outward = entry["outwardIssue"]["key"].as_str();

        if inward == Some(snapshot.key.as_str()) || outward == Some(snapshot.key.as_str()) {
            continue;
        }

        let (other_key, direction) = match (outward, inward) {
            (Some(key), _) => (key, LinkDirection::Outward),
            (None, Some(key)) => (key, LinkDirection::Inward),
            (None, None) => continue,
        };

        links.push(IssueLink {
            type_name: type_name.to_string(),
            other_key: other_key.to_string(),
            direction,
        });
    }

    Ok(links)
}

/// Map a `GET /search` body into candidate rows.
pub fn map_search_results(body: &serde_json::Value) -> Result<Vec<IssueSummary>> {
    let issues = body["issues"]
        .as_array()
        .ok_or_else(|| AppError::UnexpectedResponse("Search response has no issues".to_string()))?;

    issues
        .iter()
        .map(|issue| {
            let key = issue["key"].as_str().ok_or_else(|| {
                AppError::UnexpectedResponse("Search result without key".to_string())
            })?;
            let fields = &issue["fields"];
            Ok(IssueSummary {
                key: key.to_string(),
                summary: fields["summary"].as_str().unwrap_or_default().to_string(),
                status: fields["status"]["name"].as_str().unwrap_or_default().to_string(),
                due_date: fields["duedate"].as_str().map(str::to_string),
            })
        })
        .collect()
}
