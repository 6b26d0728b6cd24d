use serde::Serialize;

/// A workflow transition available on an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub id: String,
    pub name: String,
}

/// An attachment on the source issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub filename: String,
    pub content_url: String,
}

/// Which side of a link the other issue sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDirection {
    /// The other issue is the link's `inwardIssue`.
    Inward,
    /// The other issue is the link's `outwardIssue`.
    Outward,
}

/// One issue link as seen from the source issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueLink {
    pub type_name: String,
    pub other_key: String,
    pub direction: LinkDirection,
}

/// Read-only view of the source issue, fetched once per run.
#[derive(Debug, Clone)]
pub struct SourceIssueSnapshot {
    pub key: String,
    /// Full field map as returned by the tracker.
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// A row of the workflow candidate list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueSummary {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub due_date: Option<String>,
}

impl SourceIssueSnapshot {
    fn str_field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn summary(&self) -> Option<&str> {
        self.str_field("summary")
    }

    pub fn description(&self) -> &str {
        self.str_field("description").unwrap_or_default()
    }

    pub fn due_date(&self) -> Option<&str> {
        self.str_field("duedate")
    }

    /// User id (`name`) of the issue's reporter, if any.
    pub fn reporter_name(&self) -> Option<&str> {
        self.fields
            .get("reporter")
            .and_then(|r| r.get("name"))
            .and_then(|n| n.as_str())
            .filter(|s| !s.is_empty())
    }
}
