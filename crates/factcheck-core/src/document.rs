use serde::{Deserialize, Serialize};

/// Provenance label used when a document carries none.
pub const UNKNOWN_SOURCE: &str = "unknown";

fn default_source() -> String {
    UNKNOWN_SOURCE.to_string()
}

/// Indexed document; immutable once it has been assigned an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// 1-based, assigned in insertion order
    pub id: u64,
    pub content: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

/// A document awaiting insertion. The index assigns the id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewDocument {
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
}

impl NewDocument {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Text that gets embedded and shown as evidence: `"{title}. {content}"`
    /// when a title is present.
    pub fn indexed_text(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => format!("{}. {}", title, self.content),
            _ => self.content.clone(),
        }
    }

    pub(crate) fn into_record(self, id: u64) -> DocumentRecord {
        let content = self.indexed_text();
        let source = self
            .source
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(default_source);

        DocumentRecord {
            id,
            content,
            source,
            title: self.title,
            external_id: self.external_id,
            published_at: self.published_at,
        }
    }
}

/// Named entity annotation; advisory only, never used for ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
}
