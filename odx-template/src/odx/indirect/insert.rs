//! Indirect insertion requests

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Docx,
    Markdown,
    /// Plain text, inserted inline as-is
    Text,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Docx => "docx",
            ContentType::Markdown => "markdown",
            ContentType::Text => "text",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// "Insert a sub-document here"
///
/// Equality compares every attribute except `id`, so two requests for the same target,
/// scope and options are the same insertion no matter where they were produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndirectVirtual {
    /// Template name (or the literal text, for `text` content)
    pub target: String,
    /// The data the sub-template is assembled against
    #[serde(default)]
    pub scope: Json,
    pub content_type: ContentType,
    #[serde(default)]
    pub keep_sections: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl IndirectVirtual {
    pub fn new(target: impl Into<String>, scope: Json, content_type: ContentType) -> Self {
        Self {
            target: target.into(),
            scope,
            content_type,
            keep_sections: false,
            id: None,
        }
    }

    pub fn with_keep_sections(mut self, keep_sections: bool) -> Self {
        self.keep_sections = keep_sections;
        self
    }

    pub fn is_inline(&self) -> bool {
        self.content_type == ContentType::Text
    }
}

impl PartialEq for IndirectVirtual {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
            && self.content_type == other.content_type
            && self.keep_sections == other.keep_sections
            && self.scope == other.scope
    }
}
