//! Field list input
//!
//! The document extraction layer hands over fields in document order. A bare field is a
//! field that sits alone in its own block (paragraph); a nested array is one block that
//! holds several fields and/or literal text runs:
//!
//! ```text
//! [
//!   { "content": "if Client.IsMarried", "id": "1" },
//!   ["Dear ", { "content": "[Client.Name]", "id": "2" }, ","],
//!   { "content": "endif", "id": "3" }
//! ]
//! ```

use serde::{Deserialize, Serialize};

/// One delimited field as extracted from the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawField {
    pub content: String,
    pub id: String,
}

impl RawField {
    pub fn new(content: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            id: id.into(),
        }
    }
}

/// An entry of the field list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldListItem {
    /// A field alone in its block
    Field(RawField),
    /// A literal text run
    Text(String),
    /// One block holding several fields and/or text runs
    Block(Vec<FieldListItem>),
}

impl FieldListItem {
    pub fn field(content: impl Into<String>, id: impl Into<String>) -> Self {
        FieldListItem::Field(RawField::new(content, id))
    }

    pub fn text(text: impl Into<String>) -> Self {
        FieldListItem::Text(text.into())
    }

    /// Visit every field in document order, descending into blocks
    pub fn for_each_field<F: FnMut(&RawField)>(&self, f: &mut F) {
        match self {
            FieldListItem::Field(field) => f(field),
            FieldListItem::Text(_) => {}
            FieldListItem::Block(items) => {
                for item in items {
                    item.for_each_field(f);
                }
            }
        }
    }
}

/// Everything the compiler needs to know about one template part
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSource {
    pub fields: Vec<FieldListItem>,
    /// The source still carries unresolved tracked changes; compiling it is refused
    #[serde(default)]
    pub tracked_changes: bool,
}

impl TemplateSource {
    pub fn new(fields: Vec<FieldListItem>) -> Self {
        Self {
            fields,
            tracked_changes: false,
        }
    }

    /// Build a source where every string is a field alone in its block, with ids
    /// numbered from 1. Handy for tests and quick experiments.
    pub fn from_contents<I, S>(contents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = contents
            .into_iter()
            .enumerate()
            .map(|(i, content)| FieldListItem::field(content, (i + 1).to_string()))
            .collect();
        Self::new(fields)
    }

    pub fn field_count(&self) -> usize {
        let mut count = 0;
        for item in &self.fields {
            item.for_each_field(&mut |_| count += 1);
        }
        count
    }
}
