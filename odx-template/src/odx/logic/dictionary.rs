//! The field dictionary
//!
//! Maps every source field id to what it became:
//!
//! ```text
//! { "1": { "fieldType": "If", "atomizedExpr": "C1b" },
//!   "2": { "fieldType": "Content", "atomizedExpr": "C2" },
//!   "3": { "parent": "1" } }
//! ```
//!
//! `Else`, `EndIf` and `EndList` fields carry no expression; they point at the field that
//! opened their construct instead.

use crate::odx::fields::FieldType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DictionaryEntry {
    Field {
        #[serde(rename = "fieldType")]
        field_type: FieldType,
        #[serde(rename = "atomizedExpr")]
        atomized_expr: String,
    },
    Close {
        parent: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldDictionary {
    entries: BTreeMap<String, DictionaryEntry>,
}

impl FieldDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_field(
        &mut self,
        id: impl Into<String>,
        field_type: FieldType,
        atomized_expr: impl Into<String>,
    ) {
        self.entries.insert(
            id.into(),
            DictionaryEntry::Field {
                field_type,
                atomized_expr: atomized_expr.into(),
            },
        );
    }

    pub fn insert_close(&mut self, id: impl Into<String>, parent: impl Into<String>) {
        self.entries.insert(
            id.into(),
            DictionaryEntry::Close {
                parent: parent.into(),
            },
        );
    }

    pub fn get(&self, id: &str) -> Option<&DictionaryEntry> {
        self.entries.get(id)
    }

    /// The atomized expression of a field, following close markers to their opener
    pub fn atom_of(&self, id: &str) -> Option<&str> {
        match self.entries.get(id)? {
            DictionaryEntry::Field { atomized_expr, .. } => Some(atomized_expr),
            DictionaryEntry::Close { parent } => self.atom_of(parent),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DictionaryEntry)> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let mut dictionary = FieldDictionary::new();
        dictionary.insert_field("1", FieldType::If, "C1b");
        dictionary.insert_close("2", "1");

        let json = serde_json::to_value(&dictionary).unwrap();
        assert_eq!(json["1"]["fieldType"], "If");
        assert_eq!(json["1"]["atomizedExpr"], "C1b");
        assert_eq!(json["2"]["parent"], "1");

        let back: FieldDictionary = serde_json::from_value(json).unwrap();
        assert_eq!(back, dictionary);
    }

    #[test]
    fn test_atom_of_follows_parent() {
        let mut dictionary = FieldDictionary::new();
        dictionary.insert_field("4", FieldType::List, "L3");
        dictionary.insert_close("9", "4");

        assert_eq!(dictionary.atom_of("9"), Some("L3"));
        assert_eq!(dictionary.atom_of("10"), None);
    }
}
