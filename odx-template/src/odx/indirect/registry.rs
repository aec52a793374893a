//! Per-evaluation interning of indirect insertions

use super::insert::IndirectVirtual;
use tracing::debug;

pub const DEFAULT_PLACEHOLDER_BASE: &str = "oxpt://DocumentAssembler/insert/";

#[derive(Debug, Clone)]
pub struct IndirectRegistry {
    placeholder_base: String,
    entries: Vec<IndirectVirtual>,
}

impl Default for IndirectRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER_BASE)
    }
}

impl IndirectRegistry {
    pub fn new(placeholder_base: impl Into<String>) -> Self {
        Self {
            placeholder_base: placeholder_base.into(),
            entries: Vec::new(),
        }
    }

    /// Reuse the id of an equal insertion or mint a new one; returns the id
    pub fn intern(&mut self, indirect: IndirectVirtual) -> String {
        if let Some(existing) = self.entries.iter().find(|e| **e == indirect) {
            if let Some(id) = &existing.id {
                return id.clone();
            }
        }
        let id = format!("I{}", self.entries.len() + 1);
        debug!(%id, target = %indirect.target, "new indirect insertion");
        let mut indirect = indirect;
        indirect.id = Some(id.clone());
        self.entries.push(indirect);
        id
    }

    pub fn placeholder(&self, id: &str, keep_sections: bool) -> String {
        let mut uri = format!("{}{}", self.placeholder_base, id);
        if keep_sections {
            uri.push_str("?KeepSections=true");
        }
        uri
    }

    /// The text standing in for an insertion in the output
    ///
    /// Text content resolves inline right away. Anything else is interned and replaced
    /// by its placeholder URI, to be assembled after the walk.
    pub fn substitute(&mut self, indirect: IndirectVirtual) -> String {
        if indirect.is_inline() {
            return indirect.target;
        }
        let keep_sections = indirect.keep_sections;
        let id = self.intern(indirect);
        self.placeholder(&id, keep_sections)
    }

    pub fn entries(&self) -> &[IndirectVirtual] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<IndirectVirtual> {
        self.entries
    }
}
