//! Evaluation results

use crate::odx::indirect::IndirectVirtual;
use serde::{Deserialize, Serialize};

/// Everything one evaluation produces
///
/// Serializes with the PascalCase keys callers of the assembled document expect:
///
/// ```text
/// { "Missing": ["Client.Phone"], "Errors": [], "HasErrors": false,
///   "Document": "<?xml version=\"1.0\"?><_odx>…</_odx>", "Indirects": [] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EvaluationResult {
    /// Expressions that evaluated to nothing, in first-seen order
    pub missing: Vec<String>,
    /// `"<expr>: <message>"` per failed expression
    pub errors: Vec<String>,
    pub has_errors: bool,
    pub document: String,
    /// Deferred sub-document insertions, in id order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indirects: Vec<IndirectVirtual>,
}

impl EvaluationResult {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && !self.has_errors
    }
}
