//! Batched, non-fatal diagnostics
//!
//! Structural and parse problems never abort compilation. They are recorded here,
//! attributed to the field that caused them, and returned together with the recovered
//! template. Evaluation problems are plain strings on the evaluation result instead.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The family a diagnostic belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Unmatched or mismatched If/EndIf, List/EndList, or ambiguous block/run scope
    Structural,
    /// A field whose text is not recognizable template syntax
    Parse,
}

impl DiagnosticKind {
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::Structural => "StructuralError",
            DiagnosticKind::Parse => "ParseError",
        }
    }
}

/// A single recovered problem, attributed to a source field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub field_id: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, field_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            field_id: field_id.into(),
            message: message.into(),
        }
    }

    pub fn structural(field_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Structural, field_id, message)
    }

    pub fn parse(field_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Parse, field_id, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at field {}: {}",
            self.kind.label(),
            self.field_id,
            self.message
        )
    }
}

/// Count diagnostics of one kind
pub fn count_of(diagnostics: &[Diagnostic], kind: DiagnosticKind) -> usize {
    diagnostics.iter().filter(|d| d.kind == kind).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_field() {
        let diagnostic = Diagnostic::structural("7", "Unmatched EndIf");
        assert_eq!(
            diagnostic.to_string(),
            "StructuralError at field 7: Unmatched EndIf"
        );
    }

    #[test]
    fn test_count_of() {
        let diagnostics = vec![
            Diagnostic::structural("1", "a"),
            Diagnostic::parse("2", "b"),
            Diagnostic::structural("3", "c"),
        ];
        assert_eq!(count_of(&diagnostics, DiagnosticKind::Structural), 2);
        assert_eq!(count_of(&diagnostics, DiagnosticKind::Parse), 1);
    }

    #[test]
    fn test_serializes_camel_case() {
        let diagnostic = Diagnostic::parse("12", "bad field");
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["fieldId"], "12");
        assert_eq!(json["kind"], "Parse");
    }

    #[test]
    fn test_only_compile_time_kinds_deserialize() {
        assert_eq!(
            serde_json::from_str::<DiagnosticKind>("\"Structural\"").unwrap(),
            DiagnosticKind::Structural
        );
        assert!(serde_json::from_str::<DiagnosticKind>("\"Evaluation\"").is_err());
    }
}
