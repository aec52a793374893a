//! Field recognition
//!
//! Classifies one field's text into a typed node plus its expression. Recognition uses
//! anchored patterns tried in declaration order (first match wins):
//!
//! | type      | long form  | short form |
//! |-----------|------------|------------|
//! | `If`      | `if x`     | `?x`       |
//! | `ElseIf`  | `elseif x` | `:?x`      |
//! | `Else`    | `else`     | `:`        |
//! | `EndIf`   | `endif`    | `/?`       |
//! | `List`    | `list x`   | `#x`       |
//! | `EndList` | `endlist`  | `/#`       |
//!
//! When the whole field text is wrapped in the delimiter pair, the wrapper is removed
//! before matching, and wrapped text that is no keyword is a plain `Content` field.
//! Anything else is a [`ParseError`].

use super::node::FieldType;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Keyword patterns in recognition order
static KEYWORD_PATTERNS: Lazy<Vec<(FieldType, Regex)>> = Lazy::new(|| {
    [
        (FieldType::If, r"(?is)^(?:if\b|\?)\s*(?P<expr>.*)$"),
        (
            FieldType::ElseIf,
            r"(?is)^(?:elseif\b|else\s+if\b|:\?)\s*(?P<expr>.*)$",
        ),
        (FieldType::Else, r"(?is)^(?:else|:)\s*$"),
        // Text after a closer is an author's note and is ignored
        (FieldType::EndIf, r"(?is)^(?:endif\b|/\?)"),
        (FieldType::List, r"(?is)^(?:list\b|#)\s*(?P<expr>.*)$"),
        (FieldType::EndList, r"(?is)^(?:endlist\b|/#)"),
    ]
    .into_iter()
    .map(|(field_type, pattern)| (field_type, Regex::new(pattern).unwrap()))
    .collect()
});

/// The delimiter pair that wraps plain content fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    pub open: String,
    pub close: String,
}

impl Delimiters {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Strip the delimiter pair if it wraps the whole text
    pub fn unwrap<'a>(&self, text: &'a str) -> Option<&'a str> {
        if self.open.is_empty() || self.close.is_empty() {
            return None;
        }
        if text.len() < self.open.len() + self.close.len() {
            return None;
        }
        text.strip_prefix(self.open.as_str())
            .and_then(|rest| rest.strip_suffix(self.close.as_str()))
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new("[", "]")
    }
}

/// Options for the recognition stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizerOptions {
    pub delimiters: Delimiters,
}

/// A field classified into its type and expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedField {
    pub field_type: FieldType,
    pub expr: Option<String>,
}

/// Field text that is not template syntax
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub content: String,
    pub message: String,
}

impl ParseError {
    fn new(content: &str, message: impl Into<String>) -> Self {
        Self {
            content: content.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in field '{}'", self.message, self.content)
    }
}

impl std::error::Error for ParseError {}

/// Stateless field classifier bound to a delimiter pair
#[derive(Debug, Clone, Default)]
pub struct FieldRecognizer {
    delimiters: Delimiters,
}

impl FieldRecognizer {
    pub fn new(delimiters: Delimiters) -> Self {
        Self { delimiters }
    }

    pub fn from_options(options: &RecognizerOptions) -> Self {
        Self::new(options.delimiters.clone())
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    /// Classify one field's content
    pub fn recognize(&self, content: &str) -> Result<RecognizedField, ParseError> {
        let trimmed = content.trim();
        let (inner, wrapped) = match self.delimiters.unwrap(trimmed) {
            Some(inner) => (inner.trim(), true),
            None => (trimmed, false),
        };

        for (field_type, pattern) in KEYWORD_PATTERNS.iter() {
            let Some(caps) = pattern.captures(inner) else {
                continue;
            };
            if !field_type.has_expr() {
                return Ok(RecognizedField {
                    field_type: *field_type,
                    expr: None,
                });
            }
            let expr = caps.name("expr").map(|m| m.as_str().trim()).unwrap_or("");
            if expr.is_empty() {
                return Err(ParseError::new(
                    content,
                    format!("{} requires an expression", field_type),
                ));
            }
            return Ok(RecognizedField {
                field_type: *field_type,
                expr: Some(expr.to_string()),
            });
        }

        if wrapped {
            if inner.is_empty() {
                return Err(ParseError::new(content, "Empty field"));
            }
            return Ok(RecognizedField {
                field_type: FieldType::Content,
                expr: Some(inner.to_string()),
            });
        }

        Err(ParseError::new(content, "Unrecognized field syntax"))
    }
}

/// Classify one field's content with the given delimiters
pub fn recognize(content: &str, delimiters: &Delimiters) -> Result<RecognizedField, ParseError> {
    FieldRecognizer::new(delimiters.clone()).recognize(content)
}
