//! Template fields
//!
//! This module covers everything about a single field before it is placed in a tree:
//!
//! - [`input`]: the field list handed over by the document extraction layer
//! - [`node`]: the [`FieldNode`] type shared by every later stage
//! - [`recognizer`]: classification of one field's text into a typed node

pub mod input;
pub mod node;
pub mod recognizer;

pub use input::{FieldListItem, RawField, TemplateSource};
pub use node::{FieldNode, FieldType, Placement};
pub use recognizer::{Delimiters, FieldRecognizer, ParseError, RecognizedField, RecognizerOptions};
