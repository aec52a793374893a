//! Structure building
//!
//! Turns a field list into a properly nested tree of [`FieldNode`]s in three steps, each a
//! pure function returning new values:
//!
//! 1. [`blocks`]: recognize every field and keep the document's block grouping
//! 2. [`promotion`]: promote lone markers to block placement, validate inline markers
//! 3. [`folding`]: tag nesting depths, then fold openers and closers into subtrees
//!
//! Problems never abort the build. Each one is recorded as a [`Diagnostic`] and the
//! offending field is left in place as an inline `Error` node.

pub mod blocks;
pub mod folding;
pub mod promotion;

use crate::odx::diagnostics::Diagnostic;
use crate::odx::fields::{FieldNode, FieldRecognizer, TemplateSource};

pub use blocks::{recognize_blocks, RecognizedBlock, RecognizedTemplate};
pub use folding::fold;
pub use promotion::promote_blocks;

/// The flat, document-ordered node sequence after block promotion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatTemplate {
    pub nodes: Vec<FieldNode>,
    pub diagnostics: Vec<Diagnostic>,
}

/// The nested tree after folding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredTemplate {
    pub nodes: Vec<FieldNode>,
    pub diagnostics: Vec<Diagnostic>,
}

impl StructuredTemplate {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Run recognition, promotion and folding over a source
pub fn structure(source: &TemplateSource, recognizer: &FieldRecognizer) -> StructuredTemplate {
    let recognized = recognize_blocks(source, recognizer);
    let flat = promote_blocks(recognized);
    fold(flat)
}
