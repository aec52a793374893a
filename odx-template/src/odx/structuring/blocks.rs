//! Field recognition over a whole field list, keeping block grouping

use crate::odx::diagnostics::Diagnostic;
use crate::odx::fields::{FieldListItem, FieldNode, FieldRecognizer, RawField, TemplateSource};
use tracing::debug;

/// The recognized fields of one block (paragraph)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedBlock {
    pub nodes: Vec<FieldNode>,
    /// The block also holds literal text with something other than whitespace
    pub has_text: bool,
}

impl RecognizedBlock {
    pub fn single(node: FieldNode) -> Self {
        Self {
            nodes: vec![node],
            has_text: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedTemplate {
    pub blocks: Vec<RecognizedBlock>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Recognize every field of the source; parse errors become inline error nodes
pub fn recognize_blocks(source: &TemplateSource, recognizer: &FieldRecognizer) -> RecognizedTemplate {
    let mut blocks = Vec::new();
    let mut diagnostics = Vec::new();

    for item in &source.fields {
        match item {
            FieldListItem::Field(field) => {
                let node = recognize_field(field, recognizer, &mut diagnostics);
                blocks.push(RecognizedBlock::single(node));
            }
            // A paragraph of plain text has no bearing on structure
            FieldListItem::Text(_) => {}
            FieldListItem::Block(items) => {
                let mut block = RecognizedBlock {
                    nodes: Vec::new(),
                    has_text: false,
                };
                collect_block(items, recognizer, &mut block, &mut diagnostics);
                if !block.nodes.is_empty() {
                    blocks.push(block);
                }
            }
        }
    }

    debug!(
        blocks = blocks.len(),
        parse_errors = diagnostics.len(),
        "recognized field list"
    );
    RecognizedTemplate {
        blocks,
        diagnostics,
    }
}

fn collect_block(
    items: &[FieldListItem],
    recognizer: &FieldRecognizer,
    block: &mut RecognizedBlock,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for item in items {
        match item {
            FieldListItem::Field(field) => {
                let node = recognize_field(field, recognizer, diagnostics);
                block.nodes.push(node);
            }
            FieldListItem::Text(text) => {
                if !text.trim().is_empty() {
                    block.has_text = true;
                }
            }
            FieldListItem::Block(nested) => collect_block(nested, recognizer, block, diagnostics),
        }
    }
}

fn recognize_field(
    field: &RawField,
    recognizer: &FieldRecognizer,
    diagnostics: &mut Vec<Diagnostic>,
) -> FieldNode {
    match recognizer.recognize(&field.content) {
        Ok(recognized) => FieldNode::new(recognized.field_type, recognized.expr, &field.id),
        Err(err) => {
            diagnostics.push(Diagnostic::parse(&field.id, err.to_string()));
            FieldNode::error(&field.id, err.to_string())
        }
    }
}
