//! Block promotion
//!
//! Decides, block by block, whether structural markers span whole blocks or live inline:
//!
//! - exactly one marker and nothing else meaningful: the marker is promoted to
//!   [`Placement::Block`], so its content may range over the following blocks
//! - exactly one marker next to other text or content: ambiguous, reported and the
//!   marker is left inline as an error
//! - several markers: they must match among themselves inside the block (checked with a
//!   stack); otherwise the block's markers are all left inline as errors

use super::blocks::{RecognizedBlock, RecognizedTemplate};
use super::FlatTemplate;
use crate::odx::diagnostics::Diagnostic;
use crate::odx::fields::{FieldNode, FieldType, Placement};
use tracing::{debug, warn};

/// Promote lone markers and validate inline ones, producing the flat node sequence
pub fn promote_blocks(recognized: RecognizedTemplate) -> FlatTemplate {
    let mut diagnostics = recognized.diagnostics;
    let mut nodes = Vec::new();
    let mut promoted = 0usize;

    for block in recognized.blocks {
        let marker_count = block
            .nodes
            .iter()
            .filter(|n| n.field_type.is_structural())
            .count();

        match marker_count {
            0 => {
                let placement = block_placement(&block);
                nodes.extend(block.nodes.into_iter().map(|n| n.with_placement(placement)));
            }
            1 => {
                if has_other_content(&block) {
                    let mut reported = false;
                    for node in block.nodes {
                        if node.field_type.is_structural() {
                            let message = format!(
                                "{} must be alone in its paragraph or match inline",
                                node.field_type
                            );
                            warn!(field = %node.id, "{}", message);
                            diagnostics.push(Diagnostic::structural(&node.id, &message));
                            reported = true;
                            nodes.push(node.into_error(message));
                        } else {
                            nodes.push(node);
                        }
                    }
                    debug_assert!(reported);
                } else {
                    promoted += 1;
                    nodes.extend(
                        block
                            .nodes
                            .into_iter()
                            .map(|n| n.with_placement(Placement::Block)),
                    );
                }
            }
            _ => match validate_inline(&block.nodes) {
                Ok(()) => nodes.extend(block.nodes),
                Err((field_id, message)) => {
                    warn!(field = %field_id, "{}", message);
                    diagnostics.push(Diagnostic::structural(&field_id, &message));
                    nodes.extend(block.nodes.into_iter().map(|n| {
                        if n.field_type.is_structural() {
                            n.into_error(message.clone())
                        } else {
                            n
                        }
                    }));
                }
            },
        }
    }

    debug!(nodes = nodes.len(), promoted, "promoted block markers");
    FlatTemplate { nodes, diagnostics }
}

fn block_placement(block: &RecognizedBlock) -> Placement {
    if block.nodes.len() == 1 && !block.has_text {
        Placement::Block
    } else {
        Placement::Inline
    }
}

/// Text or content sharing the block with its marker
fn has_other_content(block: &RecognizedBlock) -> bool {
    block.has_text
        || block
            .nodes
            .iter()
            .any(|n| n.field_type == FieldType::Content)
}

/// Check that the markers of one block match among themselves.
///
/// Returns the offending field id and a message on the first violation.
fn validate_inline(nodes: &[FieldNode]) -> Result<(), (String, String)> {
    let mut stack: Vec<&FieldNode> = Vec::new();

    for node in nodes {
        match node.field_type {
            FieldType::If | FieldType::List => stack.push(node),
            FieldType::EndIf | FieldType::EndList => {
                let Some(opener) = stack.pop() else {
                    return Err((node.id.clone(), format!("Unmatched {}", node.field_type)));
                };
                if opener.field_type.closer() != Some(node.field_type) {
                    return Err((
                        node.id.clone(),
                        format!(
                            "{} does not match {} (field {})",
                            node.field_type, opener.field_type, opener.id
                        ),
                    ));
                }
            }
            FieldType::ElseIf | FieldType::Else => {
                if stack.last().map(|n| n.field_type) != Some(FieldType::If) {
                    return Err((
                        node.id.clone(),
                        format!("{} is not inside an If in this paragraph", node.field_type),
                    ));
                }
            }
            FieldType::Content | FieldType::Error => {}
        }
    }

    match stack.last() {
        Some(open) => Err((
            open.id.clone(),
            format!("{} is not closed within its paragraph", open.field_type),
        )),
        None => Ok(()),
    }
}
