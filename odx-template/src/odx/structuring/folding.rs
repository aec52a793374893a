//! Depth tagging and folding
//!
//! The flat sequence is first walked once with two independent counters, one for
//! `List`/`EndList` nesting and one for `If` chains. Every marker is tagged with its
//! counter value at the time of visit:
//!
//! - `If`/`List` increment, then tag
//! - `ElseIf`/`Else` tag at the current depth
//! - `EndIf`/`EndList` tag, then decrement (never below zero)
//!
//! Folding then resolves openers left to right: an opener owns everything up to the first
//! closer of its kind carrying the same depth tag. The body is folded recursively, so an
//! interleaving of lists and conditionals resolves correctly even though the two counters
//! know nothing of each other.
//!
//! Closers and alternatives nothing consumed are orphans and become inline `Error` nodes.

use super::{FlatTemplate, StructuredTemplate};
use crate::odx::diagnostics::Diagnostic;
use crate::odx::fields::{FieldNode, FieldType};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, warn};

/// A node with its nesting depth
#[derive(Debug, Clone)]
struct Tagged {
    node: FieldNode,
    depth: usize,
}

/// Fold a flat template into a nested tree
pub fn fold(flat: FlatTemplate) -> StructuredTemplate {
    let positions: HashMap<String, usize> = flat
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.clone(), i))
        .collect();

    let mut diagnostics = flat.diagnostics;
    let tagged = tag_depths(flat.nodes);
    let nodes = fold_sequence(tagged, &mut diagnostics);

    // Report in document order regardless of which step found the problem
    diagnostics.sort_by_key(|d| positions.get(&d.field_id).copied().unwrap_or(usize::MAX));

    debug!(
        roots = nodes.len(),
        diagnostics = diagnostics.len(),
        "folded template structure"
    );
    StructuredTemplate { nodes, diagnostics }
}

fn tag_depths(nodes: Vec<FieldNode>) -> Vec<Tagged> {
    let mut list_depth = 0usize;
    let mut if_depth = 0usize;

    nodes
        .into_iter()
        .map(|node| {
            let depth = match node.field_type {
                FieldType::If => {
                    if_depth += 1;
                    if_depth
                }
                FieldType::ElseIf | FieldType::Else => if_depth,
                FieldType::EndIf => {
                    let depth = if_depth;
                    if_depth = if_depth.saturating_sub(1);
                    depth
                }
                FieldType::List => {
                    list_depth += 1;
                    list_depth
                }
                FieldType::EndList => {
                    let depth = list_depth;
                    list_depth = list_depth.saturating_sub(1);
                    depth
                }
                FieldType::Content | FieldType::Error => 0,
            };
            Tagged { node, depth }
        })
        .collect()
}

fn fold_sequence(items: Vec<Tagged>, diagnostics: &mut Vec<Diagnostic>) -> Vec<FieldNode> {
    let mut queue: VecDeque<Tagged> = items.into();
    let mut folded = Vec::new();

    while let Some(item) = queue.pop_front() {
        let field_type = item.node.field_type;
        match field_type {
            FieldType::If | FieldType::List => {
                let closer = field_type.closer();
                let found = queue
                    .iter()
                    .position(|t| Some(t.node.field_type) == closer && t.depth == item.depth);
                let end = found.and_then(|idx| queue.remove(idx).map(|end| (idx, end)));

                let Some((idx, end)) = end else {
                    let message = format!(
                        "{} has no matching {}",
                        field_type,
                        closer.map(|c| c.as_str()).unwrap_or("end")
                    );
                    folded.push(report(item.node, message, diagnostics));
                    continue;
                };

                let body: Vec<Tagged> = queue.drain(..idx).collect();
                let mut node = item.node;
                node.end_id = Some(end.node.id);
                node.content_array = if field_type == FieldType::If {
                    fold_if_body(body, item.depth, diagnostics)
                } else {
                    fold_list_body(&node.id, body, diagnostics)
                };
                folded.push(node);
            }
            FieldType::EndIf | FieldType::EndList => {
                let message = format!("Unmatched {}", field_type);
                folded.push(report(item.node, message, diagnostics));
            }
            FieldType::ElseIf | FieldType::Else => {
                let message = format!("{} without a matching If", field_type);
                folded.push(report(item.node, message, diagnostics));
            }
            FieldType::Content | FieldType::Error => folded.push(item.node),
        }
    }

    folded
}

/// Split an `If` body at its own alternatives and thread them into a nested chain
fn fold_if_body(
    body: Vec<Tagged>,
    depth: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<FieldNode> {
    let mut main = Vec::new();
    let mut alternatives: Vec<(FieldNode, Vec<Tagged>)> = Vec::new();

    for item in body {
        let own_alternative = item.node.field_type.is_alternative() && item.depth == depth;
        if !own_alternative {
            match alternatives.last_mut() {
                Some((_, segment)) => segment.push(item),
                None => main.push(item),
            }
            continue;
        }

        match alternatives.last_mut() {
            Some((previous, segment)) if previous.field_type == FieldType::Else => {
                let message = format!("{} follows Else", item.node.field_type);
                let node = report(item.node, message, diagnostics);
                segment.push(Tagged { node, depth: 0 });
            }
            _ => alternatives.push((item.node, Vec::new())),
        }
    }

    let mut tail: Option<FieldNode> = None;
    for (alternative, segment) in alternatives.into_iter().rev() {
        let mut content = fold_sequence(segment, diagnostics);
        content.extend(tail.take());
        tail = Some(alternative.with_content(content));
    }

    let mut content = fold_sequence(main, diagnostics);
    content.extend(tail);
    content
}

fn fold_list_body(
    list_id: &str,
    body: Vec<Tagged>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<FieldNode> {
    let mut content = fold_sequence(body, diagnostics);
    if !content.last().is_some_and(FieldNode::is_punctuation) {
        content.push(FieldNode::punctuation(list_id));
    }
    content
}

fn report(node: FieldNode, message: String, diagnostics: &mut Vec<Diagnostic>) -> FieldNode {
    warn!(field = %node.id, "{}", message);
    diagnostics.push(Diagnostic::structural(&node.id, &message));
    node.into_error(message)
}
