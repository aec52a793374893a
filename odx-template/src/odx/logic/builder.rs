//! Logic tree construction
//!
//! Walks the structured field tree with a fresh [`Atomizer`], attaching atoms and filling
//! the field dictionary. Content whose atom is already defined in an active frame is
//! dropped from the tree (its field still gets a dictionary entry). Error nodes evaluate to
//! nothing and are dropped as well.

use super::dictionary::FieldDictionary;
use super::tree::{LogicNode, LogicTree};
use crate::odx::atomizing::{condition_atom, punctuation_atom, Atomizer};
use crate::odx::diagnostics::Diagnostic;
use crate::odx::fields::{FieldNode, FieldType};
use crate::odx::structuring::StructuredTemplate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Everything a compile produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledTemplate {
    pub logic: LogicTree,
    pub dictionary: FieldDictionary,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl CompiledTemplate {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Build the logic tree and field dictionary of a structured template
pub fn build_logic(structured: &StructuredTemplate) -> CompiledTemplate {
    let mut builder = LogicBuilder::default();
    let nodes = builder.build_nodes(&structured.nodes);

    debug!(
        atoms = builder.atomizer.atom_count(),
        defines = builder.atomizer.define_count(),
        fields = builder.dictionary.len(),
        "built logic tree"
    );
    CompiledTemplate {
        logic: LogicTree::new(nodes),
        dictionary: builder.dictionary,
        diagnostics: structured.diagnostics.clone(),
    }
}

#[derive(Default)]
struct LogicBuilder {
    atomizer: Atomizer,
    dictionary: FieldDictionary,
    /// Atoms of the lists being built, innermost last
    lists: Vec<String>,
}

impl LogicBuilder {
    fn build_nodes(&mut self, nodes: &[FieldNode]) -> Vec<LogicNode> {
        nodes.iter().filter_map(|n| self.build_node(n)).collect()
    }

    fn build_node(&mut self, node: &FieldNode) -> Option<LogicNode> {
        match node.field_type {
            FieldType::Content => self.build_content(node),
            FieldType::If => Some(self.build_conditional(node, &node.id)),
            FieldType::List => Some(self.build_list(node)),
            // Structuring consumed every other marker; what is left is an error
            _ => None,
        }
    }

    fn build_content(&mut self, node: &FieldNode) -> Option<LogicNode> {
        if node.is_punctuation() {
            if let Some(list_atom) = self.lists.last() {
                let atom = punctuation_atom(list_atom);
                return Some(LogicNode::new(FieldType::Content, &node.id).with_expr(node.expr(), atom));
            }
        }

        let binding = self.atomizer.define_atom(node.expr());
        self.dictionary
            .insert_field(&node.id, FieldType::Content, &binding.atom);
        binding.is_new.then(|| {
            LogicNode::new(FieldType::Content, &node.id).with_expr(node.expr(), binding.atom)
        })
    }

    /// Build an `If` or `ElseIf` together with its alternative chain
    fn build_conditional(&mut self, node: &FieldNode, if_id: &str) -> LogicNode {
        let atom = self.atomizer.begin_if_atom(node.expr());
        self.dictionary
            .insert_field(&node.id, node.field_type, condition_atom(&atom));

        let mut content = self.build_nodes(node.body());
        if let Some(alternative) = node.alternative() {
            self.atomizer.alternative();
            match alternative.field_type {
                FieldType::ElseIf => content.push(self.build_conditional(alternative, if_id)),
                _ => {
                    self.dictionary.insert_close(&alternative.id, if_id);
                    let branch = self.build_nodes(&alternative.content_array);
                    content.push(LogicNode::new(FieldType::Else, &alternative.id).with_content(branch));
                }
            }
        }
        self.atomizer.end_if();

        if let Some(end_id) = &node.end_id {
            self.dictionary.insert_close(end_id, &node.id);
        }
        LogicNode::new(node.field_type, &node.id)
            .with_expr(node.expr(), atom)
            .with_content(content)
    }

    fn build_list(&mut self, node: &FieldNode) -> LogicNode {
        let atom = self.atomizer.begin_list_atom();
        self.dictionary
            .insert_field(&node.id, FieldType::List, &atom);
        if let Some(end_id) = &node.end_id {
            self.dictionary.insert_close(end_id, &node.id);
        }

        self.lists.push(atom.clone());
        let content = self.build_nodes(&node.content_array);
        self.lists.pop();
        self.atomizer.end_list();

        LogicNode::new(FieldType::List, &node.id)
            .with_expr(node.expr(), atom)
            .with_content(content)
    }
}
