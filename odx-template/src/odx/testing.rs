//! Testing utilities
//!
//! - [`assert_tree`]: fluent assertions over structured field trees
//! - [`RecordingHost`]: a [`Host`] that records every call and answers conditions and
//!   lists from a fixed table, for comparing backends and checking walk order
//! - [`fixture_path`]: locate the shared fixture files
//!
//! ```rust,ignore
//! let structured = structure(&source, &FieldRecognizer::default());
//! assert_tree(&structured.nodes)
//!     .item_count(1)
//!     .item(0, |node| {
//!         node.is_type(FieldType::List)
//!             .expr("Items")
//!             .child_count(2)
//!             .child(1, |punc| punc.is_punctuation());
//!     });
//! ```

use crate::odx::evaluation::Host;
use crate::odx::fields::{FieldNode, FieldType, Placement};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Path of a file under this crate's `tests/fixtures`
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

// ============================================================================
// Tree assertions
// ============================================================================

/// Start an assertion over a forest of field nodes
pub fn assert_tree(nodes: &[FieldNode]) -> TreeAssertion<'_> {
    TreeAssertion {
        nodes,
        context: "tree".to_string(),
    }
}

pub struct TreeAssertion<'a> {
    nodes: &'a [FieldNode],
    context: String,
}

impl<'a> TreeAssertion<'a> {
    pub fn item_count(self, expected: usize) -> Self {
        assert_eq!(
            self.nodes.len(),
            expected,
            "{}: Expected {} nodes, found {}: {:?}",
            self.context,
            expected,
            self.nodes.len(),
            self.nodes.iter().map(|n| n.field_type).collect::<Vec<_>>()
        );
        self
    }

    pub fn item<F>(self, index: usize, check: F) -> Self
    where
        F: FnOnce(NodeAssertion<'a>),
    {
        let node = self.nodes.get(index).unwrap_or_else(|| {
            panic!(
                "{}: No node at index {} (only {})",
                self.context,
                index,
                self.nodes.len()
            )
        });
        check(NodeAssertion {
            node,
            context: format!("{}[{}]", self.context, index),
        });
        self
    }

    /// Every node in the forest, recursively, has no `Error` type
    pub fn no_errors(self) -> Self {
        fn walk(nodes: &[FieldNode], context: &str) {
            for node in nodes {
                assert_ne!(
                    node.field_type,
                    FieldType::Error,
                    "{}: Unexpected error node {} ({:?})",
                    context,
                    node.id,
                    node.message
                );
                walk(&node.content_array, context);
            }
        }
        walk(self.nodes, &self.context);
        self
    }
}

pub struct NodeAssertion<'a> {
    node: &'a FieldNode,
    context: String,
}

impl<'a> NodeAssertion<'a> {
    pub fn is_type(self, expected: FieldType) -> Self {
        assert_eq!(
            self.node.field_type, expected,
            "{}: Expected {}, found {} (id {})",
            self.context, expected, self.node.field_type, self.node.id
        );
        self
    }

    pub fn id(self, expected: &str) -> Self {
        assert_eq!(self.node.id, expected, "{}: Unexpected id", self.context);
        self
    }

    pub fn expr(self, expected: &str) -> Self {
        assert_eq!(
            self.node.expr.as_deref(),
            Some(expected),
            "{}: Unexpected expression",
            self.context
        );
        self
    }

    pub fn placement(self, expected: Placement) -> Self {
        assert_eq!(
            self.node.placement, expected,
            "{}: Unexpected placement",
            self.context
        );
        self
    }

    pub fn ends_at(self, expected: &str) -> Self {
        assert_eq!(
            self.node.end_id.as_deref(),
            Some(expected),
            "{}: Unexpected closing field",
            self.context
        );
        self
    }

    pub fn is_punctuation(self) -> Self {
        assert!(
            self.node.is_punctuation(),
            "{}: Expected list punctuation, found {} {:?}",
            self.context,
            self.node.field_type,
            self.node.expr
        );
        self
    }

    pub fn message_contains(self, needle: &str) -> Self {
        let message = self.node.message.as_deref().unwrap_or("");
        assert!(
            message.contains(needle),
            "{}: Expected message containing '{}', found '{}'",
            self.context,
            needle,
            message
        );
        self
    }

    pub fn child_count(self, expected: usize) -> Self {
        assert_eq!(
            self.node.content_array.len(),
            expected,
            "{}: Expected {} children, found {}",
            self.context,
            expected,
            self.node.content_array.len()
        );
        self
    }

    pub fn child<F>(self, index: usize, check: F) -> Self
    where
        F: FnOnce(NodeAssertion<'a>),
    {
        let node = self.node.content_array.get(index).unwrap_or_else(|| {
            panic!(
                "{}: No child at index {} (only {})",
                self.context,
                index,
                self.node.content_array.len()
            )
        });
        check(NodeAssertion {
            node,
            context: format!("{}.{}", self.context, index),
        });
        self
    }

    /// Descend into the trailing `ElseIf`/`Else`
    pub fn alternative<F>(self, check: F) -> Self
    where
        F: FnOnce(NodeAssertion<'a>),
    {
        let node = self.node.alternative().unwrap_or_else(|| {
            panic!("{}: Expected an ElseIf or Else alternative", self.context)
        });
        check(NodeAssertion {
            node,
            context: format!("{}.alt", self.context),
        });
        self
    }
}

// ============================================================================
// Recording host
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    BeginObject(Option<usize>),
    EndObject,
    Define(String, String),
    BeginCondition(String, String),
    BeginList(String, String),
    EndList,
}

/// A host that records calls; conditions default to false and lists to empty
#[derive(Debug, Default, Clone)]
pub struct RecordingHost {
    pub calls: Vec<HostCall>,
    conditions: HashMap<String, bool>,
    lists: HashMap<String, usize>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_condition(mut self, expr: impl Into<String>, value: bool) -> Self {
        self.conditions.insert(expr.into(), value);
        self
    }

    pub fn with_list(mut self, expr: impl Into<String>, count: usize) -> Self {
        self.lists.insert(expr.into(), count);
        self
    }

    /// Expressions passed to `define`, in call order
    pub fn defined_exprs(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HostCall::Define(_, expr) => Some(expr.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Host for RecordingHost {
    fn begin_object(&mut self, index: Option<usize>) {
        self.calls.push(HostCall::BeginObject(index));
    }

    fn end_object(&mut self) {
        self.calls.push(HostCall::EndObject);
    }

    fn define(&mut self, atom: &str, expr: &str) {
        self.calls.push(HostCall::Define(atom.into(), expr.into()));
    }

    fn begin_condition(&mut self, atom: &str, expr: &str) -> bool {
        self.calls
            .push(HostCall::BeginCondition(atom.into(), expr.into()));
        self.conditions.get(expr).copied().unwrap_or(false)
    }

    fn begin_list(&mut self, atom: &str, expr: &str) -> usize {
        self.calls.push(HostCall::BeginList(atom.into(), expr.into()));
        self.lists.get(expr).copied().unwrap_or(0)
    }

    fn end_list(&mut self) {
        self.calls.push(HostCall::EndList);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assert_tree_walks_children() {
        let nodes = vec![FieldNode::new(FieldType::List, Some("Items".into()), "1")
            .with_content(vec![FieldNode::punctuation("1")])];

        assert_tree(&nodes).item_count(1).no_errors().item(0, |node| {
            node.is_type(FieldType::List)
                .expr("Items")
                .child_count(1)
                .child(0, |punc| {
                    punc.is_punctuation().id("1p");
                });
        });
    }

    #[test]
    #[should_panic(expected = "Expected If, found List")]
    fn test_assert_tree_reports_type_mismatch() {
        let nodes = vec![FieldNode::new(FieldType::List, Some("x".into()), "1")];
        assert_tree(&nodes).item(0, |node| {
            node.is_type(FieldType::If);
        });
    }

    #[test]
    fn test_recording_host_answers_from_table() {
        let mut host = RecordingHost::new()
            .with_condition("a", true)
            .with_list("xs", 3);

        assert!(host.begin_condition("C1b", "a"));
        assert!(!host.begin_condition("C2b", "b"));
        assert_eq!(host.begin_list("L3", "xs"), 3);
        assert_eq!(host.calls.len(), 3);
    }
}
