//! Logic tree nodes

use crate::odx::fields::FieldType;
use serde::{Deserialize, Serialize};

/// One node of the persisted logic tree
///
/// `atom` is set on every node that evaluates something: `Content`, `If`, `ElseIf` and
/// `List`. `Else` nodes carry neither expression nor atom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicNode {
    #[serde(rename = "type")]
    pub node_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atom: Option<String>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_array: Vec<LogicNode>,
}

impl LogicNode {
    pub fn new(node_type: FieldType, id: impl Into<String>) -> Self {
        Self {
            node_type,
            expr: None,
            atom: None,
            id: id.into(),
            content_array: Vec::new(),
        }
    }

    pub fn with_expr(mut self, expr: impl Into<String>, atom: impl Into<String>) -> Self {
        self.expr = Some(expr.into());
        self.atom = Some(atom.into());
        self
    }

    pub fn with_content(mut self, content: Vec<LogicNode>) -> Self {
        self.content_array = content;
        self
    }

    pub fn expr(&self) -> &str {
        self.expr.as_deref().unwrap_or("")
    }

    pub fn atom(&self) -> &str {
        self.atom.as_deref().unwrap_or("")
    }

    /// The trailing `ElseIf`/`Else` of a conditional
    pub fn alternative(&self) -> Option<&LogicNode> {
        self.content_array
            .last()
            .filter(|last| last.node_type.is_alternative())
    }

    /// Content excluding a trailing alternative
    pub fn body(&self) -> &[LogicNode] {
        match self.alternative() {
            Some(_) => &self.content_array[..self.content_array.len() - 1],
            None => &self.content_array,
        }
    }

    pub fn count_of(&self, node_type: FieldType) -> usize {
        let own = usize::from(self.node_type == node_type);
        own + self
            .content_array
            .iter()
            .map(|child| child.count_of(node_type))
            .sum::<usize>()
    }
}

/// The whole logic tree; serializes as a bare JSON array of root nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicTree {
    pub nodes: Vec<LogicNode>,
}

impl LogicTree {
    pub fn new(nodes: Vec<LogicNode>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn count_of(&self, node_type: FieldType) -> usize {
        self.nodes.iter().map(|n| n.count_of(node_type)).sum()
    }

    /// Every atom a `define` is issued for, in tree order
    pub fn defined_atoms(&self) -> Vec<&str> {
        fn walk<'a>(nodes: &'a [LogicNode], out: &mut Vec<&'a str>) {
            for node in nodes {
                if node.node_type == FieldType::Content {
                    out.push(node.atom());
                }
                walk(&node.content_array, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_bare_array() {
        let tree = LogicTree::new(vec![LogicNode::new(FieldType::If, "1")
            .with_expr("x", "C1")
            .with_content(vec![LogicNode::new(FieldType::Content, "2").with_expr("A", "C2")])]);

        let json = tree.to_json().unwrap();
        assert_eq!(
            json,
            r#"[{"type":"If","expr":"x","atom":"C1","id":"1","contentArray":[{"type":"Content","expr":"A","atom":"C2","id":"2"}]}]"#
        );
        assert_eq!(LogicTree::from_json(&json).unwrap(), tree);
    }

    #[test]
    fn test_defined_atoms_in_order() {
        let tree = LogicTree::new(vec![
            LogicNode::new(FieldType::Content, "1").with_expr("a", "C1"),
            LogicNode::new(FieldType::List, "2")
                .with_expr("xs", "L2")
                .with_content(vec![
                    LogicNode::new(FieldType::Content, "3").with_expr("b", "C3"),
                    LogicNode::new(FieldType::Content, "2p").with_expr("_punc", "L2p"),
                ]),
        ]);
        assert_eq!(tree.defined_atoms(), vec!["C1", "C3", "L2p"]);
    }
}
