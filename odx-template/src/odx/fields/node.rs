//! The field node tree
//!
//! A `FieldNode` starts life as a flat, recognized field and ends up, after structuring,
//! as a node of a properly nested tree: `If` nodes own their content plus an optional
//! trailing chain of `ElseIf`/`Else` alternatives, `List` nodes own their repeated body.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The expression used for the synthetic trailing node of every list body
pub const PUNCTUATION_EXPR: &str = "_punc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Content,
    If,
    ElseIf,
    Else,
    EndIf,
    List,
    EndList,
    /// An inline error annotation left where a field could not be used
    Error,
}

impl FieldType {
    /// Markers that shape the tree (everything except content and errors)
    pub fn is_structural(&self) -> bool {
        !matches!(self, FieldType::Content | FieldType::Error)
    }

    /// Types that carry a non-null expression
    pub fn has_expr(&self) -> bool {
        matches!(
            self,
            FieldType::Content | FieldType::If | FieldType::ElseIf | FieldType::List
        )
    }

    pub fn is_opener(&self) -> bool {
        matches!(self, FieldType::If | FieldType::List)
    }

    pub fn is_closer(&self) -> bool {
        matches!(self, FieldType::EndIf | FieldType::EndList)
    }

    pub fn is_alternative(&self) -> bool {
        matches!(self, FieldType::ElseIf | FieldType::Else)
    }

    /// The closer matching an opener
    pub fn closer(&self) -> Option<FieldType> {
        match self {
            FieldType::If => Some(FieldType::EndIf),
            FieldType::List => Some(FieldType::EndList),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Content => "Content",
            FieldType::If => "If",
            FieldType::ElseIf => "ElseIf",
            FieldType::Else => "Else",
            FieldType::EndIf => "EndIf",
            FieldType::List => "List",
            FieldType::EndList => "EndList",
            FieldType::Error => "Error",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a marker spans whole blocks or lives inline within one block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Block,
    #[default]
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldNode {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<String>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_array: Vec<FieldNode>,
    #[serde(default)]
    pub placement: Placement,
    /// Id of the closing field consumed when this opener was folded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_id: Option<String>,
    /// Diagnostic text, for `Error` nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FieldNode {
    pub fn new(field_type: FieldType, expr: Option<String>, id: impl Into<String>) -> Self {
        Self {
            field_type,
            expr,
            id: id.into(),
            content_array: Vec::new(),
            placement: Placement::Inline,
            end_id: None,
            message: None,
        }
    }

    pub fn content(expr: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(FieldType::Content, Some(expr.into()), id)
    }

    pub fn error(id: impl Into<String>, message: impl Into<String>) -> Self {
        let mut node = Self::new(FieldType::Error, None, id);
        node.message = Some(message.into());
        node
    }

    /// The synthetic list-terminal punctuation node for a list
    pub fn punctuation(list_id: &str) -> Self {
        Self::content(PUNCTUATION_EXPR, format!("{list_id}p"))
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_content(mut self, content: Vec<FieldNode>) -> Self {
        self.content_array = content;
        self
    }

    /// Turn this node into an inline error annotation, keeping its id
    pub fn into_error(self, message: impl Into<String>) -> Self {
        FieldNode::error(self.id, message).with_placement(self.placement)
    }

    pub fn expr(&self) -> &str {
        self.expr.as_deref().unwrap_or("")
    }

    pub fn is_punctuation(&self) -> bool {
        self.field_type == FieldType::Content && self.expr.as_deref() == Some(PUNCTUATION_EXPR)
    }

    /// The trailing `ElseIf`/`Else` of an `If` (or `ElseIf`) node, if any
    pub fn alternative(&self) -> Option<&FieldNode> {
        self.content_array
            .last()
            .filter(|last| last.field_type.is_alternative())
    }

    /// Content of this node excluding a trailing alternative
    pub fn body(&self) -> &[FieldNode] {
        match self.alternative() {
            Some(_) => &self.content_array[..self.content_array.len() - 1],
            None => &self.content_array,
        }
    }

    /// Count nodes of a type in this subtree (including this node)
    pub fn count_of(&self, field_type: FieldType) -> usize {
        let own = usize::from(self.field_type == field_type);
        own + self
            .content_array
            .iter()
            .map(|child| child.count_of(field_type))
            .sum::<usize>()
    }
}

/// Count nodes of a type across a forest
pub fn count_in(nodes: &[FieldNode], field_type: FieldType) -> usize {
    nodes.iter().map(|n| n.count_of(field_type)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_invariant_by_type() {
        assert!(FieldType::Content.has_expr());
        assert!(FieldType::If.has_expr());
        assert!(FieldType::ElseIf.has_expr());
        assert!(FieldType::List.has_expr());
        assert!(!FieldType::Else.has_expr());
        assert!(!FieldType::EndIf.has_expr());
        assert!(!FieldType::EndList.has_expr());
    }

    #[test]
    fn test_alternative_and_body() {
        let node = FieldNode::new(FieldType::If, Some("x".into()), "1").with_content(vec![
            FieldNode::content("A", "2"),
            FieldNode::new(FieldType::Else, None, "3").with_content(vec![FieldNode::content(
                "B", "4",
            )]),
        ]);

        assert_eq!(node.body().len(), 1);
        assert_eq!(node.alternative().map(|a| a.id.as_str()), Some("3"));
        assert_eq!(node.count_of(FieldType::Content), 2);
    }

    #[test]
    fn test_serializes_like_logic_json() {
        let node = FieldNode::new(FieldType::List, Some("Children".into()), "5")
            .with_content(vec![FieldNode::punctuation("5")]);
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(json["type"], "List");
        assert_eq!(json["expr"], "Children");
        assert_eq!(json["contentArray"][0]["expr"], "_punc");
        assert_eq!(json["contentArray"][0]["id"], "5p");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_into_error_keeps_id() {
        let node = FieldNode::new(FieldType::EndIf, None, "9").with_placement(Placement::Block);
        let error = node.into_error("Unmatched EndIf");
        assert_eq!(error.field_type, FieldType::Error);
        assert_eq!(error.id, "9");
        assert_eq!(error.placement, Placement::Block);
        assert_eq!(error.message.as_deref(), Some("Unmatched EndIf"));
    }
}
