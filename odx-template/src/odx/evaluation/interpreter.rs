//! Direct interpretation of the logic tree

use super::host::Host;
use crate::odx::atomizing::condition_atom;
use crate::odx::fields::FieldType;
use crate::odx::logic::{LogicNode, LogicTree};

/// Walk a logic tree, driving the host
pub fn interpret<H: Host + ?Sized>(tree: &LogicTree, host: &mut H) {
    host.begin_object(None);
    walk_nodes(&tree.nodes, host);
    host.end_object();
}

fn walk_nodes<H: Host + ?Sized>(nodes: &[LogicNode], host: &mut H) {
    for node in nodes {
        walk_node(node, host);
    }
}

fn walk_node<H: Host + ?Sized>(node: &LogicNode, host: &mut H) {
    match node.node_type {
        FieldType::Content => host.define(node.atom(), node.expr()),
        FieldType::If | FieldType::ElseIf => {
            if host.begin_condition(&condition_atom(node.atom()), node.expr()) {
                walk_nodes(node.body(), host);
            } else if let Some(alternative) = node.alternative() {
                walk_node(alternative, host);
            }
        }
        FieldType::Else => walk_nodes(&node.content_array, host),
        FieldType::List => {
            let count = host.begin_list(node.atom(), node.expr());
            for index in 0..count {
                host.begin_object(Some(index));
                walk_nodes(&node.content_array, host);
                host.end_object();
            }
            host.end_list();
        }
        FieldType::EndIf | FieldType::EndList | FieldType::Error => {}
    }
}
