//! JavaScript rendering
//!
//! Renders the logic tree as a CommonJS module exposing `evaluate(cx, cl, h)`, where `cx`
//! is the data context, `cl` the caller's locals and `h` a host object with the
//! `beginObject/endObject/define/beginCondition/beginList/endList` methods. `beginList`
//! returns the item count. The module also exports the version it was generated with.

use super::program::PROGRAM_VERSION;
use crate::odx::atomizing::condition_atom;
use crate::odx::fields::FieldType;
use crate::odx::logic::{LogicNode, LogicTree};

const INDENT: &str = "  ";

/// Render a logic tree as JavaScript source
pub fn render_javascript(tree: &LogicTree) -> String {
    let mut renderer = JsRenderer::new();
    renderer.render(tree);
    renderer.output
}

/// A JSON string literal is a valid JavaScript string literal
fn js_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

struct JsRenderer {
    output: String,
    indent_level: usize,
    /// Nesting of list loops, used to name loop variables
    list_depth: usize,
}

impl JsRenderer {
    fn new() -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
            list_depth: 0,
        }
    }

    fn write_line(&mut self, text: &str) {
        self.output.push_str(&INDENT.repeat(self.indent_level));
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn render(&mut self, tree: &LogicTree) {
        self.write_line("\"use strict\";");
        self.write_line(&format!("// generated by odx-template {}", PROGRAM_VERSION));
        self.write_line("function evaluate(cx, cl, h) {");
        self.indent_level += 1;
        self.write_line("h.beginObject(cx, cl);");
        self.render_nodes(&tree.nodes);
        self.write_line("h.endObject();");
        self.indent_level -= 1;
        self.write_line("}");
        self.write_line(&format!(
            "module.exports = {{ version: {}, evaluate }};",
            js_string(PROGRAM_VERSION)
        ));
    }

    fn render_nodes(&mut self, nodes: &[LogicNode]) {
        for node in nodes {
            self.render_node(node);
        }
    }

    fn render_node(&mut self, node: &LogicNode) {
        match node.node_type {
            FieldType::Content => self.write_line(&format!(
                "h.define({}, {});",
                js_string(node.atom()),
                js_string(node.expr())
            )),
            FieldType::If | FieldType::ElseIf => {
                self.write_line(&format!("if ({}) {{", condition_call(node)));
                self.render_branches(node);
                self.write_line("}");
            }
            FieldType::List => {
                let var = format!("i{}", self.list_depth);
                self.write_line(&format!(
                    "for (let {var} = 0, n{var} = h.beginList({}, {}); {var} < n{var}; {var}++) {{",
                    js_string(node.atom()),
                    js_string(node.expr())
                ));
                self.indent_level += 1;
                self.list_depth += 1;
                self.write_line(&format!("h.beginObject({var});"));
                self.render_nodes(&node.content_array);
                self.write_line("h.endObject();");
                self.list_depth -= 1;
                self.indent_level -= 1;
                self.write_line("}");
                self.write_line("h.endList();");
            }
            FieldType::Else => self.render_nodes(&node.content_array),
            FieldType::EndIf | FieldType::EndList | FieldType::Error => {}
        }
    }

    /// Body of a conditional, then its alternatives as `else if` / `else` arms
    fn render_branches(&mut self, node: &LogicNode) {
        self.indent_level += 1;
        self.render_nodes(node.body());
        self.indent_level -= 1;

        if let Some(alternative) = node.alternative() {
            match alternative.node_type {
                FieldType::ElseIf => {
                    self.write_line(&format!("}} else if ({}) {{", condition_call(alternative)));
                    self.render_branches(alternative);
                }
                _ => {
                    self.write_line("} else {");
                    self.indent_level += 1;
                    self.render_nodes(&alternative.content_array);
                    self.indent_level -= 1;
                }
            }
        }
    }
}

fn condition_call(node: &LogicNode) -> String {
    format!(
        "h.beginCondition({}, {})",
        js_string(&condition_atom(node.atom())),
        js_string(node.expr())
    )
}
