//! Structure tests for individual template constructs
//!
//! Each test builds one construct and verifies the folded tree with `assert_tree`.

use odx_template::odx::fields::{FieldListItem, FieldType, Placement, TemplateSource};
use odx_template::odx::loader::TemplateLoader;
use odx_template::odx::testing::{assert_tree, fixture_path};
use odx_template::odx::transforms::standard::STRUCTURE;

#[test]
fn test_if_elseif_else_chain() {
    let structured = STRUCTURE
        .run(TemplateSource::from_contents([
            "if a", "[X]", "elseif b", "[Y]", "else", "[Z]", "endif",
        ]))
        .unwrap();

    assert_tree(&structured.nodes)
        .item_count(1)
        .no_errors()
        .item(0, |node| {
            node.is_type(FieldType::If)
                .expr("a")
                .ends_at("7")
                .child_count(2)
                .child(0, |x| {
                    x.is_type(FieldType::Content).expr("X");
                })
                .alternative(|else_if| {
                    else_if
                        .is_type(FieldType::ElseIf)
                        .expr("b")
                        .child_count(2)
                        .alternative(|otherwise| {
                            otherwise
                                .is_type(FieldType::Else)
                                .child_count(1)
                                .child(0, |z| {
                                    z.expr("Z");
                                });
                        });
                });
        });
}

#[test]
fn test_list_gets_trailing_punctuation() {
    let structured = STRUCTURE
        .run(TemplateSource::from_contents(["list Items", "[Name]", "endlist"]))
        .unwrap();

    assert_tree(&structured.nodes).item(0, |list| {
        list.is_type(FieldType::List)
            .placement(Placement::Block)
            .child_count(2)
            .child(1, |punc| {
                punc.is_punctuation();
            });
    });
}

#[test]
fn test_inline_pair_stays_inline() {
    let structured = STRUCTURE
        .run(TemplateSource::new(vec![FieldListItem::Block(vec![
            FieldListItem::field("if Vip", "1"),
            FieldListItem::text("Dear valued customer"),
            FieldListItem::field("endif", "2"),
        ])]))
        .unwrap();

    assert!(!structured.has_errors());
    assert_tree(&structured.nodes).item(0, |node| {
        node.is_type(FieldType::If).placement(Placement::Inline).ends_at("2");
    });
}

#[test]
fn test_mismatched_inline_pair_is_marked() {
    let structured = STRUCTURE
        .run(TemplateSource::new(vec![FieldListItem::Block(vec![
            FieldListItem::field("if Vip", "1"),
            FieldListItem::field("endlist", "2"),
        ])]))
        .unwrap();

    assert_eq!(structured.diagnostics.len(), 1);
    assert_tree(&structured.nodes)
        .item_count(2)
        .item(0, |node| {
            node.is_type(FieldType::Error).id("1");
        })
        .item(1, |node| {
            node.is_type(FieldType::Error).id("2");
        });
}

#[test]
fn test_nested_lists_inside_conditional() {
    let structured = STRUCTURE
        .run(TemplateSource::from_contents([
            "if HasOrders",
            "list Orders",
            "[Number]",
            "list Lines",
            "[Sku]",
            "endlist",
            "endlist",
            "endif",
        ]))
        .unwrap();

    assert_tree(&structured.nodes).no_errors().item(0, |node| {
        node.is_type(FieldType::If).child_count(1).child(0, |orders| {
            orders
                .is_type(FieldType::List)
                .ends_at("7")
                .child_count(3)
                .child(1, |lines| {
                    lines.is_type(FieldType::List).expr("Lines").ends_at("6");
                });
        });
    });
}

#[test]
fn test_broken_fixture_marks_errors_in_place() {
    let structured = TemplateLoader::from_path(fixture_path("broken.fields.json"))
        .unwrap()
        .structure()
        .unwrap();

    assert_tree(&structured.nodes)
        .item_count(6)
        .item(1, |node| {
            node.is_type(FieldType::Error)
                .message_contains("must be alone in its paragraph");
        })
        .item(3, |node| {
            node.is_type(FieldType::Content).expr("Text");
        })
        .item(5, |node| {
            node.is_type(FieldType::Error)
                .message_contains("Unrecognized field syntax");
        });
}
