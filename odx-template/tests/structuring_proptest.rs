//! Property-based tests for structure building
//!
//! Well-formed field lists of arbitrarily interleaved conditionals and repeats must fold
//! into exactly the groups they were generated from, and a single stray closer must be
//! reported once and only once, without disturbing anything around it.

use odx_template::odx::fields::node::count_in;
use odx_template::odx::fields::{FieldRecognizer, FieldType, TemplateSource};
use odx_template::odx::structuring::structure;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Shape {
    Content(String),
    If {
        body: Vec<Shape>,
        else_ifs: Vec<Vec<Shape>>,
        otherwise: Option<Vec<Shape>>,
    },
    List(Vec<Shape>),
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Counts {
    ifs: usize,
    else_ifs: usize,
    elses: usize,
    lists: usize,
}

impl Shape {
    fn flatten(&self, out: &mut Vec<String>) {
        match self {
            Shape::Content(expr) => out.push(format!("[{expr}]")),
            Shape::If {
                body,
                else_ifs,
                otherwise,
            } => {
                out.push("if Flag".to_string());
                flatten_all(body, out);
                for branch in else_ifs {
                    out.push("elseif Other".to_string());
                    flatten_all(branch, out);
                }
                if let Some(branch) = otherwise {
                    out.push("else".to_string());
                    flatten_all(branch, out);
                }
                out.push("endif".to_string());
            }
            Shape::List(body) => {
                out.push("list Items".to_string());
                flatten_all(body, out);
                out.push("endlist".to_string());
            }
        }
    }

    fn count(&self, counts: &mut Counts) {
        match self {
            Shape::Content(_) => {}
            Shape::If {
                body,
                else_ifs,
                otherwise,
            } => {
                counts.ifs += 1;
                counts.else_ifs += else_ifs.len();
                body.iter().for_each(|s| s.count(counts));
                else_ifs.iter().flatten().for_each(|s| s.count(counts));
                if let Some(branch) = otherwise {
                    counts.elses += 1;
                    branch.iter().for_each(|s| s.count(counts));
                }
            }
            Shape::List(body) => {
                counts.lists += 1;
                body.iter().for_each(|s| s.count(counts));
            }
        }
    }
}

fn flatten_all(shapes: &[Shape], out: &mut Vec<String>) {
    for shape in shapes {
        shape.flatten(out);
    }
}

/// Expressions that can never be mistaken for a keyword
fn expr_strategy() -> impl Strategy<Value = String> {
    prop_oneof!["F[a-z0-9]{0,5}", "Client\\.[A-Z][a-z]{1,6}", "'[a-z ]{1,8}'",]
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    let leaf = expr_strategy().prop_map(Shape::Content);
    leaf.prop_recursive(4, 48, 4, |inner| {
        let body = prop::collection::vec(inner, 0..4);
        prop_oneof![
            (
                body.clone(),
                prop::collection::vec(body.clone(), 0..2),
                prop::option::of(body.clone()),
            )
                .prop_map(|(body, else_ifs, otherwise)| Shape::If {
                    body,
                    else_ifs,
                    otherwise
                }),
            body.prop_map(Shape::List),
        ]
    })
}

fn template_strategy() -> impl Strategy<Value = Vec<Shape>> {
    prop::collection::vec(shape_strategy(), 0..5)
}

#[cfg(test)]
mod proptest_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn test_well_formed_templates_fold_exactly(shapes in template_strategy()) {
            let mut contents = Vec::new();
            flatten_all(&shapes, &mut contents);
            let mut expected = Counts::default();
            shapes.iter().for_each(|s| s.count(&mut expected));

            let structured = structure(
                &TemplateSource::from_contents(contents.clone()),
                &FieldRecognizer::default(),
            );

            prop_assert!(structured.diagnostics.is_empty(), "{:?} -> {:?}", contents, structured.diagnostics);
            let found = Counts {
                ifs: count_in(&structured.nodes, FieldType::If),
                else_ifs: count_in(&structured.nodes, FieldType::ElseIf),
                elses: count_in(&structured.nodes, FieldType::Else),
                lists: count_in(&structured.nodes, FieldType::List),
            };
            prop_assert_eq!(found, expected);
            prop_assert_eq!(count_in(&structured.nodes, FieldType::EndIf), 0);
            prop_assert_eq!(count_in(&structured.nodes, FieldType::EndList), 0);
            prop_assert_eq!(count_in(&structured.nodes, FieldType::Error), 0);
            prop_assert_eq!(structured.nodes.len(), shapes.len());
        }

        #[test]
        fn test_single_orphan_closer_reported_once(
            shapes in template_strategy(),
            position in any::<prop::sample::Index>(),
            closer in prop_oneof![Just("endif"), Just("endlist")],
        ) {
            let at = position.index(shapes.len() + 1);
            let mut contents = Vec::new();
            flatten_all(&shapes[..at], &mut contents);
            let orphan_id = (contents.len() + 1).to_string();
            contents.push(closer.to_string());
            flatten_all(&shapes[at..], &mut contents);

            let structured = structure(
                &TemplateSource::from_contents(contents.clone()),
                &FieldRecognizer::default(),
            );

            prop_assert_eq!(structured.diagnostics.len(), 1, "{:?}", contents);
            prop_assert_eq!(&structured.diagnostics[0].field_id, &orphan_id);
            let expected_message = if closer == "endif" { "Unmatched EndIf" } else { "Unmatched EndList" };
            prop_assert_eq!(structured.diagnostics[0].message.as_str(), expected_message);

            let mut expected = Counts::default();
            shapes.iter().for_each(|s| s.count(&mut expected));
            prop_assert_eq!(count_in(&structured.nodes, FieldType::If), expected.ifs);
            prop_assert_eq!(count_in(&structured.nodes, FieldType::List), expected.lists);
            prop_assert_eq!(structured.nodes.len(), shapes.len() + 1);
        }
    }
}
