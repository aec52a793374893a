//! End-to-end tests: field list in, data document out
//!
//! Each test runs the whole pipeline (recognition, structuring, logic, evaluation) the
//! way a caller would, through the loader and the standard transforms.

use odx_template::odx::codegen::{generate, Instruction};
use odx_template::odx::diagnostics::DiagnosticKind;
use odx_template::odx::evaluation::{evaluate, evaluate_program, interpret, EvaluatorOptions};
use odx_template::odx::expression::PathEngine;
use odx_template::odx::fields::TemplateSource;
use odx_template::odx::loader::{load_data, TemplateLoader};
use odx_template::odx::logic::{CompiledTemplate, LogicTree};
use odx_template::odx::testing::{fixture_path, HostCall, RecordingHost};
use odx_template::odx::transforms::standard::COMPILE;
use rstest::rstest;
use serde_json::{json, Value as Json};

fn compile(contents: &[&str]) -> CompiledTemplate {
    COMPILE
        .run(TemplateSource::from_contents(contents.iter().copied()))
        .unwrap()
}

fn run(contents: &[&str], data: Json) -> String {
    let compiled = compile(contents);
    evaluate(
        &compiled.logic,
        &data,
        &PathEngine,
        &EvaluatorOptions::default(),
    )
    .document
}

#[test]
fn test_conditional_content() {
    let fields = ["if x", "['A']", "endif"];

    insta::assert_snapshot!(run(&fields, json!({"x": true})), @r#"<?xml version="1.0"?><_odx><C1b>true</C1b><C2>A</C2></_odx>"#);
    insta::assert_snapshot!(run(&fields, json!({})), @r#"<?xml version="1.0"?><_odx><C1b>false</C1b></_odx>"#);
}

#[test]
fn test_list_over_current_value() {
    let compiled = compile(&["list []", "[.]", "endlist"]);
    let mut host = RecordingHost::new().with_list("[]", 3);
    interpret(&compiled.logic, &mut host);

    let defined = host.defined_exprs();
    assert_eq!(defined.iter().filter(|e| **e == ".").count(), 3);
    assert_eq!(defined.iter().filter(|e| **e == "_punc").count(), 3);

    let result = evaluate(
        &compiled.logic,
        &json!([1, 2, 3]),
        &PathEngine,
        &EvaluatorOptions::default(),
    );
    insta::assert_snapshot!(result.document, @r#"<?xml version="1.0"?><_odx><L1><L1i><C2>1</C2><L1p>, </L1p></L1i><L1i><C2>2</C2><L1p> and </L1p></L1i><L1i><C2>3</C2></L1i></L1></_odx>"#);
}

#[test]
fn test_orphan_endif_keeps_content() {
    let compiled = compile(&["['A']", "endif"]);

    assert_eq!(compiled.diagnostics.len(), 1);
    assert_eq!(compiled.diagnostics[0].kind, DiagnosticKind::Structural);
    assert_eq!(compiled.diagnostics[0].field_id, "2");
    assert_eq!(compiled.diagnostics[0].message, "Unmatched EndIf");

    let result = evaluate(
        &compiled.logic,
        &json!({}),
        &PathEngine,
        &EvaluatorOptions::default(),
    );
    assert!(result.document.contains("<C1>A</C1>"));
}

#[test]
fn test_repeated_expression_defined_once() {
    let compiled = compile(&["[x]", "[x]"]);
    let program = generate(&compiled.logic);

    let defines = program
        .instructions
        .iter()
        .filter(|i| matches!(i, Instruction::Define { .. }))
        .count();
    assert_eq!(defines, 1);
    assert_eq!(compiled.dictionary.atom_of("1"), compiled.dictionary.atom_of("2"));
}

#[test]
fn test_same_expression_in_two_lists() {
    let compiled = compile(&[
        "list Buyers",
        "[Name]",
        "endlist",
        "list Sellers",
        "[Name]",
        "endlist",
    ]);
    assert_ne!(compiled.dictionary.atom_of("2"), compiled.dictionary.atom_of("5"));

    let result = evaluate(
        &compiled.logic,
        &json!({"Buyers": [{"Name": "Ann"}], "Sellers": [{"Name": "Sam"}]}),
        &PathEngine,
        &EvaluatorOptions::default(),
    );
    insta::assert_snapshot!(result.document, @r#"<?xml version="1.0"?><_odx><L1><L1i><C2>Ann</C2></L1i></L1><L3><L3i><C4>Sam</C4></L3i></L3></_odx>"#);
}

#[rstest]
#[case::empty_list(json!([]), false)]
#[case::one_item(json!(["x"]), true)]
#[case::zero(json!(0), false)]
#[case::empty_string(json!(""), false)]
#[case::null(json!(null), false)]
#[case::string_zero(json!("0"), true)]
#[case::object(json!({}), true)]
fn test_condition_truthiness(#[case] value: Json, #[case] shown: bool) {
    let document = run(&["if Flag", "['shown']", "endif"], json!({ "Flag": value }));
    assert_eq!(document.contains("<C2>shown</C2>"), shown, "{}", document);
}

#[test]
fn test_backends_issue_identical_host_calls() {
    let compiled = compile(&[
        "[Title]",
        "list Items",
        "if Done",
        "[Name]",
        "elseif Started",
        "['in progress']",
        "else",
        "['todo']",
        "endif",
        "endlist",
    ]);

    let table = || {
        RecordingHost::new()
            .with_list("Items", 2)
            .with_condition("Started", true)
    };
    let mut interpreted = table();
    interpret(&compiled.logic, &mut interpreted);

    let mut executed = table();
    odx_template::odx::codegen::vm::execute(&generate(&compiled.logic), &mut executed).unwrap();

    assert_eq!(interpreted.calls, executed.calls);
    assert_eq!(
        interpreted.calls.first(),
        Some(&HostCall::BeginObject(None))
    );
}

#[test]
fn test_letter_fixture() {
    let compiled = TemplateLoader::from_path(fixture_path("letter.fields.json"))
        .unwrap()
        .compile()
        .unwrap();
    let data = load_data(fixture_path("letter.data.json")).unwrap();

    assert!(!compiled.has_errors());
    assert_eq!(compiled.dictionary.len(), 9);
    assert_eq!(compiled.dictionary.atom_of("9"), Some("C1"));

    let result = evaluate(&compiled.logic, &data, &PathEngine, &EvaluatorOptions::default());
    assert!(result.is_complete());
    insta::assert_snapshot!(result.document, @r#"<?xml version="1.0"?><_odx><C1>Ada Lovelace</C1><C2b>true</C2b><C3>William</C3><L4><L4i><C5>Byron</C5><C6>9</C6><L4p>, </L4p></L4i><L4i><C5>Annabella</C5><C6>7</C6><L4p> and </L4p></L4i><L4i><C5>Ralph</C5><C6>3</C6></L4i></L4></_odx>"#);
}

#[test]
fn test_invoice_fixture_from_yaml() {
    let compiled = TemplateLoader::from_path(fixture_path("invoice.fields.yaml"))
        .unwrap()
        .compile()
        .unwrap();
    let data = load_data(fixture_path("invoice.data.yaml")).unwrap();
    let options = EvaluatorOptions::default();

    let result = evaluate(&compiled.logic, &data, &PathEngine, &options);
    assert_eq!(result.missing, vec!["Reference"]);
    assert!(!result.has_errors);
    insta::assert_snapshot!(result.document, @r#"<?xml version="1.0"?><_odx><C1>Acme &amp; Sons</C1><C2b>false</C2b><C4b>true</C4b><C5>Thank you for your payment</C5><C7>[Reference]</C7></_odx>"#);

    let executed = evaluate_program(&generate(&compiled.logic), &data, &PathEngine, &options).unwrap();
    assert_eq!(executed, result);
}

#[test]
fn test_broken_fixture_recovers() {
    let compiled = TemplateLoader::from_path(fixture_path("broken.fields.json"))
        .unwrap()
        .compile()
        .unwrap();

    let reported: Vec<(&str, DiagnosticKind)> = compiled
        .diagnostics
        .iter()
        .map(|d| (d.field_id.as_str(), d.kind))
        .collect();
    assert_eq!(
        reported,
        vec![
            ("2", DiagnosticKind::Structural),
            ("3", DiagnosticKind::Structural),
            ("5", DiagnosticKind::Structural),
            ("6", DiagnosticKind::Parse),
        ]
    );
    assert_eq!(compiled.diagnostics[1].message, "List has no matching EndList");

    // Everything that is still sound evaluates
    let result = evaluate(
        &compiled.logic,
        &json!({"Title": "Quote", "Text": "Widgets"}),
        &PathEngine,
        &EvaluatorOptions::default(),
    );
    assert!(result.is_complete());
    assert!(result.document.contains(">Quote<"));
    assert!(result.document.contains(">Widgets<"));
}

#[test]
fn test_logic_tree_persists_as_json() {
    let compiled = compile(&["if x", "['A']", "endif"]);
    let json = compiled.logic.to_json().unwrap();

    assert_eq!(
        serde_json::from_str::<Json>(&json).unwrap(),
        json!([{
            "type": "If",
            "expr": "x",
            "atom": "C1",
            "id": "1",
            "contentArray": [{"type": "Content", "expr": "'A'", "atom": "C2", "id": "2"}]
        }])
    );
    assert_eq!(LogicTree::from_json(&json).unwrap(), compiled.logic);
}
