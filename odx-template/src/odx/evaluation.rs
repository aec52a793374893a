//! Evaluation
//!
//! Runs a compiled template against a data value and produces the output data document.
//!
//! - [`host`]: the [`Host`] trait both backends drive
//! - [`interpreter`]: walks the logic tree directly (the default backend)
//! - [`scope`]: the runtime [`ScopeStack`] of object and list frames
//! - [`assembler`]: [`XmlAssembler`], the host that evaluates expressions and builds XML
//! - [`xml`]: the output element tree
//! - [`result`]: [`EvaluationResult`]
//!
//! ```text
//! let result = evaluate(&compiled.logic, &data, &PathEngine, &EvaluatorOptions::default());
//! println!("{}", result.document);
//! ```

pub mod assembler;
pub mod host;
pub mod interpreter;
pub mod result;
pub mod scope;
pub mod xml;

pub use assembler::XmlAssembler;
pub use host::Host;
pub use interpreter::interpret;
pub use result::EvaluationResult;
pub use scope::{Frame, Punctuation, Scope, ScopeError, ScopeStack};
pub use xml::XmlElement;

use crate::odx::codegen::{vm, Program, ProgramError};
use crate::odx::expression::ExpressionEngine;
use crate::odx::indirect::DEFAULT_PLACEHOLDER_BASE;
use crate::odx::logic::LogicTree;
use serde_json::Value as Json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatorOptions {
    /// chrono format string for date values
    pub date_format: String,
    /// Prefix of the URI substituted for deferred insertions
    pub placeholder_base: String,
    pub punctuation: Punctuation,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            date_format: "%Y-%m-%d".to_string(),
            placeholder_base: DEFAULT_PLACEHOLDER_BASE.to_string(),
            punctuation: Punctuation::default(),
        }
    }
}

/// Evaluate a logic tree against data
pub fn evaluate(
    tree: &LogicTree,
    data: &Json,
    engine: &dyn ExpressionEngine,
    options: &EvaluatorOptions,
) -> EvaluationResult {
    let mut assembler = XmlAssembler::new(engine, data.clone(), options);
    interpret(tree, &mut assembler);
    assembler.finish()
}

/// Evaluate a generated program against data
///
/// Fails without evaluating anything when the program's version is incompatible.
pub fn evaluate_program(
    program: &Program,
    data: &Json,
    engine: &dyn ExpressionEngine,
    options: &EvaluatorOptions,
) -> Result<EvaluationResult, ProgramError> {
    let mut assembler = XmlAssembler::new(engine, data.clone(), options);
    vm::execute(program, &mut assembler)?;
    Ok(assembler.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odx::codegen::generate;
    use crate::odx::expression::PathEngine;
    use crate::odx::fields::{FieldRecognizer, TemplateSource};
    use crate::odx::logic::build_logic;
    use crate::odx::structuring::structure;
    use serde_json::json;

    fn compile(contents: &[&str]) -> LogicTree {
        let source = TemplateSource::from_contents(contents.iter().copied());
        build_logic(&structure(&source, &FieldRecognizer::default())).logic
    }

    #[test]
    fn test_if_example() {
        let tree = compile(&["if x", "['A']", "endif"]);
        let options = EvaluatorOptions::default();

        let shown = evaluate(&tree, &json!({"x": true}), &PathEngine, &options);
        assert!(shown.document.contains("<C2>A</C2>"));

        let hidden = evaluate(&tree, &json!({}), &PathEngine, &options);
        assert!(!hidden.document.contains("<C2>"));
        assert_eq!(hidden.missing, vec!["x"]);
    }

    #[test]
    fn test_interpreter_and_program_agree() {
        let tree = compile(&[
            "[Title]",
            "list Items",
            "if Done",
            "[Name]",
            "else",
            "['todo']",
            "endif",
            "endlist",
        ]);
        let data = json!({
            "Title": "Chores",
            "Items": [{"Name": "dishes", "Done": true}, {"Name": "laundry", "Done": false}]
        });
        let options = EvaluatorOptions::default();

        let interpreted = evaluate(&tree, &data, &PathEngine, &options);
        let executed = evaluate_program(&generate(&tree), &data, &PathEngine, &options).unwrap();
        assert_eq!(interpreted, executed);
    }

    #[test]
    fn test_incompatible_program_refused() {
        let mut program = generate(&compile(&["[A]"]));
        program.version = "1000.0.0".to_string();

        let result = evaluate_program(&program, &json!({}), &PathEngine, &EvaluatorOptions::default());
        assert!(matches!(result, Err(ProgramError::VersionMismatch { .. })));
    }
}
