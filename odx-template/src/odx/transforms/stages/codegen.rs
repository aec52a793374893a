//! Code generation stage

use crate::odx::codegen::{generate, Program};
use crate::odx::logic::CompiledTemplate;
use crate::odx::transforms::{Runnable, TransformError};

/// Code generation stage: CompiledTemplate → Program
///
/// The generated program is validated before it leaves the stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateProgram;

impl Runnable<CompiledTemplate, Program> for GenerateProgram {
    fn run(&self, input: CompiledTemplate) -> Result<Program, TransformError> {
        let program = generate(&input.logic);
        program.validate().map_err(|e| e.to_string())?;
        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odx::codegen::Instruction;
    use crate::odx::fields::TemplateSource;
    use crate::odx::transforms::standard::COMPILE;

    #[test]
    fn test_program_starts_and_ends_with_root_object() {
        let compiled = COMPILE
            .run(TemplateSource::from_contents(["[A]"]))
            .unwrap();
        let program = GenerateProgram.run(compiled).unwrap();

        assert_eq!(program.instructions.first(), Some(&Instruction::BeginObject));
        assert_eq!(program.instructions.last(), Some(&Instruction::EndObject));
    }
}
