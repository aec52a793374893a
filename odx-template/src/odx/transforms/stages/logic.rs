//! Logic stage - atomization, pruning and the field dictionary

use crate::odx::logic::{build_logic, CompiledTemplate};
use crate::odx::structuring::StructuredTemplate;
use crate::odx::transforms::{Runnable, TransformError};

/// Logic stage: StructuredTemplate → CompiledTemplate
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildLogic;

impl Runnable<StructuredTemplate, CompiledTemplate> for BuildLogic {
    fn run(&self, input: StructuredTemplate) -> Result<CompiledTemplate, TransformError> {
        Ok(build_logic(&input))
    }
}
