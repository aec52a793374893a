//! Folding stage - depth tagging and nesting

use crate::odx::structuring::{fold, FlatTemplate, StructuredTemplate};
use crate::odx::transforms::{Runnable, TransformError};

/// Folding stage: FlatTemplate → StructuredTemplate
#[derive(Debug, Clone, Copy, Default)]
pub struct FoldStructure;

impl Runnable<FlatTemplate, StructuredTemplate> for FoldStructure {
    fn run(&self, input: FlatTemplate) -> Result<StructuredTemplate, TransformError> {
        Ok(fold(input))
    }
}
