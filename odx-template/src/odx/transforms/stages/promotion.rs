//! Block promotion stage

use crate::odx::structuring::{promote_blocks, FlatTemplate, RecognizedTemplate};
use crate::odx::transforms::{Runnable, TransformError};

/// Block promotion stage: RecognizedTemplate → FlatTemplate
#[derive(Debug, Clone, Copy, Default)]
pub struct PromoteBlocks;

impl Runnable<RecognizedTemplate, FlatTemplate> for PromoteBlocks {
    fn run(&self, input: RecognizedTemplate) -> Result<FlatTemplate, TransformError> {
        Ok(promote_blocks(input))
    }
}
