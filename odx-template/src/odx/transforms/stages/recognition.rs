//! Recognition stage - classifies every field, keeping block grouping

use crate::odx::fields::{FieldRecognizer, RecognizerOptions, TemplateSource};
use crate::odx::structuring::{recognize_blocks, RecognizedTemplate};
use crate::odx::transforms::{Runnable, TransformError};

/// Recognition stage: TemplateSource → RecognizedTemplate
///
/// Refuses sources that still carry tracked changes.
#[derive(Debug, Clone, Default)]
pub struct RecognizeFields {
    recognizer: FieldRecognizer,
}

impl RecognizeFields {
    pub fn new(recognizer: FieldRecognizer) -> Self {
        Self { recognizer }
    }

    pub fn from_options(options: &RecognizerOptions) -> Self {
        Self::new(FieldRecognizer::from_options(options))
    }
}

impl Runnable<TemplateSource, RecognizedTemplate> for RecognizeFields {
    fn run(&self, input: TemplateSource) -> Result<RecognizedTemplate, TransformError> {
        if input.tracked_changes {
            return Err(TransformError::TrackedChanges);
        }
        Ok(recognize_blocks(&input, &self.recognizer))
    }
}
