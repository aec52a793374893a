//! Standard transform definitions
//!
//! Pre-built pipelines using the default `[`/`]` delimiters, defined as static references
//! using `once_cell::sync::Lazy`. Use [`compile_pipeline`] for other delimiter pairs.

use crate::odx::codegen::Program;
use crate::odx::fields::{RecognizerOptions, TemplateSource};
use crate::odx::logic::CompiledTemplate;
use crate::odx::structuring::{RecognizedTemplate, StructuredTemplate};
use crate::odx::transforms::stages::{
    BuildLogic, FoldStructure, GenerateProgram, PromoteBlocks, RecognizeFields,
};
use crate::odx::transforms::Transform;
use once_cell::sync::Lazy;

pub type RecognizeTransform = Transform<TemplateSource, RecognizedTemplate>;
pub type StructureTransform = Transform<TemplateSource, StructuredTemplate>;
pub type CompileTransform = Transform<TemplateSource, CompiledTemplate>;
pub type ProgramTransform = Transform<TemplateSource, Program>;

/// Field recognition: TemplateSource → RecognizedTemplate
pub static RECOGNIZE: Lazy<RecognizeTransform> =
    Lazy::new(|| Transform::from_fn(Ok).then(RecognizeFields::default()));

/// Structuring: TemplateSource → StructuredTemplate
///
/// 1. Field recognition
/// 2. Block promotion
/// 3. Depth tagging and folding
pub static STRUCTURE: Lazy<StructureTransform> = Lazy::new(|| {
    Transform::from_fn(Ok)
        .then(RecognizeFields::default())
        .then(PromoteBlocks)
        .then(FoldStructure)
});

/// Full compile: TemplateSource → CompiledTemplate (logic tree + field dictionary)
///
/// This is the standard transform for most use cases.
pub static COMPILE: Lazy<CompileTransform> =
    Lazy::new(|| Transform::from_fn(Ok).then_transform(&STRUCTURE).then(BuildLogic));

/// Compile down to an instruction program: TemplateSource → Program
pub static TO_PROGRAM: Lazy<ProgramTransform> =
    Lazy::new(|| Transform::from_fn(Ok).then_transform(&COMPILE).then(GenerateProgram));

/// A full compile pipeline for the given recognizer options
pub fn compile_pipeline(options: &RecognizerOptions) -> CompileTransform {
    Transform::from_fn(Ok)
        .then(RecognizeFields::from_options(options))
        .then(PromoteBlocks)
        .then(FoldStructure)
        .then(BuildLogic)
}

/// A pipeline down to an instruction program for the given recognizer options
pub fn program_pipeline(options: &RecognizerOptions) -> ProgramTransform {
    Transform::from_fn(Ok)
        .then_transform(&compile_pipeline(options))
        .then(GenerateProgram)
}
