//! Individual compiler stages
//!
//! Each stage implements [`Runnable`](super::Runnable); its type name is the stage name
//! reported in logs and failures.

pub mod codegen;
pub mod folding;
pub mod logic;
pub mod promotion;
pub mod recognition;

pub use codegen::GenerateProgram;
pub use folding::FoldStructure;
pub use logic::BuildLogic;
pub use promotion::PromoteBlocks;
pub use recognition::RecognizeFields;
