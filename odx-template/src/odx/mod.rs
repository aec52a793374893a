//! Main module for odx template functionality

pub mod atomizing;
pub mod cache;
pub mod codegen;
pub mod diagnostics;
pub mod evaluation;
pub mod expression;
pub mod fields;
pub mod indirect;
pub mod loader;
pub mod logic;
pub mod package;
pub mod structuring;
pub mod testing;
pub mod transforms;
