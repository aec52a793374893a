//! The logic tree
//!
//! The logic tree is the persisted, language-neutral result of compiling a template: the
//! structured field tree reduced to what re-evaluation needs (`type`, `expr`, `atom`,
//! `id`, `contentArray`). Next to it, the [`FieldDictionary`] maps every source field id
//! back to its atom for tooling and previews.

pub mod builder;
pub mod dictionary;
pub mod tree;

pub use builder::{build_logic, CompiledTemplate};
pub use dictionary::{DictionaryEntry, FieldDictionary};
pub use tree::{LogicNode, LogicTree};
