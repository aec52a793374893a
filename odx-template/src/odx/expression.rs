//! The expression boundary
//!
//! The expression language itself is not part of this crate. It is injected as an
//! [`ExpressionEngine`]: `compile(expr)` yields a callable, and calling it against a
//! [`Scope`](crate::odx::evaluation::Scope) yields a tagged [`Value`].
//!
//! Two engines ship with the crate:
//!
//! - [`FnEngine`]: maps expression strings to Rust closures, for hosts embedding their own
//!   language and for tests
//! - [`PathEngine`]: dotted member paths, literals, negation and equality, enough to drive
//!   templates from plain JSON data

pub mod engine;
pub mod path;
pub mod value;

pub use engine::{CompiledExpr, ExprError, ExpressionEngine, FnEngine};
pub use path::PathEngine;
pub use value::{NestedResult, Value};
