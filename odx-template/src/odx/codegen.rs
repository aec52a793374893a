//! Code generation
//!
//! The logic tree is normally interpreted directly (see
//! [`evaluation::interpreter`](crate::odx::evaluation::interpreter)). This module holds
//! the alternate backends:
//!
//! - [`program`]: a data-only instruction list tagged with the crate version
//! - [`vm`]: executes a program against a [`Host`](crate::odx::evaluation::Host),
//!   producing the same host-call sequence as the interpreter
//! - [`javascript`]: renders the logic tree as a JavaScript `evaluate(cx, cl, h)` function
//!   for external tooling

pub mod javascript;
pub mod program;
pub mod vm;

pub use javascript::render_javascript;
pub use program::{generate, is_compatible, Instruction, Program, ProgramError, PROGRAM_VERSION};
