//! # odx-template
//!
//! Compiler and evaluator for documents carrying delimited template fields.
//!
//! File Layout
//!
//! The crate follows the order data flows through it:
//!
//! src/odx
//!   ├── fields        Field list input, field recognition and the `FieldNode` tree type
//!   ├── structuring   Block promotion, depth tagging and folding into a nested tree
//!   ├── atomizing     Expression de-duplication ("atoms") scoped by lexical context
//!   ├── logic         The persisted logic tree and field dictionary
//!   ├── codegen       Instruction programs, the program VM and JavaScript rendering
//!   ├── evaluation    Scope stack, host interface, tree interpreter and XML assembler
//!   ├── expression    The injectable expression engine boundary (+ a small path engine)
//!   ├── indirect      Sub-document insertion: interning and recursive assembly
//!   ├── transforms    Composable `Runnable` stages and the standard pipelines
//!   └── testing       Fluent tree assertions and a recording host
//!
//! Most callers only need [`odx::loader::TemplateLoader`] to compile a field list and
//! [`odx::evaluation::evaluate`] to evaluate it.

#![allow(rustdoc::invalid_html_tags)]

pub mod odx;
