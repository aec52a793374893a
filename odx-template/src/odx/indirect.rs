//! Indirect insertion of sub-documents
//!
//! An expression may evaluate to an [`IndirectVirtual`]: a request to insert another
//! template, assembled against its own data scope, at that point of the document.
//!
//! - [`insert`]: the request value itself
//! - [`registry`]: per-evaluation interning by value equality and placeholder URIs
//! - [`resolver`]: the async [`DocumentAssembler`] that recursively compiles and
//!   evaluates every deferred insertion and hands the result to a composer

pub mod insert;
pub mod registry;
pub mod resolver;

pub use insert::{ContentType, IndirectVirtual};
pub use registry::{IndirectRegistry, DEFAULT_PLACEHOLDER_BASE};
pub use resolver::{
    AssembledDocument, AssembledInsert, AssemblyError, Composer, DirectoryProvider,
    DocumentAssembler, MemoryProvider, TemplateProvider, DEFAULT_MAX_INDIRECT_DEPTH,
};
