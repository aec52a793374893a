//! Atomizing
//!
//! Every expression of a template is bound to a short identifier, its *atom*, which names
//! the element holding the expression's value in the output document. Atoms are scoped by
//! lexical context:
//!
//! - the items of a `List` form one context, distinct from the context around the list
//! - within one context, the same expression always maps to the same atom
//! - the same expression in a different context maps to a different atom
//!
//! Whether a `define` must actually be emitted is tracked separately, per frame. Frames
//! are pushed for conditionals and lists; a lookup walks the frames outward but stops at
//! the first frame belonging to another context. An expression already defined in an
//! enclosing frame of the same context needs no second definition. Definitions made
//! inside a conditional branch are forgotten when the branch ends, and when an
//! alternative branch starts, so they never leak into code that may run without them.
//!
//! The counter minting atom names lives in the [`Atomizer`] itself. Each compile owns a
//! fresh atomizer, so concurrent compiles never interfere.

use std::collections::{HashMap, HashSet};

/// Identity of a lexical context
pub type ContextId = usize;

/// Suffix of the element persisting a condition's boolean
pub const CONDITION_SUFFIX: &str = "b";
/// Suffix of the element carrying a list's punctuation
pub const PUNCTUATION_SUFFIX: &str = "p";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Object,
    Condition,
    List,
}

#[derive(Debug)]
struct AtomFrame {
    kind: FrameKind,
    context: ContextId,
    defined: HashSet<String>,
}

impl AtomFrame {
    fn new(kind: FrameKind, context: ContextId) -> Self {
        Self {
            kind,
            context,
            defined: HashSet::new(),
        }
    }
}

/// The atom chosen for a content expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomBinding {
    pub atom: String,
    /// No active frame of this context has defined the atom yet
    pub is_new: bool,
}

/// Per-compile atom allocator
#[derive(Debug)]
pub struct Atomizer {
    counter: usize,
    next_context: ContextId,
    names: HashMap<(ContextId, String), String>,
    frames: Vec<AtomFrame>,
    defines: usize,
}

impl Default for Atomizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Atomizer {
    pub fn new() -> Self {
        Self {
            counter: 0,
            next_context: 1,
            names: HashMap::new(),
            frames: vec![AtomFrame::new(FrameKind::Object, 0)],
            defines: 0,
        }
    }

    fn context(&self) -> ContextId {
        self.frames.last().map(|f| f.context).unwrap_or(0)
    }

    fn mint(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{}{}", prefix, self.counter)
    }

    /// The atom name for an expression in the current context
    fn atom_for(&mut self, expr: &str) -> String {
        let key = (self.context(), expr.to_string());
        if let Some(atom) = self.names.get(&key) {
            return atom.clone();
        }
        let atom = self.mint("C");
        self.names.insert(key, atom.clone());
        atom
    }

    fn is_defined(&self, atom: &str) -> bool {
        let context = self.context();
        self.frames
            .iter()
            .rev()
            .take_while(|f| f.context == context)
            .any(|f| f.defined.contains(atom))
    }

    /// Bind a content expression, reporting whether a `define` must be emitted
    pub fn define_atom(&mut self, expr: &str) -> AtomBinding {
        let atom = self.atom_for(expr);
        if self.is_defined(&atom) {
            return AtomBinding { atom, is_new: false };
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.defined.insert(atom.clone());
        }
        self.defines += 1;
        AtomBinding { atom, is_new: true }
    }

    /// Bind a condition expression and open the conditional's frame
    ///
    /// The condition's boolean is persisted under [`condition_atom`] of the returned atom.
    pub fn begin_if_atom(&mut self, expr: &str) -> String {
        let atom = self.atom_for(expr);
        let context = self.context();
        self.frames.push(AtomFrame::new(FrameKind::Condition, context));
        atom
    }

    /// An `ElseIf` or `Else` starts: forget what the previous branch defined
    pub fn alternative(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            if frame.kind == FrameKind::Condition {
                frame.defined.clear();
            }
        }
    }

    pub fn end_if(&mut self) {
        self.pop(FrameKind::Condition);
    }

    /// Mint a fresh list atom and enter the list items' context
    ///
    /// List atoms are never shared, not even between two lists over the same expression.
    pub fn begin_list_atom(&mut self) -> String {
        let atom = self.mint("L");
        let context = self.next_context;
        self.next_context += 1;
        self.frames.push(AtomFrame::new(FrameKind::List, context));
        atom
    }

    pub fn end_list(&mut self) {
        self.pop(FrameKind::List);
    }

    fn pop(&mut self, kind: FrameKind) {
        // The root object frame is never popped
        if self.frames.len() > 1 && self.frames.last().map(|f| f.kind) == Some(kind) {
            self.frames.pop();
        }
    }

    /// Atoms minted so far
    pub fn atom_count(&self) -> usize {
        self.counter
    }

    /// Defines emitted so far
    pub fn define_count(&self) -> usize {
        self.defines
    }
}

pub fn condition_atom(atom: &str) -> String {
    format!("{atom}{CONDITION_SUFFIX}")
}

pub fn punctuation_atom(list_atom: &str) -> String {
    format!("{list_atom}{PUNCTUATION_SUFFIX}")
}
