//! The runtime scope stack
//!
//! Frames are either a single object or a materialized list. Every frame records the
//! index of its parent object frame; name lookups walk those links explicitly:
//!
//! ```text
//! [0] Object { Company, People }          parent: none
//! [1] List   [ {Name: Ada}, {Name: Bob} ] parent: 0
//! [2] Object { Name: Ada } + locals       parent: 0   (not 1: the list is transparent)
//! ```

use serde_json::{Map, Value as Json};
use std::fmt;

/// Separators handed to list items through the `_punc` local
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Punctuation {
    /// Between items, except the last pair
    pub separator: String,
    /// Between the last two items
    pub last_separator: String,
    /// After the last item
    pub terminal: String,
}

impl Default for Punctuation {
    fn default() -> Self {
        Self {
            separator: ", ".to_string(),
            last_separator: " and ".to_string(),
            terminal: String::new(),
        }
    }
}

impl Punctuation {
    /// The punctuation following item `index` of `count`
    pub fn for_position(&self, index: usize, count: usize) -> &str {
        if index + 1 >= count {
            &self.terminal
        } else if index + 2 == count {
            &self.last_separator
        } else {
            &self.separator
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Object {
        value: Json,
        locals: Map<String, Json>,
        parent: Option<usize>,
    },
    List {
        items: Vec<Json>,
        cursor: usize,
        parent: Option<usize>,
    },
}

impl Frame {
    pub fn is_list(&self) -> bool {
        matches!(self, Frame::List { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// A scalar lookup hit a list frame
    ExpectedObject,
    /// An item was requested while the current frame is not a list
    NotInList,
    /// An item index past the end of its list
    ItemOutOfRange { index: usize, count: usize },
    Empty,
}

impl fmt::Display for ScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeError::ExpectedObject => write!(f, "found LIST when expecting SINGLE object"),
            ScopeError::NotInList => write!(f, "found SINGLE object when expecting LIST"),
            ScopeError::ItemOutOfRange { index, count } => {
                write!(f, "item {} requested from a list of {}", index, count)
            }
            ScopeError::Empty => write!(f, "no active scope"),
        }
    }
}

impl std::error::Error for ScopeError {}

#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(value: Json) -> Self {
        let mut stack = Self::new();
        stack.push_object(value);
        stack
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Index of the innermost object frame
    fn current_object(&self) -> Option<usize> {
        self.frames.iter().rposition(|f| !f.is_list())
    }

    /// Push an object frame linked to the innermost object
    pub fn push_object(&mut self, value: Json) {
        let parent = self.current_object();
        self.frames.push(Frame::Object {
            value,
            locals: Map::new(),
            parent,
        });
    }

    /// Push a list frame over materialized items, returning the item count
    pub fn push_list(&mut self, items: Vec<Json>) -> Result<usize, ScopeError> {
        match self.frames.last() {
            Some(Frame::Object { .. }) => {}
            Some(Frame::List { .. }) => return Err(ScopeError::ExpectedObject),
            None => return Err(ScopeError::Empty),
        }
        let count = items.len();
        let parent = self.current_object();
        self.frames.push(Frame::List {
            items,
            cursor: 0,
            parent,
        });
        Ok(count)
    }

    /// Push the object frame of item `index` of the current list
    pub fn push_item(&mut self, index: usize, punctuation: &Punctuation) -> Result<(), ScopeError> {
        let (value, parent, count) = match self.frames.last_mut() {
            Some(Frame::List {
                items,
                cursor,
                parent,
            }) => {
                let count = items.len();
                let value = items
                    .get(index)
                    .cloned()
                    .ok_or(ScopeError::ItemOutOfRange { index, count })?;
                *cursor = index;
                (value, *parent, count)
            }
            Some(Frame::Object { .. }) => return Err(ScopeError::NotInList),
            None => return Err(ScopeError::Empty),
        };

        let mut locals = Map::new();
        locals.insert("_index".to_string(), Json::from(index + 1));
        locals.insert("_index0".to_string(), Json::from(index));
        locals.insert("_first".to_string(), Json::Bool(index == 0));
        locals.insert("_last".to_string(), Json::Bool(index + 1 == count));
        locals.insert(
            "_punc".to_string(),
            Json::String(punctuation.for_position(index, count).to_string()),
        );

        self.frames.push(Frame::Object {
            value,
            locals,
            parent,
        });
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// The scope expressions are evaluated against; the top frame must be an object
    pub fn current(&self) -> Result<Scope<'_>, ScopeError> {
        match self.frames.last() {
            Some(Frame::Object { .. }) => Ok(Scope {
                stack: self,
                index: self.frames.len() - 1,
            }),
            Some(Frame::List { .. }) => Err(ScopeError::ExpectedObject),
            None => Err(ScopeError::Empty),
        }
    }
}

/// A read-only view of one object frame and its ancestors
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    stack: &'a ScopeStack,
    index: usize,
}

impl<'a> Scope<'a> {
    fn frame(&self) -> (&'a Json, &'a Map<String, Json>, Option<usize>) {
        match &self.stack.frames[self.index] {
            Frame::Object {
                value,
                locals,
                parent,
            } => (value, locals, *parent),
            // Scopes are only ever created over object frames
            Frame::List { .. } => unreachable!("scope over a list frame"),
        }
    }

    /// The value of this object frame
    pub fn this(&self) -> &'a Json {
        self.frame().0
    }

    /// A local of this frame only
    pub fn local(&self, name: &str) -> Option<&'a Json> {
        self.frame().1.get(name)
    }

    pub fn parent(&self) -> Option<Scope<'a>> {
        self.frame().2.map(|index| Scope {
            stack: self.stack,
            index,
        })
    }

    /// Resolve a name: locals, then members of this value, then the parent scope
    pub fn lookup(&self, name: &str) -> Option<&'a Json> {
        let mut scope = Some(*self);
        while let Some(current) = scope {
            let (value, locals, _) = current.frame();
            if let Some(found) = locals.get(name) {
                return Some(found);
            }
            if let Some(found) = value.as_object().and_then(|map| map.get(name)) {
                return Some(found);
            }
            scope = current.parent();
        }
        None
    }
}
