//! Compiled program cache
//!
//! Programs are cached by template name. A cache compiles with one set of recognizer
//! options, so templates using other delimiters need a cache of their own. A serialized
//! program carries the version of the
//! compiler that produced it; loading one from an incompatible version is a cache miss
//! that drops any stale entry, and callers fall back to compiling the template again.

use crate::odx::codegen::{Program, ProgramError};
use crate::odx::fields::{RecognizerOptions, TemplateSource};
use crate::odx::transforms::standard::{program_pipeline, ProgramTransform, TO_PROGRAM};
use crate::odx::transforms::TransformError;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

pub struct ProgramCache {
    entries: Mutex<HashMap<String, Arc<Program>>>,
    pipeline: ProgramTransform,
}

impl Default for ProgramCache {
    fn default() -> Self {
        Self {
            entries: Mutex::default(),
            pipeline: TO_PROGRAM.clone(),
        }
    }
}

impl fmt::Debug for ProgramCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramCache")
            .field("entries", &self.len())
            .field("stages", &self.pipeline.stages())
            .finish()
    }
}

impl ProgramCache {
    /// A cache compiling with the default `[`/`]` delimiters
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: &RecognizerOptions) -> Self {
        Self {
            entries: Mutex::default(),
            pipeline: program_pipeline(options),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<Program>>> {
        // Entries are replaced whole, so a poisoned map is still consistent
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, name: &str) -> Option<Arc<Program>> {
        self.entries().get(name).cloned()
    }

    pub fn insert(&self, name: impl Into<String>, program: Program) -> Arc<Program> {
        let program = Arc::new(program);
        self.entries().insert(name.into(), program.clone());
        program
    }

    /// Drop an entry; returns whether one existed
    pub fn invalidate(&self, name: &str) -> bool {
        self.entries().remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Return the cached program or compile `source` and cache the result
    pub fn get_or_compile(
        &self,
        name: &str,
        source: &TemplateSource,
    ) -> Result<Arc<Program>, TransformError> {
        if let Some(program) = self.get(name) {
            return Ok(program);
        }
        debug!(name, "program cache miss, compiling");
        let program = self.pipeline.run(source.clone())?;
        Ok(self.insert(name, program))
    }

    /// Cache a previously serialized program
    ///
    /// Returns `None`, after dropping any cached entry for `name`, when the program was
    /// produced by an incompatible version or cannot be read.
    pub fn load_serialized(&self, name: &str, json: &str) -> Option<Arc<Program>> {
        match Program::from_json(json) {
            Ok(program) => Some(self.insert(name, program)),
            Err(ProgramError::VersionMismatch { found, expected }) => {
                warn!(name, %found, %expected, "cached program rejected: version mismatch");
                self.invalidate(name);
                None
            }
            Err(err) => {
                warn!(name, error = %err, "cached program rejected");
                self.invalidate(name);
                None
            }
        }
    }

    /// Load a serialized program, recompiling `source` when it is rejected
    pub fn load_or_compile(
        &self,
        name: &str,
        json: &str,
        source: &TemplateSource,
    ) -> Result<Arc<Program>, TransformError> {
        match self.load_serialized(name, json) {
            Some(program) => Ok(program),
            None => self.get_or_compile(name, source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odx::codegen::Instruction;
    use crate::odx::fields::Delimiters;

    fn source() -> TemplateSource {
        TemplateSource::from_contents(["if x", "[A]", "endif"])
    }

    #[test]
    fn test_get_or_compile_caches() {
        let cache = ProgramCache::new();
        let first = cache.get_or_compile("letter", &source()).unwrap();
        let second = cache.get_or_compile("letter", &source()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_serialized_program_round_trips() {
        let program = TO_PROGRAM.run(source()).unwrap();
        let json = program.to_json().unwrap();

        let cache = ProgramCache::new();
        let loaded = cache.load_serialized("letter", &json).unwrap();
        assert_eq!(*loaded, program);
    }

    #[test]
    fn test_version_mismatch_is_a_miss_and_recompiles() {
        let mut program = TO_PROGRAM.run(source()).unwrap();
        program.version = "0.0.0-ancient".to_string();
        let stale = program.to_json().unwrap();

        let cache = ProgramCache::new();
        cache.insert("letter", program.clone());
        assert!(cache.load_serialized("letter", &stale).is_none());
        assert!(cache.is_empty());

        let recompiled = cache.load_or_compile("letter", &stale, &source()).unwrap();
        assert_ne!(recompiled.version, "0.0.0-ancient");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_compiles_with_its_own_delimiters() {
        let curly = TemplateSource::from_contents(["{{Name}}"]);
        let defines_name = |program: &Program| {
            program
                .instructions
                .iter()
                .any(|i| matches!(i, Instruction::Define { expr, .. } if expr == "Name"))
        };

        let cache = ProgramCache::with_options(&RecognizerOptions {
            delimiters: Delimiters::new("{{", "}}"),
        });
        assert!(defines_name(&cache.get_or_compile("letter", &curly).unwrap()));

        let default_cache = ProgramCache::new();
        assert!(!defines_name(&default_cache.get_or_compile("letter", &curly).unwrap()));
    }

    #[test]
    fn test_garbage_is_a_miss() {
        let cache = ProgramCache::new();
        assert!(cache.load_serialized("letter", "not json").is_none());
    }
}
