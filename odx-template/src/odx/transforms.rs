//! Compiler pipelines
//!
//! The compiler is a chain of named stages, each taking the previous stage's output:
//!
//! ```text
//! TemplateSource ─RecognizeFields→ RecognizedTemplate ─PromoteBlocks→ FlatTemplate
//!   ─FoldStructure→ StructuredTemplate ─BuildLogic→ CompiledTemplate ─GenerateProgram→ Program
//! ```
//!
//! A stage implements [`Runnable`]. A [`Transform`] is a type-checked chain of stages built
//! with `.then(stage)`; it can stop anywhere, so callers get exactly the artifact they
//! need. Transforms are cheap to clone and can be spliced into longer ones with
//! [`Transform::then_transform`]. The usual chains live in [`standard`].
//!
//! # Errors
//!
//! Structural and parse problems are not transform errors: they travel with the output as
//! diagnostics. A [`TransformError`] means the template could not be compiled at all. A
//! plain message returned by a stage is labelled with that stage's name on its way out of
//! the chain.

pub mod stages;
pub mod standard;

use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Error that aborts a compile
#[derive(Debug, Clone, PartialEq)]
pub enum TransformError {
    /// Unlabelled failure, as returned by a stage
    Error(String),
    /// A named stage of a chain failed
    StageFailed { stage: String, message: String },
    /// The source still carries unresolved tracked changes
    TrackedChanges,
}

impl TransformError {
    /// Attribute an unlabelled failure to `stage`
    fn in_stage(self, stage: &str) -> Self {
        match self {
            TransformError::Error(message) => TransformError::StageFailed {
                stage: stage.to_string(),
                message,
            },
            other => other,
        }
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::Error(msg) => write!(f, "{}", msg),
            TransformError::StageFailed { stage, message } => {
                write!(f, "Stage '{}' failed: {}", stage, message)
            }
            TransformError::TrackedChanges => write!(
                f,
                "Template contains tracked changes; accept or reject them before compiling"
            ),
        }
    }
}

impl std::error::Error for TransformError {}

impl From<String> for TransformError {
    fn from(s: String) -> Self {
        TransformError::Error(s)
    }
}

impl From<&str> for TransformError {
    fn from(s: &str) -> Self {
        TransformError::Error(s.to_string())
    }
}

/// One compiler stage
pub trait Runnable<I, O> {
    /// Name used in logs and in [`TransformError::StageFailed`]; the type name by default
    fn name(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    fn run(&self, input: I) -> Result<O, TransformError>;
}

type ChainFn<I, O> = dyn Fn(I) -> Result<O, TransformError> + Send + Sync;

/// A chain of stages from `I` to `O`
pub struct Transform<I, O> {
    stages: Vec<&'static str>,
    chain: Arc<ChainFn<I, O>>,
}

impl<I, O> Clone for Transform<I, O> {
    fn clone(&self) -> Self {
        Self {
            stages: self.stages.clone(),
            chain: Arc::clone(&self.chain),
        }
    }
}

impl<I: 'static, O: 'static> Transform<I, O> {
    /// Start a chain from a plain function, usually `Ok`
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(I) -> Result<O, TransformError> + Send + Sync + 'static,
    {
        Transform {
            stages: Vec::new(),
            chain: Arc::new(f),
        }
    }

    /// Append a stage whose input is this chain's output
    pub fn then<O2, S>(self, stage: S) -> Transform<I, O2>
    where
        S: Runnable<O, O2> + Send + Sync + 'static,
        O2: 'static,
    {
        let name = stage.name();
        let previous = self.chain;
        let mut stages = self.stages;
        stages.push(name);

        Transform {
            stages,
            chain: Arc::new(move |input| {
                let output = stage.run(previous(input)?).map_err(|e| e.in_stage(name))?;
                trace!(stage = name, "stage finished");
                Ok(output)
            }),
        }
    }

    /// Append every stage of another chain
    pub fn then_transform<O2: 'static>(self, next: &Transform<O, O2>) -> Transform<I, O2> {
        let previous = self.chain;
        let following = Arc::clone(&next.chain);
        let mut stages = self.stages;
        stages.extend(next.stages.iter().copied());

        Transform {
            stages,
            chain: Arc::new(move |input| following(previous(input)?)),
        }
    }

    /// Stage names in execution order
    pub fn stages(&self) -> &[&'static str] {
        &self.stages
    }

    pub fn run(&self, input: I) -> Result<O, TransformError> {
        (self.chain)(input)
    }
}

impl<I: 'static, O: 'static> Runnable<I, O> for Transform<I, O> {
    fn name(&self) -> &'static str {
        "Transform"
    }

    fn run(&self, input: I) -> Result<O, TransformError> {
        Transform::run(self, input)
    }
}
