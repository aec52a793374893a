//! Recursive assembly of indirect insertions
//!
//! [`DocumentAssembler`] compiles and evaluates a template, then does the same for every
//! deferred insertion the evaluation produced, each against its own scope, until no
//! insertion is left. The resulting [`AssembledDocument`] tree goes to a [`Composer`],
//! the external layer that splices sub-documents into the output.
//!
//! Templates are fetched through a [`TemplateProvider`]. Each compiled template is
//! memoised by target and content type for the duration of one assembly, so a clause
//! inserted ten times is loaded and compiled once.

use super::insert::ContentType;
use crate::odx::diagnostics::Diagnostic;
use crate::odx::evaluation::{evaluate, EvaluationResult, EvaluatorOptions};
use crate::odx::expression::ExpressionEngine;
use crate::odx::fields::{RecognizerOptions, TemplateSource};
use crate::odx::loader::{LoaderError, TemplateLoader};
use crate::odx::logic::CompiledTemplate;
use crate::odx::transforms::standard::{compile_pipeline, CompileTransform};
use crate::odx::transforms::TransformError;
use async_trait::async_trait;
use serde_json::Value as Json;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_MAX_INDIRECT_DEPTH: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub enum AssemblyError {
    /// The provider could not supply the template
    Provider { target: String, message: String },
    /// The template could not be compiled
    Compile {
        target: String,
        error: TransformError,
    },
    /// Insertions nested deeper than the configured limit
    RecursionLimit { target: String, depth: usize },
    /// The composer rejected the assembled document
    Compose(String),
}

impl AssemblyError {
    pub fn provider(target: &str, message: impl Into<String>) -> Self {
        AssemblyError::Provider {
            target: target.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyError::Provider { target, message } => {
                write!(f, "Cannot load template '{}': {}", target, message)
            }
            AssemblyError::Compile { target, error } => {
                write!(f, "Cannot compile template '{}': {}", target, error)
            }
            AssemblyError::RecursionLimit { target, depth } => write!(
                f,
                "Inserting '{}' exceeds the indirect depth limit ({})",
                target, depth
            ),
            AssemblyError::Compose(msg) => write!(f, "Composition failed: {}", msg),
        }
    }
}

impl std::error::Error for AssemblyError {}

/// Source of sub-templates, looked up by insertion target
#[async_trait]
pub trait TemplateProvider: Send + Sync {
    async fn load(
        &self,
        target: &str,
        content_type: ContentType,
    ) -> Result<TemplateSource, AssemblyError>;
}

/// Splices assembled sub-documents into the final output
#[async_trait]
pub trait Composer: Send + Sync {
    type Output: Send;

    async fn compose(&self, document: AssembledDocument) -> Result<Self::Output, AssemblyError>;
}

/// One evaluated template and, recursively, everything inserted into it
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledDocument {
    pub target: String,
    pub result: EvaluationResult,
    /// Compile diagnostics of this template
    pub diagnostics: Vec<Diagnostic>,
    pub inserts: Vec<AssembledInsert>,
}

impl AssembledDocument {
    /// Documents in this tree, this one included
    pub fn document_count(&self) -> usize {
        1 + self
            .inserts
            .iter()
            .map(|i| i.document.document_count())
            .sum::<usize>()
    }

    /// Whether this document or any inserted one has errors or diagnostics
    pub fn has_errors(&self) -> bool {
        self.result.has_errors
            || !self.diagnostics.is_empty()
            || self.inserts.iter().any(|i| i.document.has_errors())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssembledInsert {
    /// The id embedded in the parent's placeholder URI
    pub id: String,
    pub content_type: ContentType,
    pub keep_sections: bool,
    pub document: AssembledDocument,
}

type Memo = HashMap<(String, ContentType), Arc<CompiledTemplate>>;
type AssemblyFuture<'a> = Pin<Box<dyn Future<Output = Result<AssembledDocument, AssemblyError>> + Send + 'a>>;

pub struct DocumentAssembler<P> {
    provider: P,
    engine: Arc<dyn ExpressionEngine>,
    pipeline: CompileTransform,
    options: EvaluatorOptions,
    max_indirect_depth: usize,
}

impl<P: TemplateProvider> DocumentAssembler<P> {
    pub fn new(provider: P, engine: Arc<dyn ExpressionEngine>) -> Self {
        Self {
            provider,
            engine,
            pipeline: compile_pipeline(&RecognizerOptions::default()),
            options: EvaluatorOptions::default(),
            max_indirect_depth: DEFAULT_MAX_INDIRECT_DEPTH,
        }
    }

    pub fn with_recognizer_options(mut self, options: &RecognizerOptions) -> Self {
        self.pipeline = compile_pipeline(options);
        self
    }

    pub fn with_evaluator_options(mut self, options: EvaluatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_indirect_depth(mut self, depth: usize) -> Self {
        self.max_indirect_depth = depth;
        self
    }

    /// Assemble `target` against `data`, resolving every insertion recursively
    pub async fn assemble(&self, target: &str, data: Json) -> Result<AssembledDocument, AssemblyError> {
        let mut memo = Memo::new();
        let document = self
            .assemble_at(target.to_string(), ContentType::Docx, data, 0, &mut memo)
            .await?;
        debug!(
            target,
            documents = document.document_count(),
            compiled = memo.len(),
            "assembled document"
        );
        Ok(document)
    }

    /// Assemble, then hand the result to a composer
    pub async fn assemble_and_compose<C: Composer>(
        &self,
        target: &str,
        data: Json,
        composer: &C,
    ) -> Result<C::Output, AssemblyError> {
        let document = self.assemble(target, data).await?;
        composer.compose(document).await
    }

    fn assemble_at<'a>(
        &'a self,
        target: String,
        content_type: ContentType,
        data: Json,
        depth: usize,
        memo: &'a mut Memo,
    ) -> AssemblyFuture<'a> {
        Box::pin(async move {
            if depth > self.max_indirect_depth {
                return Err(AssemblyError::RecursionLimit { target, depth });
            }

            let compiled = self.compiled(&target, content_type, memo).await?;
            let result = evaluate(&compiled.logic, &data, self.engine.as_ref(), &self.options);

            let mut inserts = Vec::with_capacity(result.indirects.len());
            for indirect in &result.indirects {
                let document = self
                    .assemble_at(
                        indirect.target.clone(),
                        indirect.content_type,
                        indirect.scope.clone(),
                        depth + 1,
                        memo,
                    )
                    .await?;
                inserts.push(AssembledInsert {
                    id: indirect.id.clone().unwrap_or_default(),
                    content_type: indirect.content_type,
                    keep_sections: indirect.keep_sections,
                    document,
                });
            }

            Ok(AssembledDocument {
                target,
                result,
                diagnostics: compiled.diagnostics.clone(),
                inserts,
            })
        })
    }

    async fn compiled(
        &self,
        target: &str,
        content_type: ContentType,
        memo: &mut Memo,
    ) -> Result<Arc<CompiledTemplate>, AssemblyError> {
        let key = (target.to_string(), content_type);
        if let Some(compiled) = memo.get(&key) {
            return Ok(compiled.clone());
        }

        let source = self.provider.load(target, content_type).await?;
        let compiled = self
            .pipeline
            .run(source)
            .map_err(|error| AssemblyError::Compile {
                target: target.to_string(),
                error,
            })?;
        if compiled.has_errors() {
            warn!(
                target,
                diagnostics = compiled.diagnostics.len(),
                "template compiled with diagnostics"
            );
        }

        let compiled = Arc::new(compiled);
        memo.insert(key, compiled.clone());
        Ok(compiled)
    }
}

/// Templates held in memory, keyed by target
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    templates: HashMap<String, TemplateSource>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, target: impl Into<String>, source: TemplateSource) -> Self {
        self.templates.insert(target.into(), source);
        self
    }
}

#[async_trait]
impl TemplateProvider for MemoryProvider {
    async fn load(
        &self,
        target: &str,
        _content_type: ContentType,
    ) -> Result<TemplateSource, AssemblyError> {
        self.templates
            .get(target)
            .cloned()
            .ok_or_else(|| AssemblyError::provider(target, "no such template"))
    }
}

/// Field list files under a root directory
///
/// Targets are relative paths. Absolute targets and targets climbing out with `..` are
/// refused, so a data file cannot make the assembler read outside the root.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, target: &str) -> Result<PathBuf, AssemblyError> {
        let relative = Path::new(target);
        let confined = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if target.is_empty() || !confined {
            return Err(AssemblyError::provider(
                target,
                "target must be a relative path inside the template directory",
            ));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl TemplateProvider for DirectoryProvider {
    async fn load(
        &self,
        target: &str,
        _content_type: ContentType,
    ) -> Result<TemplateSource, AssemblyError> {
        let path = self.resolve(target)?;
        let loaded = tokio::task::spawn_blocking(move || TemplateLoader::from_path(path))
            .await
            .map_err(|e| AssemblyError::provider(target, e.to_string()))?;
        loaded
            .map(TemplateLoader::into_source)
            .map_err(|e: LoaderError| AssemblyError::provider(target, e.to_string()))
    }
}
