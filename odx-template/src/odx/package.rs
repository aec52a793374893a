//! Compiling every part of a document package
//!
//! A source document has several independent template parts (main body, headers, footers,
//! footnotes). Each part compiles on its own blocking task. Results flow over a channel to
//! a single commit task that owns the [`PackageWriter`], so writes to the shared package
//! are serialized in arrival order.

use crate::odx::diagnostics::Diagnostic;
use crate::odx::fields::{RecognizerOptions, TemplateSource};
use crate::odx::logic::CompiledTemplate;
use crate::odx::transforms::standard::compile_pipeline;
use crate::odx::transforms::TransformError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One template part of a package, e.g. `word/document.xml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePart {
    pub name: String,
    pub source: TemplateSource,
}

impl PackagePart {
    pub fn new(name: impl Into<String>, source: TemplateSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPart {
    pub name: String,
    pub compiled: CompiledTemplate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PackageError {
    /// A part could not be compiled
    Compile { part: String, error: TransformError },
    /// The writer failed to commit
    Write(String),
    /// A compile or commit task died
    Task(String),
}

impl fmt::Display for PackageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageError::Compile { part, error } => {
                write!(f, "Cannot compile part '{}': {}", part, error)
            }
            PackageError::Write(msg) => write!(f, "Cannot write package: {}", msg),
            PackageError::Task(msg) => write!(f, "Compile task failed: {}", msg),
        }
    }
}

impl std::error::Error for PackageError {}

/// Receives compiled parts, one at a time
#[async_trait]
pub trait PackageWriter: Send {
    async fn commit(&mut self, part: CompiledPart) -> Result<(), PackageError>;

    /// Called once after the last part was committed
    async fn finish(&mut self) -> Result<(), PackageError> {
        Ok(())
    }
}

/// What a package compile did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageReport {
    /// Part names in commit order
    pub committed: Vec<String>,
    /// `(part, diagnostic)` for every diagnostic of every part
    pub diagnostics: Vec<(String, Diagnostic)>,
}

/// Compile all parts in parallel and commit them through `writer`
///
/// Returns the writer so callers can take whatever it accumulated. Any part failing to
/// compile fails the whole package.
pub async fn compile_package<W>(
    parts: Vec<PackagePart>,
    options: &RecognizerOptions,
    writer: W,
) -> Result<(PackageReport, W), PackageError>
where
    W: PackageWriter + 'static,
{
    let pipeline = Arc::new(compile_pipeline(options));
    let (tx, mut rx) = mpsc::channel::<Result<CompiledPart, PackageError>>(parts.len().max(1));

    let committer = tokio::spawn(async move {
        let mut writer = writer;
        let mut report = PackageReport::default();
        while let Some(message) = rx.recv().await {
            let part = message?;
            for diagnostic in &part.compiled.diagnostics {
                warn!(part = %part.name, %diagnostic, "template diagnostic");
                report
                    .diagnostics
                    .push((part.name.clone(), diagnostic.clone()));
            }
            let name = part.name.clone();
            writer.commit(part).await?;
            report.committed.push(name);
        }
        writer.finish().await?;
        Ok::<_, PackageError>((report, writer))
    });

    let mut tasks = Vec::with_capacity(parts.len());
    for PackagePart { name, source } in parts {
        let tx = tx.clone();
        let pipeline = pipeline.clone();
        tasks.push(tokio::task::spawn_blocking(move || {
            let message = match pipeline.run(source) {
                Ok(compiled) => Ok(CompiledPart { name, compiled }),
                Err(error) => Err(PackageError::Compile { part: name, error }),
            };
            // The committer only hangs up after a failure it already reports
            let _ = tx.blocking_send(message);
        }));
    }
    drop(tx);

    for task in tasks {
        task.await.map_err(|e| PackageError::Task(e.to_string()))?;
    }
    let (report, writer) = committer
        .await
        .map_err(|e| PackageError::Task(e.to_string()))??;

    debug!(
        parts = report.committed.len(),
        diagnostics = report.diagnostics.len(),
        "compiled package"
    );
    Ok((report, writer))
}
