//! Template loading utilities
//!
//! [`TemplateLoader`] reads a field list from a file or string (JSON, or YAML by file
//! extension) and runs transforms on it. It is used by the CLI, the indirect resolver's
//! file provider and the tests.
//!
//! ```rust,ignore
//! let compiled = TemplateLoader::from_path("letter.fields.json")?.compile()?;
//! let data = load_data("client.yaml")?;
//! ```
//!
//! A field list file holds either the bare list or the wrapped form:
//!
//! ```text
//! [ {"content": "if x", "id": "1"}, ... ]
//! { "fields": [ ... ], "trackedChanges": false }
//! ```

use crate::odx::codegen::Program;
use crate::odx::fields::{FieldListItem, TemplateSource};
use crate::odx::logic::CompiledTemplate;
use crate::odx::structuring::StructuredTemplate;
use crate::odx::transforms::standard::{COMPILE, STRUCTURE, TO_PROGRAM};
use crate::odx::transforms::{Transform, TransformError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as Json;
use std::fs;
use std::path::Path;

/// Error that can occur when loading templates or data
#[derive(Debug, Clone)]
pub enum LoaderError {
    /// IO error when reading file
    IoError(String),
    /// The file is not a valid field list or data document
    FormatError(String),
    /// Transform/compile error
    TransformError(TransformError),
}

impl std::fmt::Display for LoaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderError::IoError(msg) => write!(f, "IO error: {}", msg),
            LoaderError::FormatError(msg) => write!(f, "Format error: {}", msg),
            LoaderError::TransformError(err) => write!(f, "Transform error: {}", err),
        }
    }
}

impl std::error::Error for LoaderError {}

impl From<std::io::Error> for LoaderError {
    fn from(err: std::io::Error) -> Self {
        LoaderError::IoError(err.to_string())
    }
}

impl From<TransformError> for LoaderError {
    fn from(err: TransformError) -> Self {
        LoaderError::TransformError(err)
    }
}

impl From<serde_json::Error> for LoaderError {
    fn from(err: serde_json::Error) -> Self {
        LoaderError::FormatError(err.to_string())
    }
}

impl From<serde_yaml::Error> for LoaderError {
    fn from(err: serde_yaml::Error) -> Self {
        LoaderError::FormatError(err.to_string())
    }
}

/// Serialization format of a field list or data file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
}

impl SourceFormat {
    /// `.yaml`/`.yml` files are YAML, everything else JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                SourceFormat::Yaml
            }
            _ => SourceFormat::Json,
        }
    }

    pub fn parse<T: DeserializeOwned>(&self, text: &str) -> Result<T, LoaderError> {
        Ok(match self {
            SourceFormat::Json => serde_json::from_str(text)?,
            SourceFormat::Yaml => serde_yaml::from_str(text)?,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SourceDocument {
    Bare(Vec<FieldListItem>),
    Wrapped(TemplateSource),
}

impl From<SourceDocument> for TemplateSource {
    fn from(doc: SourceDocument) -> Self {
        match doc {
            SourceDocument::Bare(fields) => TemplateSource::new(fields),
            SourceDocument::Wrapped(source) => source,
        }
    }
}

/// Template loader with transform shortcuts
pub struct TemplateLoader {
    source: TemplateSource,
}

impl TemplateLoader {
    /// Load a field list file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LoaderError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::from_string(&text, SourceFormat::from_path(path))
    }

    /// Load a field list from text
    pub fn from_string(text: &str, format: SourceFormat) -> Result<Self, LoaderError> {
        let doc: SourceDocument = format.parse(text)?;
        Ok(TemplateLoader { source: doc.into() })
    }

    pub fn from_source(source: TemplateSource) -> Self {
        TemplateLoader { source }
    }

    /// Run a custom transform on the source
    pub fn with<O: 'static>(
        &self,
        transform: &Transform<TemplateSource, O>,
    ) -> Result<O, LoaderError> {
        Ok(transform.run(self.source.clone())?)
    }

    /// Shortcut for `.with(&STRUCTURE)`
    pub fn structure(&self) -> Result<StructuredTemplate, LoaderError> {
        self.with(&STRUCTURE)
    }

    /// Shortcut for `.with(&COMPILE)`
    pub fn compile(&self) -> Result<CompiledTemplate, LoaderError> {
        self.with(&COMPILE)
    }

    /// Shortcut for `.with(&TO_PROGRAM)`
    pub fn program(&self) -> Result<Program, LoaderError> {
        self.with(&TO_PROGRAM)
    }

    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    pub fn into_source(self) -> TemplateSource {
        self.source
    }
}

/// Load a data document (JSON, or YAML by extension)
pub fn load_data<P: AsRef<Path>>(path: P) -> Result<Json, LoaderError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    SourceFormat::from_path(path).parse(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odx::fields::FieldType;

    #[test]
    fn test_bare_list() {
        let loader = TemplateLoader::from_string(
            r#"[{"content": "[A]", "id": "1"}]"#,
            SourceFormat::Json,
        )
        .unwrap();
        assert_eq!(loader.source().field_count(), 1);
        assert!(!loader.source().tracked_changes);
    }

    #[test]
    fn test_single_block_is_not_mistaken_for_wrapped_form() {
        let loader = TemplateLoader::from_string(
            r#"[["Dear ", {"content": "[Name]", "id": "1"}]]"#,
            SourceFormat::Json,
        )
        .unwrap();
        assert!(matches!(loader.source().fields[0], FieldListItem::Block(_)));
    }

    #[test]
    fn test_wrapped_yaml() {
        let yaml = "fields:\n  - content: if x\n    id: '1'\n  - content: endif\n    id: '2'\ntrackedChanges: true\n";
        let loader = TemplateLoader::from_string(yaml, SourceFormat::Yaml).unwrap();

        assert!(loader.source().tracked_changes);
        assert!(matches!(
            loader.compile(),
            Err(LoaderError::TransformError(TransformError::TrackedChanges))
        ));
    }

    #[test]
    fn test_structure_shortcut() {
        let loader = TemplateLoader::from_source(TemplateSource::from_contents([
            "list Items",
            "[Name]",
            "endlist",
        ]));
        let structured = loader.structure().unwrap();
        assert_eq!(structured.nodes[0].field_type, FieldType::List);
    }

    #[test]
    fn test_invalid_document_is_format_error() {
        let result = TemplateLoader::from_string(r#"{"nope": 1}"#, SourceFormat::Json);
        assert!(matches!(result, Err(LoaderError::FormatError(_))));
    }

    #[test]
    fn test_from_path_nonexistent() {
        let result = TemplateLoader::from_path("nonexistent.fields.json");
        assert!(matches!(result, Err(LoaderError::IoError(_))));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("a.YML")), SourceFormat::Yaml);
        assert_eq!(SourceFormat::from_path(Path::new("a.json")), SourceFormat::Json);
        assert_eq!(SourceFormat::from_path(Path::new("a")), SourceFormat::Json);
    }
}
