//! Configuration for the odx tools
//!
//! The documented defaults in `defaults/odx.default.toml` are compiled in, so a binary
//! with no configuration file behaves exactly as that file describes. [`Loader`] stacks
//! user files, `ODX_*` environment variables and command-line overrides on top.
//!
//! `odx-template` knows nothing about this crate: it takes [`RecognizerOptions`] and
//! [`EvaluatorOptions`], which [`OdxConfig`] produces.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, ValueKind};
use odx_template::odx::evaluation::{EvaluatorOptions, Punctuation};
use odx_template::odx::fields::{Delimiters, RecognizerOptions};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/odx.default.toml");

/// Top-level configuration consumed by odx applications.
#[derive(Debug, Clone, Deserialize)]
pub struct OdxConfig {
    pub fields: FieldsConfig,
    pub output: OutputConfig,
    pub punctuation: PunctuationConfig,
    pub assembly: AssemblyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldsConfig {
    pub open_delimiter: String,
    pub close_delimiter: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub placeholder_base: String,
    pub date_format: String,
}

/// List punctuation by item position.
#[derive(Debug, Clone, Deserialize)]
pub struct PunctuationConfig {
    pub separator: String,
    pub last_separator: String,
    pub terminal: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssemblyConfig {
    pub max_indirect_depth: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

impl OdxConfig {
    /// Reject settings no template could be compiled or assembled with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fields.open_delimiter.is_empty() || self.fields.close_delimiter.is_empty() {
            return Err(ConfigError::Message(
                "fields.open_delimiter and fields.close_delimiter must not be empty".into(),
            ));
        }
        if self.assembly.max_indirect_depth == 0 {
            return Err(ConfigError::Message(
                "assembly.max_indirect_depth must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn recognizer_options(&self) -> RecognizerOptions {
        RecognizerOptions {
            delimiters: Delimiters::new(
                self.fields.open_delimiter.clone(),
                self.fields.close_delimiter.clone(),
            ),
        }
    }

    pub fn evaluator_options(&self) -> EvaluatorOptions {
        EvaluatorOptions {
            date_format: self.output.date_format.clone(),
            placeholder_base: self.output.placeholder_base.clone(),
            punctuation: Punctuation {
                separator: self.punctuation.separator.clone(),
                last_separator: self.punctuation.last_separator.clone(),
                terminal: self.punctuation.terminal.clone(),
            },
        }
    }
}

/// Prefix of environment variables layered by [`Loader::with_env`], e.g.
/// `ODX_LOGGING__FILTER=debug`
pub const ENV_PREFIX: &str = "ODX";

/// Builds an [`OdxConfig`] from the embedded defaults plus any number of layers.
///
/// Later layers win. Call [`Loader::build`] once all layers are added.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            builder: Config::builder()
                .add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml)),
        }
    }

    fn layer(mut self, path: &Path, required: bool) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path).format(FileFormat::Toml).required(required));
        self
    }

    /// Add a TOML file that must exist
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), true)
    }

    /// Add a TOML file if it exists
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), false)
    }

    /// Add `ODX_<SECTION>__<KEY>` environment variables
    pub fn with_env(mut self) -> Self {
        self.builder = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            );
        self
    }

    /// Set one dotted key, above every other layer
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Merge the layers, deserialize and validate
    pub fn build(self) -> Result<OdxConfig, ConfigError> {
        let config: OdxConfig = self.builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The embedded defaults alone
pub fn load_defaults() -> Result<OdxConfig, ConfigError> {
    Loader::new().build()
}
