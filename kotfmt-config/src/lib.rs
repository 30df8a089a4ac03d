//! Shared configuration loader for the kotfmt toolchain.
//!
//! `defaults/kotfmt.default.toml` is embedded into every binary so that
//! documented and effective defaults never drift apart. Applications layer
//! an optional user `kotfmt.toml` and per-key overrides on top via
//! [`Loader`] before deserializing into [`KotfmtConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/kotfmt.default.toml");

/// Top-level configuration consumed by kotfmt applications.
#[derive(Debug, Clone, Deserialize)]
pub struct KotfmtConfig {
    pub formatting: FormattingConfig,
}

/// Layout knobs exposed by the formatter.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FormattingConfig {
    pub max_line_length: usize,
    pub standard_indent: usize,
    pub continuation_indent: usize,
}

impl FormattingConfig {
    /// Reject values the formatter cannot work with. Called once by the
    /// driver before any file is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_line_length == 0 {
            return Err(ConfigError::Message(
                "formatting.max-line-length must be positive".to_string(),
            ));
        }
        if self.standard_indent == 0 {
            return Err(ConfigError::Message(
                "formatting.standard-indent must be positive".to_string(),
            ));
        }
        if self.continuation_indent < self.standard_indent {
            return Err(ConfigError::Message(
                "formatting.continuation-indent must be at least the standard indent".to_string(),
            ));
        }
        Ok(())
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Loader { builder }
    }

    /// Layer a configuration file. A missing file is an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (CLI flags use this).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<KotfmtConfig, ConfigError> {
        let config = self.builder.build()?;
        let parsed: KotfmtConfig = config.try_deserialize()?;
        parsed.formatting.validate()?;
        Ok(parsed)
    }
}
