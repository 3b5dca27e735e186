//! Pack configuration for `csspack.toml`.
//!
//! # Sections
//!
//! | Section    | Purpose                                                  |
//! |------------|----------------------------------------------------------|
//! | `[pack]`   | Output mode, URL prefixes, default media, source lookup |
//! | `[minify]` | Minifier switch and pass-through options                 |
//!
//! The file is optional; every field has a default. CLI flags are applied
//! on top before validation.

mod error;
mod section;
mod util;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use section::{MinifyConfig, PackSection};
pub use util::find_config_file;

use crate::{cli::Cli, log};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing csspack.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackConfig {
    /// Config file the values came from, if any (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[serde(default)]
    pub pack: PackSection,

    #[serde(default)]
    pub minify: MinifyConfig,
}

impl PackConfig {
    /// Load configuration by searching upward from `start` for `name`.
    ///
    /// A missing file is not an error: defaults are used.
    pub fn discover(start: &Path, name: &Path) -> Result<Self> {
        match find_config_file(start, name) {
            Some(path) => Self::from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)
            .with_context(|| format!("in {}", path.display()))?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        // Relative source_dir is relative to the config file
        if let (Some(dir), Some(parent)) = (&config.pack.source_dir, path.parent())
            && dir.is_relative()
        {
            config.pack.source_dir = Some(parent.join(dir));
        }

        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Load the config for a CLI run and apply its flag overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to read current directory")?;
        let mut config = Self::discover(&cwd, &cli.config)?;
        config.apply_cli(cli);
        Ok(config)
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply CLI flags on top of file values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        Self::update_option(&mut self.pack.inline, cli.inline.as_ref());
        Self::update_option(&mut self.pack.site_root, cli.site_root.as_ref());
        Self::update_option(&mut self.pack.output_path, cli.output_path.as_ref());
        Self::update_option(&mut self.pack.default_media, cli.default_media.as_ref());
        Self::update_option(&mut self.pack.remove_local_src, cli.remove_local_src.as_ref());
        Self::update_option(&mut self.minify.enable, cli.minify.as_ref());
        if let Some(source) = &cli.source {
            self.pack.source_dir = Some(source.clone());
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Validate all sections, reporting every problem at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        self.pack.validate(&mut diag);
        diag.into_result().map_err(ConfigError::Diagnostics)
    }

    /// Path of the artifact for `bundle_hex` inside the document set.
    pub fn artifact_path(&self, bundle_hex: &str) -> String {
        format!("{}{}.min.css", self.pack.output_path, bundle_hex)
    }

    /// URL pages use to reference the artifact for `bundle_hex`.
    pub fn artifact_url(&self, bundle_hex: &str) -> String {
        format!("{}{}", self.pack.site_root, self.artifact_path(bundle_hex))
    }
}

/// Parse a config snippet in tests, failing on unknown fields.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PackConfig {
    let (parsed, ignored) = PackConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
