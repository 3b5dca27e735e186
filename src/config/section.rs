//! `[pack]` and `[minify]` sections.
//!
//! # Example
//!
//! ```toml
//! [pack]
//! inline = false
//! site_root = "/"
//! output_path = "assets/stylesheets/"
//! default_media = "screen"
//! remove_local_src = false
//! remote_scheme = "http"
//!
//! [minify]
//! enable = true
//! error_recovery = false
//! unused_symbols = ["legacy-banner"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ConfigDiagnostics;

/// Packing behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackSection {
    /// Re-inject bundles as `<style>` blocks instead of writing `.min.css` files.
    pub inline: bool,
    /// Prefix of generated stylesheet URLs.
    pub site_root: String,
    /// Directory (relative to the site root) for bundle artifacts.
    pub output_path: String,
    /// Media used when a declaration has none.
    pub default_media: String,
    /// Drop local stylesheets from the output once packed.
    pub remove_local_src: bool,
    /// Scheme for protocol-relative hrefs (`//cdn/x.css`).
    pub remote_scheme: String,
    /// Filesystem root searched first for local hrefs.
    pub source_dir: Option<PathBuf>,
}

impl Default for PackSection {
    fn default() -> Self {
        Self {
            inline: false,
            site_root: "/".into(),
            output_path: "assets/stylesheets/".into(),
            default_media: "screen".into(),
            remove_local_src: false,
            remote_scheme: "http".into(),
            source_dir: None,
        }
    }
}

impl PackSection {
    /// Validate pack configuration.
    ///
    /// # Checks
    /// - `site_root` ends with `/`
    /// - `output_path` is relative and ends with `/` (or is empty)
    /// - `default_media` is not blank
    /// - `remote_scheme` is `http` or `https`
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.site_root.ends_with('/') {
            diag.error_with_hint(
                "pack.site_root",
                format!("`{}` must end with `/`", self.site_root),
                format!("use `{}/`", self.site_root),
            );
        }

        if self.output_path.starts_with('/') {
            diag.error_with_hint(
                "pack.output_path",
                format!("`{}` must be relative to the site root", self.output_path),
                "drop the leading `/`; pack.site_root is prepended to links",
            );
        } else if !self.output_path.is_empty() && !self.output_path.ends_with('/') {
            diag.error_with_hint(
                "pack.output_path",
                format!("`{}` must end with `/`", self.output_path),
                format!("use `{}/`", self.output_path),
            );
        }

        if self.default_media.trim().is_empty() {
            diag.error("pack.default_media", "must not be empty");
        }

        if !matches!(self.remote_scheme.as_str(), "http" | "https") {
            diag.error(
                "pack.remote_scheme",
                format!("expected `http` or `https`, got `{}`", self.remote_scheme),
            );
        }

        if let Some(dir) = &self.source_dir
            && !dir.is_dir()
        {
            diag.error(
                "pack.source_dir",
                format!("directory not found: {}", dir.display()),
            );
        }
    }
}

/// Minifier pass-through options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinifyConfig {
    /// Minify bundles; when false the raw concatenation is written.
    pub enable: bool,
    /// Skip invalid rules instead of failing the run.
    pub error_recovery: bool,
    /// Class, id and keyframe names whose rules are dropped.
    pub unused_symbols: Vec<String>,
}

impl Default for MinifyConfig {
    fn default() -> Self {
        Self {
            enable: true,
            error_recovery: false,
            unused_symbols: Vec::new(),
        }
    }
}
