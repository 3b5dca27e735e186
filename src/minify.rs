//! Bundle assembly and CSS minification.
//!
//! Uses lightningcss for CSS.

use std::collections::HashSet;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};

use crate::bundle::{BundleId, BundleSpec};
use crate::config::MinifyConfig;
use crate::debug;
use crate::error::PackError;
use crate::registry::StyleRegistry;

/// A finished bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBundle {
    pub id: BundleId,
    pub media: String,
    pub content: String,
}

/// CSS minifier configured once per run.
#[derive(Debug, Clone)]
pub struct CssMinifier {
    enable: bool,
    error_recovery: bool,
    unused_symbols: HashSet<String>,
}

impl CssMinifier {
    pub fn new(config: &MinifyConfig) -> Self {
        Self {
            enable: config.enable,
            error_recovery: config.error_recovery,
            unused_symbols: config.unused_symbols.iter().cloned().collect(),
        }
    }

    /// Minify CSS source code, or return it unchanged when disabled.
    pub fn minify(&self, source: &str, filename: &str) -> Result<String, String> {
        if !self.enable {
            return Ok(source.to_string());
        }

        let options = ParserOptions {
            filename: filename.to_string(),
            error_recovery: self.error_recovery,
            ..ParserOptions::default()
        };
        let mut stylesheet = StyleSheet::parse(source, options).map_err(|e| e.to_string())?;
        stylesheet
            .minify(MinifyOptions {
                unused_symbols: self.unused_symbols.clone(),
                ..MinifyOptions::default()
            })
            .map_err(|e| e.to_string())?;
        let result = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..PrinterOptions::default()
            })
            .map_err(|e| e.to_string())?;
        Ok(result.code)
    }
}

/// Join style contents in order, each followed by a newline.
pub fn concat<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for part in parts {
        out.push_str(part);
        out.push('\n');
    }
    out
}

/// Concatenate a bundle's styles from the registry and minify the result.
///
/// Unresolved slots contribute empty content at their position.
pub fn pack_bundle(
    id: BundleId,
    spec: &BundleSpec,
    registry: &StyleRegistry,
    minifier: &CssMinifier,
) -> Result<PackedBundle, PackError> {
    let raw = concat(
        spec.styles
            .iter()
            .map(|hash| registry.content(&spec.media, hash)),
    );
    let filename = format!("{id}.css");
    let content = minifier
        .minify(&raw, &filename)
        .map_err(|message| PackError::Minify {
            bundle: id.to_hex(),
            media: spec.media.clone(),
            message,
        })?;
    debug!("bundle"; "create packed stylesheet \"{}\" ({} styles, {} bytes)", id, spec.styles.len(), content.len());
    Ok(PackedBundle {
        id,
        media: spec.media.clone(),
        content,
    })
}
