//! Output writer: hand finished bundles to the pages that use them.
//!
//! Two mutually exclusive modes:
//! - **external**: one `{output_path}{id}.min.css` artifact per bundle, plus a
//!   `<link>` to `{site_root}{output_path}{id}.min.css` in every consuming page
//! - **inline**: no artifact; every consuming page gets a `<style>` block with
//!   the bundle content

use crate::bundle::PageBundle;
use crate::config::PackConfig;
use crate::debug;
use crate::files::FileSet;
use crate::html::{NewElement, StyleDocument};
use crate::minify::PackedBundle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    External,
    Inline,
}

impl OutputMode {
    pub fn from_inline(inline: bool) -> Self {
        if inline { Self::Inline } else { Self::External }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::External => "external",
            Self::Inline => "inline",
        }
    }
}

pub struct OutputWriter<'c> {
    config: &'c PackConfig,
    mode: OutputMode,
}

impl<'c> OutputWriter<'c> {
    pub fn new(config: &'c PackConfig) -> Self {
        Self {
            config,
            mode: OutputMode::from_inline(config.pack.inline),
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Give one page its bundle: a `<link>` (external) or `<style>` (inline).
    pub fn attach<D: StyleDocument>(
        &self,
        path: &str,
        doc: &mut D,
        page_bundle: &PageBundle,
        packed: &PackedBundle,
    ) {
        let hex = page_bundle.id.to_hex();
        let element = match self.mode {
            OutputMode::External => NewElement::Stylesheet {
                href: self.config.artifact_url(&hex),
                media: page_bundle.media.clone(),
            },
            OutputMode::Inline => {
                debug!("write"; "include packed stylesheet \"{}\" in \"{}\"", hex, path);
                NewElement::InlineStyle {
                    media: packed.media.clone(),
                    content: packed.content.clone(),
                }
            }
        };
        doc.append_to_head(element);
    }

    /// Store a bundle artifact (external mode only). Returns its path.
    pub fn emit(&self, files: &mut FileSet, packed: &PackedBundle) -> Option<String> {
        if self.mode == OutputMode::Inline {
            return None;
        }
        let path = self.config.artifact_path(&packed.id.to_hex());
        debug!("write"; "write packed stylesheet \"{}\" in \"{}\"", packed.id, path);
        files.insert(path.clone(), packed.content.as_bytes());
        Some(path)
    }
}
