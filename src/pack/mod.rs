//! Two-phase pack run over a whole document set.
//!
//! ```text
//! parse (rayon) → scan + resolve/enqueue (sequential, by path)
//!               → fetch barrier
//!               → pack each bundle once (concat + minify)
//!               → attach bundles, write artifacts, commit pages
//! ```
//!
//! Page edits made while scanning are buffered inside each document and only
//! committed to the [`FileSet`] once the barrier and every minification have
//! succeeded. A failed run leaves the file set untouched.


use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use rayon::prelude::*;

use crate::bundle::{BundleId, BundleIndex, PageBundle};
use crate::config::PackConfig;
use crate::error::PackError;
use crate::fetch::Fetcher;
use crate::files::FileSet;
use crate::html::{StyleDocument, TlDocument};
use crate::minify::{CssMinifier, PackedBundle, pack_bundle};
use crate::output::{OutputMode, OutputWriter};
use crate::resolve::{ResolveOptions, ResolveStats, Resolved, StyleResolver};
use crate::scan::scan_document;
use crate::{debug, log};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackReport {
    pub mode: OutputMode,
    /// Html pages scanned.
    pub pages: usize,
    /// Pages left untouched because they could not be parsed.
    pub skipped: Vec<String>,
    /// Pages that received at least one bundle.
    pub styled_pages: usize,
    /// Distinct `(media, hash)` styles.
    pub styles: usize,
    pub resolve: ResolveStats,
    pub bundles: usize,
    /// Artifact paths written (external mode).
    pub artifacts: Vec<String>,
    /// Local sources dropped from the file set.
    pub removed_sources: Vec<String>,
}

/// One html page carried through the run.
struct Page<D> {
    path: String,
    doc: D,
    bundles: Vec<PageBundle>,
}

/// Stylesheet packer, generic over transport and document backend.
pub struct Packer<F, D = TlDocument> {
    config: PackConfig,
    fetcher: Arc<F>,
    backend: PhantomData<fn() -> D>,
}

impl<F: Fetcher> Packer<F, TlDocument> {
    pub fn new(config: PackConfig, fetcher: Arc<F>) -> Self {
        Self::with_backend(config, fetcher)
    }
}

impl<F: Fetcher, D: StyleDocument> Packer<F, D> {
    /// Packer using a custom [`StyleDocument`] implementation.
    pub fn with_backend(config: PackConfig, fetcher: Arc<F>) -> Self {
        Self {
            config,
            fetcher,
            backend: PhantomData,
        }
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            source_dir: self.config.pack.source_dir.clone(),
            remote_scheme: self.config.pack.remote_scheme.clone(),
            remove_local_src: self.config.pack.remove_local_src,
        }
    }

    /// Pack every html page of `files`.
    ///
    /// Must be awaited inside a tokio runtime (remote fetches are spawned).
    pub async fn run(&self, files: &mut FileSet) -> Result<PackReport, PackError> {
        // Phase 1: scan every page, resolve or enqueue every style
        let (mut pages, skipped) = self.parse_pages(files);
        let mut resolver = StyleResolver::new(Arc::clone(&self.fetcher), self.resolve_options());
        let mut index = BundleIndex::new();
        {
            let source: &FileSet = files;
            let default_media = self.config.pack.default_media.as_str();
            for page in &mut pages {
                let styles = scan_document(&page.path, &mut page.doc, default_media, |style, hash| {
                    resolver.resolve(style, hash, source)
                });
                page.bundles = index.register(&page.path, &styles);
            }
        }
        let Resolved {
            mut registry,
            queue,
            consumed,
            stats,
        } = resolver.finish();

        // Barrier: nothing is bundled until every fetch has landed
        debug!("fetch"; "waiting on {} remote stylesheets", queue.issued());
        for fetched in queue.wait_all().await? {
            debug!("fetch"; "fetched \"{}\" ({} bytes)", fetched.url, fetched.content.len());
            registry.resolve(&fetched.media, fetched.hash, fetched.content);
        }

        // Phase 2: build every bundle exactly once
        let minifier = CssMinifier::new(&self.config.minify);
        let packed = index
            .bundles()
            .map(|(id, spec)| Ok((*id, pack_bundle(*id, spec, &registry, &minifier)?)))
            .collect::<Result<BTreeMap<BundleId, PackedBundle>, PackError>>()?;

        // Commit: from here on nothing can fail
        let writer = OutputWriter::new(&self.config);
        let mut artifacts = Vec::new();
        for bundle in packed.values() {
            debug!("pack"; "packed stylesheet \"{}\" used by {} pages", bundle.id, index.usage(&bundle.id).len());
            if let Some(path) = writer.emit(files, bundle) {
                artifacts.push(path);
            }
        }

        let mut styled_pages = 0;
        for page in &mut pages {
            for page_bundle in &page.bundles {
                if let Some(bundle) = packed.get(&page_bundle.id) {
                    writer.attach(&page.path, &mut page.doc, page_bundle, bundle);
                }
            }
            if !page.bundles.is_empty() {
                styled_pages += 1;
            }
            files.insert(page.path.clone(), page.doc.render());
        }

        let mut removed_sources = Vec::new();
        for key in consumed {
            if files.remove(&key).is_some() {
                debug!("pack"; "removed local source \"{}\"", key);
                removed_sources.push(key);
            }
        }

        Ok(PackReport {
            mode: writer.mode(),
            pages: pages.len(),
            skipped,
            styled_pages,
            styles: registry.len(),
            resolve: stats,
            bundles: packed.len(),
            artifacts,
            removed_sources,
        })
    }

    /// Parse every html page in parallel. Unparsable pages are skipped.
    fn parse_pages(&self, files: &FileSet) -> (Vec<Page<D>>, Vec<String>) {
        let parsed: Vec<(String, Result<D, String>)> = files
            .html_paths()
            .into_par_iter()
            .map(|path| {
                let result = parse_page::<D>(files, &path);
                (path, result)
            })
            .collect();

        let mut pages = Vec::with_capacity(parsed.len());
        let mut skipped = Vec::new();
        for (path, result) in parsed {
            match result {
                Ok(doc) => pages.push(Page {
                    path,
                    doc,
                    bundles: Vec::new(),
                }),
                Err(reason) => {
                    log!("warning"; "skipping \"{}\": {}", path, reason);
                    skipped.push(path);
                }
            }
        }
        (pages, skipped)
    }
}

fn parse_page<D: StyleDocument>(files: &FileSet, path: &str) -> Result<D, String> {
    let bytes = files.get(path).ok_or_else(|| "not in document set".to_string())?;
    let source = std::str::from_utf8(bytes).map_err(|e| format!("not valid UTF-8: {e}"))?;
    D::parse(source.to_string())
}
