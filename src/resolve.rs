//! Style resolver: turn a recognized style into registry content.
//!
//! | Kind   | Source                                              |
//! |--------|-----------------------------------------------------|
//! | inline | literal `<style>` text, synchronous                 |
//! | local  | filesystem under the source dir, then the file set  |
//! | remote | enqueued on the [`FetchQueue`], filled after barrier |
//!
//! Every path reserves its registry slot first, so each `(media, hash)` is
//! read or fetched at most once per run.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::fetch::{FetchQueue, Fetcher, remote_url};
use crate::files::FileSet;
use crate::hash::ContentHash;
use crate::registry::StyleRegistry;
use crate::scan::StyleRef;
use crate::{debug, log};

/// Resolver settings taken from the run configuration.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Filesystem root for local hrefs; `None` skips the filesystem lookup.
    pub source_dir: Option<PathBuf>,
    /// Scheme prepended to protocol-relative hrefs.
    pub remote_scheme: String,
    /// Delete file-set stylesheets once their content is captured.
    pub remove_local_src: bool,
}

/// Where a local stylesheet was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalSource {
    Filesystem(PathBuf),
    /// Key in the in-memory file set.
    Document(String),
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub inline: usize,
    pub local: usize,
    pub remote: usize,
    pub missing: usize,
    /// References that hit an existing slot.
    pub reused: usize,
}

pub struct StyleResolver<F> {
    registry: StyleRegistry,
    queue: FetchQueue<F>,
    options: ResolveOptions,
    consumed: Vec<String>,
    stats: ResolveStats,
}

/// Everything the resolver accumulated during scanning.
pub struct Resolved<F> {
    pub registry: StyleRegistry,
    pub queue: FetchQueue<F>,
    /// File-set keys to delete when the run commits.
    pub consumed: Vec<String>,
    pub stats: ResolveStats,
}

impl<F: Fetcher> StyleResolver<F> {
    pub fn new(fetcher: Arc<F>, options: ResolveOptions) -> Self {
        Self {
            registry: StyleRegistry::new(),
            queue: FetchQueue::new(fetcher),
            options,
            consumed: Vec::new(),
            stats: ResolveStats::default(),
        }
    }

    /// Resolve `style` into the registry, or schedule it.
    ///
    /// Never fails: a local miss is logged and recorded as missing.
    pub fn resolve(&mut self, style: &StyleRef, hash: ContentHash, files: &FileSet) {
        let media = style.media();
        if !self.registry.reserve(media, hash).is_first() {
            self.stats.reused += 1;
            return;
        }

        match style {
            StyleRef::Inline { content, .. } => {
                debug!("resolve"; "+-->  processing inline stylesheet identified by \"{}\"", hash);
                self.registry.resolve(media, hash, content.clone());
                self.stats.inline += 1;
            }
            StyleRef::Link { href, .. } if style.is_remote() => {
                debug!("resolve"; "+-->  processing remote style located at \"{}\"", href);
                let url = remote_url(href, &self.options.remote_scheme);
                self.queue.enqueue(url, media.to_string(), hash);
                self.stats.remote += 1;
            }
            StyleRef::Link { href, .. } => {
                debug!("resolve"; "+-->  processing local stylesheet located at \"{}\"", href);
                self.resolve_local(href, media, hash, files);
            }
        }
    }

    fn resolve_local(&mut self, href: &str, media: &str, hash: ContentHash, files: &FileSet) {
        match read_local(href, self.options.source_dir.as_deref(), files) {
            Some((content, source)) => {
                if let LocalSource::Document(key) = source
                    && self.options.remove_local_src
                {
                    self.consumed.push(key);
                }
                self.registry.resolve(media, hash, content);
                self.stats.local += 1;
            }
            None => {
                let shown = self
                    .options
                    .source_dir
                    .as_deref()
                    .and_then(|dir| local_path(dir, href))
                    .map_or_else(|| href.to_string(), |path| path.display().to_string());
                log!("warning"; "file missing: {}", shown);
                self.registry.mark_missing(media, hash);
                self.stats.missing += 1;
            }
        }
    }

    /// Stop scanning and hand over the accumulated state.
    pub fn finish(self) -> Resolved<F> {
        Resolved {
            registry: self.registry,
            queue: self.queue,
            consumed: self.consumed,
            stats: self.stats,
        }
    }
}

/// Strip query string and fragment from an href.
fn href_path(href: &str) -> &str {
    href.split(['?', '#']).next().unwrap_or(href)
}

/// Filesystem location of a local href under `source_dir`.
///
/// `None` when the href climbs out with a `..` segment.
pub fn local_path(source_dir: &Path, href: &str) -> Option<PathBuf> {
    let mut path = source_dir.to_path_buf();
    for part in href_path(href).split('/') {
        match part {
            "" | "." => {}
            ".." => return None,
            part => path.push(part),
        }
    }
    Some(path)
}

/// File-set key of a local href (leading `/` dropped).
pub fn document_key(href: &str) -> &str {
    let path = href_path(href);
    path.strip_prefix('/').unwrap_or(path)
}

/// Read a local stylesheet: filesystem first, then the in-memory file set.
pub fn read_local(
    href: &str,
    source_dir: Option<&Path>,
    files: &FileSet,
) -> Option<(String, LocalSource)> {
    if let Some(path) = source_dir.and_then(|dir| local_path(dir, href)) {
        if path.is_file() {
            match fs::read(&path) {
                Ok(bytes) => {
                    let content = String::from_utf8_lossy(&bytes).into_owned();
                    return Some((content, LocalSource::Filesystem(path)));
                }
                Err(err) => {
                    log!("warning"; "cannot read {}: {}", path.display(), err);
                }
            }
        }
    }

    let key = document_key(href);
    let bytes = files.get(key)?;
    let content = String::from_utf8_lossy(bytes).into_owned();
    Some((content, LocalSource::Document(key.to_string())))
}
