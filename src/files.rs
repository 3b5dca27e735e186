//! In-memory document set for one pack run.
//!
//! Keys are forward-slash paths relative to the site root (`posts/a.html`,
//! `css/main.css`), values are raw file bytes. The packer reads html pages
//! and local stylesheets from here, and writes rewritten pages and packed
//! bundles back.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jwalk::WalkDir;

/// Path → content map, ordered by path so every run visits pages identically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: BTreeMap<String, Vec<u8>>,
    /// Paths removed since load (so `write` can delete them on disk).
    removed: Vec<String>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every regular file under `root`.
    pub fn load(root: &Path) -> Result<Self> {
        let mut set = Self::new();
        for entry in WalkDir::new(root).sort(true) {
            let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Some(key) = relative_key(root, &path) else {
                continue;
            };
            let content =
                fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
            set.files.insert(key, content);
        }
        Ok(set)
    }

    /// Write every entry under `root`, creating parent directories.
    pub fn write(&self, root: &Path) -> Result<usize> {
        for (key, content) in &self.files {
            let path = key_to_path(root, key);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(&path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        Ok(self.files.len())
    }

    /// Delete entries removed during the run from `root`.
    ///
    /// Only meaningful when `root` is the directory the set was loaded from.
    pub fn prune(&self, root: &Path) -> Result<usize> {
        let mut deleted = 0;
        for key in &self.removed {
            let path = key_to_path(root, key);
            if path.is_file() {
                fs::remove_file(&path)
                    .with_context(|| format!("failed to remove {}", path.display()))?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) {
        let path = path.into();
        self.removed.retain(|p| *p != path);
        self.files.insert(path, content.into());
    }

    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        let content = self.files.remove(path)?;
        self.removed.push(path.to_string());
        Some(content)
    }

    /// Paths of every `.html` entry, in path order.
    pub fn html_paths(&self) -> Vec<String> {
        self.files
            .keys()
            .filter(|p| p.ends_with(".html"))
            .cloned()
            .collect()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<K: Into<String>, V: Into<Vec<u8>>> FromIterator<(K, V)> for FileSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// Convert an on-disk path to a forward-slash key relative to `root`.
fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

fn key_to_path(root: &Path, key: &str) -> PathBuf {
    key.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
}
