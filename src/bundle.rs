//! Bundle identity and usage.
//!
//! A bundle is one media value plus an ordered list of style hashes. Its id
//! is a hash over exactly that, so every page with the same ordered styles
//! under the same media lands on the same bundle and the same artifact.

use std::collections::BTreeMap;
use std::fmt;

use crate::debug;
use crate::hash::ContentHash;
use crate::scan::PageStyleSet;

/// Deterministic bundle fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BundleId(ContentHash);

impl BundleId {
    /// Build the id of `styles` under `media`. Order matters.
    pub fn build(media: &str, styles: &[ContentHash]) -> Self {
        let parts = std::iter::once(media.as_bytes())
            .chain(styles.iter().map(|hash| hash.as_bytes().as_slice()));
        Self(ContentHash::of_parts(parts, b"\0"))
    }

    pub fn to_hex(self) -> String {
        self.0.to_hex()
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// What goes into one bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleSpec {
    pub media: String,
    pub styles: Vec<ContentHash>,
}

/// A page's share of the index: one bundle per non-empty media group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBundle {
    pub media: String,
    pub id: BundleId,
}

/// Every bundle of a run and the pages consuming it.
#[derive(Debug, Default)]
pub struct BundleIndex {
    bundles: BTreeMap<BundleId, BundleSpec>,
    usage: BTreeMap<BundleId, Vec<String>>,
}

impl BundleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page's style set; returns its bundles in media order.
    pub fn register(&mut self, page: &str, styles: &PageStyleSet) -> Vec<PageBundle> {
        styles
            .iter()
            .map(|(media, hashes)| {
                let id = BundleId::build(media, hashes);
                self.bundles.entry(id).or_insert_with(|| BundleSpec {
                    media: media.to_string(),
                    styles: hashes.to_vec(),
                });
                self.usage.entry(id).or_default().push(page.to_string());
                debug!("bundle"; "register usage of packed style \"{}\" (media: \"{}\") for \"{}\"", id, media, page);
                PageBundle {
                    media: media.to_string(),
                    id,
                }
            })
            .collect()
    }

    pub fn bundles(&self) -> impl Iterator<Item = (&BundleId, &BundleSpec)> {
        self.bundles.iter()
    }

    pub fn get(&self, id: &BundleId) -> Option<&BundleSpec> {
        self.bundles.get(id)
    }

    /// Pages using `id`, in registration order.
    pub fn usage(&self, id: &BundleId) -> &[String] {
        self.usage.get(id).map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashes(items: &[&str]) -> Vec<ContentHash> {
        items.iter().map(ContentHash::of).collect()
    }

    fn page_set(groups: &[(&str, &[&str])]) -> PageStyleSet {
        let mut set = PageStyleSet::default();
        for (media, items) in groups {
            for item in *items {
                set.push(media, ContentHash::of(item));
            }
        }
        set
    }

    #[test]
    fn test_id_deterministic_and_order_sensitive() {
        let ab = hashes(&["a", "b"]);
        let ba = hashes(&["b", "a"]);
        assert_eq!(BundleId::build("screen", &ab), BundleId::build("screen", &ab));
        assert_ne!(BundleId::build("screen", &ab), BundleId::build("screen", &ba));
    }

    #[test]
    fn test_id_depends_on_media() {
        let ab = hashes(&["a", "b"]);
        assert_ne!(BundleId::build("screen", &ab), BundleId::build("print", &ab));
    }

    #[test]
    fn test_identical_pages_share_bundle() {
        let mut index = BundleIndex::new();
        let set = page_set(&[("screen", &["/css/a.css", "body{color:red}"])]);

        let a = index.register("a.html", &set);
        let b = index.register("b.html", &set);

        assert_eq!(a, b);
        assert_eq!(index.len(), 1);
        assert_eq!(index.usage(&a[0].id), ["a.html", "b.html"]);
        assert_eq!(index.get(&a[0].id).unwrap().styles.len(), 2);
    }

    #[test]
    fn test_one_bundle_per_media_group() {
        let mut index = BundleIndex::new();
        let set = page_set(&[("screen", &["a"]), ("print", &["p"])]);
        let bundles = index.register("a.html", &set);

        let media: Vec<_> = bundles.iter().map(|b| b.media.as_str()).collect();
        assert_eq!(media, ["screen", "print"]);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_empty_set_registers_nothing() {
        let mut index = BundleIndex::new();
        assert!(index.register("a.html", &PageStyleSet::default()).is_empty());
        assert!(index.is_empty());
    }
}
