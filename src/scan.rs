//! Document scanner: find, classify and consume a page's style declarations.
//!
//! A `<link>` counts when it has an `href`, `rel="stylesheet"` and no
//! `data-packer="exclude"`. A `<style>` counts when its `type` is absent or
//! `text/css` and it is not excluded. Recognized elements are removed from
//! the page immediately and their hash appended to the page's per-media list;
//! excluded elements only lose the marker attribute; anything else is left
//! alone.

use crate::debug;
use crate::hash::ContentHash;
use crate::html::{NodeId, StyleDocument, StyleNode, StyleTag};

/// Opt-out attribute and value.
pub const EXCLUDE_ATTR: &str = "data-packer";
pub const EXCLUDE_VALUE: &str = "exclude";

/// Accepted `type` for inline `<style>` blocks.
pub const STYLESHEET_MIME: &str = "text/css";

/// A recognized style declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleRef {
    Link { href: String, media: String },
    Inline { content: String, media: String },
}

impl StyleRef {
    pub fn media(&self) -> &str {
        match self {
            Self::Link { media, .. } | Self::Inline { media, .. } => media,
        }
    }

    /// Identity: the href for links, the literal text for inline blocks.
    pub fn hash(&self) -> ContentHash {
        match self {
            Self::Link { href, .. } => ContentHash::of(href),
            Self::Inline { content, .. } => ContentHash::of(content),
        }
    }

    /// Whether a linked stylesheet has to be fetched over the network.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Link { href, .. } if is_remote_href(href))
    }
}

/// Protocol-relative or absolute `http(s)` hrefs are remote.
pub fn is_remote_href(href: &str) -> bool {
    href.starts_with("//") || href.starts_with("http")
}

/// What the scanner does with one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    Style(StyleRef),
    Excluded,
    Unknown,
}

/// Classify a `<link>` or `<style>` element.
pub fn classify(node: &StyleNode, default_media: &str) -> Classified {
    if node.attr(EXCLUDE_ATTR) == Some(EXCLUDE_VALUE) {
        return Classified::Excluded;
    }
    let media = node.attr("media").unwrap_or(default_media).to_string();

    match node.tag {
        StyleTag::Link => match (node.attr("href"), node.attr("rel")) {
            (Some(href), Some("stylesheet")) if !href.is_empty() => Classified::Style(StyleRef::Link {
                href: href.to_string(),
                media,
            }),
            _ => Classified::Unknown,
        },
        StyleTag::Style => match node.attr("type") {
            None | Some(STYLESHEET_MIME) => Classified::Style(StyleRef::Inline {
                content: node.content.clone(),
                media,
            }),
            Some(_) => Classified::Unknown,
        },
    }
}

/// Per-media ordered style hashes of one page, media in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageStyleSet {
    groups: Vec<(String, Vec<ContentHash>)>,
}

impl PageStyleSet {
    pub fn push(&mut self, media: &str, hash: ContentHash) {
        match self.groups.iter_mut().find(|(m, _)| m == media) {
            Some((_, hashes)) => hashes.push(hash),
            None => self.groups.push((media.to_string(), vec![hash])),
        }
    }

    /// Non-empty `(media, hashes)` groups.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ContentHash])> {
        self.groups
            .iter()
            .filter(|(_, hashes)| !hashes.is_empty())
            .map(|(media, hashes)| (media.as_str(), hashes.as_slice()))
    }

    pub fn get(&self, media: &str) -> Option<&[ContentHash]> {
        self.groups
            .iter()
            .find(|(m, _)| m == media)
            .map(|(_, hashes)| hashes.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// Scan one page: classify every style element, hand recognized ones to
/// `resolve`, and record the page's style set.
///
/// Recognized elements are removed from `doc` as they are captured.
pub fn scan_document<D, R>(path: &str, doc: &mut D, default_media: &str, mut resolve: R) -> PageStyleSet
where
    D: StyleDocument,
    R: FnMut(&StyleRef, ContentHash),
{
    let nodes: Vec<(NodeId, StyleTag, Classified)> = doc
        .style_nodes()
        .iter()
        .map(|node| (node.id, node.tag, classify(node, default_media)))
        .collect();

    debug_counts(path, &nodes);

    let mut styles = PageStyleSet::default();
    for (id, tag, classified) in nodes {
        match classified {
            Classified::Style(style) => {
                let hash = style.hash();
                match &style {
                    StyleRef::Link { href, .. } if style.is_remote() => {
                        debug!("scan"; "+ remote stylesheet located at \"{}\"", href);
                    }
                    StyleRef::Link { href, .. } => {
                        debug!("scan"; "+ local stylesheet located at \"{}\"", href);
                    }
                    StyleRef::Inline { .. } => {
                        debug!("scan"; "+ inline stylesheet identified by \"{}\"", hash);
                    }
                }
                resolve(&style, hash);
                styles.push(style.media(), hash);
                doc.remove(id);
            }
            Classified::Excluded => {
                doc.remove_attribute(id, EXCLUDE_ATTR);
                debug!("scan"; "- skipping excluded <{}> tag in \"{}\"", tag_name(tag), path);
            }
            Classified::Unknown => {
                debug!("scan"; "- skipping unknown <{}> tag in \"{}\"", tag_name(tag), path);
            }
        }
    }
    styles
}

fn tag_name(tag: StyleTag) -> &'static str {
    match tag {
        StyleTag::Link => "link",
        StyleTag::Style => "style",
    }
}

fn debug_counts(path: &str, nodes: &[(NodeId, StyleTag, Classified)]) {
    let links = nodes.iter().filter(|(_, t, _)| *t == StyleTag::Link).count();
    debug!("scan"; "processing {} linked stylesheets in \"{}\"", links, path);
    debug!("scan"; "processing {} inline stylesheets in \"{}\"", nodes.len() - links, path);
}
