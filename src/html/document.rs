//! `tl`-backed [`StyleDocument`].
//!
//! `tl` is zero-copy: every tag's raw bytes are a slice of the input, so
//! each element's byte span can be recovered from pointer offsets. The
//! document keeps the source string plus a list of span edits, and splices
//! them in a single pass on render.
//!
//! `tl` tokenizes `<script>` and `<style>` bodies as markup. Raw text regions
//! are therefore located in the source first: any tag `tl` reports inside
//! one is ignored, and `<style>` spans and content come from the source.

use std::collections::BTreeMap;

use super::escape::unescape;
use super::{NewElement, NodeId, StyleDocument, StyleNode, StyleTag};

/// Byte range `[start, end)` of an element in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
}

/// Elements whose body is text, not markup.
const RAW_TEXT_TAGS: [&str; 5] = ["script", "style", "template", "textarea", "title"];

/// A raw text element (or comment) and its inert body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawText {
    element: Span,
    body: Span,
}

/// An html page parsed with `tl`, with buffered style edits.
#[derive(Debug, Clone)]
pub struct TlDocument {
    source: String,
    nodes: Vec<StyleNode>,
    spans: Vec<Span>,
    /// Byte offset where appended elements go (before `</head>`).
    head_insert: usize,
    /// Replacement text per node; empty string removes the node.
    replaced: BTreeMap<NodeId, String>,
    appended: Vec<String>,
}

impl StyleDocument for TlDocument {
    fn parse(source: String) -> Result<Self, String> {
        let raw_text = raw_text_regions(&source);
        let (nodes, spans, head_insert) = {
            let dom = tl::parse(&source, tl::ParserOptions::default())
                .map_err(|e| format!("{e:?}"))?;

            let mut links = Vec::new();
            let mut styles = Vec::new();
            let mut head = None;

            for node in dom.nodes() {
                let Some(tag) = node.as_tag() else {
                    continue;
                };
                let Some(span) = span_of(&source, tag.raw().as_bytes()) else {
                    continue;
                };
                if in_raw_text(&raw_text, span.start) {
                    continue;
                }

                let name = tag.name().as_utf8_str();
                let (kind, span, content) = if name.eq_ignore_ascii_case("link") {
                    (StyleTag::Link, span, String::new())
                } else if name.eq_ignore_ascii_case("style") {
                    let Ok(i) = raw_text.binary_search_by_key(&span.start, |r| r.element.start)
                    else {
                        continue;
                    };
                    let region = raw_text[i];
                    let content = source[region.body.start..region.body.end].to_string();
                    (StyleTag::Style, region.element, content)
                } else {
                    if head.is_none() && name.eq_ignore_ascii_case("head") {
                        head = Some(span);
                    }
                    continue;
                };

                let attrs = tag
                    .attributes()
                    .iter()
                    .map(|(key, value)| {
                        let key: &str = key.as_ref();
                        (
                            key.to_ascii_lowercase(),
                            value.map(|v| unescape(v.as_ref()).into_owned()),
                        )
                    })
                    .collect();

                let entry = (span, kind, attrs, content);
                match kind {
                    StyleTag::Link => links.push(entry),
                    StyleTag::Style => styles.push(entry),
                }
            }

            // Links first, then styles; each group in source order
            links.sort_by_key(|(span, ..)| span.start);
            styles.sort_by_key(|(span, ..)| span.start);

            let mut nodes = Vec::with_capacity(links.len() + styles.len());
            let mut spans = Vec::with_capacity(nodes.capacity());
            for (i, (span, tag, attrs, content)) in links.into_iter().chain(styles).enumerate() {
                nodes.push(StyleNode {
                    id: NodeId(i),
                    tag,
                    attrs,
                    content,
                });
                spans.push(span);
            }

            let head_insert = head.map_or(0, |span| head_close_offset(&source, &raw_text, span));
            (nodes, spans, head_insert)
        };

        Ok(Self {
            source,
            nodes,
            spans,
            head_insert,
            replaced: BTreeMap::new(),
            appended: Vec::new(),
        })
    }

    fn style_nodes(&self) -> &[StyleNode] {
        &self.nodes
    }

    fn remove(&mut self, id: NodeId) {
        if id.0 < self.nodes.len() {
            self.replaced.insert(id, String::new());
        }
    }

    fn remove_attribute(&mut self, id: NodeId, name: &str) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        if node.attr(name).is_some() {
            self.replaced.insert(id, node.render_without(name));
        }
    }

    fn append_to_head(&mut self, element: NewElement) {
        self.appended.push(element.to_html());
    }

    fn render(&self) -> String {
        let mut edits: Vec<(Span, &str)> = self
            .replaced
            .iter()
            .map(|(id, text)| (self.spans[id.0], text.as_str()))
            .collect();
        let insert = Span {
            start: self.head_insert,
            end: self.head_insert,
        };
        edits.extend(self.appended.iter().map(|html| (insert, html.as_str())));
        // Stable: insertions keep their append order
        edits.sort_by_key(|(span, _)| (span.start, span.end));

        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for (span, text) in edits {
            if span.start < cursor {
                // Overlapping edit, keep what was already emitted
                continue;
            }
            out.push_str(&self.source[cursor..span.start]);
            out.push_str(text);
            cursor = span.end;
        }
        out.push_str(&self.source[cursor..]);
        out
    }
}

/// Recover the byte span of a `tl` slice inside `source`.
fn span_of(source: &str, raw: &[u8]) -> Option<Span> {
    let base = source.as_ptr() as usize;
    let start = (raw.as_ptr() as usize).checked_sub(base)?;
    let end = start.checked_add(raw.len())?;
    (end <= source.len() && source.is_char_boundary(start) && source.is_char_boundary(end))
        .then_some(Span { start, end })
}

/// Offset of the first `</head>` close tag after the head opens, skipping
/// raw text. Falls back to the end of `tl`'s head span.
fn head_close_offset(source: &str, raw_text: &[RawText], head: Span) -> usize {
    let lower = source.to_ascii_lowercase();
    lower[head.start..]
        .match_indices("</head")
        .map(|(i, _)| head.start + i)
        .find(|&pos| {
            let next = lower.as_bytes().get(pos + "</head".len());
            next.is_none_or(|b| b.is_ascii_whitespace() || *b == b'>' || *b == b'/')
                && !in_raw_text(raw_text, pos)
        })
        .unwrap_or(head.end)
}

/// Locate comments and raw text element bodies, in source order.
///
/// A raw text body runs from the end of its opening tag to the next
/// case-insensitive `</name`, as html tokenizers do.
fn raw_text_regions(source: &str) -> Vec<RawText> {
    let lower = source.to_ascii_lowercase();
    let bytes = lower.as_bytes();
    let mut regions = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = lower[cursor..].find('<') {
        let start = cursor + offset;
        let rest = &lower[start..];

        if let Some(comment) = rest.strip_prefix("<!--") {
            let end = comment.find("-->").map_or(lower.len(), |i| start + 4 + i + 3);
            let span = Span { start, end };
            regions.push(RawText {
                element: span,
                body: span,
            });
            cursor = end;
            continue;
        }

        let name = RAW_TEXT_TAGS.iter().find(|name| {
            rest[1..].starts_with(**name)
                && bytes
                    .get(start + 1 + name.len())
                    .is_some_and(|b| b.is_ascii_whitespace() || *b == b'>' || *b == b'/')
        });
        let Some(name) = name else {
            cursor = start + 1;
            continue;
        };
        let Some(open_end) = tag_end(bytes, start) else {
            break;
        };

        let close = format!("</{name}");
        let body_end = lower[open_end..]
            .find(&close)
            .map_or(lower.len(), |i| open_end + i);
        let end = lower[body_end..]
            .find('>')
            .map_or(lower.len(), |i| body_end + i + 1);
        regions.push(RawText {
            element: Span { start, end },
            body: Span {
                start: open_end,
                end: body_end,
            },
        });
        cursor = end;
    }
    regions
}

/// Offset just past the `>` closing the tag opened at `start`.
fn tag_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut quote = None;
    for (i, &b) in bytes.iter().enumerate().skip(start + 1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(i + 1),
            None => {}
        }
    }
    None
}

/// Whether `pos` falls inside a comment or raw text body.
fn in_raw_text(regions: &[RawText], pos: usize) -> bool {
    let idx = regions.partition_point(|r| r.body.start <= pos);
    idx > 0 && pos < regions[idx - 1].body.end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> TlDocument {
        TlDocument::parse(html.to_string()).unwrap()
    }

    const PAGE: &str = r#"<!DOCTYPE html><html><head><title>t</title><style>b{c:d}</style><link rel="stylesheet" href="/a.css"><link rel="icon" href="/f.ico"></head><body><style media="print">p{x:y}</style></body></html>"#;

    #[test]
    fn test_nodes_links_before_styles() {
        let doc = parse(PAGE);
        let nodes = doc.style_nodes();
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[0].tag, StyleTag::Link);
        assert_eq!(nodes[0].attr("href"), Some("/a.css"));
        assert_eq!(nodes[1].attr("rel"), Some("icon"));
        assert_eq!(nodes[2].tag, StyleTag::Style);
        assert_eq!(nodes[2].content, "b{c:d}");
        assert_eq!(nodes[3].attr("media"), Some("print"));
        assert_eq!(nodes[3].content, "p{x:y}");
    }

    #[test]
    fn test_render_without_edits_is_identity() {
        assert_eq!(parse(PAGE).render(), PAGE);
    }

    #[test]
    fn test_remove_and_append() {
        let mut doc = parse(PAGE);
        doc.remove(NodeId(0));
        doc.remove(NodeId(2));
        doc.remove(NodeId(3));
        doc.append_to_head(NewElement::Stylesheet {
            href: "/x.min.css".into(),
            media: "screen".into(),
        });
        assert_eq!(
            doc.render(),
            r#"<!DOCTYPE html><html><head><title>t</title><link rel="icon" href="/f.ico"><link media="screen" rel="stylesheet" href="/x.min.css"></head><body></body></html>"#
        );
    }

    #[test]
    fn test_appends_keep_order() {
        let mut doc = parse("<html><head></head><body></body></html>");
        doc.append_to_head(NewElement::InlineStyle {
            media: "screen".into(),
            content: "a{}".into(),
        });
        doc.append_to_head(NewElement::InlineStyle {
            media: "print".into(),
            content: "b{}".into(),
        });
        assert_eq!(
            doc.render(),
            r#"<html><head><style media="screen">a{}</style><style media="print">b{}</style></head><body></body></html>"#
        );
    }

    #[test]
    fn test_remove_attribute() {
        let mut doc =
            parse(r#"<head><link rel="stylesheet" href="/a.css" data-packer="exclude"></head>"#);
        doc.remove_attribute(NodeId(0), "data-packer");
        assert_eq!(
            doc.render(),
            r#"<head><link rel="stylesheet" href="/a.css"></head>"#
        );
    }

    #[test]
    fn test_remove_attribute_absent_is_noop() {
        let html = r#"<head><link rel="stylesheet" href="/a.css"></head>"#;
        let mut doc = parse(html);
        doc.remove_attribute(NodeId(0), "data-packer");
        assert_eq!(doc.render(), html);
    }

    #[test]
    fn test_no_head_appends_at_start() {
        let mut doc = parse("<p>hi</p>");
        doc.append_to_head(NewElement::Stylesheet {
            href: "/x.css".into(),
            media: "screen".into(),
        });
        assert_eq!(
            doc.render(),
            r#"<link media="screen" rel="stylesheet" href="/x.css"><p>hi</p>"#
        );
    }

    #[test]
    fn test_attribute_entities_decoded() {
        let doc = parse(r#"<link rel="stylesheet" href="/a.css?v=1&amp;b=2">"#);
        assert_eq!(doc.style_nodes()[0].attr("href"), Some("/a.css?v=1&b=2"));
    }

    #[test]
    fn test_style_inside_script_string_ignored() {
        let html = r#"<html><head><script>document.write('<style>x{color:red}</style>');</script></head></html>"#;
        let doc = parse(html);
        assert!(doc.style_nodes().is_empty());
        assert_eq!(doc.render(), html);
    }

    #[test]
    fn test_style_content_is_raw_text() {
        let html = r#"<head><style>a[title="<b>"]{color:red}</style><link rel="stylesheet" href="/a.css"></head><body></body>"#;
        let mut doc = parse(html);
        let nodes = doc.style_nodes();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].attr("href"), Some("/a.css"));
        assert_eq!(nodes[1].tag, StyleTag::Style);
        assert_eq!(nodes[1].content, r#"a[title="<b>"]{color:red}"#);

        doc.remove(NodeId(1));
        assert_eq!(
            doc.render(),
            r#"<head><link rel="stylesheet" href="/a.css"></head><body></body>"#
        );
    }

    #[test]
    fn test_links_inside_comments_ignored() {
        let html = concat!(
            r#"<head><style>/* <link rel="stylesheet" href="/x.css"> */a{}</style>"#,
            r#"<!-- <link rel="stylesheet" href="/y.css"> --></head>"#,
        );
        let doc = parse(html);
        let nodes = doc.style_nodes();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].tag, StyleTag::Style);
        assert_eq!(nodes[0].content, r#"/* <link rel="stylesheet" href="/x.css"> */a{}"#);
    }

    #[test]
    fn test_uppercase_style_element() {
        let doc = parse("<HEAD><STYLE media=print>a{}</STYLE></HEAD>");
        let nodes = doc.style_nodes();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].content, "a{}");
        assert_eq!(nodes[0].attr("media"), Some("print"));
    }

    #[test]
    fn test_head_close_inside_script_skipped() {
        let mut doc = parse(r#"<head><script>var s = "</head>";</script></head><body></body>"#);
        doc.append_to_head(NewElement::Stylesheet {
            href: "/x.css".into(),
            media: "screen".into(),
        });
        assert_eq!(
            doc.render(),
            r#"<head><script>var s = "</head>";</script><link media="screen" rel="stylesheet" href="/x.css"></head><body></body>"#
        );
    }

    #[test]
    fn test_raw_text_regions() {
        let source = r#"<!-- c --><style a=">">x</STYLE ><p></p><script>y"#;
        let regions = raw_text_regions(source);
        assert_eq!(regions.len(), 3);
        assert_eq!(&source[regions[0].body.start..regions[0].body.end], "<!-- c -->");
        assert_eq!(&source[regions[1].body.start..regions[1].body.end], "x");
        assert_eq!(
            &source[regions[1].element.start..regions[1].element.end],
            r#"<style a=">">x</STYLE >"#
        );
        // Unterminated body runs to the end
        assert_eq!(&source[regions[2].body.start..regions[2].body.end], "y");
        assert!(in_raw_text(&regions, source.find('x').unwrap()));
        assert!(!in_raw_text(&regions, source.find("<p>").unwrap()));
    }
}
