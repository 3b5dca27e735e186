//! Document editing capability used by the scanner and output writer.
//!
//! The packer never touches markup directly. It sees a page through
//! [`StyleDocument`]: the `<link>` and `<style>` elements in source order,
//! plus three edits (remove an element, strip one attribute, append a new
//! element to `<head>`). [`TlDocument`] implements it on top of `tl`; any
//! other HTML backend can be dropped in by implementing the trait.

mod document;
mod escape;

pub use document::TlDocument;
pub use escape::{escape_attr, escape_style_text};

/// Handle to a style element inside one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Which element a [`StyleNode`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleTag {
    Link,
    Style,
}

/// A `<link>` or `<style>` element as found in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleNode {
    pub id: NodeId,
    pub tag: StyleTag,
    /// Attributes in source order; names are lowercased.
    pub attrs: Vec<(String, Option<String>)>,
    /// Raw text between `<style>` and `</style>`; empty for links.
    pub content: String,
}

impl StyleNode {
    /// Attribute value; a bare attribute (`<style scoped>`) reads as `""`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    /// Render the element back to markup, leaving out `skip_attr`.
    pub fn render_without(&self, skip_attr: &str) -> String {
        let mut out = String::new();
        let name = match self.tag {
            StyleTag::Link => "link",
            StyleTag::Style => "style",
        };
        out.push('<');
        out.push_str(name);
        for (key, value) in &self.attrs {
            if key.eq_ignore_ascii_case(skip_attr) {
                continue;
            }
            out.push(' ');
            out.push_str(key);
            if let Some(value) = value {
                out.push_str("=\"");
                out.push_str(&escape_attr(value));
                out.push('"');
            }
        }
        out.push('>');
        if self.tag == StyleTag::Style {
            out.push_str(&self.content);
            out.push_str("</style>");
        }
        out
    }
}

/// Element appended to `<head>` by the output writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewElement {
    /// `<link media=.. rel="stylesheet" href=..>`
    Stylesheet { href: String, media: String },
    /// `<style media=..>content</style>`
    InlineStyle { media: String, content: String },
}

impl NewElement {
    pub fn to_html(&self) -> String {
        match self {
            Self::Stylesheet { href, media } => format!(
                r#"<link media="{}" rel="stylesheet" href="{}">"#,
                escape_attr(media),
                escape_attr(href)
            ),
            // Style content is raw text; only a literal close tag must not leak
            Self::InlineStyle { media, content } => format!(
                r#"<style media="{}">{}</style>"#,
                escape_attr(media),
                escape_style_text(content)
            ),
        }
    }
}

/// Editable view of one html page.
///
/// Edits are buffered and only materialize in [`StyleDocument::render`];
/// [`StyleDocument::style_nodes`] always reflects the parsed source.
pub trait StyleDocument: Sized + Send {
    /// Parse a page. Errors carry a human readable reason.
    fn parse(source: String) -> Result<Self, String>;

    /// Every `<link>` element followed by every `<style>` element, each
    /// group in source order.
    fn style_nodes(&self) -> &[StyleNode];

    /// Remove an element entirely.
    fn remove(&mut self, id: NodeId);

    /// Keep an element but drop one of its attributes.
    fn remove_attribute(&mut self, id: NodeId, name: &str);

    /// Append an element at the end of `<head>`.
    fn append_to_head(&mut self, element: NewElement);

    /// Serialize with all buffered edits applied.
    fn render(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(tag: StyleTag, attrs: &[(&str, Option<&str>)], content: &str) -> StyleNode {
        StyleNode {
            id: NodeId(0),
            tag,
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
                .collect(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_attr_lookup() {
        let n = node(
            StyleTag::Link,
            &[("rel", Some("stylesheet")), ("disabled", None)],
            "",
        );
        assert_eq!(n.attr("rel"), Some("stylesheet"));
        assert_eq!(n.attr("REL"), Some("stylesheet"));
        assert_eq!(n.attr("disabled"), Some(""));
        assert_eq!(n.attr("href"), None);
    }

    #[test]
    fn test_render_without_strips_one_attr() {
        let n = node(
            StyleTag::Link,
            &[
                ("rel", Some("stylesheet")),
                ("href", Some("/a.css")),
                ("data-packer", Some("exclude")),
            ],
            "",
        );
        assert_eq!(
            n.render_without("data-packer"),
            r#"<link rel="stylesheet" href="/a.css">"#
        );

        let s = node(StyleTag::Style, &[("data-packer", Some("exclude"))], "a{b:c}");
        assert_eq!(s.render_without("data-packer"), "<style>a{b:c}</style>");
    }

    #[test]
    fn test_new_element_html() {
        let link = NewElement::Stylesheet {
            href: "/assets/x.min.css".into(),
            media: "screen".into(),
        };
        assert_eq!(
            link.to_html(),
            r#"<link media="screen" rel="stylesheet" href="/assets/x.min.css">"#
        );

        let style = NewElement::InlineStyle {
            media: "print".into(),
            content: "a>b{color:red}".into(),
        };
        assert_eq!(
            style.to_html(),
            r#"<style media="print">a>b{color:red}</style>"#
        );
    }

    #[test]
    fn test_inline_style_close_tag_any_case() {
        let style = NewElement::InlineStyle {
            media: "screen".into(),
            content: "a{}</STYLE><script>x()</script>".into(),
        };
        assert_eq!(
            style.to_html(),
            r#"<style media="screen">a{}<\/STYLE><script>x()</script></style>"#
        );
    }
}
