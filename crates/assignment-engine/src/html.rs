//! HTML fragment parsing into an owned, walkable tree.
//!
//! The fragment is parsed as a full document (html5ever via `scraper`) and only the
//! children of `<body>` are kept, so stray `<title>` or `<meta>` tags in a description
//! never leak into rendered output. Comments, doctypes and processing instructions are
//! dropped; text and element nodes survive in document order.

use scraper::{ElementRef, Html, Node};

use crate::error::ContentError;

/// Maximum element nesting the walker will descend into.
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentNode {
    Text(String),
    Element {
        /// Lowercased tag name, e.g. "p", "strong"
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<ContentNode>,
    },
}

impl ContentNode {
    pub fn is_text(&self) -> bool {
        matches!(self, ContentNode::Text(_))
    }

    /// Tag name for elements, `None` for text.
    pub fn tag(&self) -> Option<&str> {
        match self {
            ContentNode::Element { tag, .. } => Some(tag),
            ContentNode::Text(_) => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            ContentNode::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str()),
            ContentNode::Text(_) => None,
        }
    }

    pub fn children(&self) -> &[ContentNode] {
        match self {
            ContentNode::Element { children, .. } => children,
            ContentNode::Text(_) => &[],
        }
    }

    /// Concatenated text of this node and all descendants, ignoring markup.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match self {
            ContentNode::Text(text) => out.push_str(text),
            ContentNode::Element { children, .. } => {
                for child in children {
                    child.push_text(out);
                }
            }
        }
    }

    fn collect_elements<'a>(&'a self, tag: &str, out: &mut Vec<&'a ContentNode>) {
        if self.tag() == Some(tag) {
            out.push(self);
        }
        for child in self.children() {
            child.collect_elements(tag, out);
        }
    }
}

/// The body content of a parsed HTML fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    nodes: Vec<ContentNode>,
}

impl Fragment {
    pub fn parse(html: &str) -> Result<Self, ContentError> {
        Self::parse_with_limit(html, DEFAULT_MAX_DEPTH)
    }

    pub fn parse_with_limit(html: &str, limit: usize) -> Result<Self, ContentError> {
        let document = Html::parse_document(html);
        let body = document
            .root_element()
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "body");

        let nodes = match body {
            Some(body) => convert_children(body, 1, limit)?,
            None => Vec::new(),
        };
        Ok(Self { nodes })
    }

    /// Top-level nodes of the body, in document order.
    pub fn nodes(&self) -> &[ContentNode] {
        &self.nodes
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.push_text(&mut out);
        }
        out
    }

    /// Every element with the given tag, depth-first in document order.
    pub fn elements_named(&self, tag: &str) -> Vec<&ContentNode> {
        let mut out = Vec::new();
        for node in &self.nodes {
            node.collect_elements(tag, &mut out);
        }
        out
    }
}

fn convert_children(
    element: ElementRef<'_>,
    depth: usize,
    limit: usize,
) -> Result<Vec<ContentNode>, ContentError> {
    if depth > limit {
        return Err(ContentError::NestingTooDeep { limit });
    }

    let mut nodes = Vec::new();
    for child in element.children() {
        match child.value() {
            Node::Text(text) => nodes.push(ContentNode::Text(text.to_string())),
            Node::Element(_) => {
                let Some(el) = ElementRef::wrap(child) else {
                    continue;
                };
                nodes.push(ContentNode::Element {
                    tag: el.value().name().to_ascii_lowercase(),
                    attrs: el
                        .value()
                        .attrs()
                        .map(|(key, value)| (key.to_string(), value.to_string()))
                        .collect(),
                    children: convert_children(el, depth + 1, limit)?,
                });
            }
            _ => {}
        }
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_body_children_in_order() {
        let fragment = Fragment::parse("<p>One</p>two<br><em>three</em>").unwrap();
        let tags: Vec<Option<&str>> = fragment.nodes().iter().map(ContentNode::tag).collect();
        assert_eq!(tags, vec![Some("p"), None, Some("br"), Some("em")]);
        assert!(fragment.nodes()[1].is_text());
        assert_eq!(fragment.text_content(), "Onetwothree");
    }

    #[test]
    fn head_only_markup_is_not_body_content() {
        let fragment = Fragment::parse("<title>Ignored</title><p>Kept</p>").unwrap();
        assert_eq!(fragment.text_content(), "Kept");
    }

    #[test]
    fn attributes_are_queryable() {
        let fragment = Fragment::parse(r#"<a HREF="https://example.com/x">x</a>"#).unwrap();
        let anchor = &fragment.nodes()[0];
        assert_eq!(anchor.attr("href"), Some("https://example.com/x"));
        assert_eq!(anchor.attr("title"), None);
    }

    #[test]
    fn comments_are_dropped() {
        let fragment = Fragment::parse("<p>a<!-- hidden -->b</p>").unwrap();
        assert_eq!(fragment.text_content(), "ab");
    }

    #[test]
    fn elements_named_walks_descendants() {
        let fragment =
            Fragment::parse(r#"<p><a href="1">a</a></p><div><span><a href="2">b</a></span></div>"#)
                .unwrap();
        let anchors = fragment.elements_named("a");
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[1].attr("href"), Some("2"));
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let html = format!("{}x{}", "<div>".repeat(10), "</div>".repeat(10));
        let err = Fragment::parse_with_limit(&html, 5).unwrap_err();
        assert!(matches!(err, ContentError::NestingTooDeep { limit: 5 }));
        assert!(Fragment::parse_with_limit(&html, 11).is_ok());
    }

    #[test]
    fn empty_input_has_no_nodes() {
        let fragment = Fragment::parse("").unwrap();
        assert!(fragment.nodes().is_empty());
    }
}
