//! HTML to Markdown rendering for assignment descriptions.
//!
//! Each node kind has one rule and each element rule recurses into its own children.
//! Headings, emphasis and links use the flattened text of the element, so markup nested
//! inside them is reduced to plain text. Whitespace is only normalized once, after the
//! whole tree has been rendered.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ContentError;
use crate::html::{ContentNode, Fragment};
use crate::text::escape_currency;

static BLANK_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

pub fn to_markdown(html: &str) -> Result<String, ContentError> {
    let fragment = Fragment::parse(html)?;
    Ok(render_fragment(&fragment))
}

pub(crate) fn render_fragment(fragment: &Fragment) -> String {
    let rendered: String = fragment.nodes().iter().map(render_node).collect();
    BLANK_RUN_RE
        .replace_all(rendered.trim(), "\n\n")
        .into_owned()
}

fn render_node(node: &ContentNode) -> String {
    let (tag, children) = match node {
        ContentNode::Text(text) => return escape_currency(text).into_owned(),
        ContentNode::Element { tag, children, .. } => (tag.as_str(), children.as_slice()),
    };

    match tag {
        "h1" => format!("# {}\n\n", flattened(node)),
        "h2" => format!("## {}\n\n", flattened(node)),
        "h3" => format!("### {}\n\n", flattened(node)),
        "strong" | "b" => format!("**{}**", flattened(node)),
        "em" | "i" => format!("*{}*", flattened(node)),
        "ul" => render_list(children, |_| "- ".to_string()),
        "ol" => render_list(children, |index| format!("{}. ", index + 1)),
        "li" => render_list_item(node),
        "p" => format!("{}\n\n", render_children(children)),
        "br" => "\n".to_string(),
        "a" => match node.attr("href").filter(|href| !href.is_empty()) {
            Some(href) => format!("[{}]({href})", flattened(node)),
            None => flattened(node),
        },
        _ => render_children(children),
    }
}

fn render_children(children: &[ContentNode]) -> String {
    children.iter().map(render_node).collect()
}

fn render_list_item(node: &ContentNode) -> String {
    render_children(node.children()).trim().to_string()
}

/// Element children only; whitespace text between items does not become an entry.
fn render_list(children: &[ContentNode], marker: impl Fn(usize) -> String) -> String {
    let items: Vec<String> = children
        .iter()
        .filter(|child| !child.is_text())
        .enumerate()
        .map(|(index, child)| format!("{}{}", marker(index), render_list_item(child)))
        .collect();
    format!("{}\n\n", items.join("\n"))
}

fn flattened(node: &ContentNode) -> String {
    escape_currency(&node.text_content()).into_owned()
}
