//! Plain-text extraction from assignment descriptions.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ContentError;
use crate::html::Fragment;

static CURRENCY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("valid regex"));

/// Prefix every `$` that is followed by digits with a backslash, so Markdown and LaTeX
/// renderers downstream read "$20" as an amount rather than math or template syntax.
pub fn escape_currency(text: &str) -> Cow<'_, str> {
    CURRENCY_RE.replace_all(text, r"\$$${1}")
}

/// Text content of an HTML description with currency amounts escaped.
///
/// `None` and the empty string both yield an empty string. Whitespace from the source
/// markup is preserved verbatim.
pub fn to_plain_text(html: Option<&str>) -> Result<String, ContentError> {
    let Some(html) = html.filter(|h| !h.is_empty()) else {
        return Ok(String::new());
    };
    let fragment = Fragment::parse(html)?;
    Ok(fragment_plain_text(&fragment))
}

pub(crate) fn fragment_plain_text(fragment: &Fragment) -> String {
    escape_currency(&fragment.text_content()).into_owned()
}
