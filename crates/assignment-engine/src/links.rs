use crate::error::ContentError;
use crate::html::Fragment;
use crate::model::Link;

/// Every anchor in the description, in document order.
///
/// Anchors without an `href` yield an empty href rather than being skipped.
pub fn extract_links(html: Option<&str>) -> Result<Vec<Link>, ContentError> {
    let Some(html) = html.filter(|h| !h.is_empty()) else {
        return Ok(Vec::new());
    };
    let fragment = Fragment::parse(html)?;
    Ok(fragment_links(&fragment))
}

pub(crate) fn fragment_links(fragment: &Fragment) -> Vec<Link> {
    fragment
        .elements_named("a")
        .into_iter()
        .map(|anchor| Link {
            text: anchor.text_content(),
            href: anchor.attr("href").unwrap_or_default().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_yields_no_links() {
        assert!(extract_links(None).unwrap().is_empty());
    }

    #[test]
    fn collects_text_and_href_in_order() {
        let html = r#"<p>See <a href="https://a.example/syllabus">the <em>syllabus</em></a>.</p>
<ul><li><a href="/files/12">Worksheet</a></li></ul>"#;
        let links = extract_links(Some(html)).unwrap();
        assert_eq!(
            links,
            vec![
                Link {
                    text: "the syllabus".to_string(),
                    href: "https://a.example/syllabus".to_string(),
                },
                Link {
                    text: "Worksheet".to_string(),
                    href: "/files/12".to_string(),
                },
            ]
        );
    }

    #[test]
    fn missing_href_and_text_become_empty() {
        let links = extract_links(Some(r#"<a name="top"></a><a href="">x</a>"#)).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].text, "");
        assert_eq!(links[0].href, "");
        assert_eq!(links[1].href, "");
    }

    #[test]
    fn malformed_href_is_passed_through() {
        let links = extract_links(Some(r#"<a href="ht!tp://[bad">bad</a>"#)).unwrap();
        assert_eq!(links[0].href, "ht!tp://[bad");
    }
}
