// src/sources/markup.rs
//! Selector and link helpers shared by the HTML adapters.

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

use crate::job::canonical_url;
use crate::text::{element_text_inline, element_text_lines};

/// Parses a selector list that is known-good at compile time.
pub(crate) fn selector(css: &str) -> Selector {
    match Selector::parse(css) {
        Ok(s) => s,
        Err(e) => panic!("invalid built-in selector {css:?}: {e:?}"),
    }
}

/// First matching element's text on one line, if non-empty.
pub fn first_inline(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .map(element_text_inline)
        .find(|t| !t.is_empty())
}

/// First matching element's text with line breaks kept, if non-empty.
pub fn first_block(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .map(element_text_lines)
        .find(|t| !t.is_empty())
}

/// Resolves `href` against `base`, keeping only http(s) targets.
pub fn absolutize(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    let u = base.join(href).ok()?;
    matches!(u.scheme(), "http" | "https").then_some(u)
}

/// Collects distinct absolute links matched by `sel`, in document order,
/// keeping those accepted by `keep`.
pub fn collect_links<F>(html: &str, base: &Url, sel: &Selector, keep: F) -> Vec<String>
where
    F: Fn(&Url) -> bool,
{
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for a in doc.select(sel) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let Some(u) = absolutize(base, href) else {
            continue;
        };
        if !keep(&u) {
            continue;
        }
        let canon = canonical_url(u.as_str());
        if seen.insert(canon.clone()) {
            out.push(canon);
        }
    }
    out
}

/// Replaces HTML named entities that are not valid XML so feeds parse.
pub fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
