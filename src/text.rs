// src/text.rs
//! Text cleanup shared by the adapters.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Single-line cleanup for titles, company names and locations:
/// decode entities, normalize typographic quotes, collapse whitespace.
pub fn clean_inline(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);
    let out = decoded
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace('\u{00A0}', " ");
    RE_WS.replace_all(&out, " ").trim().to_string()
}

/// Converts an HTML fragment into plain text, one text run per line.
pub fn html_to_text(html: &str) -> String {
    let frag = Html::parse_fragment(html);
    join_text_lines(frag.root_element())
}

/// Text content of an element with runs joined by newlines and blank runs dropped.
pub fn element_text_lines(el: ElementRef<'_>) -> String {
    join_text_lines(el)
}

/// Text content of an element collapsed onto one line.
pub fn element_text_inline(el: ElementRef<'_>) -> String {
    let raw: String = el.text().collect::<Vec<_>>().join(" ");
    clean_inline(&raw)
}

fn join_text_lines(el: ElementRef<'_>) -> String {
    el.text()
        .map(clean_inline)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncates to at most `max` characters (not bytes).
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
