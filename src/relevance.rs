// src/relevance.rs
//! Enumeration-time relevance gate. General-purpose boards carry far more
//! postings than the L&D niche; adapters drop everything that does not
//! mention one of the curated phrases before it ever reaches parsing.

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevanceFilter {
    keywords: Vec<String>,
}

impl RelevanceFilter {
    /// Phrases are lowercased, trimmed and de-duplicated; order is kept.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for k in keywords {
            let k = k.as_ref().trim().to_lowercase();
            if !k.is_empty() && !out.contains(&k) {
                out.push(k);
            }
        }
        Self { keywords: out }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Substring match of any phrase against the lowercased text.
    pub fn matched<'a>(&'a self, text: &str) -> Option<&'a str> {
        let text = text.to_lowercase();
        self.keywords
            .iter()
            .find(|k| text.contains(k.as_str()))
            .map(String::as_str)
    }

    pub fn is_relevant(&self, text: &str) -> bool {
        match self.matched(text) {
            Some(k) => {
                debug!(target: "relevance", keyword = k, "kept");
                true
            }
            None => false,
        }
    }
}

impl Default for RelevanceFilter {
    fn default() -> Self {
        Self::new(crate::config::keywords::DEFAULT_RELEVANCE_KEYWORDS)
    }
}
