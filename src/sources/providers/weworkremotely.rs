// src/sources/providers/weworkremotely.rs
//! We Work Remotely: public RSS feed. Feed items carry everything a record
//! needs, so detail pages are only parsed for URLs the feed did not cover.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use quick_xml::de::from_str;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::classify::LocationType;
use crate::fetch::PageFetcher;
use crate::job::{canonical_url, JobDraft, JobRecord};
use crate::sources::markup::{first_block, first_inline, scrub_html_entities_for_xml, selector};
use crate::sources::structured::find_job_posting;
use crate::sources::{AdapterContext, SourceAdapter};
use crate::text::{clean_inline, html_to_text};

pub const NAME: &str = "We Work Remotely";
pub const DEFAULT_FEED_URL: &str = "https://weworkremotely.com/remote-jobs.rss";

const DEFAULT_REGION: &str = "Remote";
const DEFAULT_JOB_TYPE: &str = "Full-Time";

static TITLE: Lazy<Selector> = Lazy::new(|| selector("h1, .listing-header-container h1"));
static COMPANY: Lazy<Selector> = Lazy::new(|| selector(".company-card h2, .company-name"));
static BODY: Lazy<Selector> = Lazy::new(|| selector(".listing-container, .job-description"));

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<FeedItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub category: Vec<String>,
    pub region: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<String>,
    #[serde(rename = "pubDate")]
    pub pub_date: Option<String>,
}

pub fn parse_feed(xml: &str) -> Result<Vec<FeedItem>> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).context("parsing wwr rss xml")?;
    Ok(rss.channel.item)
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(ts.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Feed titles read `Company: Job Title`.
fn split_title(full: &str) -> (Option<String>, String) {
    match full.split_once(": ") {
        Some((company, title)) => (Some(company.trim().to_string()), title.trim().to_string()),
        None => (None, full.trim().to_string()),
    }
}

pub struct WeWorkRemotely {
    ctx: AdapterContext,
    name: String,
    feed_url: String,
    cache: HashMap<String, FeedItem>,
}

impl WeWorkRemotely {
    pub fn new(ctx: AdapterContext, name: Option<&str>, feed_url: Option<&str>) -> Self {
        Self {
            ctx,
            name: name.unwrap_or(NAME).to_string(),
            feed_url: feed_url.unwrap_or(DEFAULT_FEED_URL).to_string(),
            cache: HashMap::new(),
        }
    }

    fn draft_from_item(&self, url: &str, item: &FeedItem) -> JobDraft {
        let (company, title) = split_title(&clean_inline(item.title.as_deref().unwrap_or_default()));
        let region = item
            .region
            .as_deref()
            .map(clean_inline)
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let job_type = item
            .job_type
            .as_deref()
            .map(clean_inline)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_JOB_TYPE.to_string());

        JobDraft {
            title,
            company,
            location: region,
            description: item.description.as_deref().map(html_to_text).unwrap_or_default(),
            source_url: url.to_string(),
            source_site: self.name.clone(),
            posted_at: item.pub_date.as_deref().and_then(parse_rfc2822),
            location_type: Some(LocationType::Remote),
            employment_hint: Some(job_type),
            ..JobDraft::default()
        }
    }

    fn draft_from_page(&self, url: &str, html: &str) -> Option<JobDraft> {
        let doc = Html::parse_document(html);
        if let Some(d) = find_job_posting(&doc).and_then(|p| p.into_draft(url, &self.name, DEFAULT_REGION)) {
            return Some(JobDraft {
                location_type: Some(LocationType::Remote),
                ..d
            });
        }
        let title = first_inline(&doc, &TITLE)?;
        Some(JobDraft {
            title,
            company: first_inline(&doc, &COMPANY),
            location: DEFAULT_REGION.to_string(),
            description: first_block(&doc, &BODY).unwrap_or_default(),
            source_url: url.to_string(),
            source_site: self.name.clone(),
            location_type: Some(LocationType::Remote),
            ..JobDraft::default()
        })
    }
}

#[async_trait]
impl SourceAdapter for WeWorkRemotely {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_url(&self) -> &str {
        &self.feed_url
    }

    fn fetcher(&self) -> &PageFetcher {
        &self.ctx.fetcher
    }

    async fn enumerate(&mut self) -> Result<Vec<String>> {
        self.cache.clear();
        let body = self
            .ctx
            .fetcher
            .get_direct(&self.feed_url)
            .await
            .context("fetching wwr rss feed")?;
        let items = parse_feed(&body)?;
        info!(source = %self.name, total = items.len(), "rss feed items");

        let mut urls = Vec::new();
        for item in items {
            let (Some(title), Some(link)) = (item.title.as_deref(), item.link.as_deref()) else {
                continue;
            };
            if title.trim().is_empty() || link.trim().is_empty() {
                continue;
            }
            let text = format!(
                "{} {} {}",
                title,
                item.description.as_deref().unwrap_or_default(),
                item.category.join(" ")
            );
            if !self.ctx.is_relevant(&text) {
                continue;
            }
            let url = canonical_url(link);
            if self.cache.contains_key(&url) {
                debug!(url = %url, "duplicate feed item");
                continue;
            }
            urls.push(url.clone());
            self.cache.insert(url, item);
        }
        info!(source = %self.name, relevant = urls.len(), "filtered to L&D jobs");
        Ok(urls)
    }

    fn has_cached(&self, url: &str) -> bool {
        self.cache.contains_key(url)
    }

    fn parse(&self, url: &str, content: Option<&str>) -> Result<Option<JobRecord>> {
        let draft = match (self.cache.get(url), content) {
            (Some(item), _) => Some(self.draft_from_item(url, item)),
            (None, Some(html)) => self.draft_from_page(url, html),
            (None, None) => None,
        };
        match draft {
            Some(d) if !d.title.is_empty() => Ok(Some(self.ctx.record(d)?)),
            _ => Ok(None),
        }
    }

    fn close(&mut self) {
        self.cache.clear();
        self.ctx.fetcher.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
  <title>WWR</title>
  <item>
    <title>Acme Learning: Senior Instructional Designer</title>
    <region>USA Only</region>
    <category>Design</category>
    <type>Contract</type>
    <description>&lt;p&gt;Design e-learning&amp;nbsp;courses&lt;/p&gt;</description>
    <pubDate>Tue, 02 Apr 2024 10:00:00 +0000</pubDate>
    <link>https://weworkremotely.com/remote-jobs/acme-senior-id</link>
  </item>
  <item>
    <title>Rust Backend Engineer</title>
    <link>https://weworkremotely.com/remote-jobs/rust</link>
  </item>
</channel></rss>"#;

    #[test]
    fn feed_items_deserialize() {
        let items = parse_feed(FEED).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].region.as_deref(), Some("USA Only"));
        assert_eq!(items[0].job_type.as_deref(), Some("Contract"));
        assert_eq!(items[0].category, vec!["Design"]);
        assert!(parse_rfc2822(items[0].pub_date.as_deref().unwrap()).is_some());
        assert!(items[1].description.is_none());
    }

    #[test]
    fn title_splits_on_first_separator() {
        assert_eq!(
            split_title("Acme: Lead: Training"),
            (Some("Acme".to_string()), "Lead: Training".to_string())
        );
        assert_eq!(split_title("Just a title"), (None, "Just a title".to_string()));
    }
}
