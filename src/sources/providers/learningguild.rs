// src/sources/providers/learningguild.rs
//! The Learning Guild job board: HTML listing page, detail page per posting.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::info;
use url::Url;

use crate::classify::detect_location_type;
use crate::fetch::PageFetcher;
use crate::job::{JobDraft, JobRecord};
use crate::sources::markup::{collect_links, first_block, first_inline, selector};
use crate::sources::structured::find_job_posting;
use crate::sources::{AdapterContext, SourceAdapter};

pub const NAME: &str = "Learning Guild";
pub const DEFAULT_LISTING_URL: &str = "https://www.learningguild.com/jobs/";

const DEFAULT_LOCATION: &str = "United States";

static JOB_LINKS: Lazy<Selector> = Lazy::new(|| selector(r#"a[href*="/jobs/"]"#));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("h1, .job-title, .posting-title"));
static COMPANY: Lazy<Selector> = Lazy::new(|| selector(".company-name, .employer, [class*='company']"));
static LOCATION: Lazy<Selector> = Lazy::new(|| selector(".location, [class*='location']"));
static DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| selector(".job-description, .description, article, .content"));

/// Detail links on the listing page: same host, under `/jobs/`, and not the
/// listing itself.
pub fn listing_links(html: &str, listing: &Url) -> Vec<String> {
    let listing_path = listing.path().trim_end_matches('/').to_string();
    collect_links(html, listing, &JOB_LINKS, |u| {
        let path = u.path().trim_end_matches('/');
        u.host_str() == listing.host_str()
            && u.path().contains("/jobs/")
            && path != "/jobs"
            && path != listing_path
    })
}

pub struct LearningGuild {
    ctx: AdapterContext,
    name: String,
    listing: Url,
}

impl LearningGuild {
    pub fn new(ctx: AdapterContext, name: Option<&str>, listing_url: Option<&str>) -> Result<Self> {
        let raw = listing_url.unwrap_or(DEFAULT_LISTING_URL);
        let listing = Url::parse(raw).with_context(|| format!("invalid learning guild url {raw}"))?;
        Ok(Self {
            ctx,
            name: name.unwrap_or(NAME).to_string(),
            listing,
        })
    }

    fn draft_from_page(&self, url: &str, html: &str) -> Option<JobDraft> {
        let doc = Html::parse_document(html);
        if let Some(d) = find_job_posting(&doc).and_then(|p| p.into_draft(url, &self.name, DEFAULT_LOCATION)) {
            return Some(d);
        }

        let title = first_inline(&doc, &TITLE)?;
        let location = first_inline(&doc, &LOCATION).unwrap_or_else(|| DEFAULT_LOCATION.to_string());
        let description = first_block(&doc, &DESCRIPTION).unwrap_or_default();
        // title wording ("Remote Trainer") counts toward the work arrangement here
        let location_type = detect_location_type(&location, &format!("{title}\n{description}"));
        Some(JobDraft {
            title,
            company: first_inline(&doc, &COMPANY),
            location,
            description,
            source_url: url.to_string(),
            source_site: self.name.clone(),
            location_type: Some(location_type),
            ..JobDraft::default()
        })
    }
}

#[async_trait]
impl SourceAdapter for LearningGuild {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_url(&self) -> &str {
        self.listing.as_str()
    }

    fn fetcher(&self) -> &PageFetcher {
        &self.ctx.fetcher
    }

    async fn enumerate(&mut self) -> Result<Vec<String>> {
        let body = self
            .ctx
            .fetcher
            .fetch(self.listing.as_str())
            .await
            .context("fetching learning guild listing")?;
        let urls = listing_links(&body, &self.listing);
        info!(source = %self.name, found = urls.len(), "job urls on listing page");
        Ok(urls)
    }

    fn parse(&self, url: &str, content: Option<&str>) -> Result<Option<JobRecord>> {
        let Some(html) = content else {
            return Ok(None);
        };
        match self.draft_from_page(url, html) {
            Some(d) => Ok(Some(self.ctx.record(d)?)),
            None => Ok(None),
        }
    }

    fn close(&mut self) {
        self.ctx.fetcher.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_keeps_only_detail_pages_on_same_host() {
        let listing = Url::parse("https://www.learningguild.com/jobs/").unwrap();
        let html = r#"
            <a href="/jobs/">All jobs</a>
            <a href="/jobs/1234/senior-learning-designer">Senior Learning Designer</a>
            <a href="https://www.learningguild.com/jobs/1235/trainer">Trainer</a>
            <a href="/jobs/1234/senior-learning-designer">dup</a>
            <a href="https://elsewhere.example.com/jobs/9">External</a>
            <a href="/events/">Events</a>
        "#;
        assert_eq!(
            listing_links(html, &listing),
            vec![
                "https://www.learningguild.com/jobs/1234/senior-learning-designer",
                "https://www.learningguild.com/jobs/1235/trainer",
            ]
        );
    }
}
