// src/sources/providers/elearning_industry.rs
//! eLearning Industry job board: HTML listing page plus detail pages.
//! Markup-only postings need both a title and a description element.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::info;
use url::Url;

use crate::fetch::PageFetcher;
use crate::job::{JobDraft, JobRecord, Salary};
use crate::salary::extract_salary;
use crate::sources::markup::{collect_links, first_block, first_inline, selector};
use crate::sources::structured::find_job_posting;
use crate::sources::{AdapterContext, SourceAdapter};

pub const NAME: &str = "eLearning Industry";
pub const DEFAULT_LISTING_URL: &str = "https://elearningindustry.com/jobs";

const DEFAULT_LOCATION: &str = "Remote";

static JOB_LINKS: Lazy<Selector> =
    Lazy::new(|| selector("a.job-listing-link, .job-card a, article.job a"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("h1.job-title, .job-header h1, h1"));
static COMPANY: Lazy<Selector> =
    Lazy::new(|| selector(".company-name, .employer-name, .job-company"));
static LOCATION: Lazy<Selector> =
    Lazy::new(|| selector(".job-location, .location, [class*='location']"));
static DESCRIPTION: Lazy<Selector> = Lazy::new(|| selector(".job-description, .job-content, article"));

pub fn listing_links(html: &str, listing: &Url) -> Vec<String> {
    collect_links(html, listing, &JOB_LINKS, |u| u.as_str() != listing.as_str())
}

pub struct ElearningIndustry {
    ctx: AdapterContext,
    name: String,
    listing: Url,
}

impl ElearningIndustry {
    pub fn new(ctx: AdapterContext, name: Option<&str>, listing_url: Option<&str>) -> Result<Self> {
        let raw = listing_url.unwrap_or(DEFAULT_LISTING_URL);
        let listing = Url::parse(raw).with_context(|| format!("invalid elearning industry url {raw}"))?;
        Ok(Self {
            ctx,
            name: name.unwrap_or(NAME).to_string(),
            listing,
        })
    }

    fn draft_from_page(&self, url: &str, html: &str) -> Option<JobDraft> {
        let doc = Html::parse_document(html);
        // salary wording anywhere on the page, markup included
        let page_salary = extract_salary(html).map(Salary::from);

        if let Some(mut d) = find_job_posting(&doc).and_then(|p| p.into_draft(url, &self.name, DEFAULT_LOCATION)) {
            if d.salary.is_none() {
                d.salary = page_salary;
            }
            return Some(d);
        }

        let title = first_inline(&doc, &TITLE)?;
        let description = first_block(&doc, &DESCRIPTION)?;
        Some(JobDraft {
            title,
            company: first_inline(&doc, &COMPANY),
            location: first_inline(&doc, &LOCATION).unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            description,
            source_url: url.to_string(),
            source_site: self.name.clone(),
            salary: page_salary,
            ..JobDraft::default()
        })
    }
}

#[async_trait]
impl SourceAdapter for ElearningIndustry {
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
            .context("fetching elearning industry listing")?;
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
