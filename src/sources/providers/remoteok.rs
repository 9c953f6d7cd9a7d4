// src/sources/providers/remoteok.rs
//! RemoteOK: public JSON API. The first array element is a legal/metadata
//! notice, the rest are postings.

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::Html;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{info, warn};
use url::Url;

use crate::classify::LocationType;
use crate::fetch::PageFetcher;
use crate::job::{canonical_url, JobDraft, JobRecord, Salary};
use crate::salary::SalaryPeriod;
use crate::sources::markup::absolutize;
use crate::sources::structured::{find_job_posting, parse_date};
use crate::sources::{AdapterContext, SourceAdapter};
use crate::text::{clean_inline, html_to_text};

pub const NAME: &str = "RemoteOK";
pub const DEFAULT_API_URL: &str = "https://remoteok.com/api";

const DEFAULT_LOCATION: &str = "Remote";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiJob {
    pub url: Option<String>,
    pub position: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub date: Option<String>,
}

/// Postings from an API payload, skipping the leading metadata element.
pub fn parse_api(body: &str) -> Result<Vec<ApiJob>> {
    let values: Vec<Value> = serde_json::from_str(body).context("parsing remoteok api json")?;
    let mut out = Vec::with_capacity(values.len().saturating_sub(1));
    for (i, v) in values.into_iter().enumerate() {
        if i == 0 && v.get("position").is_none() {
            continue;
        }
        match serde_json::from_value::<ApiJob>(v) {
            Ok(job) => out.push(job),
            Err(e) => warn!(index = i, error = %e, "skipping malformed remoteok entry"),
        }
    }
    Ok(out)
}

fn positive(v: Option<f64>) -> Option<u64> {
    v.filter(|n| n.is_finite() && *n > 0.0).map(|n| n.round() as u64)
}

pub struct RemoteOk {
    ctx: AdapterContext,
    name: String,
    api_url: String,
    origin: Url,
    cache: HashMap<String, ApiJob>,
}

impl RemoteOk {
    pub fn new(ctx: AdapterContext, name: Option<&str>, api_url: Option<&str>) -> Result<Self> {
        let api_url = api_url.unwrap_or(DEFAULT_API_URL).to_string();
        let origin = Url::parse(&api_url).with_context(|| format!("invalid remoteok url {api_url}"))?;
        Ok(Self {
            ctx,
            name: name.unwrap_or(NAME).to_string(),
            api_url,
            origin,
            cache: HashMap::new(),
        })
    }

    fn draft_from_api(&self, url: &str, job: &ApiJob) -> JobDraft {
        let location = job
            .location
            .as_deref()
            .map(clean_inline)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
        JobDraft {
            title: job.position.as_deref().map(clean_inline).unwrap_or_default(),
            company: job.company.as_deref().map(clean_inline),
            location,
            description: job.description.as_deref().map(html_to_text).unwrap_or_default(),
            source_url: url.to_string(),
            source_site: self.name.clone(),
            salary: Salary::new(
                positive(job.salary_min),
                positive(job.salary_max),
                None,
                SalaryPeriod::Annual,
            ),
            posted_at: job.date.as_deref().and_then(parse_date),
            location_type: Some(LocationType::Remote),
            ..JobDraft::default()
        }
    }
}

#[async_trait]
impl SourceAdapter for RemoteOk {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_url(&self) -> &str {
        &self.api_url
    }

    fn fetcher(&self) -> &PageFetcher {
        &self.ctx.fetcher
    }

    async fn enumerate(&mut self) -> Result<Vec<String>> {
        self.cache.clear();
        let body = self
            .ctx
            .fetcher
            .get_direct(&self.api_url)
            .await
            .context("fetching remoteok api")?;
        let jobs = parse_api(&body)?;
        info!(source = %self.name, total = jobs.len(), "api returned jobs");

        let mut urls = Vec::new();
        for job in jobs {
            let text = format!(
                "{} {} {}",
                job.position.as_deref().unwrap_or_default(),
                job.description.as_deref().unwrap_or_default(),
                job.tags.join(" ")
            );
            if !self.ctx.is_relevant(&text) {
                continue;
            }
            let Some(abs) = job.url.as_deref().and_then(|u| absolutize(&self.origin, u)) else {
                continue;
            };
            let url = canonical_url(abs.as_str());
            if self.cache.contains_key(&url) {
                continue;
            }
            urls.push(url.clone());
            self.cache.insert(url, job);
        }
        info!(source = %self.name, relevant = urls.len(), "filtered to L&D jobs");
        Ok(urls)
    }

    fn has_cached(&self, url: &str) -> bool {
        self.cache.contains_key(url)
    }

    fn parse(&self, url: &str, content: Option<&str>) -> Result<Option<JobRecord>> {
        let draft = match (self.cache.get(url), content) {
            (Some(job), _) => Some(self.draft_from_api(url, job)),
            (None, Some(html)) => find_job_posting(&Html::parse_document(html))
                .and_then(|p| p.into_draft(url, &self.name, DEFAULT_LOCATION))
                .map(|d| JobDraft {
                    location_type: Some(LocationType::Remote),
                    ..d
                }),
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
