// src/job.rs
//! Normalized job record produced by every source adapter, and its persisted shape.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::classify::{
    detect_employment_type, detect_experience_level, detect_location_type, Category, CategoryMap,
    EmploymentType, ExperienceLevel, LocationType,
};
use crate::salary::{SalaryPeriod, SalaryRange};
use crate::text::truncate_chars;

pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const MAX_DESCRIPTION_CHARS: usize = 5000;
pub const DEFAULT_EXPIRY_DAYS: i64 = 30;
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("job title is empty")]
    EmptyTitle,
    #[error("source url is empty")]
    EmptySourceUrl,
    #[error("expiry of {0} days is out of range")]
    ExpiryOutOfRange(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Active,
    Expired,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salary {
    pub min: Option<u64>,
    pub max: Option<u64>,
    pub currency: String,
    pub period: SalaryPeriod,
}

impl Salary {
    /// Keeps only positive bounds; `None` when neither bound survives.
    pub fn new(min: Option<u64>, max: Option<u64>, currency: Option<&str>, period: SalaryPeriod) -> Option<Self> {
        let min = min.filter(|v| *v > 0);
        let max = max.filter(|v| *v > 0);
        if min.is_none() && max.is_none() {
            return None;
        }
        let currency = currency
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
            .to_ascii_uppercase();
        Some(Self {
            min,
            max,
            currency,
            period,
        })
    }
}

impl From<SalaryRange> for Salary {
    fn from(r: SalaryRange) -> Self {
        Self {
            min: Some(r.min),
            max: Some(r.max),
            currency: DEFAULT_CURRENCY.to_string(),
            period: r.period,
        }
    }
}

/// Fields an adapter managed to extract. Classification and lifecycle
/// metadata are filled in by [`JobRecord::build`].
#[derive(Debug, Clone, Default)]
pub struct JobDraft {
    pub title: String,
    pub company: Option<String>,
    pub location: String,
    pub description: String,
    pub source_url: String,
    pub source_site: String,
    pub requirements: Vec<String>,
    pub salary: Option<Salary>,
    pub posted_at: Option<DateTime<Utc>>,
    /// Adapter-known location type (e.g. remote-only boards).
    pub location_type: Option<LocationType>,
    /// Adapter-known employment type (e.g. structured metadata).
    pub employment_type: Option<EmploymentType>,
    /// Extra text fed to the employment classifier (feed "type" field and the like).
    pub employment_hint: Option<String>,
}

/// Immutable, classified job record.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub location_type: LocationType,
    pub description: String,
    pub requirements: Vec<String>,
    pub salary: Option<Salary>,
    pub category: Category,
    pub experience_level: ExperienceLevel,
    pub employment_type: EmploymentType,
    pub source_url: String,
    pub source_site: String,
    pub posted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub scraped_at: DateTime<Utc>,
    pub is_featured: bool,
    pub is_direct_post: bool,
    pub status: JobStatus,
}

impl JobRecord {
    /// Builds a record from a draft, classifying the free text and stamping
    /// lifecycle metadata from `now`.
    pub fn build(
        draft: JobDraft,
        categories: &CategoryMap,
        now: DateTime<Utc>,
        expiry_days: i64,
    ) -> Result<Self, RecordError> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(RecordError::EmptyTitle);
        }
        let source_url = canonical_url(&draft.source_url);
        if source_url.is_empty() {
            return Err(RecordError::EmptySourceUrl);
        }
        let expires_at = Duration::try_days(expiry_days)
            .filter(|d| *d > Duration::zero())
            .and_then(|d| now.checked_add_signed(d))
            .ok_or(RecordError::ExpiryOutOfRange(expiry_days))?;
        let company = draft
            .company
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| UNKNOWN_COMPANY.to_string());
        let location = draft.location.trim().to_string();
        let description = truncate_chars(&draft.description, MAX_DESCRIPTION_CHARS);

        let location_type = draft
            .location_type
            .unwrap_or_else(|| detect_location_type(&location, &description));
        let employment_type = draft.employment_type.unwrap_or_else(|| {
            let hinted = match draft.employment_hint.as_deref() {
                Some(hint) => format!("{hint} {description}"),
                None => description.clone(),
            };
            detect_employment_type(&title, &hinted)
        });
        let experience_level = detect_experience_level(&title, &description);
        let category = categories.detect(&title, &description);

        Ok(Self {
            id: identity(&source_url),
            title,
            company,
            location,
            location_type,
            description,
            requirements: draft
                .requirements
                .into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
            salary: draft.salary,
            category,
            experience_level,
            employment_type,
            source_url,
            source_site: draft.source_site,
            posted_at: draft.posted_at.unwrap_or(now),
            expires_at,
            scraped_at: now,
            is_featured: false,
            is_direct_post: false,
            status: JobStatus::Active,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Persisted document shape (field names as written to the store).
    pub fn to_document(&self) -> Map<String, Value> {
        let doc = JobDocument {
            id: &self.id,
            title: &self.title,
            company: &self.company,
            location: &self.location,
            location_type: self.location_type,
            description: &self.description,
            requirements: &self.requirements,
            salary: self.salary.as_ref(),
            category: self.category,
            experience_level: self.experience_level,
            employment_type: self.employment_type,
            source_url: &self.source_url,
            source_site: &self.source_site,
            posted_at: self.posted_at,
            expires_at: self.expires_at,
            scraped_at: self.scraped_at,
            is_featured: self.is_featured,
            is_direct_post: self.is_direct_post,
            status: self.status,
        };
        match serde_json::to_value(doc) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JobDocument<'a> {
    id: &'a str,
    title: &'a str,
    company: &'a str,
    location: &'a str,
    location_type: LocationType,
    description: &'a str,
    requirements: &'a [String],
    salary: Option<&'a Salary>,
    category: Category,
    experience_level: ExperienceLevel,
    employment_type: EmploymentType,
    source_url: &'a str,
    source_site: &'a str,
    posted_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    scraped_at: DateTime<Utc>,
    is_featured: bool,
    is_direct_post: bool,
    status: JobStatus,
}

/// Canonical form of a source URL: trimmed, fragment removed, scheme/host
/// normalized when it parses as an absolute URL.
pub fn canonical_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match url::Url::parse(trimmed) {
        Ok(mut u) => {
            u.set_fragment(None);
            u.to_string()
        }
        Err(_) => trimmed.split('#').next().unwrap_or_default().to_string(),
    }
}

/// Store key: lowercase hex MD5 of the canonical source URL.
pub fn identity(source_url: &str) -> String {
    format!("{:x}", md5::compute(canonical_url(source_url).as_bytes()))
}
