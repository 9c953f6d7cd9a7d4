// src/sources/structured.rs
//! Embedded schema.org `JobPosting` metadata (`<script type="application/ld+json">`).
//!
//! Detail pages are tried here first; markup selectors are the fallback.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::classify::{EmploymentType, LocationType};
use crate::job::{JobDraft, Salary};
use crate::salary::SalaryPeriod;
use crate::text::{clean_inline, html_to_text};

use super::markup::selector;

static LD_JSON: Lazy<Selector> = Lazy::new(|| selector(r#"script[type="application/ld+json"]"#));

/// Fields lifted from one `JobPosting` node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPosting {
    pub title: Option<String>,
    pub description: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub remote: bool,
    pub employment_type: Option<EmploymentType>,
    pub salary: Option<Salary>,
    pub posted_at: Option<DateTime<Utc>>,
    pub requirements: Vec<String>,
}

impl JobPosting {
    /// Draft for `url`, or `None` without a title.
    pub fn into_draft(self, url: &str, site: &str, default_location: &str) -> Option<JobDraft> {
        let title = self.title.filter(|t| !t.is_empty())?;
        let location = self
            .location
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| default_location.to_string());
        Some(JobDraft {
            title,
            company: self.company,
            location,
            description: self.description.unwrap_or_default(),
            source_url: url.to_string(),
            source_site: site.to_string(),
            requirements: self.requirements,
            salary: self.salary,
            posted_at: self.posted_at,
            location_type: self.remote.then_some(LocationType::Remote),
            employment_type: self.employment_type,
            employment_hint: None,
        })
    }
}

/// First `JobPosting` embedded in the page. Malformed blocks are skipped.
pub fn find_job_posting(doc: &Html) -> Option<JobPosting> {
    doc.select(&LD_JSON).find_map(|script| {
        let raw: String = script.text().collect();
        let value: Value = serde_json::from_str(raw.trim()).ok()?;
        find_in_value(&value)
    })
}

pub fn find_in_value(v: &Value) -> Option<JobPosting> {
    match v {
        Value::Array(items) => items.iter().find_map(find_in_value),
        Value::Object(map) => {
            if is_job_posting(v) {
                return Some(from_node(v));
            }
            map.get("@graph").and_then(find_in_value)
        }
        _ => None,
    }
}

fn is_job_posting(v: &Value) -> bool {
    match v.get("@type") {
        Some(Value::String(t)) => t == "JobPosting",
        Some(Value::Array(ts)) => ts.iter().any(|t| t.as_str() == Some("JobPosting")),
        _ => false,
    }
}

fn from_node(v: &Value) -> JobPosting {
    JobPosting {
        title: v.get("title").and_then(Value::as_str).map(clean_inline),
        description: v
            .get("description")
            .and_then(Value::as_str)
            .map(|d| html_to_text(&html_escape::decode_html_entities(d)))
            .filter(|d| !d.is_empty()),
        company: organization_name(v.get("hiringOrganization")),
        location: v.get("jobLocation").and_then(location_text),
        remote: v
            .get("jobLocationType")
            .and_then(Value::as_str)
            .is_some_and(|t| t.eq_ignore_ascii_case("TELECOMMUTE")),
        employment_type: v.get("employmentType").and_then(employment_type),
        salary: v.get("baseSalary").and_then(base_salary),
        posted_at: v.get("datePosted").and_then(Value::as_str).and_then(parse_date),
        requirements: ["qualifications", "experienceRequirements", "skills"]
            .iter()
            .filter_map(|k| v.get(*k))
            .flat_map(text_list)
            .collect(),
    }
}

fn organization_name(v: Option<&Value>) -> Option<String> {
    let name = match v? {
        Value::String(s) => s.as_str(),
        Value::Object(_) => v?.get("name")?.as_str()?,
        _ => return None,
    };
    Some(clean_inline(name)).filter(|n| !n.is_empty())
}

fn location_text(v: &Value) -> Option<String> {
    match v {
        Value::Array(items) => items.iter().find_map(location_text),
        Value::String(s) => Some(clean_inline(s)).filter(|s| !s.is_empty()),
        Value::Object(_) => match v.get("address") {
            Some(Value::String(s)) => Some(clean_inline(s)).filter(|s| !s.is_empty()),
            Some(addr @ Value::Object(_)) => {
                let parts: Vec<String> = ["addressLocality", "addressRegion", "addressCountry"]
                    .iter()
                    .filter_map(|k| match addr.get(*k)? {
                        Value::String(s) => Some(clean_inline(s)),
                        country @ Value::Object(_) => country.get("name")?.as_str().map(clean_inline),
                        _ => None,
                    })
                    .filter(|s| !s.is_empty())
                    .collect();
                (!parts.is_empty()).then(|| parts.join(", "))
            }
            _ => None,
        },
        _ => None,
    }
}

fn employment_type(v: &Value) -> Option<EmploymentType> {
    match v {
        Value::Array(items) => items.iter().find_map(employment_type),
        Value::String(s) => match s.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "FULL_TIME" => Some(EmploymentType::FullTime),
            "PART_TIME" => Some(EmploymentType::PartTime),
            "CONTRACTOR" | "CONTRACT" | "TEMPORARY" => Some(EmploymentType::Contract),
            "FREELANCE" => Some(EmploymentType::Freelance),
            _ => None,
        },
        _ => None,
    }
}

fn number(v: &Value) -> Option<u64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.replace([',', '$'], "").trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n > 0.0).then(|| n.round() as u64)
}

/// `baseSalary` as `MonetaryAmount`. Only yearly and hourly units map onto
/// the record's periods; anything else is dropped.
fn base_salary(v: &Value) -> Option<Salary> {
    let currency = v.get("currency").and_then(Value::as_str);
    let (min, max, unit) = match v.get("value") {
        Some(q @ Value::Object(_)) => {
            let single = q.get("value").and_then(number);
            (
                q.get("minValue").and_then(number).or(single),
                q.get("maxValue").and_then(number).or(single),
                q.get("unitText").and_then(Value::as_str),
            )
        }
        Some(n) => (number(n), number(n), None),
        None => return None,
    };
    let period = match unit.map(str::to_ascii_uppercase).as_deref() {
        None | Some("YEAR") => SalaryPeriod::Annual,
        Some("HOUR") => SalaryPeriod::Hourly,
        Some(_) => return None,
    };
    Salary::new(min, max, currency, period)
}

/// RFC 3339 timestamp or bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s.get(..10)?, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn text_list(v: &Value) -> Vec<String> {
    match v {
        Value::String(s) => html_to_text(&html_escape::decode_html_entities(s))
            .lines()
            .map(|l| l.trim_start_matches(['-', '*', '•']).trim().to_string())
            .filter(|l| !l.is_empty())
            .collect(),
        Value::Array(items) => items.iter().flat_map(text_list).collect(),
        Value::Object(_) => v
            .get("description")
            .or_else(|| v.get("name"))
            .map(text_list)
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}
