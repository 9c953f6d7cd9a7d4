// src/salary.rs
//! Salary range extraction from free text / raw markup.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalaryPeriod {
    Annual,
    Hourly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalaryRange {
    pub min: u64,
    pub max: u64,
    pub period: SalaryPeriod,
}

const HOURLY_SUFFIX: &str = r"(?:per hour|an hour|/\s?hr|/\s?hour|hourly)";

// "$80,000 - $100,000", optionally followed by an hourly marker ("$50 - $75/hr").
static RE_DOLLAR_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\$(\d{{1,3}}(?:,\d{{3}})*)\s*[-–to]+\s*\$(\d{{1,3}}(?:,\d{{3}})*)(\s*{HOURLY_SUFFIX})?"
    ))
    .expect("dollar range regex")
});

// "80,000 - 100,000 per year"
static RE_ANNUAL_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\d{1,3}(?:,\d{3})*)\s*[-–to]+\s*(\d{1,3}(?:,\d{3})*)\s*(?:per year|annually|a year|/\s?yr|/\s?year)",
    )
    .expect("annual range regex")
});

// "50 - 75 per hour"
static RE_HOURLY_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\$?(\d{{2,3}})\s*[-–to]+\s*\$?(\d{{2,3}})\s*{HOURLY_SUFFIX}"
    ))
    .expect("hourly range regex")
});

/// Scans `text` with the ordered patterns (explicit dollar range, numeric range
/// with an annual marker, numeric range with an hourly marker). The first
/// pattern that matches with parseable numbers wins.
pub fn extract_salary(text: &str) -> Option<SalaryRange> {
    let patterns: [(&Regex, fn(&Captures<'_>) -> SalaryPeriod); 3] = [
        (&*RE_DOLLAR_RANGE, |c| {
            if c.get(3).is_some() {
                SalaryPeriod::Hourly
            } else {
                SalaryPeriod::Annual
            }
        }),
        (&*RE_ANNUAL_RANGE, |_| SalaryPeriod::Annual),
        (&*RE_HOURLY_RANGE, |_| SalaryPeriod::Hourly),
    ];

    for (re, period_of) in patterns {
        let Some(caps) = re.captures(text) else {
            continue;
        };
        let (Some(min), Some(max)) = (parse_amount(caps.get(1)), parse_amount(caps.get(2))) else {
            continue;
        };
        return Some(SalaryRange {
            min,
            max,
            period: period_of(&caps),
        });
    }
    None
}

fn parse_amount(m: Option<regex::Match<'_>>) -> Option<u64> {
    m.and_then(|m| m.as_str().replace(',', "").parse::<u64>().ok())
        .filter(|v| *v > 0)
}
