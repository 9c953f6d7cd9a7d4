// src/classify.rs
//! Taxonomy classifiers.
//!
//! Every classifier lowercases its inputs, scans an ordered list of trigger
//! phrases and returns the label of the first hit. Earlier entries win, so
//! "director" outranks "lead" outranks "senior". Each function is total: with
//! no hit it returns the taxonomy default.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Remote,
    Hybrid,
    Onsite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Freelance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    Lead,
    Director,
}

/// Closed L&D category taxonomy. Declaration order is the default priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    InstructionalDesign,
    ElearningDevelopment,
    TrainingFacilitation,
    LearningManagement,
    CurriculumDevelopment,
    CorporateTraining,
    LearningTechnology,
    TalentDevelopment,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::InstructionalDesign,
        Category::ElearningDevelopment,
        Category::TrainingFacilitation,
        Category::LearningManagement,
        Category::CurriculumDevelopment,
        Category::CorporateTraining,
        Category::LearningTechnology,
        Category::TalentDevelopment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::InstructionalDesign => "instructional-design",
            Category::ElearningDevelopment => "elearning-development",
            Category::TrainingFacilitation => "training-facilitation",
            Category::LearningManagement => "learning-management",
            Category::CurriculumDevelopment => "curriculum-development",
            Category::CorporateTraining => "corporate-training",
            Category::LearningTechnology => "learning-technology",
            Category::TalentDevelopment => "talent-development",
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::InstructionalDesign
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == key)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

fn joined_lower(a: &str, b: &str) -> String {
    format!("{a} {b}").to_lowercase()
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

/// Remote wins over onsite; "remote" together with "hybrid" means hybrid.
pub fn detect_location_type(location: &str, description: &str) -> LocationType {
    let text = joined_lower(location, description);
    let hybrid = text.contains("hybrid");
    if contains_any(&text, &["remote", "work from home", "wfh"]) {
        if hybrid {
            LocationType::Hybrid
        } else {
            LocationType::Remote
        }
    } else if hybrid {
        LocationType::Hybrid
    } else {
        LocationType::Onsite
    }
}

const EMPLOYMENT_TRIGGERS: &[(EmploymentType, &[&str])] = &[
    (EmploymentType::Freelance, &["freelance", "freelancer"]),
    (EmploymentType::Contract, &["contract", "contractor"]),
    (EmploymentType::PartTime, &["part-time", "part time"]),
];

pub fn detect_employment_type(title: &str, description: &str) -> EmploymentType {
    let text = joined_lower(title, description);
    first_match(&text, EMPLOYMENT_TRIGGERS).unwrap_or(EmploymentType::FullTime)
}

const EXPERIENCE_TRIGGERS: &[(ExperienceLevel, &[&str])] = &[
    (ExperienceLevel::Director, &["director", "vp ", "vice president"]),
    (ExperienceLevel::Lead, &["lead", "principal", "head of"]),
    (ExperienceLevel::Senior, &["senior", "sr.", "sr "]),
    (
        ExperienceLevel::Entry,
        &["junior", "jr.", "entry", "associate"],
    ),
];

pub fn detect_experience_level(title: &str, description: &str) -> ExperienceLevel {
    let text = joined_lower(title, description);
    first_match(&text, EXPERIENCE_TRIGGERS).unwrap_or(ExperienceLevel::Mid)
}

fn first_match<L: Copy>(text: &str, table: &[(L, &[&str])]) -> Option<L> {
    table
        .iter()
        .find(|(_, needles)| contains_any(text, needles))
        .map(|(label, _)| *label)
}

/// Ordered category -> trigger phrases mapping. Loaded from config; see
/// [`crate::config::keywords`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMap {
    entries: Vec<(Category, Vec<String>)>,
}

impl CategoryMap {
    /// Phrases are lowercased and trimmed; empty phrases are dropped.
    pub fn new(entries: Vec<(Category, Vec<String>)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(cat, phrases)| {
                let cleaned = phrases
                    .into_iter()
                    .map(|p| p.trim().to_lowercase())
                    .filter(|p| !p.is_empty())
                    .collect();
                (cat, cleaned)
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[(Category, Vec<String>)] {
        &self.entries
    }

    pub fn detect(&self, title: &str, description: &str) -> Category {
        let text = joined_lower(title, description);
        self.entries
            .iter()
            .find(|(_, phrases)| phrases.iter().any(|p| text.contains(p.as_str())))
            .map(|(cat, _)| *cat)
            .unwrap_or_default()
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        crate::config::keywords::default_category_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_remote_hybrid_onsite() {
        assert_eq!(detect_location_type("Remote (US)", ""), LocationType::Remote);
        assert_eq!(
            detect_location_type("Chicago", "hybrid, 2 days remote"),
            LocationType::Hybrid
        );
        assert_eq!(detect_location_type("Chicago, IL", "on site"), LocationType::Onsite);
        assert_eq!(detect_location_type("", "WFH friendly"), LocationType::Remote);
    }

    #[test]
    fn employment_priority_freelance_over_contract() {
        assert_eq!(
            detect_employment_type("Freelance contract designer", ""),
            EmploymentType::Freelance
        );
        assert_eq!(detect_employment_type("Trainer", "part time role"), EmploymentType::PartTime);
        assert_eq!(detect_employment_type("Trainer", ""), EmploymentType::FullTime);
    }

    #[test]
    fn experience_director_outranks_senior() {
        assert_eq!(
            detect_experience_level("Senior Director of Learning", ""),
            ExperienceLevel::Director
        );
        assert_eq!(detect_experience_level("Sr. Trainer", ""), ExperienceLevel::Senior);
        assert_eq!(detect_experience_level("Associate ID", ""), ExperienceLevel::Entry);
        assert_eq!(detect_experience_level("Designer", ""), ExperienceLevel::Mid);
    }

    #[test]
    fn classifiers_are_total_on_empty_input() {
        assert_eq!(detect_location_type("", ""), LocationType::Onsite);
        assert_eq!(detect_employment_type("", ""), EmploymentType::FullTime);
        assert_eq!(detect_experience_level("", ""), ExperienceLevel::Mid);
        assert_eq!(CategoryMap::default().detect("", ""), Category::InstructionalDesign);
    }

    #[test]
    fn category_map_respects_order() {
        let map = CategoryMap::new(vec![
            (Category::LearningManagement, vec!["LMS".into()]),
            (Category::ElearningDevelopment, vec!["storyline".into(), " ".into()]),
        ]);
        assert_eq!(map.detect("LMS admin with Storyline", ""), Category::LearningManagement);
        assert_eq!(map.detect("Storyline dev", ""), Category::ElearningDevelopment);
        assert_eq!(map.entries()[1].1, vec!["storyline".to_string()]);
    }

    #[test]
    fn category_round_trips_through_str() {
        for c in Category::ALL {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
        }
        assert!("cooking".parse::<Category>().is_err());
    }

    #[test]
    fn senior_contract_remote_scenario() {
        let title = "Senior Instructional Designer needed, contract, remote";
        assert_eq!(detect_location_type(title, ""), LocationType::Remote);
        assert_eq!(detect_employment_type(title, ""), EmploymentType::Contract);
        assert_eq!(detect_experience_level(title, ""), ExperienceLevel::Senior);
        assert_eq!(CategoryMap::default().detect(title, ""), Category::InstructionalDesign);
    }
}
