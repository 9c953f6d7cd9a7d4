// src/config/keywords.rs
//! Relevance phrases and the category trigger mapping.
//!
//! Resolution order mirrors the other config loaders:
//! 1) `$KEYWORDS_CONFIG_PATH` (must exist when set)
//! 2) `config/keywords.toml`
//! 3) `config/keywords.json`
//! 4) built-in L&D defaults
//!
//! File shape (TOML; JSON uses the same keys):
//! ```toml
//! relevance = ["instructional design", "e-learning"]
//!
//! [categories]
//! instructional-design = ["instructional design", "learning designer"]
//! learning-management = ["lms"]
//! ```
//! Categories are matched in file order, first hit wins. Categories absent
//! from the file follow in taxonomy order with their built-in phrases.

use anyhow::{anyhow, Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::classify::{Category, CategoryMap};
use crate::relevance::RelevanceFilter;

pub const ENV_KEYWORDS_PATH: &str = "KEYWORDS_CONFIG_PATH";

pub const DEFAULT_RELEVANCE_KEYWORDS: &[&str] = &[
    "instructional design",
    "instructional designer",
    "e-learning",
    "elearning",
    "learning and development",
    "l&d",
    "corporate training",
    "training specialist",
    "training manager",
    "learning experience",
    "curriculum developer",
    "curriculum development",
    "articulate storyline",
    "articulate rise",
    "adobe captivate",
    "lms administrator",
    "learning management",
    "talent development",
    "training facilitator",
    "learning consultant",
];

fn default_phrases(cat: Category) -> &'static [&'static str] {
    match cat {
        Category::InstructionalDesign => &[
            "instructional design",
            "instructional designer",
            "learning design",
            "learning designer",
            "id specialist",
        ],
        Category::ElearningDevelopment => &[
            "e-learning developer",
            "elearning developer",
            "course developer",
            "articulate",
            "captivate",
            "storyline",
            "rise 360",
        ],
        Category::TrainingFacilitation => &[
            "training facilitator",
            "trainer",
            "facilitator",
            "workshop",
            "classroom training",
        ],
        Category::LearningManagement => &[
            "lms",
            "learning management",
            "cornerstone",
            "workday learning",
            "docebo",
            "saba",
        ],
        Category::CurriculumDevelopment => &[
            "curriculum",
            "course design",
            "program design",
            "learning program",
        ],
        Category::CorporateTraining => &[
            "corporate training",
            "enterprise training",
            "organizational learning",
            "employee training",
        ],
        Category::LearningTechnology => &[
            "learning technology",
            "edtech",
            "learning platform",
            "xapi",
            "scorm",
        ],
        Category::TalentDevelopment => &[
            "talent development",
            "talent management",
            "leadership development",
            "organizational development",
        ],
    }
}

pub fn default_category_map() -> CategoryMap {
    CategoryMap::new(
        Category::ALL
            .into_iter()
            .map(|c| (c, default_phrases(c).iter().map(|s| s.to_string()).collect()))
            .collect(),
    )
}

/// Resolved keyword configuration handed to every adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords {
    pub relevance: RelevanceFilter,
    pub categories: CategoryMap,
}

impl Default for Keywords {
    fn default() -> Self {
        Self {
            relevance: RelevanceFilter::default(),
            categories: default_category_map(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct KeywordsFile {
    #[serde(default)]
    relevance: Option<Vec<String>>,
    #[serde(default)]
    categories: OrderedCategories,
}

/// `[categories]` table in document order. A repeated key replaces the
/// earlier phrases but keeps its position.
#[derive(Debug, Default)]
struct OrderedCategories(Vec<(Category, Vec<String>)>);

impl<'de> Deserialize<'de> for OrderedCategories {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = OrderedCategories;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a table of category -> trigger phrases")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut out: Vec<(Category, Vec<String>)> = Vec::new();
                while let Some((cat, phrases)) = map.next_entry::<Category, Vec<String>>()? {
                    match out.iter_mut().find(|(c, _)| *c == cat) {
                        Some(slot) => slot.1 = phrases,
                        None => out.push((cat, phrases)),
                    }
                }
                Ok(OrderedCategories(out))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

impl KeywordsFile {
    fn resolve(mut self) -> Keywords {
        let relevance = match self.relevance.take() {
            Some(list) if list.iter().any(|k| !k.trim().is_empty()) => RelevanceFilter::new(list),
            _ => RelevanceFilter::default(),
        };
        let mut entries = self.categories.0;
        for c in Category::ALL {
            if !entries.iter().any(|(named, _)| *named == c) {
                entries.push((c, default_phrases(c).iter().map(|s| s.to_string()).collect()));
            }
        }
        let categories = CategoryMap::new(entries);
        Keywords {
            relevance,
            categories,
        }
    }
}

/// Load from an explicit path. Supports TOML or JSON.
pub fn load_keywords_from(path: &Path) -> Result<Keywords> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading keywords from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_keywords(&content, &ext)
}

pub fn load_keywords_default() -> Result<Keywords> {
    if let Ok(p) = std::env::var(ENV_KEYWORDS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_keywords_from(&pb);
        }
        return Err(anyhow!("{ENV_KEYWORDS_PATH} points to non-existent path"));
    }
    let toml_p = PathBuf::from("config/keywords.toml");
    if toml_p.exists() {
        return load_keywords_from(&toml_p);
    }
    let json_p = PathBuf::from("config/keywords.json");
    if json_p.exists() {
        return load_keywords_from(&json_p);
    }
    Ok(Keywords::default())
}

fn parse_keywords(s: &str, hint_ext: &str) -> Result<Keywords> {
    let parsed: KeywordsFile = if hint_ext == "json" {
        serde_json::from_str(s).context("parsing keywords json")?
    } else {
        match toml::from_str(s) {
            Ok(v) => v,
            Err(toml_err) => serde_json::from_str(s)
                .map_err(|_| anyhow!("unsupported keywords format: {toml_err}"))?,
        }
    };
    Ok(parsed.resolve())
}
