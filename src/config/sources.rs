// src/config/sources.rs
//! Job board table: which adapters run, against which endpoint.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_SOURCES_PATH: &str = "SOURCES_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    /// Registry key, e.g. "weworkremotely".
    pub parser: String,
    /// Overrides the adapter's canonical endpoint when set.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl SourceConfig {
    pub fn new(name: &str, parser: &str) -> Self {
        Self {
            name: name.to_string(),
            parser: parser.to_string(),
            base_url: None,
            enabled: true,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

pub fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new("We Work Remotely", "weworkremotely"),
        SourceConfig::new("RemoteOK", "remoteok"),
        SourceConfig::new("Learning Guild", "learningguild"),
        SourceConfig::new("eLearning Industry", "elearning_industry"),
    ]
}

#[derive(Debug, Deserialize)]
struct SourcesFile {
    sources: Vec<SourceConfig>,
}

pub fn load_sources_from(path: &Path) -> Result<Vec<SourceConfig>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let parsed: SourcesFile = toml::from_str(&content).context("parsing sources toml")?;
    Ok(parsed.sources)
}

/// `$SOURCES_CONFIG_PATH`, then `config/sources.toml`, then the built-in table;
/// `SOURCE_<PARSER>_ENABLED` env flags are applied on top.
pub fn load_sources_default() -> Result<Vec<SourceConfig>> {
    let mut sources = if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_SOURCES_PATH} points to non-existent path"));
        }
        load_sources_from(&pb)?
    } else {
        let toml_p = PathBuf::from("config/sources.toml");
        if toml_p.exists() {
            load_sources_from(&toml_p)?
        } else {
            default_sources()
        }
    };
    apply_enabled_overrides(&mut sources, |key| std::env::var(key).ok());
    Ok(sources)
}

pub fn enabled_flag_key(parser: &str) -> String {
    format!("SOURCE_{}_ENABLED", parser.to_ascii_uppercase())
}

pub(crate) fn apply_enabled_overrides<F>(sources: &mut [SourceConfig], lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for s in sources.iter_mut() {
        if let Some(flag) = lookup(&enabled_flag_key(&s.parser)).and_then(|v| parse_flag(&v)) {
            s.enabled = flag;
        }
    }
}

pub(crate) fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_flags_toggle_sources() {
        let mut s = default_sources();
        apply_enabled_overrides(&mut s, |k| match k {
            "SOURCE_REMOTEOK_ENABLED" => Some("0".into()),
            "SOURCE_LEARNINGGUILD_ENABLED" => Some("maybe".into()),
            _ => None,
        });
        let by: Vec<(&str, bool)> = s.iter().map(|c| (c.parser.as_str(), c.enabled)).collect();
        assert_eq!(
            by,
            vec![
                ("weworkremotely", true),
                ("remoteok", false),
                ("learningguild", true),
                ("elearning_industry", true)
            ]
        );
    }

    #[test]
    fn toml_table_parses_with_defaults() {
        let src = r#"
[[sources]]
name = "Guild staging"
parser = "learningguild"
base_url = "http://127.0.0.1:9000/jobs/"

[[sources]]
name = "ATD"
parser = "atd_jobs"
enabled = false
"#;
        let parsed: SourcesFile = toml::from_str(src).unwrap();
        assert_eq!(parsed.sources.len(), 2);
        assert!(parsed.sources[0].enabled);
        assert_eq!(parsed.sources[0].base_url.as_deref(), Some("http://127.0.0.1:9000/jobs/"));
        assert!(!parsed.sources[1].enabled);
    }
}
