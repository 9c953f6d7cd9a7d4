// src/sources/registry.rs
//! Closed set of known boards. Configuration names a board by its parser
//! key; anything unknown is reported and skipped by the harvester.

use anyhow::Result;
use async_trait::async_trait;

use crate::fetch::PageFetcher;
use crate::job::JobRecord;

use super::providers::{ElearningIndustry, LearningGuild, RemoteOk, WeWorkRemotely};
use super::{AdapterContext, SourceAdapter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    WeWorkRemotely,
    RemoteOk,
    LearningGuild,
    ElearningIndustry,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::WeWorkRemotely,
        SourceKind::RemoteOk,
        SourceKind::LearningGuild,
        SourceKind::ElearningIndustry,
    ];

    pub fn parser_key(&self) -> &'static str {
        match self {
            SourceKind::WeWorkRemotely => "weworkremotely",
            SourceKind::RemoteOk => "remoteok",
            SourceKind::LearningGuild => "learningguild",
            SourceKind::ElearningIndustry => "elearning_industry",
        }
    }

    pub fn from_parser(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|k| k.parser_key() == key)
    }

    /// Instantiates the adapter. `name`/`base_url` override the board defaults.
    pub fn build(&self, ctx: AdapterContext, name: Option<&str>, base_url: Option<&str>) -> Result<Adapter> {
        Ok(match self {
            SourceKind::WeWorkRemotely => Adapter::WeWorkRemotely(WeWorkRemotely::new(ctx, name, base_url)),
            SourceKind::RemoteOk => Adapter::RemoteOk(RemoteOk::new(ctx, name, base_url)?),
            SourceKind::LearningGuild => Adapter::LearningGuild(LearningGuild::new(ctx, name, base_url)?),
            SourceKind::ElearningIndustry => {
                Adapter::ElearningIndustry(ElearningIndustry::new(ctx, name, base_url)?)
            }
        })
    }
}

/// A constructed adapter of any known kind.
pub enum Adapter {
    WeWorkRemotely(WeWorkRemotely),
    RemoteOk(RemoteOk),
    LearningGuild(LearningGuild),
    ElearningIndustry(ElearningIndustry),
}

macro_rules! each {
    ($self:expr, $a:ident => $body:expr) => {
        match $self {
            Adapter::WeWorkRemotely($a) => $body,
            Adapter::RemoteOk($a) => $body,
            Adapter::LearningGuild($a) => $body,
            Adapter::ElearningIndustry($a) => $body,
        }
    };
}

#[async_trait]
impl SourceAdapter for Adapter {
    fn name(&self) -> &str {
        each!(self, a => a.name())
    }

    fn base_url(&self) -> &str {
        each!(self, a => a.base_url())
    }

    fn fetcher(&self) -> &PageFetcher {
        each!(self, a => a.fetcher())
    }

    async fn enumerate(&mut self) -> Result<Vec<String>> {
        each!(self, a => a.enumerate().await)
    }

    fn has_cached(&self, url: &str) -> bool {
        each!(self, a => a.has_cached(url))
    }

    fn parse(&self, url: &str, content: Option<&str>) -> Result<Option<JobRecord>> {
        each!(self, a => a.parse(url, content))
    }

    fn close(&mut self) {
        each!(self, a => a.close())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parser_keys_round_trip() {
        for k in SourceKind::ALL {
            assert_eq!(SourceKind::from_parser(k.parser_key()), Some(k));
        }
        assert_eq!(SourceKind::from_parser("eLearning-Industry"), Some(SourceKind::ElearningIndustry));
        assert_eq!(SourceKind::from_parser("trainingindustry"), None);
    }
}
