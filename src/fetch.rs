// src/fetch.rs
//! Page fetcher: resolves a URL to raw content through an ordered chain of
//! transport strategies.
//!
//! 1. rendering proxy (ZenRows, `js_render=true`)
//! 2. plain proxy (ScraperAPI)
//! 3. direct GET with a desktop browser user-agent
//!
//! A strategy is skipped when its credential is missing. Only HTTP 200 counts
//! as success; any other status or transport error falls through to the next
//! strategy. Exhausting the chain is a per-URL skip for the caller.

use std::time::Duration;

use reqwest::header::USER_AGENT;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DESKTOP_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
pub const ZENROWS_ENDPOINT: &str = "https://api.zenrows.com/v1/";
pub const SCRAPERAPI_ENDPOINT: &str = "http://api.scraperapi.com";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub zenrows_api_key: Option<String>,
    pub scraperapi_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub zenrows_endpoint: String,
    pub scraperapi_endpoint: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            zenrows_endpoint: ZENROWS_ENDPOINT.to_string(),
            scraperapi_endpoint: SCRAPERAPI_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    RenderingProxy,
    Proxy,
    Direct,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::RenderingProxy => "zenrows",
            Strategy::Proxy => "scraperapi",
            Strategy::Direct => "direct",
        }
    }
}

/// Why one strategy did not produce content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    Status(u16),
    Transport(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("all fetch strategies failed for {url} ({} attempted)", .attempts.len())]
    Exhausted {
        url: String,
        attempts: Vec<(Strategy, AttemptFailure)>,
    },
    #[error("fetcher already closed")]
    Closed,
    #[error("http client init failed: {0}")]
    Client(String),
}

/// Owns the HTTP connection pool shared by one adapter.
#[derive(Debug)]
pub struct PageFetcher {
    client: Option<reqwest::Client>,
    credentials: Credentials,
    settings: FetchSettings,
}

impl PageFetcher {
    pub fn new(credentials: Credentials, settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self {
            client: Some(client),
            credentials,
            settings,
        })
    }

    /// Strategies that will be attempted, in order, given the credentials.
    pub fn plan(&self) -> Vec<Strategy> {
        let mut out = Vec::with_capacity(3);
        if self.credentials.zenrows_api_key.is_some() {
            out.push(Strategy::RenderingProxy);
        }
        if self.credentials.scraperapi_key.is_some() {
            out.push(Strategy::Proxy);
        }
        out.push(Strategy::Direct);
        out
    }

    pub fn client(&self) -> Result<&reqwest::Client, FetchError> {
        self.client.as_ref().ok_or(FetchError::Closed)
    }

    /// Runs the strategy chain for `url`.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let client = self.client()?;
        let mut attempts = Vec::new();
        for strategy in self.plan() {
            match self.attempt(client, strategy, url).await {
                Ok(body) => {
                    info!(url = %url, strategy = strategy.name(), "fetched");
                    return Ok(body);
                }
                Err(failure) => {
                    match &failure {
                        AttemptFailure::Status(code) => {
                            debug!(url = %url, strategy = strategy.name(), status = code, "non-200, falling through")
                        }
                        AttemptFailure::Transport(e) => {
                            warn!(url = %url, strategy = strategy.name(), error = %e, "transport error, falling through")
                        }
                    }
                    attempts.push((strategy, failure));
                }
            }
        }
        warn!(url = %url, attempts = attempts.len(), "all fetch strategies failed");
        Err(FetchError::Exhausted {
            url: url.to_string(),
            attempts,
        })
    }

    /// Plain GET with the desktop user-agent, no proxies. Used by adapters
    /// that talk to feeds/APIs directly. Non-200 is an error.
    pub async fn get_direct(&self, url: &str) -> Result<String, FetchError> {
        let client = self.client()?;
        self.attempt(client, Strategy::Direct, url)
            .await
            .map_err(|failure| FetchError::Exhausted {
                url: url.to_string(),
                attempts: vec![(Strategy::Direct, failure)],
            })
    }

    async fn attempt(
        &self,
        client: &reqwest::Client,
        strategy: Strategy,
        url: &str,
    ) -> Result<String, AttemptFailure> {
        let request = match strategy {
            Strategy::RenderingProxy => {
                let key = self.credentials.zenrows_api_key.as_deref().unwrap_or_default();
                client
                    .get(&self.settings.zenrows_endpoint)
                    .query(&[("url", url), ("apikey", key), ("js_render", "true")])
            }
            Strategy::Proxy => {
                let key = self.credentials.scraperapi_key.as_deref().unwrap_or_default();
                client
                    .get(&self.settings.scraperapi_endpoint)
                    .query(&[("api_key", key), ("url", url)])
            }
            Strategy::Direct => client.get(url).header(USER_AGENT, DESKTOP_USER_AGENT),
        };

        let resp = request
            .send()
            .await
            .map_err(|e| AttemptFailure::Transport(e.to_string()))?;
        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            return Err(AttemptFailure::Status(status.as_u16()));
        }
        resp.text()
            .await
            .map_err(|e| AttemptFailure::Transport(e.to_string()))
    }

    /// Drops the connection pool. Later fetches fail with [`FetchError::Closed`].
    pub fn close(&mut self) {
        self.client = None;
    }

    pub fn is_closed(&self) -> bool {
        self.client.is_none()
    }
}
