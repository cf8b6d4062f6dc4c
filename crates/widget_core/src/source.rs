//! External collaborators that supply `(name, colorHex)` rows.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::domain::TogglePair;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid source url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("failed to build http client: {0}")]
    Client(reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request { url: Url, source: reqwest::Error },
    #[error("unexpected response shape from {url}: {source}")]
    Decode {
        url: Url,
        source: serde_json::Error,
    },
    #[error("pair source is unavailable")]
    Unavailable,
}

#[async_trait]
pub trait PairSource: Send + Sync {
    async fn fetch_pairs(&self) -> Result<Vec<TogglePair>, SourceError>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticPairSource {
    pairs: Vec<TogglePair>,
}

impl StaticPairSource {
    pub fn new(pairs: Vec<TogglePair>) -> Self {
        Self { pairs }
    }
}

#[async_trait]
impl PairSource for StaticPairSource {
    async fn fetch_pairs(&self) -> Result<Vec<TogglePair>, SourceError> {
        Ok(self.pairs.clone())
    }
}

pub struct MissingPairSource;

#[async_trait]
impl PairSource for MissingPairSource {
    async fn fetch_pairs(&self) -> Result<Vec<TogglePair>, SourceError> {
        Err(SourceError::Unavailable)
    }
}

/// Fetches a JSON array of `[name, colorHex]` arrays with a single GET.
pub struct HttpPairSource {
    http: Client,
    url: Url,
}

impl HttpPairSource {
    pub fn new(url: &str) -> Result<Self, SourceError> {
        Ok(Self {
            http: Client::new(),
            url: parse_url(url)?,
        })
    }

    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SourceError::Client)?;
        Ok(Self {
            http,
            url: parse_url(url)?,
        })
    }
}

fn parse_url(url: &str) -> Result<Url, SourceError> {
    Url::parse(url).map_err(|source| SourceError::InvalidUrl {
        url: url.to_string(),
        source,
    })
}

#[async_trait]
impl PairSource for HttpPairSource {
    async fn fetch_pairs(&self) -> Result<Vec<TogglePair>, SourceError> {
        let request_error = |source| SourceError::Request {
            url: self.url.clone(),
            source,
        };

        let body = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .map_err(request_error)?
            .error_for_status()
            .map_err(request_error)?
            .bytes()
            .await
            .map_err(request_error)?;

        let pairs: Vec<TogglePair> =
            serde_json::from_slice(&body).map_err(|source| SourceError::Decode {
                url: self.url.clone(),
                source,
            })?;
        debug!(url = %self.url, pairs = pairs.len(), "fetched toggle pairs");
        Ok(pairs)
    }
}

#[cfg(test)]
#[path = "tests/source_tests.rs"]
mod tests;
