// # HTTP Feed Fetcher
//
// This crate provides the production `FeedFetcher` for the arXiv poller.
//
// ## Behaviour
//
// - One `GET` per call, URL built from the endpoint plus the page query
// - Per-request timeout (30 seconds by default)
// - Non-2xx responses become `Error::Upstream` carrying status and body
// - Connection, timeout and body-read failures become `Error::Transport`
//
// No retries happen here: a failed call leaves the engine untouched and the
// caller decides when to try again.

use arxiv_core::traits::FeedFetcher;
use arxiv_core::{Error, PageQuery, Result};

use std::time::Duration;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User-Agent sent with every request
const USER_AGENT: &str = concat!("arxiv-poller/", env!("CARGO_PKG_VERSION"));

/// HTTP transport for the arXiv query API
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    /// HTTP client
    client: reqwest::Client,

    /// Request timeout the client was built with
    timeout: Duration,
}

impl HttpFeedFetcher {
    /// Create a fetcher with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a fetcher with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait::async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, endpoint: &str, query: &PageQuery) -> Result<Vec<u8>> {
        let url = query.request_url(endpoint)?;
        tracing::debug!(%url, "requesting arXiv page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::transport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "arXiv API returned an error");
            return Err(Error::upstream(status.as_u16(), body));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport(format!("failed to read response: {e}")))?;

        tracing::trace!(bytes = body.len(), "arXiv page received");
        Ok(body.to_vec())
    }

    fn fetcher_name(&self) -> &'static str {
        "http"
    }
}
