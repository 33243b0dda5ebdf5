// # Feed Fetcher Trait
//
// Defines the transport the engine uses to retrieve one page of results.
//
// ## Implementations
//
// - HTTP (reqwest): `arxiv-http` crate
// - Test doubles: `tests/common` in this crate
//
// ## Usage
//
// ```rust,ignore
// use arxiv_core::{FeedFetcher, PageQuery};
// use arxiv_core::config::{SortBy, SortOrder};
//
// let fetcher = /* FeedFetcher implementation */;
// let query = PageQuery::new("cat:cs.AI", SortBy::SubmittedDate, SortOrder::Descending, 0, 100);
// let raw = fetcher.fetch("https://export.arxiv.org/api/query", &query).await?;
// ```

use async_trait::async_trait;

use crate::client::PageQuery;

/// Trait for feed transport implementations
///
/// A fetcher performs exactly one request per call and returns the raw
/// response body. It is injected into the engine, which owns everything
/// around the call: pagination, rate limiting, parsing, and retry.
///
/// # Error Contract
///
/// - `Error::InvalidEndpoint`: `endpoint` cannot be turned into a request URL
/// - `Error::Transport`: connection failure, timeout, unreadable body
/// - `Error::Upstream { status, body }`: non-success response status
///
/// # Forbidden
///
/// - ❌ Retrying or backing off (owned by the caller of `PollingEngine::next()`)
/// - ❌ Rate limiting (owned by the engine's rate budget)
/// - ❌ Parsing the payload (owned by the feed parser)
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch one page of results
    ///
    /// # Parameters
    ///
    /// - `endpoint`: base URL of the query API
    /// - `query`: search query, sort settings, `start` offset and page size
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<u8>)`: the raw feed document
    /// - `Err(Error)`: see the error contract above
    async fn fetch(&self, endpoint: &str, query: &PageQuery) -> Result<Vec<u8>, crate::Error>;

    /// Get the fetcher name (for logging/debugging)
    fn fetcher_name(&self) -> &'static str;
}
