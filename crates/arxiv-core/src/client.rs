//! Feed client
//!
//! Builds the request for one page of results and hands it to the injected
//! [`FeedFetcher`]. The request URL is deterministic: query parameters are
//! percent-encoded and emitted with keys in lexicographic order, replacing
//! whatever query string the configured endpoint carried.
//!
//! ```text
//! https://export.arxiv.org/api/query?max_results=100&search_query=cat%3Acs.AI
//!     &sortBy=submittedDate&sortOrder=descending&start=0
//! ```

use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

use crate::config::{SortBy, SortOrder};
use crate::error::{Error, Result};
use crate::traits::FeedFetcher;

/// Parameters of a single page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// arXiv search query
    pub search_query: String,
    /// Sort field
    pub sort_by: SortBy,
    /// Sort direction
    pub sort_order: SortOrder,
    /// Offset of the first result (`start`)
    pub start: u64,
    /// Page size (`max_results`)
    pub max_results: u32,
}

impl PageQuery {
    /// Create a page query
    pub fn new(
        search_query: impl Into<String>,
        sort_by: SortBy,
        sort_order: SortOrder,
        start: u64,
        max_results: u32,
    ) -> Self {
        Self {
            search_query: search_query.into(),
            sort_by,
            sort_order,
            start,
            max_results,
        }
    }

    /// Query parameters, keyed and ordered as they appear on the wire
    pub fn params(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("max_results", self.max_results.to_string()),
            ("search_query", self.search_query.clone()),
            ("sortBy", self.sort_by.as_str().to_string()),
            ("sortOrder", self.sort_order.as_str().to_string()),
            ("start", self.start.to_string()),
        ])
    }

    /// Build the full request URL against `endpoint`
    ///
    /// # Errors
    ///
    /// `Error::InvalidEndpoint` if `endpoint` is not an absolute URL.
    pub fn request_url(&self, endpoint: &str) -> Result<Url> {
        let mut url = Url::parse(endpoint)
            .map_err(|e| Error::invalid_endpoint(format!("invalid arXiv API URL {endpoint:?}: {e}")))?;

        url.set_query(None);
        url.query_pairs_mut().extend_pairs(self.params());

        Ok(url)
    }
}

/// Client for the arXiv query API
///
/// Pairs the configured endpoint with an injected transport.
pub struct FeedClient {
    endpoint: String,
    fetcher: Box<dyn FeedFetcher>,
}

impl FeedClient {
    /// Create a client
    ///
    /// # Parameters
    ///
    /// - `endpoint`: base URL of the query API
    /// - `fetcher`: transport implementation
    pub fn new(endpoint: impl Into<String>, fetcher: Box<dyn FeedFetcher>) -> Self {
        Self {
            endpoint: endpoint.into(),
            fetcher,
        }
    }

    /// Configured endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch one page of raw results
    ///
    /// The endpoint is validated before the transport is invoked, so an
    /// unusable base URL never reaches the network.
    pub async fn fetch(&self, query: &PageQuery) -> Result<Vec<u8>> {
        let url = query.request_url(&self.endpoint)?;
        debug!(
            fetcher = self.fetcher.fetcher_name(),
            start = query.start,
            max_results = query.max_results,
            %url,
            "fetching page"
        );

        self.fetcher.fetch(&self.endpoint, query).await
    }
}

impl std::fmt::Debug for FeedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedClient")
            .field("endpoint", &self.endpoint)
            .field("fetcher", &self.fetcher.fetcher_name())
            .finish()
    }
}
