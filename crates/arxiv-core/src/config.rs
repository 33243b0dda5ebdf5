//! Configuration types for the arXiv poller
//!
//! The settings object is consumed read-only by the engine. It is usually
//! deserialized (or assembled from environment variables by `arxivd`) and then
//! checked once with [`SourceConfig::validate()`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default arXiv API query endpoint
pub const DEFAULT_API_URL: &str = "https://export.arxiv.org/api/query";

/// Upper bound the arXiv API accepts for `max_results` in a single request
pub const MAX_RESULTS_LIMIT: u32 = 2000;

/// Settings for one polling session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the arXiv query API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// arXiv search query (e.g. `ti:"AI" AND cat:cs.AI`)
    pub search_query: String,

    /// Page size requested per fetch cycle (1..=2000)
    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Sort field
    #[serde(default)]
    pub sort_by: SortBy,

    /// Sort direction
    #[serde(default)]
    pub sort_order: SortOrder,

    /// Minimum interval between two fetch cycles (in seconds)
    ///
    /// Set to 0 to fetch as soon as the buffer drains.
    #[serde(default = "default_polling_period_secs")]
    pub polling_period_secs: u64,

    /// Whether records carry a `pdf_url` field when the entry links one
    #[serde(default = "default_include_pdf")]
    pub include_pdf: bool,

    /// Drop entries published before `now - recency_window_secs`
    #[serde(default)]
    pub filter_recent: bool,

    /// Width of the recency window (in seconds)
    #[serde(default = "default_recency_window_secs")]
    pub recency_window_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl SourceConfig {
    /// Create a configuration for `search_query` with every other field defaulted
    pub fn new(search_query: impl Into<String>) -> Self {
        Self {
            api_url: default_api_url(),
            search_query: search_query.into(),
            max_results: default_max_results(),
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            polling_period_secs: default_polling_period_secs(),
            include_pdf: default_include_pdf(),
            filter_recent: false,
            recency_window_secs: default_recency_window_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Point the configuration at a different API endpoint
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Set the page size
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Set the polling period
    pub fn with_polling_period_secs(mut self, secs: u64) -> Self {
        self.polling_period_secs = secs;
        self
    }

    /// Enable or disable PDF link extraction
    pub fn with_include_pdf(mut self, include_pdf: bool) -> Self {
        self.include_pdf = include_pdf;
        self
    }

    /// Enable the recency filter with the given window
    pub fn with_recency_window(mut self, window: Duration) -> Self {
        self.filter_recent = true;
        self.recency_window_secs = window.as_secs();
        self
    }

    /// Polling period as a [`Duration`]
    pub fn polling_period(&self) -> Duration {
        Duration::from_secs(self.polling_period_secs)
    }

    /// Recency window as a [`Duration`]
    pub fn recency_window(&self) -> Duration {
        Duration::from_secs(self.recency_window_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.search_query.trim().is_empty() {
            return Err(crate::Error::config("search_query is required"));
        }

        if self.max_results == 0 || self.max_results > MAX_RESULTS_LIMIT {
            return Err(crate::Error::config(format!(
                "max_results must be between 1 and {MAX_RESULTS_LIMIT}"
            )));
        }

        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("event_channel_capacity must be > 0"));
        }

        Ok(())
    }
}

/// Field the arXiv API sorts results by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    /// Original submission date
    #[default]
    SubmittedDate,
    /// Date of the latest revision
    LastUpdatedDate,
    /// Search relevance
    Relevance,
}

impl SortBy {
    /// Wire name used in the `sortBy` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::SubmittedDate => "submittedDate",
            SortBy::LastUpdatedDate => "lastUpdatedDate",
            SortBy::Relevance => "relevance",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submittedDate" => Ok(SortBy::SubmittedDate),
            "lastUpdatedDate" => Ok(SortBy::LastUpdatedDate),
            "relevance" => Ok(SortBy::Relevance),
            _ => Err(crate::Error::config(
                "sort_by must be one of: submittedDate, lastUpdatedDate, relevance",
            )),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first
    Ascending,
    /// Newest first
    #[default]
    Descending,
}

impl SortOrder {
    /// Wire name used in the `sortOrder` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascending" => Ok(SortOrder::Ascending),
            "descending" => Ok(SortOrder::Descending),
            _ => Err(crate::Error::config(
                "sort_order must be either ascending or descending",
            )),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_max_results() -> u32 {
    100
}

fn default_polling_period_secs() -> u64 {
    3600
}

fn default_include_pdf() -> bool {
    true
}

fn default_recency_window_secs() -> u64 {
    24 * 60 * 60
}

fn default_event_channel_capacity() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let config: SourceConfig =
            serde_json::from_str(r#"{"search_query": "cat:cs.AI"}"#).unwrap();

        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.max_results, 100);
        assert_eq!(config.sort_by, SortBy::SubmittedDate);
        assert_eq!(config.sort_order, SortOrder::Descending);
        assert_eq!(config.polling_period(), Duration::from_secs(3600));
        assert!(config.include_pdf);
        assert!(!config.filter_recent);
        assert_eq!(config.recency_window(), Duration::from_secs(86_400));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sort_wire_names() {
        let config: SourceConfig = serde_json::from_str(
            r#"{"search_query": "AI", "sort_by": "lastUpdatedDate", "sort_order": "ascending"}"#,
        )
        .unwrap();
        assert_eq!(config.sort_by, SortBy::LastUpdatedDate);
        assert_eq!(config.sort_order, SortOrder::Ascending);

        assert!(serde_json::from_str::<SourceConfig>(r#"{"search_query": "AI", "sort_by": "invalid"}"#).is_err());
        assert_eq!("relevance".parse::<SortBy>().unwrap(), SortBy::Relevance);
        assert_eq!(SortOrder::Descending.to_string(), "descending");
    }

    #[test]
    fn test_invalid_sort_values_rejected() {
        let err = "invalid".parse::<SortBy>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: sort_by must be one of: submittedDate, lastUpdatedDate, relevance"
        );
        let err = "sideways".parse::<SortOrder>().unwrap_err();
        assert!(err.to_string().contains("ascending or descending"));
    }

    #[test]
    fn test_validate_search_query_required() {
        let err = SourceConfig::new("  ").validate().unwrap_err();
        assert_eq!(err, crate::Error::config("search_query is required"));
    }

    #[test]
    fn test_validate_max_results_range() {
        for bad in [0, 2001, 3000] {
            let err = SourceConfig::new("AI")
                .with_max_results(bad)
                .validate()
                .unwrap_err();
            assert_eq!(
                err,
                crate::Error::config("max_results must be between 1 and 2000")
            );
        }

        for good in [1, 100, 2000] {
            assert!(SourceConfig::new("AI").with_max_results(good).validate().is_ok());
        }
    }

    #[test]
    fn test_with_recency_window_enables_filter() {
        let config = SourceConfig::new("AI").with_recency_window(Duration::from_secs(3600));
        assert!(config.filter_recent);
        assert_eq!(config.recency_window_secs, 3600);
    }
}
