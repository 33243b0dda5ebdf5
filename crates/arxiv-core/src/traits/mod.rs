//! Core traits for the arXiv poller
//!
//! This module defines the abstract interfaces the engine depends on.
//!
//! - [`FeedFetcher`]: Perform the network fetch of one page of results

pub mod feed_fetcher;

pub use feed_fetcher::FeedFetcher;
