// # arxiv-core
//
// Core library for the incremental arXiv feed poller.
//
// ## Architecture Overview
//
// This library turns a paginated arXiv Atom feed into a resumable stream of
// change records:
// - **FeedFetcher**: Trait for the network transport (injected)
// - **FeedClient**: Builds the page request and invokes the fetcher
// - **feed::parse**: Decodes the Atom payload into `FeedEntry` values
// - **TimeWindowFilter**: Optional recency window
// - **RecordMapper**: `FeedEntry` + position → `ChangeRecord`
// - **PollingEngine**: Rate-limited fetch cycles, buffer, offset, position
// - **position**: Offset ⇄ opaque position token
//
// ## Design Principles
//
// 1. **Injected Transport**: The engine never talks HTTP itself
// 2. **Single Consumer**: One engine, one caller, `next()` takes `&mut self`
// 3. **At-Least-Once**: Failed cycles leave state untouched and are retried verbatim
// 4. **Library-First**: The daemon is a thin wrapper around this crate

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod filter;
pub mod mapper;
pub mod position;
pub mod traits;

// Re-export core types for convenience
pub use client::{FeedClient, PageQuery};
pub use config::{SortBy, SortOrder, SourceConfig};
pub use engine::{EngineEvent, EngineState, NextRecord, PollingEngine, RateBudget};
pub use error::{Error, Result};
pub use feed::FeedEntry;
pub use filter::TimeWindowFilter;
pub use mapper::{ChangeRecord, Operation, RecordMapper};
pub use position::Position;
pub use traits::FeedFetcher;
