//! Core polling engine
//!
//! The PollingEngine is responsible for:
//! - Gating fetch cycles through the rate budget
//! - Fetching, parsing, filtering and mapping one page per cycle
//! - Buffering the resulting records and serving them one at a time
//! - Advancing the pagination offset and the last emitted position
//!
//! ## Architecture
//!
//! ```text
//!                    next()
//!                      │
//!            ┌─────────┴─────────┐
//!     buffer non-empty      buffer empty
//!            │                   │
//!            │            ┌──────────────┐
//!            │            │  RateBudget  │ (only suspension point)
//!            │            └──────────────┘
//!            │                   │
//!            │            ┌──────────────┐     ┌──────────────┐
//!            │            │  FeedClient  │────►│ FeedFetcher  │ (injected)
//!            │            └──────────────┘     └──────────────┘
//!            │                   │ raw bytes
//!            │         parse ─► filter ─► map
//!            │                   │
//!            │            refill buffer, offset += page entries
//!            ▼                   ▼
//!       pop front, last_position = record.position
//! ```
//!
//! ## Delivery
//!
//! At-least-once. A failed cycle leaves offset and buffer untouched, so the
//! next call re-requests the identical page. `ack()` is informational only.

mod rate;
mod state;
mod stream;

pub use rate::RateBudget;
pub use state::{EngineState, PollState};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::client::{FeedClient, PageQuery};
use crate::config::SourceConfig;
use crate::error::Result;
use crate::feed;
use crate::filter::TimeWindowFilter;
use crate::mapper::{ChangeRecord, RecordMapper};
use crate::position::{self, Position};
use crate::traits::FeedFetcher;

/// Outcome of a successful [`PollingEngine::next()`] call
#[derive(Debug, Clone, PartialEq)]
pub enum NextRecord {
    /// The next record in stream order
    Record(ChangeRecord),
    /// Nothing to deliver yet; retry later with a caller-chosen backoff
    NoRecordAvailable,
}

impl NextRecord {
    /// The record, if one was delivered
    pub fn into_record(self) -> Option<ChangeRecord> {
        match self {
            NextRecord::Record(record) => Some(record),
            NextRecord::NoRecordAvailable => None,
        }
    }

    /// Whether the caller should back off
    pub fn is_empty(&self) -> bool {
        matches!(self, NextRecord::NoRecordAvailable)
    }
}

/// Events emitted by the PollingEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Session opened
    Opened {
        offset: u64,
    },

    /// A fetch cycle completed
    PageFetched {
        /// Offset the page was requested at
        offset: u64,
        /// Entries returned by upstream
        received: usize,
        /// Entries that survived the recency filter
        retained: usize,
    },

    /// A fetch cycle failed; offset and buffer are unchanged
    FetchFailed {
        offset: u64,
        error: String,
    },

    /// The caller acknowledged a record
    Acked {
        position: Position,
    },

    /// Session torn down
    Stopped {
        last_position: Position,
    },
}

/// Core polling engine
///
/// One engine serves one logical consumer. `next()` takes `&mut self`, so
/// sharing an engine between tasks requires the caller's own mutex.
///
/// ## Lifecycle
///
/// 1. Create with [`PollingEngine::open()`] from a (possibly empty) position
/// 2. Call [`PollingEngine::next()`] repeatedly, persisting record positions
/// 3. Finish with [`PollingEngine::teardown()`]
pub struct PollingEngine {
    /// Transport wrapper
    client: FeedClient,

    /// Entry → record conversion
    mapper: RecordMapper,

    /// Recency window
    filter: TimeWindowFilter,

    /// Session settings
    config: SourceConfig,

    /// Fetch gate
    budget: RateBudget,

    /// Offset, buffer, last position
    state: PollState,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl PollingEngine {
    /// Open a polling session
    ///
    /// # Parameters
    ///
    /// - `config`: validated session settings
    /// - `fetcher`: transport implementation
    /// - `position`: resume point; empty or unparseable tokens start at 0
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn open(
        config: SourceConfig,
        fetcher: Box<dyn FeedFetcher>,
        position: &Position,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let offset = position::decode(position);
        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            client: FeedClient::new(config.api_url.clone(), fetcher),
            mapper: RecordMapper::new(config.include_pdf),
            filter: TimeWindowFilter::new(config.filter_recent, config.recency_window()),
            budget: RateBudget::new(config.polling_period()),
            state: PollState::new(offset, position.clone()),
            config,
            event_tx: tx,
        };

        info!(
            search_query = %engine.config.search_query,
            offset,
            "opening arXiv source"
        );
        engine.emit_event(EngineEvent::Opened { offset });

        Ok((engine, rx))
    }

    /// Deliver the next record
    ///
    /// Serves from the buffer when possible. Otherwise waits for the rate
    /// budget, runs one fetch cycle, and serves the first record it produced.
    ///
    /// # Returns
    ///
    /// - `Ok(NextRecord::Record(_))`: the next record in stream order
    /// - `Ok(NextRecord::NoRecordAvailable)`: the cycle produced nothing
    /// - `Err(Error::Cancelled)`: `cancel` fired during the rate wait; no fetch happened
    /// - `Err(_)`: fetch or parse failure; state unchanged, retry re-fetches the same page
    pub async fn next(&mut self, cancel: &CancellationToken) -> Result<NextRecord> {
        if let Some(record) = self.state.pop_front() {
            trace!(position = %record.position, "serving buffered record");
            return Ok(NextRecord::Record(record));
        }

        self.state.set_phase(EngineState::RateWait);
        if let Err(e) = self.budget.acquire(cancel).await {
            self.state.set_phase(EngineState::Idle);
            return Err(e);
        }

        if let Err(e) = self.fill_buffer().await {
            let offset = self.state.offset();
            warn!(offset, error = %e, "fetch cycle failed");
            self.state.set_phase(EngineState::Idle);
            self.emit_event(EngineEvent::FetchFailed {
                offset,
                error: e.to_string(),
            });
            return Err(e);
        }

        Ok(match self.state.pop_front() {
            Some(record) => NextRecord::Record(record),
            None => NextRecord::NoRecordAvailable,
        })
    }

    /// Acknowledge a record
    ///
    /// Observability only: acknowledgements do not change what the engine
    /// delivers next.
    pub fn ack(&self, position: &Position) {
        debug!(%position, "got ack");
        self.emit_event(EngineEvent::Acked {
            position: position.clone(),
        });
    }

    /// Tear the session down
    ///
    /// # Returns
    ///
    /// The last emitted position, for the caller to persist. Buffered but
    /// undelivered records are dropped and will be re-fetched on resume.
    pub fn teardown(self) -> Position {
        let last_position = self.state.last_position().clone();
        info!(
            %last_position,
            dropped = self.state.buffered(),
            "tearing down arXiv source"
        );
        self.emit_event(EngineEvent::Stopped {
            last_position: last_position.clone(),
        });
        last_position
    }

    /// Current state machine phase
    pub fn state(&self) -> EngineState {
        self.state.phase()
    }

    /// Offset the next fetch cycle will request
    pub fn offset(&self) -> u64 {
        self.state.offset()
    }

    /// Number of buffered records
    pub fn buffered(&self) -> usize {
        self.state.buffered()
    }

    /// Position of the last record handed out
    pub fn last_position(&self) -> &Position {
        self.state.last_position()
    }

    /// Session settings
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Run one fetch cycle and refill the buffer
    ///
    /// Nothing in `self.state` except the phase changes unless the whole
    /// cycle succeeds.
    async fn fill_buffer(&mut self) -> Result<()> {
        let offset = self.state.offset();
        let query = PageQuery::new(
            self.config.search_query.clone(),
            self.config.sort_by,
            self.config.sort_order,
            offset,
            self.config.max_results,
        );
        debug!(offset, "filling buffer with arXiv entries");

        self.state.set_phase(EngineState::Fetching);
        let raw = self.client.fetch(&query).await?;
        let entries = feed::parse(&raw)?;

        self.state.set_phase(EngineState::Filling);
        let reference_time = Utc::now();
        let records: Vec<ChangeRecord> = entries
            .iter()
            .zip(offset..)
            .filter(|(entry, _)| self.filter.keep(entry, reference_time))
            .map(|(entry, at)| self.mapper.map(entry, Position::from_offset(at)))
            .collect();

        let received = entries.len();
        let retained = records.len();
        debug!(offset, received, retained, "page fetched");

        self.state.refill(records, received as u64);
        self.emit_event(EngineEvent::PageFetched {
            offset,
            received,
            retained,
        });

        Ok(())
    }

    /// Emit an engine event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening; events are optional.
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

impl std::fmt::Debug for PollingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingEngine")
            .field("client", &self.client)
            .field("state", &self.state)
            .field("budget", &self.budget)
            .finish_non_exhaustive()
    }
}
