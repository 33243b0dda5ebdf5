// # Poll State
//
// Process-local state of one polling session: the pagination offset, the FIFO
// of records not yet handed out, and the position of the last record that
// was. Discarded on teardown; only the last position is durable, and only
// because the caller persists it.

use std::collections::VecDeque;
use std::fmt;

use crate::mapper::ChangeRecord;
use crate::position::Position;

/// Phase of the engine state machine
///
/// ```text
/// Idle ─► RateWait ─► Fetching ─► Filling ─► Draining ─► Idle
///   ▲        │            │           │
///   └────────┴────────────┴───────────┘  (cancel / error / empty page)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Buffer empty, no fetch in flight
    Idle,
    /// Blocked on the rate budget
    RateWait,
    /// Waiting on the fetcher
    Fetching,
    /// Parsing, filtering and mapping a fetched page
    Filling,
    /// Buffer non-empty, serving records
    Draining,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::Idle => "idle",
            EngineState::RateWait => "rate_wait",
            EngineState::Fetching => "fetching",
            EngineState::Filling => "filling",
            EngineState::Draining => "draining",
        };
        f.write_str(name)
    }
}

/// Mutable state owned by a single engine instance
#[derive(Debug)]
pub struct PollState {
    offset: u64,
    buffer: VecDeque<ChangeRecord>,
    last_position: Position,
    phase: EngineState,
}

impl PollState {
    /// Fresh state resuming at `offset`
    pub(crate) fn new(offset: u64, last_position: Position) -> Self {
        Self {
            offset,
            buffer: VecDeque::new(),
            last_position,
            phase: EngineState::Idle,
        }
    }

    /// Offset the next fetch cycle will request
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of records waiting to be dequeued
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Position of the last record handed out (or the opening position)
    pub fn last_position(&self) -> &Position {
        &self.last_position
    }

    /// Current phase
    pub fn phase(&self) -> EngineState {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: EngineState) {
        self.phase = phase;
    }

    /// Install the records of a successful cycle and advance past the page
    ///
    /// `received` is the raw entry count of the page, which may exceed
    /// `records.len()` when entries were filtered out.
    pub(crate) fn refill(&mut self, records: Vec<ChangeRecord>, received: u64) {
        self.buffer.extend(records);
        self.offset = self.offset.saturating_add(received);
        self.phase = self.drain_phase();
    }

    /// Hand out the oldest buffered record
    pub(crate) fn pop_front(&mut self) -> Option<ChangeRecord> {
        let record = self.buffer.pop_front();
        if let Some(ref record) = record {
            self.last_position = record.position.clone();
        }
        self.phase = self.drain_phase();
        record
    }

    fn drain_phase(&self) -> EngineState {
        if self.buffer.is_empty() {
            EngineState::Idle
        } else {
            EngineState::Draining
        }
    }
}
