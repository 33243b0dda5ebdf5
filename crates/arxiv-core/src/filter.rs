//! Recency window filter

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::feed::FeedEntry;

/// Optional predicate dropping entries published outside a recency window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindowFilter {
    enabled: bool,
    window: Duration,
}

impl TimeWindowFilter {
    /// Create a filter
    pub fn new(enabled: bool, window: Duration) -> Self {
        Self { enabled, window }
    }

    /// A filter that keeps everything
    pub fn disabled() -> Self {
        Self::new(false, Duration::ZERO)
    }

    /// Whether the filter drops anything at all
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Apply the filter with the configured settings
    pub fn keep(&self, entry: &FeedEntry, reference_time: DateTime<Utc>) -> bool {
        keep(entry, reference_time, self.window, self.enabled)
    }
}

/// Decide whether `entry` survives the recency window
///
/// Disabled: always `true`. Enabled: `true` unless the entry was published
/// strictly before `reference_time - window`; the boundary itself is kept.
pub fn keep(
    entry: &FeedEntry,
    reference_time: DateTime<Utc>,
    window: Duration,
    enabled: bool,
) -> bool {
    if !enabled {
        return true;
    }

    // A window too large to represent reaches back past any real timestamp.
    let Ok(window) = chrono::Duration::from_std(window) else {
        return true;
    };
    let Some(cutoff) = reference_time.checked_sub_signed(window) else {
        return true;
    };

    entry.published.with_timezone(&Utc) >= cutoff
}
