// # Rate Budget
//
// Fixed-interval gate in front of every fetch cycle. The first acquire is
// granted immediately; each later acquire waits until `interval` has passed
// since the previous grant. Waiting is the engine's only suspension point and
// is cut short by the caller's cancellation token.

use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Upper bound on the polling interval, keeps deadline arithmetic in range
const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Gate allowing at most one fetch cycle per interval
#[derive(Debug)]
pub struct RateBudget {
    interval: Duration,
    next_allowed: Option<Instant>,
}

impl RateBudget {
    /// Create a budget that allows one immediate acquire
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.min(MAX_INTERVAL),
            next_allowed: None,
        }
    }

    /// Configured interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time left before the next acquire is granted without waiting
    pub fn time_until_ready(&self) -> Duration {
        self.next_allowed
            .map(|at| at.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO)
    }

    /// Wait for the next slot
    ///
    /// # Returns
    ///
    /// - `Ok(())`: a slot was granted; the next one opens `interval` from now
    /// - `Err(Error::Cancelled)`: `cancel` fired first (or was already fired);
    ///   no slot is consumed
    pub async fn acquire(&mut self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        if let Some(deadline) = self.next_allowed
            && deadline > Instant::now()
        {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep_until(deadline) => {}
            }
        }

        self.next_allowed = Some(Instant::now() + self.interval);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_is_immediate() {
        let mut budget = RateBudget::new(Duration::from_secs(60));
        let cancel = CancellationToken::new();

        let start = Instant::now();
        budget.acquire(&cancel).await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(budget.time_until_ready(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_acquire_waits_full_interval() {
        let mut budget = RateBudget::new(Duration::from_secs(60));
        let cancel = CancellationToken::new();

        budget.acquire(&cancel).await.unwrap();
        let start = Instant::now();
        budget.acquire(&cancel).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_interval_already_elapsed() {
        let mut budget = RateBudget::new(Duration::from_secs(60));
        let cancel = CancellationToken::new();

        budget.acquire(&cancel).await.unwrap();
        tokio::time::advance(Duration::from_secs(45)).await;

        let start = Instant::now();
        budget.acquire(&cancel).await.unwrap();
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(15) && waited < Duration::from_secs(16));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_never_waits() {
        let mut budget = RateBudget::new(Duration::ZERO);
        let cancel = CancellationToken::new();

        let start = Instant::now();
        for _ in 0..5 {
            budget.acquire(&cancel).await.unwrap();
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_wait() {
        let mut budget = RateBudget::new(Duration::from_secs(60));
        let cancel = CancellationToken::new();
        budget.acquire(&cancel).await.unwrap();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let err = budget.acquire(&cancel).await.unwrap_err();
        assert_eq!(err, Error::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_already_cancelled_refuses_even_first_slot() {
        let mut budget = RateBudget::new(Duration::from_secs(60));
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(budget.acquire(&cancel).await, Err(Error::Cancelled));
        assert_eq!(budget.time_until_ready(), Duration::ZERO);
    }
}
