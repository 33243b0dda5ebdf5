// # Record Stream
//
// Drives an engine from a background task and exposes the records as a
// stream. This is one caller-side backoff policy layered on top of `next()`:
// fixed delay after an empty cycle or a failed cycle, stop on cancellation.
//
// Every wait in the driver also watches the stream's receiver, so dropping
// the stream tears the engine down without waiting out a rate interval.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{NextRecord, PollingEngine};
use crate::error::{Error, Result};
use crate::mapper::ChangeRecord;

/// Records buffered between the driver task and the stream consumer
const RECORD_STREAM_CAPACITY: usize = 256;

impl PollingEngine {
    /// Move the engine into a background task and stream its records
    ///
    /// Errors are forwarded as `Err` items and followed by a `backoff` pause;
    /// the stream keeps going. It ends when `cancel` fires or the stream is
    /// dropped, after which the engine is torn down.
    ///
    /// # Parameters
    ///
    /// - `cancel`: stops the driver, also interrupting rate and backoff waits
    /// - `backoff`: pause after `NoRecordAvailable` or an error
    pub fn into_stream(
        self,
        cancel: CancellationToken,
        backoff: Duration,
    ) -> ReceiverStream<Result<ChangeRecord>> {
        let (tx, rx) = mpsc::channel(RECORD_STREAM_CAPACITY);
        tokio::spawn(drive(self, tx, cancel, backoff));
        ReceiverStream::new(rx)
    }
}

async fn drive(
    mut engine: PollingEngine,
    tx: mpsc::Sender<Result<ChangeRecord>>,
    cancel: CancellationToken,
    backoff: Duration,
) {
    loop {
        let outcome = tokio::select! {
            biased;
            _ = tx.closed() => {
                debug!("record stream dropped, stopping driver");
                break;
            }
            outcome = engine.next(&cancel) => outcome,
        };

        let item = match outcome {
            Ok(NextRecord::Record(record)) => Ok(record),
            Ok(NextRecord::NoRecordAvailable) => {
                debug!(?backoff, "no records available, backing off");
                if !pause(&tx, &cancel, backoff).await {
                    break;
                }
                continue;
            }
            Err(Error::Cancelled) => break,
            Err(e) => Err(e),
        };

        let failed = item.is_err();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = tx.send(item) => {
                if sent.is_err() {
                    debug!("record stream dropped, stopping driver");
                    break;
                }
            }
        }

        if failed && !pause(&tx, &cancel, backoff).await {
            break;
        }
    }

    let last_position = engine.teardown();
    info!(%last_position, "record stream finished");
}

/// Sleep for `backoff`; `false` if cancelled or the stream was dropped first
async fn pause(
    tx: &mpsc::Sender<Result<ChangeRecord>>,
    cancel: &CancellationToken,
    backoff: Duration,
) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tx.closed() => false,
        _ = tokio::time::sleep(backoff) => true,
    }
}
