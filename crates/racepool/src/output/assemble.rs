//! Output assembly
//!
//! Streaming mode hands each value on as its invocation settles. Collection
//! mode drains the race silently and reads the ledger once it is done.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::stream::{FusedStream, Stream, StreamExt};
use tracing::{debug, instrument, warn};

use super::race::{Race, RaceState};
use crate::error::PoolError;
use crate::ledger::ResultLedger;

/// Lazy, single-pass sequence of results in completion order
///
/// Yields at most one `Err`, after which it is exhausted.
pub struct ResultStream<T, E> {
    race: Race<T, E>,
}

impl<T, E> ResultStream<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    pub(crate) fn new(race: Race<T, E>) -> Self {
        Self { race }
    }

    /// Current race state
    pub fn state(&self) -> RaceState {
        self.race.state()
    }

    /// Number of operations currently in flight
    pub fn in_flight(&self) -> usize {
        self.race.in_flight()
    }

    /// Number of workers retired so far
    pub fn retired(&self) -> usize {
        self.race.retired()
    }
}

impl<T, E> Stream for ResultStream<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Item = Result<T, PoolError<E>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match self.race.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(Some(Ok(event))) => match event.result {
                    Some(value) => return Poll::Ready(Some(Ok(value))),
                    // Unreachable: only the crate builds a `ResultStream`, and
                    // always over a pass-through ledger. Only an ordered ledger
                    // withholds values.
                    None => warn!(
                        slot = event.slot,
                        position = ?event.position,
                        "Value withheld by ledger in streaming mode"
                    ),
                },
            }
        }
    }
}

impl<T, E> FusedStream for ResultStream<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn is_terminated(&self) -> bool {
        self.race.is_terminated()
    }
}

/// Drive `race` to the end, then read every result out of `ledger`
///
/// The first failure ends the drain; outstanding invocations are dropped
/// with the race and no partial list is returned.
#[instrument(skip_all, fields(workers = race.workers()))]
pub async fn drain_into_ledger<T, E>(
    mut race: Race<T, E>,
    ledger: Arc<ResultLedger<T>>,
) -> Result<Vec<T>, PoolError<E>>
where
    T: Send + 'static,
    E: Send + 'static,
{
    let mut completed = 0usize;
    while let Some(event) = race.next().await {
        event?;
        completed += 1;
    }

    debug!(completed, retired = race.retired(), "Drained all workers");
    Ok(ledger.take_values())
}
