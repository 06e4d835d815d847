//! Completion racer
//!
//! Keeps one outstanding invocation per live worker and hands back whichever
//! settles first. A worker that produced a value is re-armed straight away; a
//! worker that reached the end is retired for good. The race is over when no
//! worker is left, when an invocation fails, or when the run is cancelled.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::stream::{FusedStream, FuturesUnordered, Stream, StreamExt};
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::PoolError;
use crate::worker::{CompletionEvent, Worker, WorkerRun};

/// Race lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceState {
    /// Every worker is still active
    Running,
    /// Some workers have retired, others are still active
    Draining,
    /// All workers retired, or the race was cut short
    Done,
}

/// Stream of non-terminal completion events, in completion order
pub struct Race<T, E> {
    workers: Vec<Arc<Worker<T, E>>>,
    outstanding: FuturesUnordered<WorkerRun<T, E>>,
    cancelled: Option<BoxFuture<'static, ()>>,
    retired: usize,
    state: RaceState,
}

impl<T, E> Race<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Start the first invocation of every worker
    pub fn new(workers: Vec<Arc<Worker<T, E>>>, cancel: CancellationToken) -> Self {
        let outstanding: FuturesUnordered<_> = workers.iter().map(|worker| worker.run()).collect();
        let state = if outstanding.is_empty() {
            RaceState::Done
        } else {
            RaceState::Running
        };

        Self {
            workers,
            outstanding,
            cancelled: Some(cancel.cancelled_owned().boxed()),
            retired: 0,
            state,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> RaceState {
        self.state
    }

    /// Number of invocations currently outstanding
    pub fn in_flight(&self) -> usize {
        self.outstanding.len()
    }

    /// Number of workers retired so far
    pub fn retired(&self) -> usize {
        self.retired
    }

    /// Pool size
    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    /// Stop racing and abandon every outstanding invocation
    fn finish(&mut self) {
        self.state = RaceState::Done;
        self.outstanding = FuturesUnordered::new();
        self.cancelled = None;
    }
}

impl<T, E> Stream for Race<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Item = Result<CompletionEvent<T>, PoolError<E>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.state == RaceState::Done {
            return Poll::Ready(None);
        }

        if let Some(cancelled) = self.cancelled.as_mut() {
            if cancelled.poll_unpin(cx).is_ready() {
                debug!(in_flight = self.outstanding.len(), "Run cancelled, abandoning workers");
                self.finish();
                return Poll::Ready(Some(Err(PoolError::Cancelled)));
            }
        }

        loop {
            match self.outstanding.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(None) => {
                    self.finish();
                    return Poll::Ready(None);
                }
                Poll::Ready(Some(Ok(event))) if !event.reached_end => {
                    let next = self.workers[event.slot].run();
                    self.outstanding.push(next);
                    return Poll::Ready(Some(Ok(event)));
                }
                Poll::Ready(Some(Ok(event))) => {
                    self.retired += 1;
                    trace!(
                        slot = event.slot,
                        worker_id = %event.worker_id,
                        retired = self.retired,
                        "Worker retired"
                    );

                    if self.outstanding.is_empty() {
                        debug!(workers = self.workers.len(), "All workers retired");
                        self.finish();
                        return Poll::Ready(None);
                    }
                    self.state = RaceState::Draining;
                }
                Poll::Ready(Some(Err(e))) => {
                    debug!(
                        in_flight = self.outstanding.len(),
                        "Invocation failed, abandoning remaining workers"
                    );
                    self.finish();
                    return Poll::Ready(Some(Err(e)));
                }
            }
        }
    }
}

impl<T, E> FusedStream for Race<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn is_terminated(&self) -> bool {
        self.state == RaceState::Done
    }
}
