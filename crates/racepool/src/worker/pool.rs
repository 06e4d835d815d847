//! Fixed-size worker pool
//!
//! Every worker runs the same step: draw a handle from the shared source,
//! await it, report. Workers own no data beyond their identity; the racer
//! decides when a worker runs again.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::event::{CompletionEvent, WorkerId};
use crate::error::PoolError;
use crate::ledger::ResultLedger;
use crate::source::TaskSource;
use crate::token::Pulled;

/// Future of a single worker invocation
pub type WorkerRun<T, E> = BoxFuture<'static, Result<CompletionEvent<T>, PoolError<E>>>;

/// One slot of the pool
pub struct Worker<T, E> {
    id: WorkerId,
    slot: usize,
    source: Arc<dyn TaskSource<T, E>>,
    ledger: Arc<ResultLedger<T>>,
    cancel: CancellationToken,
}

impl<T, E> Worker<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Create a worker for `slot`
    pub fn new(
        slot: usize,
        source: Arc<dyn TaskSource<T, E>>,
        ledger: Arc<ResultLedger<T>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id: WorkerId::new(),
            slot,
            source,
            ledger,
            cancel,
        }
    }

    /// Worker identity
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Slot index
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Start one invocation: pull, await, report
    pub fn run(self: &Arc<Self>) -> WorkerRun<T, E> {
        let worker = Arc::clone(self);
        Box::pin(async move { worker.step().await })
    }

    async fn step(&self) -> Result<CompletionEvent<T>, PoolError<E>> {
        // Cancellation is a failure, never exhaustion.
        if self.cancel.is_cancelled() {
            trace!(slot = self.slot, "Cancelled, not pulling");
            return Err(PoolError::Cancelled);
        }

        let Some(handle) = self.source.next_handle() else {
            trace!(slot = self.slot, "Source exhausted on pull");
            return Ok(self.ended(None));
        };

        let drawn_position = handle.position();
        if let Some(position) = drawn_position {
            self.ledger.reserve(position);
        }

        match handle.await {
            Ok(Pulled::Value { position, value }) => {
                trace!(slot = self.slot, position, "Operation completed");
                Ok(CompletionEvent {
                    slot: self.slot,
                    worker_id: self.id,
                    position: Some(position),
                    result: self.ledger.record(position, value),
                    reached_end: false,
                })
            }
            Ok(Pulled::End(_)) => {
                if let Some(position) = drawn_position {
                    self.ledger.discard(position);
                }
                trace!(slot = self.slot, "Handle carried end of stream");
                Ok(self.ended(drawn_position))
            }
            Err(e) => {
                debug!(
                    slot = self.slot,
                    worker_id = %self.id,
                    position = ?e.position(),
                    "Worker invocation failed"
                );
                Err(e)
            }
        }
    }

    fn ended(&self, position: Option<usize>) -> CompletionEvent<T> {
        CompletionEvent {
            slot: self.slot,
            worker_id: self.id,
            position,
            result: None,
            reached_end: true,
        }
    }
}

/// Create `count` workers sharing one source and one ledger
pub fn create_workers<T, E>(
    count: usize,
    source: Arc<dyn TaskSource<T, E>>,
    ledger: Arc<ResultLedger<T>>,
    cancel: CancellationToken,
) -> Vec<Arc<Worker<T, E>>>
where
    T: Send + 'static,
    E: Send + 'static,
{
    (0..count)
        .map(|slot| {
            Arc::new(Worker::new(
                slot,
                Arc::clone(&source),
                Arc::clone(&ledger),
                cancel.clone(),
            ))
        })
        .collect()
}
