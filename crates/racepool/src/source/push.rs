//! Push-based task source
//!
//! The stream can only be asked for its next element asynchronously, so each
//! handle wraps that request. A handle whose fetch comes back empty resolves to
//! [`Pulled::End`] and flips the exhausted flag; from then on no new handles
//! are handed out. Handles already drawn still resolve, to the end marker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use super::{OperationHandle, SharedOperation, TaskSource};
use crate::error::PoolError;
use crate::token::Pulled;

struct PushCursor<I, E> {
    items: BoxStream<'static, Result<I, E>>,
    next_position: usize,
    finished: bool,
}

struct PushShared<I, E> {
    cursor: Mutex<PushCursor<I, E>>,
    exhausted: AtomicBool,
}

impl<I, E> PushShared<I, E> {
    fn mark_exhausted(&self) {
        if !self.exhausted.swap(true, Ordering::AcqRel) {
            debug!("Push source exhausted");
        }
    }
}

/// Task source over a push-based stream
pub struct PushSource<I, T, E> {
    operation: SharedOperation<I, T, E>,
    shared: Arc<PushShared<I, E>>,
}

impl<I, T, E> PushSource<I, T, E> {
    /// Create a push source applying `operation` to every element of `items`
    pub fn new(operation: SharedOperation<I, T, E>, items: BoxStream<'static, Result<I, E>>) -> Self {
        Self {
            operation,
            shared: Arc::new(PushShared {
                cursor: Mutex::new(PushCursor {
                    items,
                    next_position: 0,
                    finished: false,
                }),
                exhausted: AtomicBool::new(false),
            }),
        }
    }

    /// Whether a fetch has observed the end of the stream
    pub fn is_exhausted(&self) -> bool {
        self.shared.exhausted.load(Ordering::Acquire)
    }
}

impl<I, T, E> TaskSource<T, E> for PushSource<I, T, E>
where
    I: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    fn next_handle(&self) -> Option<OperationHandle<T, E>> {
        if self.is_exhausted() {
            return None;
        }

        let shared = Arc::clone(&self.shared);
        let operation = Arc::clone(&self.operation);

        Some(OperationHandle::new(None, async move {
            let (position, item) = {
                let mut cursor = shared.cursor.lock().await;
                // A finished stream is never polled again.
                if cursor.finished {
                    return Ok(Pulled::end());
                }

                let position = cursor.next_position;
                match cursor.items.next().await {
                    Some(Ok(item)) => {
                        cursor.next_position += 1;
                        (position, item)
                    }
                    Some(Err(source)) => {
                        cursor.finished = true;
                        shared.mark_exhausted();
                        return Err(PoolError::Source { position, source });
                    }
                    None => {
                        cursor.finished = true;
                        shared.mark_exhausted();
                        return Ok(Pulled::end());
                    }
                }
            };

            trace!(position, "Fetched element from push source");
            match operation(item).await {
                Ok(value) => Ok(Pulled::Value { position, value }),
                Err(source) => Err(PoolError::Operation { position, source }),
            }
        }))
    }
}
