//! Pull-based task source
//!
//! Elements are taken synchronously when a handle is drawn. The sequence ends
//! exactly when the underlying iterator does, so no end marker is needed.

use std::iter::Fuse;

use parking_lot::Mutex;
use tracing::trace;

use super::{OperationHandle, SharedOperation, TaskSource};
use crate::error::PoolError;
use crate::token::Pulled;

struct PullCursor<I> {
    items: Fuse<Box<dyn Iterator<Item = I> + Send>>,
    next_position: usize,
}

/// Task source over a pull-based iterator
pub struct PullSource<I, T, E> {
    operation: SharedOperation<I, T, E>,
    cursor: Mutex<PullCursor<I>>,
}

impl<I, T, E> PullSource<I, T, E> {
    /// Create a pull source applying `operation` to every item of `items`
    pub fn new(
        operation: SharedOperation<I, T, E>,
        items: Box<dyn Iterator<Item = I> + Send>,
    ) -> Self {
        Self {
            operation,
            cursor: Mutex::new(PullCursor {
                items: items.fuse(),
                next_position: 0,
            }),
        }
    }

    /// Number of handles drawn so far
    pub fn drawn(&self) -> usize {
        self.cursor.lock().next_position
    }
}

impl<I, T, E> TaskSource<T, E> for PullSource<I, T, E>
where
    I: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    fn next_handle(&self) -> Option<OperationHandle<T, E>> {
        let (position, item) = {
            let mut cursor = self.cursor.lock();
            let item = cursor.items.next()?;
            let position = cursor.next_position;
            cursor.next_position += 1;
            (position, item)
        };

        // Invoke now; the returned future is the pending handle.
        let pending = (self.operation)(item);
        trace!(position, "Drew handle from pull source");

        Some(OperationHandle::new(Some(position), async move {
            match pending.await {
                Ok(value) => Ok(Pulled::Value { position, value }),
                Err(source) => Err(PoolError::Operation { position, source }),
            }
        }))
    }
}
