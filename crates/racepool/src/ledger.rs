//! Result ledger
//!
//! In collection mode the ledger holds every result keyed by the element's
//! position, so reading it out yields input order no matter which operation
//! finished first. In streaming mode results go straight to the caller and the
//! ledger retains nothing.

use std::collections::BTreeMap;

use parking_lot::Mutex;

/// Whether the ledger retains results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMode {
    /// Retain every result for ordered read-out
    Ordered,
    /// Retain nothing; results pass through to the caller
    PassThrough,
}

#[derive(Debug)]
enum Entry<T> {
    Pending,
    Ready(T),
}

/// Position-keyed store of results for one run
#[derive(Debug)]
pub struct ResultLedger<T> {
    mode: LedgerMode,
    entries: Mutex<BTreeMap<usize, Entry<T>>>,
}

impl<T> ResultLedger<T> {
    /// Create an empty ledger
    pub fn new(mode: LedgerMode) -> Self {
        Self {
            mode,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Ledger mode
    pub fn mode(&self) -> LedgerMode {
        self.mode
    }

    /// Record that the element at `position` is in flight
    pub fn reserve(&self, position: usize) {
        if self.mode == LedgerMode::Ordered {
            self.entries.lock().insert(position, Entry::Pending);
        }
    }

    /// Store the result for `position`
    ///
    /// Returns the value back when the ledger does not retain it, so the
    /// caller can hand it on.
    pub fn record(&self, position: usize, value: T) -> Option<T> {
        match self.mode {
            LedgerMode::Ordered => {
                self.entries.lock().insert(position, Entry::Ready(value));
                None
            }
            LedgerMode::PassThrough => Some(value),
        }
    }

    /// Drop the placeholder for `position`, if any
    pub fn discard(&self, position: usize) {
        self.entries.lock().remove(&position);
    }

    /// Number of entries, pending or ready
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the ledger holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Number of reserved entries still waiting on their operation
    ///
    /// Only pull-based elements are reserved at draw time. A push-based
    /// element's position is unknown until its fetch runs, so it is never
    /// counted here. This is not a count of elements in flight.
    pub fn pending(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|entry| matches!(entry, Entry::Pending))
            .count()
    }

    /// Take every ready result, in position order
    ///
    /// Pending placeholders are skipped; after a fully drained run there are
    /// none.
    pub fn take_values(&self) -> Vec<T> {
        std::mem::take(&mut *self.entries.lock())
            .into_values()
            .filter_map(|entry| match entry {
                Entry::Ready(value) => Some(value),
                Entry::Pending => None,
            })
            .collect()
    }
}
