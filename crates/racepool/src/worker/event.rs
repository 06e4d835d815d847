//! Worker identity and completion events

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Process-unique worker identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(Uuid);

impl WorkerId {
    /// Generate a fresh identity
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for WorkerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

/// Outcome of one worker invocation
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionEvent<T> {
    /// Fixed slot index of the worker (0..concurrency)
    pub slot: usize,

    /// Identity of the worker
    pub worker_id: WorkerId,

    /// Position of the element the invocation processed
    pub position: Option<usize>,

    /// The result, unless the ledger kept it or the source ran dry
    pub result: Option<T>,

    /// Whether the worker found nothing left and must retire
    pub reached_end: bool,
}

impl<T> CompletionEvent<T> {
    /// Whether the invocation processed an element
    pub fn did_work(&self) -> bool {
        !self.reached_end
    }
}
