//! Worker pool
//!
//! This module provides:
//! - [`Worker`] - one pool slot running pull, await, report
//! - [`CompletionEvent`] - the slot-tagged outcome of one invocation
//! - [`create_workers`] - builds the fixed set of workers for a run
//!
//! # Architecture
//!
//! ```text
//!                 Arc<dyn TaskSource>  (one shared cursor)
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!     ┌──────────┐   ┌──────────┐   ┌──────────┐
//!     │ slot 0   │   │ slot 1   │   │ slot N-1 │
//!     └────┬─────┘   └────┬─────┘   └────┬─────┘
//!          │  reserve / record / discard  │
//!          └──────────────┬───────────────┘
//!                         ▼
//!                Arc<ResultLedger>
//! ```

mod event;
mod pool;

pub use event::{CompletionEvent, WorkerId};
pub use pool::{create_workers, Worker, WorkerRun};
