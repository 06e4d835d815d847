//! # Racepool
//!
//! A bounded-concurrency task runner: applies an async operation to every
//! element of a source with at most `concurrency` invocations in flight.
//!
//! ## Features
//!
//! - **Ordered collection**: results come back in input order, whatever order they finished in
//! - **Completion-order streaming**: results are yielded as soon as each one settles
//! - **Uniform sources**: collections, iterators, and async streams share one pull contract
//! - **Fail fast**: the first failure ends the run and abandons in-flight work
//! - **Cancellation**: runs stop pulling and abandon work when a token fires
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        TaskSource                            │
//! │  (lazy handles; push sources resolve to EndOfStream at end) │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Workers (N fixed slots)                     │
//! │  (pull one handle, await it, report a CompletionEvent)      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                           Race                               │
//! │  (first settled wins; re-arm slot or retire it)             │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                              │
//!                 ▼                              ▼
//!         ResultStream                    ResultLedger
//!     (completion order)               (input order, collect)
//! ```
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//!
//! use futures::StreamExt;
//! use racepool::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() {
//! async fn invert(x: u64) -> Result<u64, std::convert::Infallible> {
//!     let value = 1000 / x;
//!     tokio::time::sleep(Duration::from_millis(value)).await;
//!     Ok(value)
//! }
//!
//! let pool = TaskPool::new(PoolOptions::new().with_concurrency(2));
//!
//! let ordered = pool.collect(invert, Source::items([10, 25, 50])).await.unwrap();
//! assert_eq!(ordered, vec![100, 40, 20]);
//!
//! let streamed: Vec<u64> = pool
//!     .stream(invert, Source::items([10, 25, 50]))
//!     .unwrap()
//!     .map(|r| r.unwrap())
//!     .collect()
//!     .await;
//! assert_eq!(streamed, vec![40, 20, 100]);
//! # }
//! ```

pub mod error;
pub mod ledger;
pub mod options;
pub mod output;
pub mod pool;
pub mod source;
pub mod token;
pub mod worker;

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::PoolError;
    pub use crate::options::{OutputMode, PoolOptions};
    pub use crate::output::{RaceState, ResultStream};
    pub use crate::pool::{PoolOutput, TaskPool};
    pub use crate::source::{spread, Source};
    pub use tokio_util::sync::CancellationToken;
}

// Re-export key types at crate root
pub use error::PoolError;
pub use ledger::{LedgerMode, ResultLedger};
pub use options::{OptionsError, OutputMode, PoolOptions};
pub use output::{RaceState, ResultStream};
pub use pool::{CollectFuture, PoolOutput, TaskPool};
pub use source::{spread, Apply, OperationHandle, Source, TaskSource};
pub use token::{EndOfStream, Pulled};
pub use worker::{CompletionEvent, WorkerId};
