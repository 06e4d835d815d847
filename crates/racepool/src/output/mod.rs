//! Completion racing and output assembly
//!
//! - [`Race`] - races outstanding worker invocations, re-arming or retiring slots
//! - [`ResultStream`] - streaming mode: values in completion order
//! - [`drain_into_ledger`] - collection mode: drain the race, read the ledger
//!
//! # State machine
//!
//! ```text
//!   Running ──(a worker retires)──► Draining ──(last worker retires)──► Done
//!      │                               │
//!      └──────(failure / cancel)───────┴──────────────────────────────► Done
//! ```

mod assemble;
mod race;

pub use assemble::{drain_into_ledger, ResultStream};
pub use race::{Race, RaceState};
