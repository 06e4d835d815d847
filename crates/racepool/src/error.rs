//! Error types for pool runs

use crate::options::OptionsError;

/// Errors surfaced by a pool run
///
/// `E` is the caller's error type, shared by the operation and by fallible
/// push-based sources. Nothing here is retried or swallowed: the first
/// failure observed by the racer terminates the run.
#[derive(Debug, thiserror::Error)]
pub enum PoolError<E> {
    /// Concurrency was zero
    #[error("concurrency must be a positive integer, got {0}")]
    InvalidConcurrency(usize),

    /// Options could not be parsed or validated
    #[error("invalid pool options: {0}")]
    Options(#[from] OptionsError),

    /// The operation failed for the element at `position`
    #[error("operation failed for element {position}: {source}")]
    Operation { position: usize, source: E },

    /// The source failed to produce the element at `position`
    #[error("source failed to produce element {position}: {source}")]
    Source { position: usize, source: E },

    /// The run was cancelled before the source was exhausted
    #[error("pool run was cancelled")]
    Cancelled,
}

impl<E> PoolError<E> {
    /// Position of the element that failed, if the failure belongs to one
    pub fn position(&self) -> Option<usize> {
        match self {
            PoolError::Operation { position, .. } | PoolError::Source { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }

    /// Whether this is a misuse error reported before any worker started
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            PoolError::InvalidConcurrency(_) | PoolError::Options(_)
        )
    }

    /// Consume the error, returning the caller's error if there is one
    pub fn into_inner(self) -> Option<E> {
        match self {
            PoolError::Operation { source, .. } | PoolError::Source { source, .. } => Some(source),
            _ => None,
        }
    }
}
