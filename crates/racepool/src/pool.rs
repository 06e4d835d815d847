//! Pool entry point
//!
//! Wires one run together: task source, ledger, workers, race, and the output
//! strategy the options ask for.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::{FutureExt, TryStreamExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::PoolError;
use crate::ledger::{LedgerMode, ResultLedger};
use crate::options::{OptionsError, OutputMode, PoolOptions};
use crate::output::{drain_into_ledger, Race, ResultStream};
use crate::source::{shared_operation, task_source, Source};
use crate::worker::create_workers;

/// Ordered results of a collection-mode run
pub type CollectFuture<T, E> = BoxFuture<'static, Result<Vec<T>, PoolError<E>>>;

/// Output of [`TaskPool::run`], shaped by [`OutputMode`]
pub enum PoolOutput<T, E> {
    /// Results in completion order
    Stream(ResultStream<T, E>),
    /// All results at once, in input order
    Collect(CollectFuture<T, E>),
}

impl<T, E> PoolOutput<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// The output mode this value was produced for
    pub fn mode(&self) -> OutputMode {
        match self {
            PoolOutput::Stream(_) => OutputMode::Stream,
            PoolOutput::Collect(_) => OutputMode::Collect,
        }
    }

    /// The stream, if this is a streaming run
    pub fn into_stream(self) -> Option<ResultStream<T, E>> {
        match self {
            PoolOutput::Stream(stream) => Some(stream),
            PoolOutput::Collect(_) => None,
        }
    }

    /// Wait for every result
    ///
    /// A streaming run is gathered in completion order, a collecting run in
    /// input order.
    pub async fn into_vec(self) -> Result<Vec<T>, PoolError<E>> {
        match self {
            PoolOutput::Stream(stream) => stream.try_collect().await,
            PoolOutput::Collect(collect) => collect.await,
        }
    }
}

impl<T, E> fmt::Debug for PoolOutput<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolOutput::Stream(_) => f.write_str("PoolOutput::Stream"),
            PoolOutput::Collect(_) => f.write_str("PoolOutput::Collect"),
        }
    }
}

/// Bounded-concurrency task runner
///
/// # Example
///
/// ```
/// use racepool::{PoolOptions, Source, TaskPool};
///
/// # #[tokio::main]
/// # async fn main() {
/// let pool = TaskPool::new(PoolOptions::new().with_concurrency(2));
///
/// let values = pool
///     .collect(
///         |x: u32| async move { Ok::<_, std::convert::Infallible>(1000 / x) },
///         Source::items([10, 25, 50]),
///     )
///     .await
///     .unwrap();
///
/// assert_eq!(values, vec![100, 40, 20]);
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct TaskPool {
    options: PoolOptions,
    cancel: CancellationToken,
}

impl TaskPool {
    /// Create a pool with the given options
    pub fn new(options: PoolOptions) -> Self {
        Self {
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Create a collecting pool with the given concurrency
    pub fn bounded(concurrency: usize) -> Self {
        Self::new(PoolOptions::new().with_concurrency(concurrency))
    }

    /// Cancel runs of this pool through `token`
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Pool options
    pub fn options(&self) -> &PoolOptions {
        &self.options
    }

    /// Token that cancels every run of this pool
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run `operation` over `source`, shaped by the configured output mode
    ///
    /// Misuse errors are returned here, before any worker exists.
    pub fn run<I, T, E, F, Fut>(
        &self,
        operation: F,
        source: Source<I, E>,
    ) -> Result<PoolOutput<T, E>, PoolError<E>>
    where
        I: Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        match self.options.output {
            OutputMode::Stream => self.stream(operation, source).map(PoolOutput::Stream),
            OutputMode::Collect => {
                let (race, ledger) = self.start(operation, source, LedgerMode::Ordered)?;
                Ok(PoolOutput::Collect(drain_into_ledger(race, ledger).boxed()))
            }
        }
    }

    /// Run `operation` over `source`, yielding results in completion order
    pub fn stream<I, T, E, F, Fut>(
        &self,
        operation: F,
        source: Source<I, E>,
    ) -> Result<ResultStream<T, E>, PoolError<E>>
    where
        I: Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (race, _ledger) = self.start(operation, source, LedgerMode::PassThrough)?;
        Ok(ResultStream::new(race))
    }

    /// Run `operation` over `source`, resolving to results in input order
    ///
    /// Options are validated when this is called; a misuse error is what the
    /// returned future resolves to.
    pub fn collect<I, T, E, F, Fut>(&self, operation: F, source: Source<I, E>) -> CollectFuture<T, E>
    where
        I: Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        match self.start(operation, source, LedgerMode::Ordered) {
            Ok((race, ledger)) => drain_into_ledger(race, ledger).boxed(),
            Err(e) => future::ready(Err(e)).boxed(),
        }
    }

    fn start<I, T, E, F, Fut>(
        &self,
        operation: F,
        source: Source<I, E>,
        mode: LedgerMode,
    ) -> Result<(Race<T, E>, Arc<ResultLedger<T>>), PoolError<E>>
    where
        I: Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.options.validate().map_err(|e| match e {
            OptionsError::InvalidConcurrency(n) => PoolError::InvalidConcurrency(n),
            other => PoolError::Options(other),
        })?;

        let concurrency = self.options.concurrency;
        debug!(
            concurrency,
            ledger = ?mode,
            push_based = source.is_push_based(),
            "Starting pool run"
        );

        let tasks = task_source(shared_operation(operation), source);
        let ledger = Arc::new(ResultLedger::new(mode));
        let workers = create_workers(concurrency, tasks, Arc::clone(&ledger), self.cancel.clone());
        let race = Race::new(workers, self.cancel.clone());

        Ok((race, ledger))
    }
}
