//! Task sources
//!
//! This module turns caller input into a lazy sequence of operation handles:
//! - [`Source`] - the shapes a caller may hand in (collection, iterator, stream)
//! - [`TaskSource`] - the single pull contract the worker pool consumes
//! - [`OperationHandle`] - "the operation applied to one element", not yet awaited
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐     ┌──────────────────────────┐
//! │ Source::items / ::iter   │     │ Source::stream / ::try_* │
//! └────────────┬─────────────┘     └────────────┬─────────────┘
//!              ▼                                ▼
//! ┌──────────────────────────┐     ┌──────────────────────────┐
//! │       PullSource         │     │       PushSource         │
//! │ (element taken at draw)  │     │ (element fetched inside  │
//! │                          │     │  the handle; may resolve │
//! │                          │     │  to EndOfStream)         │
//! └────────────┬─────────────┘     └────────────┬─────────────┘
//!              └───────────────┬────────────────┘
//!                              ▼
//!                 Arc<dyn TaskSource<T, E>>  (shared by all workers)
//! ```

mod args;
mod pull;
mod push;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::stream::{BoxStream, Stream, StreamExt};

use crate::error::PoolError;
use crate::token::Pulled;

pub use args::{spread, Apply};
pub use pull::PullSource;
pub use push::PushSource;

/// Type-erased operation shared by every handle of a run
pub type SharedOperation<I, T, E> =
    Arc<dyn Fn(I) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Future behind an operation handle
pub type HandleFuture<T, E> = BoxFuture<'static, Result<Pulled<T>, PoolError<E>>>;

/// Caller input for a run
pub enum Source<I, E> {
    /// A finite collection, provided up front
    Items(Vec<I>),
    /// A pull-based iterator
    Iter(Box<dyn Iterator<Item = I> + Send>),
    /// A push-based stream; each `Err` is a source failure
    Stream(BoxStream<'static, Result<I, E>>),
}

impl<I, E> Source<I, E>
where
    I: Send + 'static,
    E: Send + 'static,
{
    /// A finite collection of inputs
    pub fn items(items: impl IntoIterator<Item = I>) -> Self {
        Source::Items(items.into_iter().collect())
    }

    /// A pull-based iterator over inputs
    pub fn iter(iter: impl Iterator<Item = I> + Send + 'static) -> Self {
        Source::Iter(Box::new(iter))
    }

    /// A push-based stream of inputs that cannot fail
    pub fn stream(stream: impl Stream<Item = I> + Send + 'static) -> Self {
        Source::Stream(stream.map(Ok).boxed())
    }

    /// A push-based stream of inputs that may fail
    pub fn try_stream(stream: impl Stream<Item = Result<I, E>> + Send + 'static) -> Self {
        Source::Stream(stream.boxed())
    }

    /// A zero-argument factory producing a push-based stream
    pub fn generator<S, G>(factory: G) -> Self
    where
        G: FnOnce() -> S,
        S: Stream<Item = I> + Send + 'static,
    {
        Self::stream(factory())
    }

    /// Whether elements are produced by an asynchronous fetch
    pub fn is_push_based(&self) -> bool {
        matches!(self, Source::Stream(_))
    }
}

impl<I, E> From<Vec<I>> for Source<I, E> {
    fn from(items: Vec<I>) -> Self {
        Source::Items(items)
    }
}

impl<I, E> std::fmt::Debug for Source<I, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Items(items) => f.debug_tuple("Items").field(&items.len()).finish(),
            Source::Iter(_) => f.write_str("Iter"),
            Source::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// An operation applied to one element, not yet awaited
///
/// For pull-based sources the element's position is known when the handle is
/// drawn. For push-based sources it is only known once the handle's fetch
/// step has taken an element, so `position()` is `None` until resolution.
pub struct OperationHandle<T, E> {
    position: Option<usize>,
    future: HandleFuture<T, E>,
}

impl<T, E> OperationHandle<T, E> {
    pub(crate) fn new(
        position: Option<usize>,
        future: impl Future<Output = Result<Pulled<T>, PoolError<E>>> + Send + 'static,
    ) -> Self {
        Self {
            position,
            future: Box::pin(future),
        }
    }

    /// Position of the element, when known at draw time
    pub fn position(&self) -> Option<usize> {
        self.position
    }
}

impl<T, E> Future for OperationHandle<T, E> {
    type Output = Result<Pulled<T>, PoolError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.future.as_mut().poll(cx)
    }
}

/// Lazy, single-pass sequence of operation handles
///
/// Shared by every worker of a pool. Each call advances one shared cursor, so
/// no two callers ever receive the same handle.
pub trait TaskSource<T, E>: Send + Sync {
    /// Draw the next handle, or `None` once the sequence has nothing left
    fn next_handle(&self) -> Option<OperationHandle<T, E>>;
}

/// Build the task source for `source`, applying `operation` to each element
pub fn task_source<I, T, E>(
    operation: SharedOperation<I, T, E>,
    source: Source<I, E>,
) -> Arc<dyn TaskSource<T, E>>
where
    I: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    match source {
        Source::Items(items) => Arc::new(PullSource::new(operation, Box::new(items.into_iter()))),
        Source::Iter(iter) => Arc::new(PullSource::new(operation, iter)),
        Source::Stream(stream) => Arc::new(PushSource::new(operation, stream)),
    }
}

/// Erase an operation closure into a [`SharedOperation`]
pub fn shared_operation<I, T, E, F, Fut>(operation: F) -> SharedOperation<I, T, E>
where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Arc::new(move |input| Box::pin(operation(input)))
}
