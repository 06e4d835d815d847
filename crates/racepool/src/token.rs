//! End-of-stream signalling
//!
//! A push-based source cannot know it is exhausted until a fetch comes back
//! empty, and that fetch happens inside an operation handle. The handle
//! therefore resolves to an ordinary value that says "there was nothing
//! left", and the rest of the pipeline treats it like any other resolution.

/// Marker carried by a handle whose fetch found the source exhausted
///
/// Only this crate can construct it, so it can never be confused with an
/// operation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndOfStream {
    _private: (),
}

impl EndOfStream {
    pub(crate) const fn token() -> Self {
        Self { _private: () }
    }
}

/// What an operation handle resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pulled<T> {
    /// The operation ran on the element at `position`
    Value { position: usize, value: T },
    /// The source had nothing left to hand out
    End(EndOfStream),
}

impl<T> Pulled<T> {
    pub(crate) fn end() -> Self {
        Pulled::End(EndOfStream::token())
    }

    /// Whether this resolution carries the end-of-stream marker
    pub fn is_end(&self) -> bool {
        matches!(self, Pulled::End(_))
    }

    /// The element's position, if a value was produced
    pub fn position(&self) -> Option<usize> {
        match self {
            Pulled::Value { position, .. } => Some(*position),
            Pulled::End(_) => None,
        }
    }

    /// Convert into the operation result, dropping the marker
    pub fn into_value(self) -> Option<T> {
        match self {
            Pulled::Value { value, .. } => Some(value),
            Pulled::End(_) => None,
        }
    }
}
