// Copyright 2026 The pledge Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error carrier and the library-emitted error kinds

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error as ThisError;

/// The settlement of a `Promise<T>`: fulfilled with `T` or rejected with an [`Error`].
pub type Outcome<T> = Result<T, Error>;

/// Errors the library itself emits while composing chains.
///
/// User-domain errors travel through chains untouched; these kinds only show
/// up when a combinator has nothing better to report.
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ChainError {
    /// A `then`/`recover` body handed back the very promise it resolves.
    #[error("callback returned the promise it resolves")]
    ReturnedSelf,
    /// A `compact_map` body produced `None`.
    #[error("compact_map produced no value")]
    CompactMapNone,
    /// An operation that reduces a sequence of promises was given none.
    #[error("cannot reduce an empty sequence of promises")]
    EmptySequence,
    /// An aggregate combinator was called with unusable input.
    #[error("aggregate combinator was given unusable input")]
    BadInput,
    /// Every arm of a `race_fulfilled` rejected.
    #[error("no promise was fulfilled")]
    NoWinner,
    /// A callback-shape resolver was invoked with neither value nor error.
    #[error("resolver called back with neither value nor error")]
    InvalidCallingConvention,
    /// The chain was abandoned on purpose.
    #[error("cancelled")]
    Cancelled,
}

/// A cheaply clonable error that travels through a chain unchanged.
///
/// Clones share the underlying error object, so every operator downstream of
/// a rejection observes the identical error; [`Error::is_same`] witnesses
/// that identity.
#[derive(Clone, Debug)]
pub struct Error {
    inner: Arc<dyn StdError + Send + Sync + 'static>,
    cancelled: bool,
}

impl Error {
    /// Wrap a user-domain error.
    pub fn new<E>(err: E) -> Error
    where
        E: StdError + Send + Sync + 'static,
    {
        Error {
            inner: Arc::new(err),
            cancelled: false,
        }
    }

    /// The canonical cancellation error.
    pub fn cancelled() -> Error {
        Error {
            inner: Arc::new(ChainError::Cancelled),
            cancelled: true,
        }
    }

    /// Wrap a host error that should be treated as a cancellation by the
    /// catch policy.
    pub fn cancelled_by<E>(err: E) -> Error
    where
        E: StdError + Send + Sync + 'static,
    {
        Error {
            inner: Arc::new(err),
            cancelled: true,
        }
    }

    /// Whether the catch policy classifies this error as a cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Borrow the underlying error as a concrete type, if it is one.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        self.inner.downcast_ref::<E>()
    }

    /// Whether two carriers share the same underlying error object.
    pub fn is_same(&self, other: &Error) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.inner.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<ChainError> for Error {
    fn from(kind: ChainError) -> Error {
        let cancelled = kind == ChainError::Cancelled;
        Error {
            inner: Arc::new(kind),
            cancelled,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clones_share_identity() {
        let err = Error::new(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        let cloned = err.clone();

        assert!(err.is_same(&cloned));
        assert!(!err.is_same(&Error::cancelled()));
    }

    #[test]
    fn downcast_reaches_the_kind() {
        let err = Error::from(ChainError::NoWinner);
        assert_eq!(err.downcast_ref::<ChainError>(), Some(&ChainError::NoWinner));
        assert!(err.downcast_ref::<std::io::Error>().is_none());
    }

    #[test]
    fn cancellation_marking() {
        assert!(Error::cancelled().is_cancelled());
        assert!(Error::from(ChainError::Cancelled).is_cancelled());
        assert!(Error::cancelled_by(std::fmt::Error).is_cancelled());
        assert!(!Error::from(ChainError::BadInput).is_cancelled());
    }
}
