// Copyright 2026 The pledge Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Write-capability handles for settling pending values

use std::sync::Arc;

use crate::core::Core;
use crate::error::{ChainError, Error, Outcome};

/// The write side of a [`Promise`](crate::Promise): the only way to settle it
/// from outside.
///
/// Handles may be cloned and raced; the first settlement wins and the rest
/// are no-ops. When the last handle is dropped with the promise still
/// pending, nothing can ever settle it, and that is reported to the log
/// sink.
pub struct Resolver<T: Send + 'static> {
    pub(crate) core: Arc<Core<Outcome<T>>>,
}

impl<T: Send + 'static> Resolver<T> {
    pub(crate) fn new(core: Arc<Core<Outcome<T>>>) -> Resolver<T> {
        core.attach_writer();
        Resolver { core }
    }
}

impl<T: Send + 'static> Clone for Resolver<T> {
    fn clone(&self) -> Resolver<T> {
        Resolver::new(self.core.clone())
    }
}

impl<T: Send + 'static> Drop for Resolver<T> {
    fn drop(&mut self) {
        self.core.detach_writer();
    }
}

impl<T> Resolver<T>
where
    T: Clone + Send + 'static,
{
    /// Settle the promise as fulfilled.
    pub fn fulfill(&self, value: T) {
        self.core.seal(Ok(value));
    }

    /// Settle the promise as rejected.
    pub fn reject(&self, error: Error) {
        self.core.seal(Err(error));
    }

    /// Settle the promise with an already-formed outcome.
    pub fn resolve(&self, settled: Outcome<T>) {
        self.core.seal(settled);
    }

    /// Adapt the legacy `(value?, error?)` callback shape: an error rejects,
    /// otherwise a value fulfills, otherwise the call itself was malformed.
    pub fn resolve_opt(&self, value: Option<T>, error: Option<Error>) {
        match (value, error) {
            (_, Some(error)) => self.reject(error),
            (Some(value), None) => self.fulfill(value),
            (None, None) => self.reject(ChainError::InvalidCallingConvention.into()),
        }
    }

    /// Adapt the legacy `(error?, value?)` callback shape.
    pub fn resolve_opt_err(&self, error: Option<Error>, value: Option<T>) {
        self.resolve_opt(value, error);
    }
}

/// The write side of a [`Guarantee`](crate::Guarantee). Dropping the last
/// handle of a still-pending guarantee is reported like the promise case.
pub struct Completer<T: Send + 'static> {
    pub(crate) core: Arc<Core<T>>,
}

impl<T: Send + 'static> Completer<T> {
    pub(crate) fn new(core: Arc<Core<T>>) -> Completer<T> {
        core.attach_writer();
        Completer { core }
    }
}

impl<T: Send + 'static> Clone for Completer<T> {
    fn clone(&self) -> Completer<T> {
        Completer::new(self.core.clone())
    }
}

impl<T: Send + 'static> Drop for Completer<T> {
    fn drop(&mut self) {
        self.core.detach_writer();
    }
}

impl<T> Completer<T>
where
    T: Clone + Send + 'static,
{
    /// Settle the guarantee.
    pub fn complete(&self, value: T) {
        self.core.seal(value);
    }
}
