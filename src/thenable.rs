// Copyright 2026 The pledge Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Capability trait over promise-shaped values

use std::sync::Arc;

use crate::error::Outcome;
use crate::guarantee::Guarantee;
use crate::promise::Promise;

/// Anything a settlement can be piped out of.
///
/// `then` and `recover` bodies may hand back either a [`Promise`] or a
/// [`Guarantee`]; the combinators only need these two capabilities, so they
/// are generic over this trait rather than over a concrete type.
pub trait Thenable<T>: Send + Sized + 'static
where
    T: Clone + Send + 'static,
{
    /// Run `body` with the settlement, now or when it happens.
    fn pipe_settled<F>(&self, body: F)
    where
        F: FnOnce(Outcome<T>) + Send + 'static;

    /// Identity of the backing cell, used to refuse self-referential chains.
    fn cell_id(&self) -> usize;
}

impl<T> Thenable<T> for Promise<T>
where
    T: Clone + Send + 'static,
{
    fn pipe_settled<F>(&self, body: F)
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        self.pipe(body);
    }

    fn cell_id(&self) -> usize {
        Arc::as_ptr(&self.core) as usize
    }
}

impl<T> Thenable<T> for Guarantee<T>
where
    T: Clone + Send + 'static,
{
    fn pipe_settled<F>(&self, body: F)
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        self.pipe(move |value| body(Ok(value)));
    }

    fn cell_id(&self) -> usize {
        Arc::as_ptr(&self.core) as usize
    }
}
