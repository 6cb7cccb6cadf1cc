// Copyright 2026 The pledge Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! First-past-the-post aggregation

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::core::{Core, Flavor};
use crate::error::ChainError;
use crate::promise::Promise;

/// Settle with whichever input settles first, fulfilled or rejected.
///
/// Every input pipes straight into the winner's cell; losers settle later
/// into an already-sealed cell, a silent no-op.
pub fn race<T>(promises: Vec<Promise<T>>) -> Promise<T>
where
    T: Clone + Send + 'static,
{
    if promises.is_empty() {
        return Promise::rejected(ChainError::BadInput.into());
    }

    let core = Core::pending(Flavor::Promise);
    let winner = Promise { core: core.clone() };

    for promise in &promises {
        let core = core.clone();
        promise.pipe(move |settled| core.seal(settled));
    }

    winner
}

/// Settle with the first *fulfillment*; rejections are only counted, and the
/// aggregate rejects with [`ChainError::NoWinner`] when every arm has lost.
pub fn race_fulfilled<T>(promises: Vec<Promise<T>>) -> Promise<T>
where
    T: Clone + Send + 'static,
{
    if promises.is_empty() {
        return Promise::rejected(ChainError::BadInput.into());
    }

    let core = Core::pending(Flavor::Promise);
    let winner = Promise { core: core.clone() };
    let remaining = Arc::new(AtomicUsize::new(promises.len()));

    for promise in &promises {
        let core = core.clone();
        let remaining = remaining.clone();
        promise.pipe(move |settled| match settled {
            Ok(value) => core.seal(Ok(value)),
            Err(_) => {
                if remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
                    core.seal(Err(ChainError::NoWinner.into()));
                }
            }
        });
    }

    winner
}
