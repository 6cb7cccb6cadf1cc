// Copyright 2026 The pledge Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Terminal end of a caught chain

use crate::dispatch::{On, Step};
use crate::guarantee::Guarantee;

/// What `catch` and `cauterize` hand back: the only thing left to do with a
/// caught chain is to run one last closure.
///
/// The wrapped guarantee settles once the catch handler has run or been
/// skipped by policy; a `Finalizer` is deliberately not chainable.
pub struct Finalizer {
    inner: Guarantee<()>,
}

impl Finalizer {
    pub(crate) fn new(inner: Guarantee<()>) -> Finalizer {
        Finalizer { inner }
    }

    /// Run `body` once the caught chain is fully settled.
    pub fn finally<F>(self, body: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.finally_on(On::Default, body);
    }

    pub fn finally_on<F>(self, on: On, body: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.pipe(move |()| on.run(Step::Terminal, body));
    }
}
