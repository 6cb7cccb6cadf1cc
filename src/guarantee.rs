// Copyright 2026 The pledge Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! An asynchronous value that cannot fail

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::config::{self, LogEvent};
use crate::core::{Core, Flavor};
use crate::dispatch::{On, Step};
use crate::resolver::Completer;

/// An asynchronous value that settles exactly once with a `T`.
///
/// A rejected guarantee is unrepresentable: the cell stores the bare value,
/// so chains of guarantees need no error plumbing at all.
pub struct Guarantee<T: Send + 'static> {
    pub(crate) core: Arc<Core<T>>,
}

impl<T: Send + 'static> Clone for Guarantee<T> {
    fn clone(&self) -> Guarantee<T> {
        Guarantee {
            core: self.core.clone(),
        }
    }
}

impl<T> Guarantee<T>
where
    T: Clone + Send + 'static,
{
    /// Create a pending guarantee and hand its completer to `executor`.
    pub fn new<F>(executor: F) -> Guarantee<T>
    where
        F: FnOnce(Completer<T>),
    {
        let (guarantee, completer) = Guarantee::pending();
        executor(completer);
        guarantee
    }

    /// A pending guarantee together with its write handle.
    pub fn pending() -> (Guarantee<T>, Completer<T>) {
        let core = Core::pending(Flavor::Guarantee);
        let completer = Completer::new(core.clone());
        (Guarantee { core }, completer)
    }

    /// A guarantee that is already settled.
    pub fn resolved(value: T) -> Guarantee<T> {
        Guarantee {
            core: Core::sealed(value, Flavor::Guarantee),
        }
    }

    /// Run `body` with the value, immediately if it already settled.
    pub fn pipe<F>(&self, body: F)
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.core.pipe(body);
    }

    /// Snapshot: `None` while pending.
    pub fn value(&self) -> Option<T> {
        self.core.peek()
    }

    pub fn is_pending(&self) -> bool {
        !self.core.is_sealed()
    }

    pub fn is_resolved(&self) -> bool {
        self.core.is_sealed()
    }

    /// Block the calling thread until the guarantee settles.
    pub fn wait(&self) -> T {
        if thread::current().name() == Some("main") {
            config::emit(LogEvent::WaitOnMainThread);
        }

        let (tx, rx) = mpsc::channel();
        self.pipe(move |value| {
            let _ = tx.send(value);
        });
        rx.recv().expect("Guarantee dropped while a waiter was blocked")
    }

    /// Transform the value.
    pub fn map_on<U, F>(&self, on: On, body: F) -> Guarantee<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let core = Core::pending(Flavor::Guarantee);
        let downstream = Guarantee { core: core.clone() };

        self.core
            .pipe(move |value| on.run(Step::Processing, move || core.seal(body(value))));

        downstream
    }

    pub fn map<U, F>(&self, body: F) -> Guarantee<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.map_on(On::Default, body)
    }

    /// Chain to another guarantee produced from the value.
    pub fn then_on<U, F>(&self, on: On, body: F) -> Guarantee<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Guarantee<U> + Send + 'static,
    {
        let core = Core::pending(Flavor::Guarantee);
        let downstream = Guarantee { core: core.clone() };

        self.core.pipe(move |value| {
            on.run(Step::Processing, move || {
                body(value).pipe(move |next| core.seal(next));
            });
        });

        downstream
    }

    pub fn then<U, F>(&self, body: F) -> Guarantee<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Guarantee<U> + Send + 'static,
    {
        self.then_on(On::Default, body)
    }

    /// Observe the value mid-chain; the downstream carries the original.
    pub fn get_on<F>(&self, on: On, body: F) -> Guarantee<T>
    where
        F: FnOnce(T) + Send + 'static,
    {
        let core = Core::pending(Flavor::Guarantee);
        let downstream = Guarantee { core: core.clone() };

        self.core.pipe(move |value| {
            let keep = value.clone();
            on.run(Step::Terminal, move || {
                body(value);
                core.seal(keep);
            });
        });

        downstream
    }

    pub fn get<F>(&self, body: F) -> Guarantee<T>
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.get_on(On::Default, body)
    }

    /// Consume the value at the end of a chain.
    pub fn done_on<F>(&self, on: On, body: F) -> Guarantee<()>
    where
        F: FnOnce(T) + Send + 'static,
    {
        let core = Core::pending(Flavor::Guarantee);
        let downstream = Guarantee { core: core.clone() };

        self.core.pipe(move |value| {
            on.run(Step::Terminal, move || {
                body(value);
                core.seal(());
            });
        });

        downstream
    }

    pub fn done<F>(&self, body: F) -> Guarantee<()>
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.done_on(On::Default, body)
    }

    /// Collapse the value. Never hops contexts.
    pub fn as_void(&self) -> Guarantee<()> {
        self.map_on(On::Direct, |_| ())
    }
}
