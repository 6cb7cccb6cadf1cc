// Copyright 2026 The pledge Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Promise style asynchronous value composition

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::config::{self, CatchPolicy, LogEvent};
use crate::core::{Core, Flavor};
use crate::dispatch::{On, Step};
use crate::error::{ChainError, Error, Outcome};
use crate::finalizer::Finalizer;
use crate::guarantee::Guarantee;
use crate::resolver::Resolver;
use crate::thenable::Thenable;

/// An asynchronous value that settles exactly once: fulfilled with a `T` or
/// rejected with an [`Error`].
///
/// Clones share the same settlement. Every combinator returns a new pending
/// downstream promise and installs a single callback on the upstream that
/// will settle it; rejections flow through non-recovery combinators
/// untouched.
pub struct Promise<T: Send + 'static> {
    pub(crate) core: Arc<Core<Outcome<T>>>,
}

impl<T: Send + 'static> Clone for Promise<T> {
    fn clone(&self) -> Promise<T> {
        Promise {
            core: self.core.clone(),
        }
    }
}

impl<T> Promise<T>
where
    T: Clone + Send + 'static,
{
    /// Create a pending promise and hand its resolver to `executor`.
    ///
    /// An `Err` from the executor rejects the promise, unless the executor
    /// already settled it.
    pub fn new<F>(executor: F) -> Promise<T>
    where
        F: FnOnce(Resolver<T>) -> Outcome<()>,
    {
        let (promise, resolver) = Promise::pending();
        let core = promise.core.clone();

        // Hold a writer across the executor so an executor error settles the
        // cell before the last-writer check runs.
        core.attach_writer();
        if let Err(error) = executor(resolver) {
            core.seal(Err(error));
        }
        core.detach_writer();

        promise
    }

    /// A pending promise together with its write handle.
    pub fn pending() -> (Promise<T>, Resolver<T>) {
        let core = Core::pending(Flavor::Promise);
        let resolver = Resolver::new(core.clone());
        (Promise { core }, resolver)
    }

    /// A promise that is already fulfilled.
    pub fn resolved(value: T) -> Promise<T> {
        Promise {
            core: Core::sealed(Ok(value), Flavor::Promise),
        }
    }

    /// A promise that is already rejected.
    pub fn rejected(error: Error) -> Promise<T> {
        Promise {
            core: Core::sealed(Err(error), Flavor::Promise),
        }
    }

    /// Run `body` with the settlement, immediately if it already happened.
    pub fn pipe<F>(&self, body: F)
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        self.core.pipe(body);
    }

    /// Snapshot: `None` while pending.
    pub fn result(&self) -> Option<Outcome<T>> {
        self.core.peek()
    }

    /// The fulfillment value, if there is one yet.
    pub fn value(&self) -> Option<T> {
        match self.core.peek() {
            Some(Ok(value)) => Some(value),
            _ => None,
        }
    }

    /// The rejection error, if there is one yet.
    pub fn error(&self) -> Option<Error> {
        match self.core.peek() {
            Some(Err(error)) => Some(error),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.core.is_sealed()
    }

    pub fn is_resolved(&self) -> bool {
        self.core.is_sealed()
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self.core.peek(), Some(Ok(_)))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.core.peek(), Some(Err(_)))
    }

    /// Block the calling thread until the promise settles.
    pub fn wait(&self) -> Outcome<T> {
        if thread::current().name() == Some("main") {
            config::emit(LogEvent::WaitOnMainThread);
        }

        let (tx, rx) = mpsc::channel();
        self.pipe(move |settled| {
            let _ = tx.send(settled);
        });
        rx.recv().expect("Promise dropped while a waiter was blocked")
    }

    /// Chain to another promise-shaped value produced from the fulfillment.
    ///
    /// A body that hands back the downstream it is supposed to resolve would
    /// never settle; that is rejected with [`ChainError::ReturnedSelf`].
    pub fn then_on<U, P, F>(&self, on: On, body: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        P: Thenable<U>,
        F: FnOnce(T) -> Outcome<P> + Send + 'static,
    {
        let core = Core::pending(Flavor::Promise);
        let downstream = Promise { core: core.clone() };
        let mark = Arc::as_ptr(&core) as usize;

        self.core.pipe(move |settled| match settled {
            Err(error) => core.seal(Err(error)),
            Ok(value) => on.run(Step::Processing, move || match body(value) {
                Err(error) => core.seal(Err(error)),
                Ok(next) => {
                    if next.cell_id() == mark {
                        core.seal(Err(ChainError::ReturnedSelf.into()));
                    } else {
                        next.pipe_settled(move |settled| core.seal(settled));
                    }
                }
            }),
        });

        downstream
    }

    pub fn then<U, P, F>(&self, body: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        P: Thenable<U>,
        F: FnOnce(T) -> Outcome<P> + Send + 'static,
    {
        self.then_on(On::Default, body)
    }

    /// Transform the fulfillment value.
    pub fn map_on<U, F>(&self, on: On, body: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Outcome<U> + Send + 'static,
    {
        let core = Core::pending(Flavor::Promise);
        let downstream = Promise { core: core.clone() };

        self.core.pipe(move |settled| match settled {
            Err(error) => core.seal(Err(error)),
            Ok(value) => on.run(Step::Processing, move || core.seal(body(value))),
        });

        downstream
    }

    pub fn map<U, F>(&self, body: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Outcome<U> + Send + 'static,
    {
        self.map_on(On::Default, body)
    }

    /// Transform the fulfillment value, rejecting with
    /// [`ChainError::CompactMapNone`] when the body produces `None`.
    pub fn compact_map_on<U, F>(&self, on: On, body: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Outcome<Option<U>> + Send + 'static,
    {
        let core = Core::pending(Flavor::Promise);
        let downstream = Promise { core: core.clone() };

        self.core.pipe(move |settled| match settled {
            Err(error) => core.seal(Err(error)),
            Ok(value) => on.run(Step::Processing, move || match body(value) {
                Err(error) => core.seal(Err(error)),
                Ok(Some(mapped)) => core.seal(Ok(mapped)),
                Ok(None) => core.seal(Err(ChainError::CompactMapNone.into())),
            }),
        });

        downstream
    }

    pub fn compact_map<U, F>(&self, body: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Outcome<Option<U>> + Send + 'static,
    {
        self.compact_map_on(On::Default, body)
    }

    /// Consume the fulfillment value at the end of a chain.
    pub fn done_on<F>(&self, on: On, body: F) -> Promise<()>
    where
        F: FnOnce(T) -> Outcome<()> + Send + 'static,
    {
        let core = Core::pending(Flavor::Promise);
        let downstream = Promise { core: core.clone() };

        self.core.pipe(move |settled| match settled {
            Err(error) => core.seal(Err(error)),
            Ok(value) => on.run(Step::Terminal, move || core.seal(body(value))),
        });

        downstream
    }

    pub fn done<F>(&self, body: F) -> Promise<()>
    where
        F: FnOnce(T) -> Outcome<()> + Send + 'static,
    {
        self.done_on(On::Default, body)
    }

    /// Observe the fulfillment value mid-chain; the downstream carries the
    /// original value unless the body fails.
    pub fn get_on<F>(&self, on: On, body: F) -> Promise<T>
    where
        F: FnOnce(T) -> Outcome<()> + Send + 'static,
    {
        let core = Core::pending(Flavor::Promise);
        let downstream = Promise { core: core.clone() };

        self.core.pipe(move |settled| match settled {
            Err(error) => core.seal(Err(error)),
            Ok(value) => {
                let keep = value.clone();
                on.run(Step::Terminal, move || match body(value) {
                    Ok(()) => core.seal(Ok(keep)),
                    Err(error) => core.seal(Err(error)),
                });
            }
        });

        downstream
    }

    pub fn get<F>(&self, body: F) -> Promise<T>
    where
        F: FnOnce(T) -> Outcome<()> + Send + 'static,
    {
        self.get_on(On::Default, body)
    }

    /// Observe the settlement, fulfilled or rejected, and pass it through.
    pub fn tap_on<F>(&self, on: On, body: F) -> Promise<T>
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        let core = Core::pending(Flavor::Promise);
        let downstream = Promise { core: core.clone() };

        self.core.pipe(move |settled| {
            on.run(Step::Processing, move || {
                body(settled.clone());
                core.seal(settled);
            });
        });

        downstream
    }

    pub fn tap<F>(&self, body: F) -> Promise<T>
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        self.tap_on(On::Default, body)
    }

    /// Collapse the value, keeping the settlement shape. Never hops contexts.
    pub fn as_void(&self) -> Promise<()> {
        self.map_on(On::Direct, |_| Ok(()))
    }

    /// Terminate the chain, consuming a rejection.
    ///
    /// Under [`CatchPolicy::AllErrorsExceptCancellation`] a cancellation
    /// skips the handler; the finalizer completes either way.
    pub fn catch_on<F>(&self, on: On, body: F) -> Finalizer
    where
        F: FnOnce(Error) + Send + 'static,
    {
        let policy = config::catch_policy();
        let core = Core::pending(Flavor::Guarantee);
        let finalizer = Finalizer::new(Guarantee { core: core.clone() });

        self.core.pipe(move |settled| match settled {
            Ok(_) => core.seal(()),
            Err(error) => {
                if error.is_cancelled() && policy == CatchPolicy::AllErrorsExceptCancellation {
                    core.seal(());
                } else {
                    on.run(Step::Terminal, move || {
                        body(error);
                        core.seal(());
                    });
                }
            }
        });

        finalizer
    }

    pub fn catch<F>(&self, body: F) -> Finalizer
    where
        F: FnOnce(Error) + Send + 'static,
    {
        self.catch_on(On::Default, body)
    }

    /// Replace a rejection with a new promise-shaped value.
    ///
    /// Cancellations forward unrecovered under
    /// [`CatchPolicy::AllErrorsExceptCancellation`].
    pub fn recover_on<P, F>(&self, on: On, body: F) -> Promise<T>
    where
        P: Thenable<T>,
        F: FnOnce(Error) -> Outcome<P> + Send + 'static,
    {
        let policy = config::catch_policy();
        let core = Core::pending(Flavor::Promise);
        let downstream = Promise { core: core.clone() };
        let mark = Arc::as_ptr(&core) as usize;

        self.core.pipe(move |settled| match settled {
            Ok(value) => core.seal(Ok(value)),
            Err(error) => {
                if error.is_cancelled() && policy == CatchPolicy::AllErrorsExceptCancellation {
                    core.seal(Err(error));
                } else {
                    on.run(Step::Processing, move || match body(error) {
                        Err(error) => core.seal(Err(error)),
                        Ok(next) => {
                            if next.cell_id() == mark {
                                core.seal(Err(ChainError::ReturnedSelf.into()));
                            } else {
                                next.pipe_settled(move |settled| core.seal(settled));
                            }
                        }
                    });
                }
            }
        });

        downstream
    }

    pub fn recover<P, F>(&self, body: F) -> Promise<T>
    where
        P: Thenable<T>,
        F: FnOnce(Error) -> Outcome<P> + Send + 'static,
    {
        self.recover_on(On::Default, body)
    }

    /// Replace every rejection with a guarantee, leaving nothing that can
    /// fail. The policy is not consulted: the body must handle all errors.
    pub fn recover_all_on<F>(&self, on: On, body: F) -> Guarantee<T>
    where
        F: FnOnce(Error) -> Guarantee<T> + Send + 'static,
    {
        let core = Core::pending(Flavor::Guarantee);
        let downstream = Guarantee { core: core.clone() };

        self.core.pipe(move |settled| match settled {
            Ok(value) => core.seal(value),
            Err(error) => on.run(Step::Processing, move || {
                body(error).pipe(move |value| core.seal(value));
            }),
        });

        downstream
    }

    pub fn recover_all<F>(&self, body: F) -> Guarantee<T>
    where
        F: FnOnce(Error) -> Guarantee<T> + Send + 'static,
    {
        self.recover_all_on(On::Default, body)
    }

    /// Run `body` on both paths, passing the settlement through untouched.
    pub fn ensure_on<F>(&self, on: On, body: F) -> Promise<T>
    where
        F: FnOnce() + Send + 'static,
    {
        let core = Core::pending(Flavor::Promise);
        let downstream = Promise { core: core.clone() };

        self.core.pipe(move |settled| {
            on.run(Step::Terminal, move || {
                body();
                core.seal(settled);
            });
        });

        downstream
    }

    pub fn ensure<F>(&self, body: F) -> Promise<T>
    where
        F: FnOnce() + Send + 'static,
    {
        self.ensure_on(On::Default, body)
    }

    /// Like [`ensure`](Promise::ensure), but holds the settlement until the
    /// body's guarantee completes.
    pub fn ensure_then_on<F>(&self, on: On, body: F) -> Promise<T>
    where
        F: FnOnce() -> Guarantee<()> + Send + 'static,
    {
        let core = Core::pending(Flavor::Promise);
        let downstream = Promise { core: core.clone() };

        self.core.pipe(move |settled| {
            on.run(Step::Terminal, move || {
                body().pipe(move |()| core.seal(settled));
            });
        });

        downstream
    }

    pub fn ensure_then<F>(&self, body: F) -> Promise<T>
    where
        F: FnOnce() -> Guarantee<()> + Send + 'static,
    {
        self.ensure_then_on(On::Default, body)
    }

    /// Terminate the chain, reporting any rejection to the log sink instead
    /// of dropping it on the floor.
    pub fn cauterize(&self) -> Finalizer {
        let core = Core::pending(Flavor::Guarantee);
        let finalizer = Finalizer::new(Guarantee { core: core.clone() });

        self.core.pipe(move |settled| {
            if let Err(error) = settled {
                config::emit(LogEvent::Cauterized(error));
            }
            core.seal(());
        });

        finalizer
    }
}
