// Copyright 2026 The pledge Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The settle-once state cell shared by a promise and its resolver

use std::mem;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::{self, LogEvent};

pub(crate) type Handler<R> = Box<dyn FnOnce(R) + Send + 'static>;

/// State of a cell: still collecting handlers, or settled for good.
pub(crate) enum Sealant<R> {
    Pending(Vec<Handler<R>>),
    Resolved(R),
}

/// Which kind of value the cell backs, for the pending-drop report.
#[derive(Clone, Copy)]
pub(crate) enum Flavor {
    Promise,
    Guarantee,
}

/// A `Core` is the cell shared between a value and its write handle.
///
/// It transitions from pending to resolved at most once. Handlers appended
/// while pending fire in insertion order at settlement; handlers appended
/// afterwards fire immediately on the appending thread. A second `seal` is a
/// silent no-op: the first settlement wins.
pub(crate) struct Core<R> {
    sealant: Mutex<Sealant<R>>,
    flavor: Flavor,
    writers: AtomicUsize,
    reported: AtomicBool,
}

impl<R> Core<R>
where
    R: Clone + Send + 'static,
{
    pub fn pending(flavor: Flavor) -> Arc<Core<R>> {
        Arc::new(Core {
            sealant: Mutex::new(Sealant::Pending(Vec::new())),
            flavor,
            writers: AtomicUsize::new(0),
            reported: AtomicBool::new(false),
        })
    }

    pub fn sealed(value: R, flavor: Flavor) -> Arc<Core<R>> {
        Arc::new(Core {
            sealant: Mutex::new(Sealant::Resolved(value)),
            flavor,
            writers: AtomicUsize::new(0),
            reported: AtomicBool::new(false),
        })
    }

    /// Settle the cell. The handler list is moved out under the lock and
    /// fired after it is released, so a handler may settle another cell
    /// without deadlocking.
    pub fn seal(&self, value: R) {
        let handlers = {
            let mut sealant = self.sealant.lock().unwrap();
            match &mut *sealant {
                Sealant::Resolved(_) => return,
                Sealant::Pending(handlers) => {
                    let handlers = mem::take(handlers);
                    *sealant = Sealant::Resolved(value.clone());
                    handlers
                }
            }
        };

        for handler in handlers {
            handler(value.clone());
        }
    }

    /// Attach a handler, or run it right away if the cell already settled.
    pub fn pipe<F>(&self, body: F)
    where
        F: FnOnce(R) + Send + 'static,
    {
        let value = {
            let mut sealant = self.sealant.lock().unwrap();
            match &mut *sealant {
                Sealant::Pending(handlers) => {
                    handlers.push(Box::new(body));
                    return;
                }
                Sealant::Resolved(value) => value.clone(),
            }
        };

        body(value);
    }

    /// Non-blocking snapshot of the settled value.
    pub fn peek(&self) -> Option<R> {
        match &*self.sealant.lock().unwrap() {
            Sealant::Resolved(value) => Some(value.clone()),
            Sealant::Pending(_) => None,
        }
    }
}

impl<R> Core<R> {
    pub fn is_sealed(&self) -> bool {
        matches!(&*self.sealant.lock().unwrap(), Sealant::Resolved(_))
    }

    /// A write handle was created for this cell.
    pub fn attach_writer(&self) {
        self.writers.fetch_add(1, Ordering::SeqCst);
    }

    /// A write handle went away. Once the last one is gone nothing can
    /// settle the cell from outside, so a still-pending cell is reported
    /// right away, however long the read side lives on.
    pub fn detach_writer(&self) {
        if self.writers.fetch_sub(1, Ordering::SeqCst) == 1 && !self.is_sealed() {
            self.report_unsettled();
        }
    }

    fn report_unsettled(&self) {
        if self.reported.swap(true, Ordering::SeqCst) {
            return;
        }
        config::emit(match self.flavor {
            Flavor::Promise => LogEvent::PendingPromiseDeallocated,
            Flavor::Guarantee => LogEvent::PendingGuaranteeDeallocated,
        });
    }
}

impl<R> Drop for Core<R> {
    fn drop(&mut self) {
        let sealant = self
            .sealant
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);

        // Backstop for cells that never had a write handle; the write-handle
        // path has already reported the others.
        if let Sealant::Pending(_) = *sealant {
            self.report_unsettled();
        }
    }
}
