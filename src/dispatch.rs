// Copyright 2026 The pledge Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Execution contexts for continuations

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Sender};

use crate::config;

/// A unit of work handed to a dispatcher.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// An execution context that can run a closure, now or eventually.
pub trait Dispatch: Send + Sync {
    /// Arrange for `job` to be invoked.
    fn schedule(&self, job: Job);
}

/// The canonical synchronous context: runs the job on the calling thread.
pub struct Inline;

impl Dispatch for Inline {
    fn schedule(&self, job: Job) {
        job();
    }
}

/// A FIFO dispatcher backed by worker threads.
///
/// Jobs scheduled on the same `Queue` run in submission order when it has a
/// single worker; with more workers only dequeue order is FIFO.
pub struct Queue {
    tx: Sender<Job>,
}

impl Queue {
    /// A serial queue with one worker thread.
    pub fn new() -> Queue {
        Queue::with_workers(1)
    }

    /// A queue drained by `workers` threads.
    pub fn with_workers(workers: usize) -> Queue {
        assert!(workers >= 1, "There must be at least 1 worker");

        let (tx, rx) = unbounded::<Job>();

        for id in 0..workers {
            let rx = rx.clone();
            thread::Builder::new()
                .name(format!("pledge-queue-{}", id))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        job();
                    }
                })
                .expect("Failed to spawn a queue worker");
        }

        Queue { tx }
    }
}

impl Default for Queue {
    fn default() -> Queue {
        Queue::new()
    }
}

impl Dispatch for Queue {
    fn schedule(&self, job: Job) {
        if let Err(err) = self.tx.send(job) {
            error!("Error while scheduling on a shut down queue: {}", err);
        }
    }
}

/// Which class of continuation a default dispatcher is being chosen for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Step {
    Processing,
    Terminal,
}

/// Call-site selection of the context a continuation runs on.
///
/// `Default` defers to the configured default for the step class; `Direct`
/// runs the continuation at the point the upstream settles, with no hop.
#[derive(Clone)]
pub enum On {
    /// Use the configured default dispatcher.
    Default,
    /// Run on whatever thread observes the settlement.
    Direct,
    /// Run on the given dispatcher.
    At(Arc<dyn Dispatch>),
}

impl On {
    pub(crate) fn run<F>(self, step: Step, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self {
            On::Direct => job(),
            On::At(queue) => queue.schedule(Box::new(job)),
            On::Default => match config::dispatcher_for(step) {
                Some(queue) => queue.schedule(Box::new(job)),
                None => job(),
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::sync::Mutex;

    #[test]
    fn inline_runs_on_the_caller() {
        let ran = Arc::new(AtomicUsize::new(0));

        {
            let ran = ran.clone();
            Inline.schedule(Box::new(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            }));
        }

        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn serial_queue_preserves_submission_order() {
        let queue = Queue::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = mpsc::channel();

        for id in 0..100 {
            let seen = seen.clone();
            let tx = tx.clone();
            queue.schedule(Box::new(move || {
                seen.lock().unwrap().push(id);
                if id == 99 {
                    tx.send(()).unwrap();
                }
            }));
        }

        rx.recv().unwrap();
        assert_eq!(*seen.lock().unwrap(), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn pool_drains_every_job() {
        let queue = Queue::with_workers(4);
        let done = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();

        for _ in 0..64 {
            let done = done.clone();
            let tx = tx.clone();
            queue.schedule(Box::new(move || {
                if done.fetch_add(1, Ordering::SeqCst) == 63 {
                    tx.send(()).unwrap();
                }
            }));
        }

        rx.recv().unwrap();
        assert_eq!(done.load(Ordering::SeqCst), 64);
    }
}
