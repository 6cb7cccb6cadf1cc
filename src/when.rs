// Copyright 2026 The pledge Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Waiting on whole collections of promises

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::core::{Core, Flavor};
use crate::dispatch::On;
use crate::error::{ChainError, Outcome};
use crate::guarantee::Guarantee;
use crate::promise::Promise;

/// Signal-only aggregation: fulfills once every input has fulfilled, rejects
/// with the first rejection observed. The value-gathering front ends are a
/// pure projection over this.
fn when_void<T>(promises: &[Promise<T>]) -> Promise<()>
where
    T: Clone + Send + 'static,
{
    if promises.is_empty() {
        return Promise::resolved(());
    }

    let core = Core::pending(Flavor::Promise);
    let signal = Promise { core: core.clone() };
    let countdown = Arc::new(AtomicUsize::new(promises.len()));

    for promise in promises {
        let core = core.clone();
        let countdown = countdown.clone();
        promise.pipe(move |settled| match settled {
            Ok(_) => {
                if countdown.fetch_sub(1, Ordering::SeqCst) == 1 {
                    core.seal(Ok(()));
                }
            }
            Err(error) => core.seal(Err(error)),
        });
    }

    signal
}

/// Wait for every input to fulfill; the output preserves input order, not
/// settlement order. The first rejection rejects the aggregate; the
/// remaining inputs still settle, unobserved.
pub fn when_all_fulfilled<T>(promises: Vec<Promise<T>>) -> Promise<Vec<T>>
where
    T: Clone + Send + 'static,
{
    when_void(&promises).map_on(On::Direct, move |()| {
        Ok(promises
            .iter()
            .map(|p| p.value().expect("fulfilled promise lost its value"))
            .collect())
    })
}

/// Wait for a pair of differently-typed promises.
pub fn zip<A, B>(a: Promise<A>, b: Promise<B>) -> Promise<(A, B)>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
{
    when_void(&[a.as_void(), b.as_void()]).map_on(On::Direct, move |()| {
        Ok((
            a.value().expect("fulfilled promise lost its value"),
            b.value().expect("fulfilled promise lost its value"),
        ))
    })
}

/// Wait for a triple of differently-typed promises.
pub fn zip3<A, B, C>(a: Promise<A>, b: Promise<B>, c: Promise<C>) -> Promise<(A, B, C)>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    C: Clone + Send + 'static,
{
    when_void(&[a.as_void(), b.as_void(), c.as_void()]).map_on(On::Direct, move |()| {
        Ok((
            a.value().expect("fulfilled promise lost its value"),
            b.value().expect("fulfilled promise lost its value"),
            c.value().expect("fulfilled promise lost its value"),
        ))
    })
}

/// Wait for every input to settle either way; never rejects.
pub fn when_all_resolved<T>(promises: Vec<Promise<T>>) -> Guarantee<Vec<Outcome<T>>>
where
    T: Clone + Send + 'static,
{
    if promises.is_empty() {
        return Guarantee::resolved(Vec::new());
    }

    let core = Core::pending(Flavor::Guarantee);
    let gathered = Guarantee { core: core.clone() };
    let countdown = Arc::new(AtomicUsize::new(promises.len()));
    let inputs = Arc::new(promises);

    for index in 0..inputs.len() {
        let core = core.clone();
        let countdown = countdown.clone();
        let gathered_inputs = inputs.clone();
        inputs[index].pipe(move |_| {
            if countdown.fetch_sub(1, Ordering::SeqCst) == 1 {
                core.seal(
                    gathered_inputs
                        .iter()
                        .map(|p| p.result().expect("resolved promise lost its result"))
                        .collect(),
                );
            }
        });
    }

    gathered
}

/// Shared state of a bounded-concurrency drain. The iterator is only ever
/// advanced under this lock.
struct Gate<T, I>
where
    T: Send + 'static,
{
    iter: I,
    started: Vec<Promise<T>>,
    running: usize,
    exhausted: bool,
    stopped: bool,
}

impl<T, I> Gate<T, I>
where
    T: Clone + Send + 'static,
    I: Iterator<Item = Promise<T>>,
{
    fn new(iter: I) -> Arc<Mutex<Gate<T, I>>> {
        Arc::new(Mutex::new(Gate {
            iter,
            started: Vec::new(),
            running: 0,
            exhausted: false,
            stopped: false,
        }))
    }
}

/// Pull promises out of a lazy iterator, keeping at most `concurrently` of
/// them outstanding; rejects with the first rejection and stops pulling.
pub fn when_fulfilled_concurrently<T, I>(promises: I, concurrently: usize) -> Promise<Vec<T>>
where
    T: Clone + Send + 'static,
    I: Iterator<Item = Promise<T>> + Send + 'static,
{
    if concurrently == 0 {
        return Promise::rejected(ChainError::BadInput.into());
    }

    let core = Core::pending(Flavor::Promise);
    let collected = Promise { core: core.clone() };
    let gate = Gate::new(promises);

    drain_fulfilled(&gate, &core, concurrently);
    collected
}

fn drain_fulfilled<T, I>(
    gate: &Arc<Mutex<Gate<T, I>>>,
    core: &Arc<Core<Outcome<Vec<T>>>>,
    cap: usize,
) where
    T: Clone + Send + 'static,
    I: Iterator<Item = Promise<T>> + Send + 'static,
{
    let mut fresh = Vec::new();
    {
        let mut guard = gate.lock().unwrap();
        if guard.stopped {
            return;
        }
        while guard.running < cap && !guard.exhausted {
            match guard.iter.next() {
                Some(promise) => {
                    guard.running += 1;
                    guard.started.push(promise.clone());
                    fresh.push(promise);
                }
                None => guard.exhausted = true,
            }
        }
        if guard.exhausted && guard.running == 0 {
            guard.stopped = true;
            let values = guard
                .started
                .iter()
                .map(|p| p.value().expect("fulfilled promise lost its value"))
                .collect();
            drop(guard);
            core.seal(Ok(values));
            return;
        }
    }

    for promise in fresh {
        let gate = gate.clone();
        let core = core.clone();
        promise.pipe(move |settled| match settled {
            Err(error) => {
                let mut guard = gate.lock().unwrap();
                if !guard.stopped {
                    guard.stopped = true;
                    drop(guard);
                    core.seal(Err(error));
                }
            }
            Ok(_) => {
                gate.lock().unwrap().running -= 1;
                drain_fulfilled(&gate, &core, cap);
            }
        });
    }
}

/// Pull promises out of a lazy iterator, keeping at most `concurrently` of
/// them outstanding, and gather every settlement. Never rejects, so the cap
/// must be at least 1.
pub fn when_resolved_concurrently<T, I>(
    promises: I,
    concurrently: usize,
) -> Guarantee<Vec<Outcome<T>>>
where
    T: Clone + Send + 'static,
    I: Iterator<Item = Promise<T>> + Send + 'static,
{
    assert!(concurrently >= 1, "There must be at least 1 slot");

    let core = Core::pending(Flavor::Guarantee);
    let gathered = Guarantee { core: core.clone() };
    let gate = Gate::new(promises);

    drain_resolved(&gate, &core, concurrently);
    gathered
}

fn drain_resolved<T, I>(
    gate: &Arc<Mutex<Gate<T, I>>>,
    core: &Arc<Core<Vec<Outcome<T>>>>,
    cap: usize,
) where
    T: Clone + Send + 'static,
    I: Iterator<Item = Promise<T>> + Send + 'static,
{
    let mut fresh = Vec::new();
    {
        let mut guard = gate.lock().unwrap();
        while guard.running < cap && !guard.exhausted {
            match guard.iter.next() {
                Some(promise) => {
                    guard.running += 1;
                    guard.started.push(promise.clone());
                    fresh.push(promise);
                }
                None => guard.exhausted = true,
            }
        }
        if guard.exhausted && guard.running == 0 && !guard.stopped {
            guard.stopped = true;
            let results = guard
                .started
                .iter()
                .map(|p| p.result().expect("resolved promise lost its result"))
                .collect();
            drop(guard);
            core.seal(results);
            return;
        }
    }

    for promise in fresh {
        let gate = gate.clone();
        let core = core.clone();
        promise.pipe(move |_| {
            gate.lock().unwrap().running -= 1;
            drain_resolved(&gate, &core, cap);
        });
    }
}
