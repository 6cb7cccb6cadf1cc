extern crate pledge;
extern crate rand;

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rand::Rng;

use pledge::{
    race, race_fulfilled, when_all_fulfilled, when_all_resolved, when_fulfilled_concurrently,
    when_resolved_concurrently, zip, zip3, ChainError, Error, Promise,
};

#[derive(Clone, Debug, Eq, PartialEq)]
struct Boom(&'static str);

impl fmt::Display for Boom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for Boom {}

#[test]
fn when_preserves_input_order() {
    let (p0, r0) = Promise::<u32>::pending();
    let (p1, r1) = Promise::<u32>::pending();
    let (p2, r2) = Promise::<u32>::pending();

    let all = when_all_fulfilled(vec![p0, p1, p2]);

    r1.fulfill(10);
    r2.fulfill(20);
    assert!(all.is_pending());
    r0.fulfill(30);

    assert_eq!(all.value(), Some(vec![30, 10, 20]));
}

#[test]
fn when_rejects_on_the_first_rejection() {
    let (p0, r0) = Promise::<u32>::pending();
    let (p1, r1) = Promise::<u32>::pending();
    let original = Error::new(Boom("first"));

    let all = when_all_fulfilled(vec![p0, p1]);

    r1.reject(original.clone());
    assert!(all.error().unwrap().is_same(&original));

    // The surviving input settles into an already-rejected aggregate.
    r0.fulfill(1);
    assert!(all.error().unwrap().is_same(&original));
}

#[test]
fn when_of_nothing_fulfills_empty() {
    let all = when_all_fulfilled(Vec::<Promise<u32>>::new());
    assert_eq!(all.value(), Some(Vec::new()));
}

#[test]
fn when_all_resolved_gathers_both_shapes() {
    let results = when_all_resolved(vec![
        Promise::resolved(1),
        Promise::rejected(Error::new(Boom("middle"))),
        Promise::resolved(3),
    ])
    .value()
    .expect("settled inputs must settle the aggregate");

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().ok(), Some(&1));
    assert_eq!(
        results[1].as_ref().err().and_then(|e| e.downcast_ref::<Boom>()),
        Some(&Boom("middle"))
    );
    assert_eq!(results[2].as_ref().ok(), Some(&3));
}

#[test]
fn zip_pairs_mixed_types() {
    let pair = zip(Promise::resolved(1u32), Promise::resolved("two"));
    assert_eq!(pair.value(), Some((1, "two")));

    let triple = zip3(
        Promise::resolved(1u32),
        Promise::resolved("two"),
        Promise::resolved(3.0f64),
    );
    assert_eq!(triple.value(), Some((1, "two", 3.0)));

    let original = Error::new(Boom("left"));
    let pair = zip(Promise::<u32>::rejected(original.clone()), Promise::resolved(2u32));
    assert!(pair.error().unwrap().is_same(&original));
}

#[test]
fn race_first_settlement_wins() {
    let (p0, r0) = Promise::<u32>::pending();
    let (p1, r1) = Promise::<u32>::pending();

    let winner = race(vec![p0, p1]);

    r1.fulfill(11);
    assert_eq!(winner.value(), Some(11));

    // The loser settles into a sealed cell; nothing changes.
    r0.fulfill(22);
    assert_eq!(winner.value(), Some(11));
}

#[test]
fn race_rejection_can_win() {
    let (p0, _r0) = Promise::<u32>::pending();
    let (p1, r1) = Promise::<u32>::pending();
    let original = Error::new(Boom("fastest loser"));

    let winner = race(vec![p0, p1]);
    r1.reject(original.clone());

    assert!(winner.error().unwrap().is_same(&original));
    _r0.fulfill(1);
}

#[test]
fn race_of_nothing_is_bad_input() {
    let winner = race(Vec::<Promise<u32>>::new());
    assert_eq!(
        winner.error().unwrap().downcast_ref::<ChainError>(),
        Some(&ChainError::BadInput)
    );

    let winner = race_fulfilled(Vec::<Promise<u32>>::new());
    assert_eq!(
        winner.error().unwrap().downcast_ref::<ChainError>(),
        Some(&ChainError::BadInput)
    );
}

#[test]
fn race_fulfilled_ignores_early_rejections() {
    let (p0, r0) = Promise::<&'static str>::pending();
    let (p1, r1) = Promise::<&'static str>::pending();
    let (p2, r2) = Promise::<&'static str>::pending();

    let winner = race_fulfilled(vec![p0, p1, p2]);

    r0.reject(Error::new(Boom("too eager")));
    assert!(winner.is_pending());
    r1.fulfill("a");
    r2.fulfill("b");

    assert_eq!(winner.value(), Some("a"));
}

#[test]
fn race_fulfilled_with_no_winner() {
    let (p0, r0) = Promise::<u32>::pending();
    let (p1, r1) = Promise::<u32>::pending();

    let winner = race_fulfilled(vec![p0, p1]);

    r0.reject(Error::new(Boom("no")));
    assert!(winner.is_pending());
    r1.reject(Error::new(Boom("still no")));

    assert_eq!(
        winner.error().unwrap().downcast_ref::<ChainError>(),
        Some(&ChainError::NoWinner)
    );
}

#[test]
fn bounded_concurrency_respects_the_cap() {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let promises = {
        let running = running.clone();
        let peak = peak.clone();
        (0..5u32).map(move |i| {
            let running = running.clone();
            let peak = peak.clone();
            Promise::new(move |r| {
                thread::spawn(move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(10));
                    running.fetch_sub(1, Ordering::SeqCst);
                    r.fulfill(i);
                });
                Ok(())
            })
        })
    };

    let collected = when_fulfilled_concurrently(promises, 2);

    assert_eq!(collected.wait().unwrap(), vec![0, 1, 2, 3, 4]);
    assert!(peak.load(Ordering::SeqCst) <= 2);
}

#[test]
fn zero_cap_is_bad_input() {
    let collected = when_fulfilled_concurrently((0..3u32).map(Promise::resolved), 0);
    assert_eq!(
        collected.error().unwrap().downcast_ref::<ChainError>(),
        Some(&ChainError::BadInput)
    );
}

#[test]
fn rejection_stops_the_dequeue() {
    let pulls = Arc::new(AtomicUsize::new(0));

    let promises = {
        let pulls = pulls.clone();
        (0..5u32).map(move |i| {
            pulls.fetch_add(1, Ordering::SeqCst);
            if i == 1 {
                Promise::rejected(Error::new(Boom("stop")))
            } else {
                Promise::resolved(i)
            }
        })
    };

    let collected = when_fulfilled_concurrently(promises, 1);

    assert!(collected.wait().is_err());
    assert!(pulls.load(Ordering::SeqCst) <= 2);
}

#[test]
fn bounded_drain_gathers_every_settlement() {
    let promises = (0..5u32).map(|i| {
        if i % 2 == 0 {
            Promise::resolved(i)
        } else {
            Promise::rejected(Error::new(Boom("odd")))
        }
    });

    let results = when_resolved_concurrently(promises, 2).wait();

    assert_eq!(results.len(), 5);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.is_ok(), i % 2 == 0);
    }
}

#[test]
fn random_settle_order_keeps_input_order() {
    let promises: Vec<Promise<usize>> = (0..8)
        .map(|i| {
            Promise::new(move |r| {
                thread::spawn(move || {
                    let nap = rand::thread_rng().gen_range(0..10);
                    thread::sleep(Duration::from_millis(nap));
                    r.fulfill(i);
                });
                Ok(())
            })
        })
        .collect();

    let winner = race(promises.clone());
    let all = when_all_fulfilled(promises);

    assert_eq!(all.wait().unwrap(), (0..8).collect::<Vec<_>>());
    assert!(winner.wait().unwrap() < 8);
}

#[test]
fn aggregates_fed_from_threads() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let promises: Vec<Promise<u32>> = (0..4)
        .map(|i| {
            Promise::new(move |r| {
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(5 * (4 - i) as u64));
                    r.fulfill(i);
                });
                Ok(())
            })
        })
        .collect();

    let tail = {
        let seen = seen.clone();
        when_all_fulfilled(promises).done(move |values| {
            seen.lock().unwrap().extend(values);
            Ok(())
        })
    };

    tail.wait().unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3]);
}
