//! Configuration is process-wide, so everything that rewires it lives in
//! this one test, in its own binary.

extern crate pledge;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use pledge::{config, CatchPolicy, Error, Guarantee, Promise, Queue};

#[derive(Clone, Debug, Eq, PartialEq)]
struct Boom(&'static str);

impl fmt::Display for Boom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for Boom {}

#[test]
fn configuration_and_log_events() {
    let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    {
        let events = events.clone();
        config::configure(move |c| {
            c.log_handler = Arc::new(move |event| events.lock().unwrap().push(event.to_string()));
        });
    }

    let saw = |needle: &str| {
        events
            .lock()
            .unwrap()
            .iter()
            .any(|line| line.contains(needle))
    };
    let count = |needle: &str| {
        events
            .lock()
            .unwrap()
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    };
    let reset = || events.lock().unwrap().clear();

    // Losing the resolver of a live promise is reported at once: the
    // consumer still holds a promise nothing can settle anymore.
    {
        let (p, r) = Promise::<u32>::pending();
        drop(r);
        assert!(saw("pending promise deallocated"));
        assert!(p.is_pending());
    }
    reset();

    // With cloned resolvers only the last one to go reports, and the
    // promise's own death afterwards stays quiet.
    {
        let (p, r) = Promise::<u32>::pending();
        let spare = r.clone();
        drop(r);
        assert_eq!(count("pending promise deallocated"), 0);
        drop(spare);
        assert_eq!(count("pending promise deallocated"), 1);
        drop(p);
    }
    assert_eq!(count("pending promise deallocated"), 1);
    reset();

    // A settled promise's resolver drops silently.
    {
        let (p, r) = Promise::<u32>::pending();
        r.fulfill(1);
        drop(r);
        drop(p);
    }
    assert_eq!(count("pending promise deallocated"), 0);

    {
        let (g, c) = Guarantee::<u32>::pending();
        drop(c);
        assert!(saw("pending guarantee deallocated"));
        drop(g);
    }
    reset();

    // An executor that fails after consuming its resolver rejects the
    // promise instead of tripping the report.
    {
        let p: Promise<u32> = Promise::new(|_| Err(Error::new(Boom("setup"))));
        assert!(p.is_rejected());
    }
    assert_eq!(count("pending promise deallocated"), 0);

    // But an executor that leaks its resolver without settling is caught.
    {
        let p: Promise<u32> = Promise::new(|r| {
            drop(r);
            Ok(())
        });
        assert!(p.is_pending());
    }
    assert_eq!(count("pending promise deallocated"), 1);
    reset();

    // cauterize hands otherwise-unobserved rejections to the sink.
    Promise::<u32>::rejected(Error::new(Boom("lost"))).cauterize();
    assert!(saw("cauterized error: lost"));

    // wait() off the main thread stays quiet.
    assert_eq!(Promise::resolved(1).wait().unwrap(), 1);
    assert!(!saw("main thread"));

    // Under AllErrors the catch handler sees cancellations too.
    config::configure(|c| c.catch_policy = CatchPolicy::AllErrors);
    let captured = Arc::new(AtomicBool::new(false));
    Promise::<u32>::rejected(Error::cancelled()).catch({
        let captured = captured.clone();
        move |e| captured.store(e.is_cancelled(), Ordering::SeqCst)
    });
    assert!(captured.load(Ordering::SeqCst));

    // And back under the default policy it is skipped again.
    config::configure(|c| c.catch_policy = CatchPolicy::AllErrorsExceptCancellation);
    let captured = Arc::new(AtomicBool::new(false));
    Promise::<u32>::rejected(Error::cancelled()).catch({
        let captured = captured.clone();
        move |_| captured.store(true, Ordering::SeqCst)
    });
    assert!(!captured.load(Ordering::SeqCst));

    // A configured processing default moves transforms onto the queue.
    config::configure(|c| c.processing = Some(Arc::new(Queue::new())));
    let hopped = Promise::resolved(())
        .map(|()| Ok(thread::current().name().map(String::from)))
        .wait()
        .unwrap();
    assert!(hopped.unwrap_or_default().starts_with("pledge-queue"));

    // Terminal steps were left at the default and run where they settle.
    config::configure(|c| c.processing = None);
    let here = thread::current().name().map(String::from);
    let stayed = Promise::resolved(())
        .done(move |()| {
            assert_eq!(thread::current().name().map(String::from), here);
            Ok(())
        })
        .wait();
    assert!(stayed.is_ok());
}
