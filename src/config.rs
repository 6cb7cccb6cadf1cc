// Copyright 2026 The pledge Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Process-wide configuration and library log events

use std::fmt;
use std::sync::{Arc, RwLock};

use crate::dispatch::{Dispatch, Step};
use crate::error::Error;

/// Whether `catch`/`recover` handlers are shown cancellation errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CatchPolicy {
    /// Handlers see every rejection.
    AllErrors,
    /// Cancellations skip the handler and forward untouched.
    AllErrorsExceptCancellation,
}

/// Events the library reports about itself.
#[derive(Clone, Debug)]
pub enum LogEvent {
    /// A blocking `wait()` was invoked on the main thread.
    WaitOnMainThread,
    /// The last reference to a still-pending promise was dropped.
    PendingPromiseDeallocated,
    /// The last reference to a still-pending guarantee was dropped.
    PendingGuaranteeDeallocated,
    /// `cauterize` observed a rejection nobody else would.
    Cauterized(Error),
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEvent::WaitOnMainThread => write!(f, "wait() called on the main thread"),
            LogEvent::PendingPromiseDeallocated => write!(f, "pending promise deallocated"),
            LogEvent::PendingGuaranteeDeallocated => write!(f, "pending guarantee deallocated"),
            LogEvent::Cauterized(err) => write!(f, "cauterized error: {}", err),
        }
    }
}

/// Library-wide defaults, set once at startup and read at call time.
///
/// A `None` dispatcher means continuations of that class run directly at the
/// settlement site.
pub struct Config {
    /// Default context for transformation steps (`then`, `map`, ...).
    pub processing: Option<Arc<dyn Dispatch>>,
    /// Default context for terminal steps (`done`, `catch`, `ensure`, ...).
    pub terminal: Option<Arc<dyn Dispatch>>,
    /// Default policy consulted by `catch` and `recover`.
    pub catch_policy: CatchPolicy,
    /// Sink for [`LogEvent`]s.
    pub log_handler: Arc<dyn Fn(&LogEvent) + Send + Sync>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            processing: None,
            terminal: None,
            catch_policy: CatchPolicy::AllErrorsExceptCancellation,
            log_handler: Arc::new(|event| match event {
                LogEvent::Cauterized(_) => error!("{}", event),
                _ => warn!("{}", event),
            }),
        }
    }
}

lazy_static! {
    static ref CONFIG: RwLock<Config> = RwLock::new(Config::default());
}

/// Adjust the process-wide configuration.
///
/// Meant for startup; chains already in flight read the configuration at each
/// step, so late changes affect only steps attached afterwards.
pub fn configure<F>(apply: F)
where
    F: FnOnce(&mut Config),
{
    let mut config = CONFIG.write().unwrap();
    apply(&mut config);
}

pub(crate) fn dispatcher_for(step: Step) -> Option<Arc<dyn Dispatch>> {
    let config = CONFIG.read().unwrap();
    match step {
        Step::Processing => config.processing.clone(),
        Step::Terminal => config.terminal.clone(),
    }
}

pub(crate) fn catch_policy() -> CatchPolicy {
    CONFIG.read().unwrap().catch_policy
}

pub(crate) fn emit(event: LogEvent) {
    let handler = CONFIG.read().unwrap().log_handler.clone();
    handler(&event);
}
