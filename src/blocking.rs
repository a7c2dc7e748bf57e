// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Blocking `wait()` adapters — not part of the core settlement model, and
//! gated behind the `blocking-wait` feature: a strict-async consumer never
//! pulls `parking_lot::Condvar` into its dependency graph at all.
//!
//! `hang()` (driving a host run-loop until settlement) is deliberately not
//! implemented: it has no meaningful equivalent without a specific run-loop
//! to drive, and the spec treats it as an open question a strict-async
//! target may omit.

use crate::config::{self, LogEvent};
use crate::guarantee::Guarantee;
use crate::outcome::Outcome;
use crate::promise::Promise;
use parking_lot::{Condvar, Mutex};
use std::cell::Cell as StdCell;

thread_local! {
    static IS_MAIN_THREAD: StdCell<bool> = const { StdCell::new(false) };
}

/// Mark the calling thread as "main" for the purposes of [`LogEvent::WaitOnMainThread`].
///
/// Hosts with a notion of a main/UI thread should call this once, early, on
/// that thread. Blocking `wait()` calls made from any other thread are
/// unflagged.
pub fn mark_main_thread() {
    IS_MAIN_THREAD.with(|flag| flag.set(true));
}

fn is_main_thread() -> bool {
    IS_MAIN_THREAD.with(|flag| flag.get())
}

struct WaitLatch {
    lock: Mutex<bool>,
    condvar: Condvar,
}

impl WaitLatch {
    fn new() -> Self {
        Self {
            lock: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    fn signal(&self) {
        *self.lock.lock() = true;
        self.condvar.notify_one();
    }

    fn park(&self) {
        let mut settled = self.lock.lock();
        while !*settled {
            self.condvar.wait(&mut settled);
        }
    }
}

impl<T> Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Block the calling thread until this promise settles, returning its
    /// outcome. Logs [`LogEvent::WaitOnMainThread`] if the calling thread was
    /// marked via [`mark_main_thread`].
    pub fn wait(&self) -> Outcome<T> {
        if is_main_thread() {
            config::log(LogEvent::WaitOnMainThread);
        }

        if let Some(outcome) = self.result() {
            return outcome;
        }

        let latch = std::sync::Arc::new(WaitLatch::new());
        let result = std::sync::Arc::new(Mutex::new(None));

        let latch2 = std::sync::Arc::clone(&latch);
        let result2 = std::sync::Arc::clone(&result);
        self.pipe(move |outcome| {
            *result2.lock() = Some(outcome);
            latch2.signal();
        });

        latch.park();
        result.lock().take().expect("latch only signals after the outcome is stored")
    }
}

impl<T> Guarantee<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Block the calling thread until this guarantee settles, returning its
    /// value. Logs [`LogEvent::WaitOnMainThread`] if the calling thread was
    /// marked via [`mark_main_thread`].
    pub fn wait(&self) -> T {
        if is_main_thread() {
            config::log(LogEvent::WaitOnMainThread);
        }

        if let Some(value) = self.result() {
            return value;
        }

        let latch = std::sync::Arc::new(WaitLatch::new());
        let result = std::sync::Arc::new(Mutex::new(None));

        let latch2 = std::sync::Arc::clone(&latch);
        let result2 = std::sync::Arc::clone(&result);
        self.pipe(move |value| {
            *result2.lock() = Some(value);
            latch2.signal();
        });

        latch.park();
        result.lock().take().expect("latch only signals after the value is stored")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::time::Duration;

    #[test]
    fn wait_returns_immediately_for_already_settled_promise() {
        let p = Promise::fulfilled(5);
        assert_eq!(p.wait().value(), Some(&5));
    }

    #[test]
    fn wait_blocks_until_another_thread_settles_it() {
        let (p, resolver) = Promise::pending();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            resolver.fulfill(42);
        });
        assert_eq!(p.wait().value(), Some(&42));
    }

    #[test]
    fn wait_returns_rejection() {
        let p: Promise<i32> = Promise::rejected(Error::BadInput);
        assert!(p.wait().is_rejected());
    }

    #[test]
    fn guarantee_wait_blocks_until_settled() {
        let (g, resolver) = Guarantee::pending();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            resolver.fulfill(7);
        });
        assert_eq!(g.wait(), 7);
    }

    #[test]
    #[serial_test::serial(sealant_config)]
    fn main_thread_wait_logs_event() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let seen = Arc::new(AtomicBool::new(false));
        let seen2 = Arc::clone(&seen);
        config::set(config::Config {
            log_handler: Arc::new(move |event| {
                if matches!(event, LogEvent::WaitOnMainThread) {
                    seen2.store(true, Ordering::SeqCst);
                }
            }),
            ..config::Config::default()
        });

        mark_main_thread();
        Promise::fulfilled(()).wait();

        assert!(seen.load(Ordering::SeqCst));
        config::reset();
    }
}
