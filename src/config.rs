// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Process-wide configuration: default dispatchers, catch policy, log sink.
//!
//! Kept as a single struct behind an [`arc_swap::ArcSwap`] rather than
//! threaded through every call site, per the library's design notes: reads
//! are racy-safe snapshots (`Arc` clones), writes (`set`) are rare and only
//! expected at process startup.

use crate::dispatch::{Dispatcher, SharedDispatcher, ThreadPoolDispatcher};
use crate::error::Error;
use crate::ops::CatchPolicy;
use arc_swap::ArcSwap;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Library log events, emitted through [`Config::log_handler`].
#[derive(Debug, Clone)]
pub enum LogEvent {
    /// A blocking `wait()` adapter was invoked on a thread marked as main.
    WaitOnMainThread,
    /// A still-pending `Promise`'s last `Resolver`/cell reference was dropped.
    PendingPromiseDeallocated,
    /// A still-pending `Guarantee`'s last reference was dropped.
    PendingGuaranteeDeallocated,
    /// `cauterize` delivered a terminal rejection to the log sink.
    Cauterized(Error),
}

/// Process-wide configuration consulted by combinators that aren't given an
/// explicit override.
#[derive(Clone)]
pub struct Config {
    /// Default dispatcher for transformation steps (`map`, `then`, ...).
    pub default_dispatcher_processing: SharedDispatcher,
    /// Default dispatcher for terminal-style steps (`done`, `catch`, `ensure`, ...).
    pub default_dispatcher_terminal: SharedDispatcher,
    /// Default catch policy for `catch`/`recover` when none is passed explicitly.
    pub catch_policy: CatchPolicy,
    /// Sink for library log events.
    pub log_handler: Arc<dyn Fn(LogEvent) + Send + Sync>,
    /// Extends [`Error::is_cancelled`] with a host-registered predicate, so a
    /// host's own cancellation error — wrapped via `Error::custom` rather
    /// than the library's `Error::Cancelled` — can still be recognized by
    /// [`crate::ops::CatchPolicy::AllErrorsExceptCancellation`].
    pub cancellation_predicate: Arc<dyn Fn(&Error) -> bool + Send + Sync>,
}

impl Config {
    /// The cancellation predicate consulted by `catch`/`recover` policy:
    /// `Error::Cancelled`, or whatever `cancellation_predicate` additionally
    /// recognizes.
    pub fn is_cancelled(&self, error: &Error) -> bool {
        error.is_cancelled() || (self.cancellation_predicate)(error)
    }
}

impl Default for Config {
    fn default() -> Self {
        let pool: SharedDispatcher = Arc::new(ThreadPoolDispatcher::new(
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        ));

        Self {
            default_dispatcher_processing: Arc::clone(&pool),
            default_dispatcher_terminal: pool,
            catch_policy: CatchPolicy::AllErrors,
            log_handler: Arc::new(default_log_handler),
            cancellation_predicate: Arc::new(|_| false),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("catch_policy", &self.catch_policy)
            .finish_non_exhaustive()
    }
}

fn default_log_handler(event: LogEvent) {
    match event {
        LogEvent::WaitOnMainThread => {
            tracing::warn!("sealant: blocking wait() invoked on the main thread");
        }
        LogEvent::PendingPromiseDeallocated => {
            tracing::warn!("sealant: a still-pending Promise was dropped (PENDING_PROMISE_DEALLOCATED)");
        }
        LogEvent::PendingGuaranteeDeallocated => {
            tracing::warn!("sealant: a still-pending Guarantee was dropped (PENDING_GUARANTEE_DEALLOCATED)");
        }
        LogEvent::Cauterized(err) => {
            tracing::error!(error = %err, "sealant: cauterized an unhandled rejection");
        }
    }
}

static CONFIG: Lazy<ArcSwap<Config>> = Lazy::new(|| ArcSwap::from_pointee(Config::default()));

/// Read a snapshot of the process-wide configuration.
pub fn get() -> Arc<Config> {
    CONFIG.load_full()
}

/// Replace the process-wide configuration wholesale.
///
/// Intended to run once at startup; safe to call at any time, but a swap
/// racing with in-flight combinators means some may observe the old config
/// and some the new one.
pub fn set(config: Config) {
    CONFIG.store(Arc::new(config));
}

/// Restore the default configuration. Mostly useful for tests.
pub fn reset() {
    CONFIG.store(Arc::new(Config::default()));
}

/// Emit a log event through the current configuration's sink.
pub fn log(event: LogEvent) {
    (get().log_handler)(event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::InlineDispatcher;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    #[serial_test::serial(sealant_config)]
    fn default_config_uses_all_errors_policy() {
        assert_eq!(get().catch_policy, CatchPolicy::AllErrors);
    }

    #[test]
    #[serial_test::serial(sealant_config)]
    fn set_replaces_the_snapshot() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen2 = Arc::clone(&seen);

        set(Config {
            default_dispatcher_processing: Arc::new(InlineDispatcher),
            default_dispatcher_terminal: Arc::new(InlineDispatcher),
            catch_policy: CatchPolicy::AllErrorsExceptCancellation,
            log_handler: Arc::new(move |_event| {
                seen2.fetch_add(1, Ordering::SeqCst);
            }),
            cancellation_predicate: Arc::new(|_| false),
        });

        assert_eq!(get().catch_policy, CatchPolicy::AllErrorsExceptCancellation);
        log(LogEvent::WaitOnMainThread);
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        reset();
        assert_eq!(get().catch_policy, CatchPolicy::AllErrors);
    }

    #[test]
    fn cancellation_predicate_extends_the_builtin_check() {
        let mut cfg = Config::default();
        assert!(!cfg.is_cancelled(&Error::message("boom")));

        cfg.cancellation_predicate = Arc::new(|e| e.to_string() == "boom");
        assert!(cfg.is_cancelled(&Error::message("boom")));
        assert!(cfg.is_cancelled(&Error::Cancelled));
    }
}
