// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Execution-context abstraction.
//!
//! A [`Dispatcher`] arranges to invoke a closure "eventually". Every
//! combinator takes an optional dispatcher; `None` means "use the
//! process-wide default" (see [`crate::config`] for `default_dispatcher_processing`/
//! `default_dispatcher_terminal`). Running inline — never hopping execution
//! contexts — is always an explicit opt-in: pass `Some(Arc::new(InlineDispatcher))`.

use std::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;

/// A job scheduled on a [`Dispatcher`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run a closure "eventually".
///
/// Implementors only need to guarantee the closure runs; ordering beyond
/// FIFO-per-dispatcher is not required by the core (see spec §4.2).
pub trait Dispatcher: Send + Sync {
    /// Arrange for `job` to run. May run synchronously or be handed off to
    /// another thread/executor.
    fn schedule(&self, job: Job);
}

impl fmt::Debug for dyn Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn Dispatcher")
    }
}

/// Runs every job synchronously on the calling thread.
///
/// Distinguishing this from "no dispatcher at all" matters for a handful of
/// micro-combinators (`as_void`, collection helpers) that must never hop
/// execution contexts even when a process-wide default dispatcher is
/// configured; passing `Some(&InlineDispatcher)` explicitly overrides it.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn schedule(&self, job: Job) {
        tracing::trace!(dispatcher = "inline", "running job synchronously");
        job();
    }
}

/// The crate's canonical asynchronous dispatcher: a fixed pool of worker
/// threads fed by an unbounded FIFO channel.
///
/// Grounded on the channel-fed worker/queue pairing in a Node-compatible
/// event loop: a `schedule` call pushes onto the channel and returns
/// immediately; a worker thread blocks on `recv` and runs jobs as they
/// arrive, one at a time, in the order they were sent.
pub struct ThreadPoolDispatcher {
    sender: crossbeam_channel::Sender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPoolDispatcher {
    /// Spawn a pool of `worker_count` threads (minimum 1).
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();

        let workers = (0..worker_count)
            .map(|index| {
                let receiver = receiver.clone();
                std::thread::Builder::new()
                    .name(format!("sealant-worker-{index}"))
                    .spawn(move || {
                        while let Ok(job) = receiver.recv() {
                            tracing::trace!(dispatcher = "thread_pool", worker = index, "running scheduled job");
                            job();
                        }
                    })
                    .expect("failed to spawn sealant worker thread")
            })
            .collect();

        Self { sender, workers }
    }

    /// Number of worker threads in the pool.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

impl Dispatcher for ThreadPoolDispatcher {
    fn schedule(&self, job: Job) {
        tracing::trace!(dispatcher = "thread_pool", "queueing job");
        // An unbounded channel with live receivers never fails to send.
        let _ = self.sender.send(job);
    }
}

impl fmt::Debug for ThreadPoolDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPoolDispatcher")
            .field("workers", &self.workers.len())
            .finish()
    }
}

/// A dispatcher backed by a Tokio runtime handle.
#[cfg(feature = "tokio")]
pub struct TokioDispatcher {
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "tokio")]
impl TokioDispatcher {
    /// Build a dispatcher from an explicit runtime handle.
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Build a dispatcher from the handle of the runtime the caller is
    /// currently running inside.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

#[cfg(feature = "tokio")]
impl Dispatcher for TokioDispatcher {
    fn schedule(&self, job: Job) {
        tracing::trace!(dispatcher = "tokio", "spawning job via spawn_blocking");
        self.handle.spawn_blocking(job);
    }
}

/// Convenience: a boxed dispatcher trait object.
pub type SharedDispatcher = Arc<dyn Dispatcher>;
