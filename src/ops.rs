// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Composition operators: `then`, `map`, `compact_map`, `done`, `get`, `tap`,
//! `as_void`, `catch`, `recover`, `ensure`, `ensure_then`, `cauterize`.
//!
//! Every operator is built on [`Promise::pipe`]/[`Guarantee::pipe`] plus a
//! [`Dispatcher`]: attach a handler to the upstream cell that, on the
//! relevant branch, hands a job to the dispatcher; the job computes the
//! downstream settlement and resolves it. Rejection (where applicable)
//! forwards through untouched, without ever touching the dispatcher —
//! there's no work to schedule for a value that's just passing through.

use crate::config::{self, LogEvent};
use crate::dispatch::SharedDispatcher;
use crate::error::Error;
use crate::guarantee::Guarantee;
use crate::outcome::Outcome;
use crate::promise::Promise;
use crate::thenable::{IntoThenable, Thenable};
use std::sync::Arc;

/// Which rejections `catch`/`recover` hand to their body, versus forward
/// through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchPolicy {
    /// Every rejection is handled.
    AllErrors,
    /// Every rejection except [`Error::Cancelled`] is handled; a
    /// cancellation is forwarded as though no handler were attached.
    AllErrorsExceptCancellation,
}

impl CatchPolicy {
    /// `true` if a rejection with this error should be handed to the body.
    ///
    /// Cancellation is recognized via [`config::Config::is_cancelled`],
    /// which also consults a host-registered predicate beyond the library's
    /// own [`Error::Cancelled`] variant.
    pub fn admits(&self, error: &Error) -> bool {
        match self {
            CatchPolicy::AllErrors => true,
            CatchPolicy::AllErrorsExceptCancellation => !config::get().is_cancelled(error),
        }
    }
}

/// Resolve `explicit`, falling back to the process-wide default dispatcher
/// for either the "processing" or "terminal" role (spec §4.2).
fn resolve_dispatcher(explicit: Option<SharedDispatcher>, processing: bool) -> SharedDispatcher {
    explicit.unwrap_or_else(|| {
        let cfg = config::get();
        if processing {
            Arc::clone(&cfg.default_dispatcher_processing)
        } else {
            Arc::clone(&cfg.default_dispatcher_terminal)
        }
    })
}

/// Shared skeleton for combinators whose body only runs on the fulfilled
/// branch and synchronously produces the downstream [`Outcome`]; rejection
/// forwards untouched without visiting the dispatcher at all.
fn chain_fulfilled<T, U, F>(
    upstream: &Promise<T>,
    dispatcher: SharedDispatcher,
    on_fulfilled: F,
) -> Promise<U>
where
    T: Clone + Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
    F: FnOnce(T) -> Outcome<U> + Send + 'static,
{
    let (downstream, resolver) = Promise::pending();
    upstream.pipe(move |outcome| match outcome {
        Outcome::Rejected(e) => resolver.reject(e),
        Outcome::Fulfilled(v) => {
            dispatcher.schedule(Box::new(move || {
                resolver.resolve(on_fulfilled(v));
            }));
        }
    });
    downstream
}

/// A non-chainable terminal handle, returned by `catch`/`cauterize`: there is
/// nothing left to observe but "it ran", exposed through
/// [`Finalizer::finally`].
pub struct Finalizer {
    guarantee: Guarantee<()>,
}

impl Finalizer {
    /// Run `body` once the chain this finalizer terminates has fully
    /// settled (including, for `catch`, after the handler itself has run).
    pub fn finally<F>(&self, body: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.guarantee.pipe(move |_| body());
    }
}

impl<T> Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Chain a fallible, thenable-returning continuation. If `body` returns
    /// the very promise being resolved, the downstream rejects with
    /// [`Error::ReturnedSelf`] instead of deadlocking forever.
    pub fn then<U, R, F>(&self, dispatcher: Option<SharedDispatcher>, body: F) -> Promise<U>
    where
        U: Clone + Send + Sync + 'static,
        R: IntoThenable<U> + 'static,
        F: FnOnce(T) -> crate::error::Result<R> + Send + 'static,
    {
        let dispatcher = resolve_dispatcher(dispatcher, true);
        let (downstream, resolver) = Promise::pending();
        let downstream_cell = downstream.cell.clone();

        self.pipe(move |outcome| match outcome {
            Outcome::Rejected(e) => resolver.reject(e),
            Outcome::Fulfilled(v) => {
                let downstream_cell = downstream_cell.clone();
                dispatcher.schedule(Box::new(move || match body(v) {
                    Err(e) => resolver.reject(e),
                    Ok(r) => pipe_thenable_into(r.into_thenable(), &downstream_cell, resolver),
                }));
            }
        });

        downstream
    }

    /// Transform the fulfilled value; rejection passes through unchanged.
    pub fn map<U, F>(&self, dispatcher: Option<SharedDispatcher>, body: F) -> Promise<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> crate::error::Result<U> + Send + 'static,
    {
        chain_fulfilled(self, resolve_dispatcher(dispatcher, true), move |v| {
            body(v).into()
        })
    }

    /// Like [`Promise::map`], but a body returning `Ok(None)` rejects the
    /// downstream with [`Error::CompactMapNil`] instead of producing an
    /// `Option<U>` the caller would just have to unwrap anyway.
    pub fn compact_map<U, F>(&self, dispatcher: Option<SharedDispatcher>, body: F) -> Promise<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> crate::error::Result<Option<U>> + Send + 'static,
    {
        chain_fulfilled(self, resolve_dispatcher(dispatcher, true), move |v| {
            match body(v) {
                Ok(Some(u)) => Outcome::Fulfilled(u),
                Ok(None) => Outcome::Rejected(Error::CompactMapNil),
                Err(e) => Outcome::Rejected(e),
            }
        })
    }

    /// Run a side-effecting body for its `Result<(), Error>`, discarding the
    /// original value. Rejection passes through unchanged.
    pub fn done<F>(&self, dispatcher: Option<SharedDispatcher>, body: F) -> Promise<()>
    where
        F: FnOnce(T) -> crate::error::Result<()> + Send + 'static,
    {
        chain_fulfilled(self, resolve_dispatcher(dispatcher, false), move |v| {
            body(v).into()
        })
    }

    /// Run a side-effecting body that may itself fail, but preserve the
    /// original fulfilled value on success.
    pub fn get<F>(&self, dispatcher: Option<SharedDispatcher>, body: F) -> Promise<T>
    where
        F: FnOnce(T) -> crate::error::Result<()> + Send + 'static,
    {
        chain_fulfilled(self, resolve_dispatcher(dispatcher, false), move |v| {
            match body(v.clone()) {
                Ok(()) => Outcome::Fulfilled(v),
                Err(e) => Outcome::Rejected(e),
            }
        })
    }

    /// Observe the settled outcome — fulfilled or rejected — without being
    /// able to change it. `body` cannot fail; the downstream always settles
    /// identically to the upstream.
    pub fn tap<F>(&self, dispatcher: Option<SharedDispatcher>, body: F) -> Promise<T>
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        let dispatcher = resolve_dispatcher(dispatcher, false);
        let (downstream, resolver) = Promise::pending();

        self.pipe(move |outcome| {
            dispatcher.schedule(Box::new(move || {
                body(outcome.clone());
                resolver.resolve(outcome);
            }));
        });

        downstream
    }

    /// Collapse to `Promise<()>`, keeping only fulfilled-vs-rejected. Runs
    /// inline: there is no transformation worth hopping a dispatcher for.
    pub fn as_void(&self) -> Promise<()> {
        let (downstream, resolver) = Promise::pending();
        self.pipe(move |outcome| resolver.resolve(outcome.map(|_| ())));
        downstream
    }

    /// Handle a rejection without producing a further value. Always returns
    /// a [`Finalizer`]: a `catch`ed chain has nothing left to chain off of.
    pub fn catch<F>(
        &self,
        dispatcher: Option<SharedDispatcher>,
        policy: Option<CatchPolicy>,
        body: F,
    ) -> Finalizer
    where
        F: FnOnce(Error) + Send + 'static,
    {
        let dispatcher = resolve_dispatcher(dispatcher, false);
        let policy = policy.unwrap_or_else(|| config::get().catch_policy);
        let (guarantee, resolver) = Guarantee::pending();

        self.pipe(move |outcome| {
            dispatcher.schedule(Box::new(move || {
                if let Outcome::Rejected(e) = outcome {
                    if policy.admits(&e) {
                        body(e);
                    }
                }
                resolver.fulfill(());
            }));
        });

        Finalizer { guarantee }
    }

    /// Recover a rejection into a further `Promise<T>`, e.g. a fallback
    /// request that can itself fail. A rejection the policy doesn't admit
    /// forwards through untouched, same as an un-`catch`ed chain.
    pub fn recover<R, F>(
        &self,
        dispatcher: Option<SharedDispatcher>,
        policy: Option<CatchPolicy>,
        body: F,
    ) -> Promise<T>
    where
        R: IntoThenable<T> + 'static,
        F: FnOnce(Error) -> crate::error::Result<R> + Send + 'static,
    {
        let dispatcher = resolve_dispatcher(dispatcher, false);
        let policy = policy.unwrap_or_else(|| config::get().catch_policy);
        let (downstream, resolver) = Promise::pending();
        let downstream_cell = downstream.cell.clone();

        self.pipe(move |outcome| match outcome {
            Outcome::Fulfilled(v) => resolver.fulfill(v),
            Outcome::Rejected(e) => {
                if !policy.admits(&e) {
                    resolver.reject(e);
                    return;
                }
                let downstream_cell = downstream_cell.clone();
                dispatcher.schedule(Box::new(move || match body(e) {
                    Err(e2) => resolver.reject(e2),
                    Ok(r) => pipe_thenable_into(r.into_thenable(), &downstream_cell, resolver),
                }));
            }
        });

        downstream
    }

    /// Recover a rejection into a [`Guarantee<T>`] — a recovery that cannot
    /// itself fail. Unlike [`Promise::recover`], there's no policy to
    /// consult: a `Guarantee` has no channel left to forward an unrecovered
    /// rejection through, so every rejection is handed to `body`.
    pub fn recover_guarantee<F>(&self, dispatcher: Option<SharedDispatcher>, body: F) -> Guarantee<T>
    where
        F: FnOnce(Error) -> Guarantee<T> + Send + 'static,
    {
        let dispatcher = resolve_dispatcher(dispatcher, false);
        let (downstream, resolver) = Guarantee::pending();

        self.pipe(move |outcome| match outcome {
            Outcome::Fulfilled(v) => resolver.fulfill(v),
            Outcome::Rejected(e) => {
                dispatcher.schedule(Box::new(move || {
                    let recovered = body(e);
                    recovered.pipe(move |v| resolver.fulfill(v));
                }));
            }
        });

        downstream
    }

    /// Run `body` regardless of how the chain settles, then forward the
    /// original outcome unchanged.
    pub fn ensure<F>(&self, dispatcher: Option<SharedDispatcher>, body: F) -> Promise<T>
    where
        F: FnOnce() + Send + 'static,
    {
        let dispatcher = resolve_dispatcher(dispatcher, false);
        let (downstream, resolver) = Promise::pending();

        self.pipe(move |outcome| {
            dispatcher.schedule(Box::new(move || {
                body();
                resolver.resolve(outcome);
            }));
        });

        downstream
    }

    /// Like [`Promise::ensure`], but `body` returns a [`Guarantee<()>`] that
    /// is awaited before the original outcome is forwarded — for cleanup
    /// that is itself asynchronous.
    pub fn ensure_then<F>(&self, dispatcher: Option<SharedDispatcher>, body: F) -> Promise<T>
    where
        F: FnOnce() -> Guarantee<()> + Send + 'static,
    {
        let dispatcher = resolve_dispatcher(dispatcher, false);
        let (downstream, resolver) = Promise::pending();

        self.pipe(move |outcome| {
            dispatcher.schedule(Box::new(move || {
                let cleanup = body();
                cleanup.pipe(move |_| resolver.resolve(outcome));
            }));
        });

        downstream
    }

    /// Terminate the chain, logging any rejection through
    /// [`LogEvent::Cauterized`] instead of dropping it silently. For chains
    /// whose errors genuinely don't need handling beyond "don't lose them".
    pub fn cauterize(&self, dispatcher: Option<SharedDispatcher>) -> Finalizer {
        let dispatcher = resolve_dispatcher(dispatcher, false);
        let (guarantee, resolver) = Guarantee::pending();

        self.pipe(move |outcome| {
            dispatcher.schedule(Box::new(move || {
                if let Outcome::Rejected(e) = outcome {
                    config::log(LogEvent::Cauterized(e));
                }
                resolver.fulfill(());
            }));
        });

        Finalizer { guarantee }
    }
}

/// Pipe `thenable`'s eventual settlement into `resolver`, unless `thenable`
/// turns out to be the very downstream cell `resolver` writes to (a body
/// that returned its own promise), in which case reject with
/// [`Error::ReturnedSelf`] rather than waiting on a cell that can only ever
/// be settled by this same call.
fn pipe_thenable_into<U, D>(thenable: D, downstream_cell: &crate::cell::Cell<Outcome<U>>, resolver: crate::resolver::Resolver<U>)
where
    U: Clone + Send + Sync + 'static,
    D: Thenable<U> + 'static,
{
    if let Some(p) = thenable.as_any().downcast_ref::<Promise<U>>() {
        if crate::cell::Cell::ptr_eq(&p.cell, downstream_cell) {
            resolver.reject(Error::ReturnedSelf);
            return;
        }
    }
    thenable.pipe_outcome(Box::new(move |settled| resolver.resolve(settled)));
}
