// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`Promise<T>`]: an asynchronous value that settles once, fulfilled with
//! `T` or rejected with an [`Error`].

use crate::cell::Cell;
use crate::config::{self, LogEvent};
use crate::error::Error;
use crate::outcome::Outcome;
use crate::resolver::Resolver;
use crate::thenable::Thenable;
use std::fmt;

/// An asynchronous value that eventually settles as fulfilled(T) or
/// rejected(Error). Cheap to clone; every clone observes the same
/// settlement.
pub struct Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) cell: Cell<Outcome<T>>,
}

impl<T> Clone for Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Promise {
            cell: self.cell.clone(),
        }
    }
}

impl<T> fmt::Debug for Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.result() {
            None => write!(f, "Promise(pending)"),
            Some(Outcome::Fulfilled(_)) => write!(f, "Promise(fulfilled)"),
            Some(Outcome::Rejected(e)) => write!(f, "Promise(rejected: {e})"),
        }
    }
}

impl<T> Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Build a pending promise, handing the producer a [`Resolver`] to
    /// settle it later (possibly from another thread).
    pub fn new<F>(builder: F) -> Self
    where
        F: FnOnce(Resolver<T>),
    {
        let (promise, resolver) = Self::pending();
        builder(resolver);
        promise
    }

    /// Build a pending promise together with the [`Resolver`] that settles
    /// it, for callers who want to hold onto the resolver themselves rather
    /// than working inside a builder closure.
    pub fn pending() -> (Self, Resolver<T>) {
        let cell = Cell::pending();
        let resolver = Resolver::new(cell.clone());
        (Promise { cell }, resolver)
    }

    /// An already-fulfilled promise.
    pub fn fulfilled(value: T) -> Self {
        Promise {
            cell: Cell::sealed(Outcome::Fulfilled(value)),
        }
    }

    /// An already-rejected promise.
    pub fn rejected(error: Error) -> Self {
        Promise {
            cell: Cell::sealed(Outcome::Rejected(error)),
        }
    }

    /// Attach a handler that runs, once, with the settled outcome —
    /// immediately on the calling thread if already settled, or from
    /// whichever thread eventually settles this promise otherwise. This is
    /// the primitive every composition operator is built on; combinators
    /// additionally route through a [`crate::dispatch::Dispatcher`].
    pub fn pipe<F>(&self, callback: F)
    where
        F: FnOnce(Outcome<T>) + Send + 'static,
    {
        self.cell
            .pipe(Box::new(move |outcome| callback((*outcome).clone())));
    }

    /// Non-blocking snapshot: `None` while pending, `Some` once settled.
    pub fn result(&self) -> Option<Outcome<T>> {
        self.cell.snapshot().map(|outcome| (*outcome).clone())
    }

    /// `true` while unsettled.
    pub fn is_pending(&self) -> bool {
        self.result().is_none()
    }

    /// `true` once settled, fulfilled or rejected.
    pub fn is_resolved(&self) -> bool {
        self.result().is_some()
    }

    /// `true` if settled fulfilled.
    pub fn is_fulfilled(&self) -> bool {
        matches!(self.result(), Some(Outcome::Fulfilled(_)))
    }

    /// `true` if settled rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(self.result(), Some(Outcome::Rejected(_)))
    }

    /// The fulfilled value, if settled fulfilled.
    pub fn value(&self) -> Option<T> {
        match self.result() {
            Some(Outcome::Fulfilled(v)) => Some(v),
            _ => None,
        }
    }

    /// The rejection error, if settled rejected.
    pub fn error(&self) -> Option<Error> {
        match self.result() {
            Some(Outcome::Rejected(e)) => Some(e),
            _ => None,
        }
    }
}

impl<T> Thenable<T> for Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn pipe_outcome(&self, handler: Box<dyn FnOnce(Outcome<T>) + Send>) {
        self.pipe(move |outcome| handler(outcome));
    }

    fn snapshot_outcome(&self) -> Option<Outcome<T>> {
        self.result()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl<T> Drop for Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if self.cell.is_abandoned_pending() {
            config::log(LogEvent::PendingPromiseDeallocated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fulfilled_promise_is_settled() {
        let p = Promise::fulfilled(5);
        assert!(p.is_fulfilled());
        assert_eq!(p.value(), Some(5));
    }

    #[test]
    fn rejected_promise_is_settled() {
        let p: Promise<i32> = Promise::rejected(Error::BadInput);
        assert!(p.is_rejected());
        assert!(matches!(p.error(), Some(Error::BadInput)));
    }

    #[test]
    fn pending_promise_settles_via_resolver() {
        let (p, resolver) = Promise::pending();
        assert!(p.is_pending());
        resolver.fulfill(10);
        assert_eq!(p.value(), Some(10));
    }

    #[test]
    fn pipe_runs_immediately_when_already_settled() {
        let p = Promise::fulfilled(1);
        let mut seen = None;
        p.pipe(move |outcome| seen = Some(outcome.is_fulfilled()));
        assert_eq!(seen, Some(true));
    }

    #[test]
    fn clone_observes_the_same_settlement() {
        let (p, resolver) = Promise::pending();
        let clone = p.clone();
        resolver.fulfill(3);
        assert_eq!(clone.value(), Some(3));
    }
}
