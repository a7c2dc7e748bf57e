// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`Guarantee<T>`]: an asynchronous value that settles once with `T` and
//! cannot reject.

use crate::cell::Cell;
use crate::config::{self, LogEvent};
use crate::outcome::Outcome;
use crate::resolver::GuaranteeResolver;
use crate::thenable::Thenable;
use std::fmt;

/// An asynchronous value that eventually settles with a `T`. Rejection is
/// unrepresentable — a `Guarantee` simply has no `Error` variant to carry
/// one, per invariant 5.
pub struct Guarantee<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) cell: Cell<T>,
}

impl<T> Clone for Guarantee<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Guarantee {
            cell: self.cell.clone(),
        }
    }
}

impl<T> fmt::Debug for Guarantee<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.is_resolved() {
            true => write!(f, "Guarantee(resolved)"),
            false => write!(f, "Guarantee(pending)"),
        }
    }
}

impl<T> Guarantee<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Build a pending guarantee, handing the producer a
    /// [`GuaranteeResolver`] to settle it later.
    pub fn new<F>(builder: F) -> Self
    where
        F: FnOnce(GuaranteeResolver<T>),
    {
        let (guarantee, resolver) = Self::pending();
        builder(resolver);
        guarantee
    }

    /// Build a pending guarantee together with the resolver that settles it.
    pub fn pending() -> (Self, GuaranteeResolver<T>) {
        let cell = Cell::pending();
        let resolver = GuaranteeResolver::new(cell.clone());
        (Guarantee { cell }, resolver)
    }

    /// An already-settled guarantee.
    pub fn value(value: T) -> Self {
        Guarantee {
            cell: Cell::sealed(value),
        }
    }

    /// Attach a handler that runs, once, with the settled value.
    pub fn pipe<F>(&self, callback: F)
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.cell.pipe(Box::new(move |v| callback((*v).clone())));
    }

    /// Non-blocking snapshot: `None` while pending, `Some` once settled.
    pub fn result(&self) -> Option<T> {
        self.cell.snapshot().map(|v| (*v).clone())
    }

    /// `true` while unsettled.
    pub fn is_pending(&self) -> bool {
        self.result().is_none()
    }

    /// `true` once settled.
    pub fn is_resolved(&self) -> bool {
        self.result().is_some()
    }
}

impl<T> Thenable<T> for Guarantee<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn pipe_outcome(&self, handler: Box<dyn FnOnce(Outcome<T>) + Send>) {
        self.pipe(move |value| handler(Outcome::Fulfilled(value)));
    }

    fn snapshot_outcome(&self) -> Option<Outcome<T>> {
        self.result().map(Outcome::Fulfilled)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl<T> Drop for Guarantee<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if self.cell.is_abandoned_pending() {
            config::log(LogEvent::PendingGuaranteeDeallocated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_guarantee_is_settled() {
        let g = Guarantee::value(5);
        assert!(g.is_resolved());
        assert_eq!(g.result(), Some(5));
    }

    #[test]
    fn pending_guarantee_settles_via_resolver() {
        let (g, resolver) = Guarantee::pending();
        assert!(g.is_pending());
        resolver.fulfill(7);
        assert_eq!(g.result(), Some(7));
    }

    #[test]
    fn pipe_runs_immediately_when_already_settled() {
        let g = Guarantee::value(2);
        let mut seen = None;
        g.pipe(move |v| seen = Some(v));
        assert_eq!(seen, Some(2));
    }
}
