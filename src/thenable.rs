// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `Thenable` capability trait.
//!
//! `Promise<T>` and `Guarantee<T>` are different types (only one of them can
//! reject), but most combinators only need "something that eventually
//! settles with a `T`, observable via `pipe`/`result`". Encoding that as a
//! trait — rather than an inheritance hierarchy — lets a single generic
//! combinator body work over either, and lets `then`'s body return whichever
//! one fits its use case.

use crate::guarantee::Guarantee;
use crate::outcome::Outcome;
use crate::promise::Promise;

/// Capability shared by `Promise<T>` and `Guarantee<T>`: settles once with
/// an [`Outcome<T>`] (always `Fulfilled` for a `Guarantee`).
pub trait Thenable<T>: Send + Sync
where
    T: Clone + Send + 'static,
{
    /// Attach a handler to run, once, with the settled outcome.
    fn pipe_outcome(&self, handler: Box<dyn FnOnce(Outcome<T>) + Send>);

    /// Non-blocking snapshot of the settled outcome, if any.
    fn snapshot_outcome(&self) -> Option<Outcome<T>>;

    /// Type-erased view of `self`, used by `then`/`recover` to detect a
    /// body returning its own downstream (`RETURNED_SELF`) by pointer
    /// identity rather than by trait dispatch.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Converts a `then`/`recover` body's return value into something
/// [`Thenable`], so the combinator can pipe its settlement into the
/// downstream promise regardless of whether the body produced a
/// `Promise<T>` or a `Guarantee<T>`.
pub trait IntoThenable<T>
where
    T: Clone + Send + 'static,
{
    /// The concrete thenable type this converts into.
    type Target: Thenable<T> + 'static;

    /// Perform the conversion.
    fn into_thenable(self) -> Self::Target;
}

impl<T> IntoThenable<T> for Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Target = Promise<T>;

    fn into_thenable(self) -> Self::Target {
        self
    }
}

impl<T> IntoThenable<T> for Guarantee<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Target = Guarantee<T>;

    fn into_thenable(self) -> Self::Target {
        self
    }
}
