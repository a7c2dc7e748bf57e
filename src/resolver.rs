// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`Resolver`] / [`GuaranteeResolver`]: the write-capability handles.
//!
//! These are the only way to externally settle a pending [`Cell`]. Each is
//! the sole owner of that write capability — there is no `Clone` impl — so
//! dropping one while its cell is still pending means the cell can never be
//! settled, which is worth a log line (see [`crate::config::LogEvent`]).

use crate::cell::Cell;
use crate::config::{self, LogEvent};
use crate::error::Error;
use crate::outcome::Outcome;

/// Write-capability for a pending `Promise<T>`.
pub struct Resolver<T> {
    cell: Cell<Outcome<T>>,
}

impl<T> Resolver<T> {
    pub(crate) fn new(cell: Cell<Outcome<T>>) -> Self {
        Self { cell }
    }

    /// Settle with a fulfilled value.
    pub fn fulfill(&self, value: T) {
        self.cell.seal(Outcome::Fulfilled(value));
    }

    /// Settle with a rejection.
    pub fn reject(&self, error: Error) {
        self.cell.seal(Outcome::Rejected(error));
    }

    /// Settle with an already-built [`Outcome`].
    pub fn resolve(&self, outcome: Outcome<T>) {
        self.cell.seal(outcome);
    }

    /// Adapt a legacy `(value?, error?)`-shaped callback: error wins if
    /// present, else value, else [`Error::InvalidCallingConvention`].
    pub fn from_value_error(&self, value: Option<T>, error: Option<Error>) {
        self.resolve_legacy(value, error)
    }

    /// Adapt a legacy `(error?, value?)`-shaped callback — the Node-style
    /// `(err, value)` argument order — with the same resolution rule as
    /// [`Resolver::from_value_error`].
    pub fn from_error_value(&self, error: Option<Error>, value: Option<T>) {
        self.resolve_legacy(value, error)
    }

    fn resolve_legacy(&self, value: Option<T>, error: Option<Error>) {
        match (error, value) {
            (Some(e), _) => self.reject(e),
            (None, Some(v)) => self.fulfill(v),
            (None, None) => self.reject(Error::InvalidCallingConvention),
        }
    }
}

impl<T> Drop for Resolver<T> {
    fn drop(&mut self) {
        if !self.cell.is_resolved() {
            config::log(LogEvent::PendingPromiseDeallocated);
        }
    }
}

/// Write-capability for a pending `Guarantee<T>`. Rejection is
/// unrepresentable, so there is only `fulfill`.
pub struct GuaranteeResolver<T> {
    cell: Cell<T>,
}

impl<T> GuaranteeResolver<T> {
    pub(crate) fn new(cell: Cell<T>) -> Self {
        Self { cell }
    }

    /// Settle with the guaranteed value.
    pub fn fulfill(&self, value: T) {
        self.cell.seal(value);
    }
}

impl<T> Drop for GuaranteeResolver<T> {
    fn drop(&mut self) {
        if !self.cell.is_resolved() {
            config::log(LogEvent::PendingGuaranteeDeallocated);
        }
    }
}
