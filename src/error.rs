// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error taxonomy for promise/guarantee chains.
//!
//! [`Error`] carries the library-emitted kinds spec'd by the composition
//! operators and aggregators, plus a [`Error::Custom`] variant that carries
//! a user-domain error through a chain unchanged. `Custom` wraps its payload
//! in an `Arc` rather than owning it directly: a rejected chain can be
//! observed by more than one late-attaching `pipe` handler (see
//! [`crate::cell`]), and cloning an `Arc` is the cheapest way to hand all of
//! them the identical error without requiring every user error type to
//! implement `Clone`.

use std::fmt;
use std::sync::Arc;

/// Result alias used throughout the crate's own fallible constructors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors this library can produce, plus user-domain errors passed through
/// a chain unchanged.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A `then` body returned the very downstream promise it was resolving.
    #[error("a combinator body returned its own downstream promise")]
    ReturnedSelf,

    /// `compact_map`'s body returned `None`.
    #[error("compact_map body produced no value")]
    CompactMapNil,

    /// An aggregator (`when_all_fulfilled`, bounded-concurrency variants)
    /// was given an empty iterator where at least one item was required.
    #[error("expected at least one promise, got an empty sequence")]
    EmptySequence,

    /// `race` / `race_fulfilled` received an empty input slice.
    #[error("race requires at least one input promise")]
    BadInput,

    /// `race_fulfilled` observed every input reject.
    #[error("all inputs to race_fulfilled rejected")]
    NoWinner,

    /// A legacy `(value?, error?)` resolver callback had neither set.
    #[error("calling convention violated: neither value nor error supplied")]
    InvalidCallingConvention,

    /// A designated cancellation error. Consulted only by [`crate::ops::CatchPolicy`].
    #[error("operation was cancelled")]
    Cancelled,

    /// A user-domain error propagated through the chain unchanged.
    #[error("{0}")]
    Custom(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap an arbitrary user error so it can flow through a `Promise<T>` chain.
    pub fn custom<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Custom(Arc::new(err))
    }

    /// Wrap a plain message as a user-domain error.
    pub fn message(msg: impl Into<String>) -> Self {
        Error::custom(MessageError(msg.into()))
    }

    /// Recognizes the library's own [`Error::Cancelled`] kind.
    ///
    /// This is the library-only half of the cancellation predicate: it can't
    /// see inside an opaque [`Error::Custom`] payload, so a host that wraps
    /// its own cancellation error via `Error::custom` won't be recognized
    /// here. `catch`/`recover` policy checks don't call this directly — see
    /// [`crate::config::Config::is_cancelled`], which also consults a
    /// host-registered predicate for exactly that case.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// A bare string wrapped as a [`std::error::Error`], for [`Error::message`].
#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MessageError {}
