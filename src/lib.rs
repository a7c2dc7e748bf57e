// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A promise/future library for asynchronous value composition.
//!
//! `sealant` exposes two settling values — [`Promise<T>`], which eventually
//! fulfills with `T` or rejects with an [`Error`], and [`Guarantee<T>`],
//! which eventually settles with `T` and cannot reject — plus a family of
//! composition operators (`then`, `map`, `catch`, `recover`, `ensure`, ...)
//! and aggregators (`when_all_fulfilled`, `race`, ...) for combining them.
//! Continuations run wherever a [`Dispatcher`] says they should: inline, on
//! a thread pool, or on a Tokio runtime, selected per call or process-wide
//! via [`config`].
//!
//! ```
//! use sealant::{Dispatcher, InlineDispatcher, Promise};
//! use std::sync::Arc;
//!
//! // An explicit InlineDispatcher keeps this example synchronous; in real
//! // use, passing `None` runs on the process-wide default instead.
//! let inline: Option<Arc<dyn Dispatcher>> = Some(Arc::new(InlineDispatcher));
//!
//! let p = Promise::fulfilled(21)
//!     .map(inline.clone(), |n| Ok(n * 2))
//!     .get(inline, |n| {
//!         assert_eq!(n, 42);
//!         Ok(())
//!     });
//!
//! assert_eq!(p.value(), Some(42));
//! ```

mod aggregate;
#[cfg(feature = "blocking-wait")]
mod blocking;
mod cell;
pub mod config;
pub mod dispatch;
pub mod error;
mod guarantee;
pub mod ops;
mod outcome;
mod promise;
mod resolver;
mod thenable;

pub use aggregate::{
    race, race_fulfilled, race_fulfilled_concurrently, when_all_fulfilled,
    when_all_fulfilled_concurrently, when_all_resolved,
};
#[cfg(feature = "blocking-wait")]
pub use blocking::mark_main_thread;
pub use config::{Config, LogEvent};
pub use dispatch::{Dispatcher, InlineDispatcher, SharedDispatcher, ThreadPoolDispatcher};
#[cfg(feature = "tokio")]
pub use dispatch::TokioDispatcher;
pub use error::{Error, Result};
pub use guarantee::Guarantee;
pub use ops::{CatchPolicy, Finalizer};
pub use outcome::Outcome;
pub use promise::Promise;
pub use resolver::{GuaranteeResolver, Resolver};
pub use thenable::{IntoThenable, Thenable};
