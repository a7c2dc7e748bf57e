// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`Outcome`]: the domain-internal settled-value sum type.
//!
//! This is this crate's name for spec's `Result⟨T⟩` — kept as its own type
//! rather than reusing `std::result::Result<T, Error>` so call sites read
//! unambiguously (`Outcome::Fulfilled` vs. a bare `Ok`), though the two are
//! freely interconvertible via [`Outcome::into_result`] / `From`.

use crate::error::Error;

/// A promise's settled value: either fulfilled with `T` or rejected with an
/// [`Error`].
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    /// Settled successfully.
    Fulfilled(T),
    /// Settled with an error.
    Rejected(Error),
}

impl<T> Outcome<T> {
    /// `true` if fulfilled.
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Outcome::Fulfilled(_))
    }

    /// `true` if rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected(_))
    }

    /// The fulfilled value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Fulfilled(v) => Some(v),
            Outcome::Rejected(_) => None,
        }
    }

    /// The rejection error, if any.
    pub fn error(&self) -> Option<&Error> {
        match self {
            Outcome::Fulfilled(_) => None,
            Outcome::Rejected(e) => Some(e),
        }
    }

    /// Convert into a `std::result::Result`.
    pub fn into_result(self) -> Result<T, Error> {
        self.into()
    }

    /// Map the fulfilled value, passing rejection through untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Fulfilled(v) => Outcome::Fulfilled(f(v)),
            Outcome::Rejected(e) => Outcome::Rejected(e),
        }
    }
}

impl<T> From<Result<T, Error>> for Outcome<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(v) => Outcome::Fulfilled(v),
            Err(e) => Outcome::Rejected(e),
        }
    }
}

impl<T> From<Outcome<T>> for Result<T, Error> {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Outcome::Fulfilled(v) => Ok(v),
            Outcome::Rejected(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_result() {
        let outcome: Outcome<i32> = Ok(5).into();
        assert!(outcome.is_fulfilled());
        assert_eq!(outcome.into_result().unwrap(), 5);
    }

    #[test]
    fn map_only_touches_fulfilled() {
        let rejected: Outcome<i32> = Outcome::Rejected(Error::BadInput);
        let mapped = rejected.map(|v| v + 1);
        assert!(mapped.is_rejected());
    }
}
