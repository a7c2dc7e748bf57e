// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! [`Cell`]: the thread-safe settlement state cell backing every
//! `Promise`/`Guarantee`.
//!
//! This is the crate's name for spec's "Box" (renamed — `Box<R>` would
//! collide with `std::boxed::Box`). A `Cell<R>` is single-writer,
//! multi-reader: `seal` transitions it from pending to resolved at most
//! once; `pipe` attaches a handler that fires with the resolved value,
//! immediately if already resolved, or once settlement happens otherwise.
//!
//! Resolved values are stored behind an `Arc<R>` rather than `R` directly so
//! that every handler attached before or after settlement — and there may
//! be many, per invariant 3 — can be handed the identical value without
//! requiring `R: Clone`.

use parking_lot::Mutex;
use std::sync::Arc;

/// A handler registered via [`Cell::pipe`].
pub type Handler<R> = Box<dyn FnOnce(Arc<R>) + Send>;

enum EmptyState<R> {
    Pending(Vec<Handler<R>>),
    Resolved(Arc<R>),
}

enum Inner<R> {
    /// Immutable: constructed already resolved, needs no lock.
    Sealed(Arc<R>),
    /// Mutable: begins pending, transitions at most once.
    Empty(Mutex<EmptyState<R>>),
}

/// The settlement cell. Cheap to clone (an `Arc` bump); every clone refers
/// to the same underlying state.
pub struct Cell<R>(Arc<Inner<R>>);

impl<R> Clone for Cell<R> {
    fn clone(&self) -> Self {
        Cell(Arc::clone(&self.0))
    }
}

impl<R> Cell<R> {
    /// A cell that is already resolved. No handler registered via `pipe`
    /// ever has to wait.
    pub fn sealed(value: R) -> Self {
        Cell(Arc::new(Inner::Sealed(Arc::new(value))))
    }

    /// A cell that begins pending and is settled later via [`Cell::seal`].
    pub fn pending() -> Self {
        Cell(Arc::new(Inner::Empty(Mutex::new(EmptyState::Pending(
            Vec::new(),
        )))))
    }

    /// Non-blocking snapshot: `Some` once resolved, `None` while pending.
    pub fn snapshot(&self) -> Option<Arc<R>> {
        match &*self.0 {
            Inner::Sealed(v) => Some(Arc::clone(v)),
            Inner::Empty(state) => match &*state.lock() {
                EmptyState::Pending(_) => None,
                EmptyState::Resolved(v) => Some(Arc::clone(v)),
            },
        }
    }

    /// `true` once resolved.
    pub fn is_resolved(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Attach a handler. If already resolved, it runs immediately, on the
    /// calling thread. Otherwise it is appended to the handler list and
    /// runs, once, at the moment [`Cell::seal`] settles this cell — from
    /// whatever thread calls `seal`.
    pub fn pipe(&self, handler: Handler<R>) {
        match &*self.0 {
            Inner::Sealed(v) => handler(Arc::clone(v)),
            Inner::Empty(state) => {
                let resolved = {
                    let mut guard = state.lock();
                    match &mut *guard {
                        EmptyState::Pending(handlers) => {
                            handlers.push(handler);
                            return;
                        }
                        EmptyState::Resolved(v) => Arc::clone(v),
                    }
                };
                // Run outside the lock even on the already-resolved path,
                // so a handler that itself pipes into this same cell can't
                // deadlock against the guard above.
                handler(resolved);
            }
        }
    }

    /// Transition pending → resolved. A second `seal` on an already-resolved
    /// cell is a silent no-op: many combinators (races, `when`) rely on this
    /// to make concurrent settlement attempts safe.
    pub fn seal(&self, value: R) {
        let Inner::Empty(state) = &*self.0 else {
            // Sealed cells are resolved by construction; nothing to do.
            return;
        };

        let handlers = {
            let mut guard = state.lock();
            if matches!(&*guard, EmptyState::Resolved(_)) {
                return;
            }
            let wrapped = Arc::new(value);
            let EmptyState::Pending(handlers) =
                std::mem::replace(&mut *guard, EmptyState::Resolved(wrapped))
            else {
                unreachable!("checked Pending above");
            };
            handlers
        };

        // Fire outside the lock: a handler may settle another cell that
        // itself tries to acquire this same mutex transitively.
        let value = self.snapshot().expect("just sealed");
        for handler in handlers {
            handler(Arc::clone(&value));
        }
    }

    /// `true` if this is the sole owner of a still-pending cell — used by
    /// `Promise`/`Guarantee`/`Resolver` drop impls to detect an abandoned
    /// pending chain.
    pub fn is_abandoned_pending(&self) -> bool {
        Arc::strong_count(&self.0) == 1 && !self.is_resolved()
    }

    /// `true` if `a` and `b` are handles onto the same underlying cell.
    /// `then`/`recover` use this to detect a body returning its own
    /// downstream promise, which would deadlock forever.
    pub fn ptr_eq(a: &Cell<R>, b: &Cell<R>) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}
