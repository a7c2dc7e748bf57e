// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Composite aggregators over a collection of promises: `when_all_fulfilled`,
//! `when_all_resolved`, `race`, `race_fulfilled`, and their
//! bounded-concurrency iterator variants.
//!
//! Each aggregator maintains its own countdown/accumulator under a single
//! `Mutex`, settling the downstream's `Resolver` once the termination
//! condition is met. Because [`crate::cell::Cell::seal`] is idempotent,
//! concurrent settlement attempts (e.g. two arms of a race finishing at
//! once) are safe without any extra coordination.

use crate::error::Error;
use crate::outcome::Outcome;
use crate::promise::Promise;
use parking_lot::Mutex;
use std::sync::Arc;

/// `Promise<[T]>` in input order, rejecting as soon as any input rejects.
///
/// Empty input fulfills immediately with an empty vector.
pub fn when_all_fulfilled<T>(promises: &[Promise<T>]) -> Promise<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
{
    if promises.is_empty() {
        return Promise::fulfilled(Vec::new());
    }

    let (downstream, resolver) = Promise::pending();
    let resolver = Arc::new(resolver);
    let total = promises.len();
    let slots: Arc<Mutex<Vec<Option<T>>>> = Arc::new(Mutex::new(vec![None; total]));
    let remaining = Arc::new(Mutex::new(total));

    for (index, promise) in promises.iter().enumerate() {
        let slots = Arc::clone(&slots);
        let remaining = Arc::clone(&remaining);
        let resolver = Arc::clone(&resolver);

        promise.pipe(move |outcome| match outcome {
            Outcome::Rejected(e) => resolver.reject(e),
            Outcome::Fulfilled(v) => {
                let done = {
                    let mut slots = slots.lock();
                    slots[index] = Some(v);
                    let mut remaining = remaining.lock();
                    *remaining -= 1;
                    *remaining == 0
                };
                if done {
                    let values = slots
                        .lock()
                        .iter_mut()
                        .map(|slot| slot.take().expect("every slot filled when remaining hits 0"))
                        .collect();
                    resolver.fulfill(values);
                }
            }
        });
    }

    downstream
}

/// `Guarantee<[Outcome<T>]>` in input order — never rejects, regardless of
/// how many inputs reject.
pub fn when_all_resolved<T>(promises: &[Promise<T>]) -> crate::guarantee::Guarantee<Vec<Outcome<T>>>
where
    T: Clone + Send + Sync + 'static,
{
    use crate::guarantee::Guarantee;

    if promises.is_empty() {
        return Guarantee::value(Vec::new());
    }

    let (downstream, resolver) = Guarantee::pending();
    let resolver = Arc::new(resolver);
    let total = promises.len();
    let slots: Arc<Mutex<Vec<Option<Outcome<T>>>>> = Arc::new(Mutex::new(
        std::iter::repeat_with(|| None).take(total).collect(),
    ));
    let remaining = Arc::new(Mutex::new(total));

    for (index, promise) in promises.iter().enumerate() {
        let slots = Arc::clone(&slots);
        let remaining = Arc::clone(&remaining);
        let resolver = Arc::clone(&resolver);

        promise.pipe(move |outcome| {
            let done = {
                let mut slots = slots.lock();
                slots[index] = Some(outcome);
                let mut remaining = remaining.lock();
                *remaining -= 1;
                *remaining == 0
            };
            if done {
                let values = slots
                    .lock()
                    .iter_mut()
                    .map(|slot| slot.take().expect("every slot filled when remaining hits 0"))
                    .collect();
                resolver.fulfill(values);
            }
        });
    }

    downstream
}

/// First settlement (fulfillment or rejection) among `promises` wins;
/// losing arms' later settlements are no-ops by `Cell::seal` idempotence.
/// Empty input rejects with [`Error::BadInput`].
pub fn race<T>(promises: &[Promise<T>]) -> Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    if promises.is_empty() {
        return Promise::rejected(Error::BadInput);
    }

    let (downstream, resolver) = Promise::pending();
    let resolver = Arc::new(resolver);

    for promise in promises {
        let resolver = Arc::clone(&resolver);
        promise.pipe(move |outcome| resolver.resolve(outcome));
    }

    downstream
}

/// First *fulfillment* among `promises` wins; if every input rejects, the
/// downstream rejects with [`Error::NoWinner`]. Empty input rejects with
/// [`Error::BadInput`].
pub fn race_fulfilled<T>(promises: &[Promise<T>]) -> Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    if promises.is_empty() {
        return Promise::rejected(Error::BadInput);
    }

    let (downstream, resolver) = Promise::pending();
    let resolver = Arc::new(resolver);
    let total = promises.len();
    let rejections_remaining = Arc::new(Mutex::new(total));

    for promise in promises {
        let resolver = Arc::clone(&resolver);
        let rejections_remaining = Arc::clone(&rejections_remaining);

        promise.pipe(move |outcome| match outcome {
            Outcome::Fulfilled(v) => resolver.fulfill(v),
            Outcome::Rejected(_) => {
                let all_rejected = {
                    let mut remaining = rejections_remaining.lock();
                    *remaining -= 1;
                    *remaining == 0
                };
                if all_rejected {
                    resolver.reject(Error::NoWinner);
                }
            }
        });
    }

    downstream
}

/// `when_all_fulfilled` over promises produced lazily by `source`, never
/// running more than `concurrency` of them at once.
///
/// Rejects as soon as any produced promise rejects, at which point the
/// iterator is simply no longer advanced (already-started promises still
/// run to completion, but their results are discarded).
pub fn when_all_fulfilled_concurrently<T, I>(source: I, concurrency: usize) -> Promise<Vec<T>>
where
    T: Clone + Send + Sync + 'static,
    I: IntoIterator<Item = Promise<T>>,
{
    BoundedRunner::new(source, concurrency).run_collecting()
}

/// `race_fulfilled` over promises produced lazily by `source`, capping the
/// number running concurrently at `concurrency`. Stops pulling from the
/// source as soon as a fulfillment or a terminal all-rejected state is
/// reached.
pub fn race_fulfilled_concurrently<T, I>(source: I, concurrency: usize) -> Promise<T>
where
    T: Clone + Send + Sync + 'static,
    I: IntoIterator<Item = Promise<T>>,
{
    BoundedRunner::new(source, concurrency).run_racing()
}

/// Shared bounded-concurrency dequeue loop (spec §4.7, "Bounded
/// concurrency"): pulls from a lazy iterator while fewer than `concurrency`
/// promises are in flight, and re-pulls whenever one completes.
struct BoundedRunner<T, I>
where
    T: Clone + Send + Sync + 'static,
{
    state: Arc<Mutex<RunnerState<T, I>>>,
    concurrency: usize,
}

struct RunnerState<T, I> {
    source: I,
    exhausted: bool,
    running: usize,
    next_index: usize,
    slots: Vec<Option<T>>,
}

impl<T, I> BoundedRunner<T, I>
where
    T: Clone + Send + Sync + 'static,
    I: Iterator<Item = Promise<T>>,
{
    fn new(source: impl IntoIterator<Item = Promise<T>, IntoIter = I>, concurrency: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(RunnerState {
                source: source.into_iter(),
                exhausted: false,
                running: 0,
                next_index: 0,
                slots: Vec::new(),
            })),
            concurrency: concurrency.max(1),
        }
    }

    /// `when_all_fulfilled` semantics: gather every value in input order,
    /// reject as soon as any input rejects.
    fn run_collecting(self) -> Promise<Vec<T>> {
        let (downstream, resolver) = Promise::pending();
        let resolver = Arc::new(resolver);
        self.dequeue_collecting(resolver);
        downstream
    }

    fn dequeue_collecting(&self, resolver: Arc<crate::resolver::Resolver<Vec<T>>>) {
        loop {
            let next = {
                let mut state = self.state.lock();
                if state.running >= self.concurrency || state.exhausted {
                    break;
                }
                match state.source.next() {
                    Some(promise) => {
                        let index = state.next_index;
                        state.next_index += 1;
                        state.slots.push(None);
                        state.running += 1;
                        Some((index, promise))
                    }
                    None => {
                        state.exhausted = true;
                        None
                    }
                }
            };

            let Some((index, promise)) = next else { break };

            let state_ref = Arc::clone(&self.state);
            let resolver = Arc::clone(&resolver);
            let runner = BoundedRunner {
                state: Arc::clone(&self.state),
                concurrency: self.concurrency,
            };

            promise.pipe(move |outcome| match outcome {
                Outcome::Rejected(e) => resolver.reject(e),
                Outcome::Fulfilled(v) => {
                    let finished = {
                        let mut state = state_ref.lock();
                        state.slots[index] = Some(v);
                        state.running -= 1;
                        state.exhausted && state.running == 0
                    };
                    if finished {
                        let values = state_ref
                            .lock()
                            .slots
                            .iter_mut()
                            .map(|slot| slot.take().expect("filled before termination check"))
                            .collect();
                        resolver.fulfill(values);
                    } else {
                        runner.dequeue_collecting(resolver);
                    }
                }
            });
        }
    }

    /// `race_fulfilled` semantics: first fulfillment anywhere wins; if the
    /// source is exhausted and every started promise has rejected, reject
    /// with [`Error::NoWinner`].
    fn run_racing(self) -> Promise<T> {
        let (downstream, resolver) = Promise::pending();
        let resolver = Arc::new(resolver);
        self.dequeue_racing(resolver);
        downstream
    }

    fn dequeue_racing(&self, resolver: Arc<crate::resolver::Resolver<T>>) {
        loop {
            let next = {
                let mut state = self.state.lock();
                if state.running >= self.concurrency || state.exhausted {
                    break;
                }
                match state.source.next() {
                    Some(promise) => {
                        state.running += 1;
                        Some(promise)
                    }
                    None => {
                        state.exhausted = true;
                        None
                    }
                }
            };

            let Some(promise) = next else { break };

            let state_ref = Arc::clone(&self.state);
            let resolver = Arc::clone(&resolver);
            let runner = BoundedRunner {
                state: Arc::clone(&self.state),
                concurrency: self.concurrency,
            };

            promise.pipe(move |outcome| match outcome {
                Outcome::Fulfilled(v) => resolver.fulfill(v),
                Outcome::Rejected(_) => {
                    let done = {
                        let mut state = state_ref.lock();
                        state.running -= 1;
                        state.exhausted && state.running == 0
                    };
                    if done {
                        resolver.reject(Error::NoWinner);
                    } else {
                        runner.dequeue_racing(resolver);
                    }
                }
            });
        }
    }
}
