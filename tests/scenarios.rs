// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Concrete end-to-end scenarios exercising chains, aggregators, and policy,
//! each run with an explicit [`InlineDispatcher`] so settlement happens
//! synchronously and deterministically within the test body.

use sealant::ops::CatchPolicy;
use sealant::{race_fulfilled, when_all_fulfilled, Error, InlineDispatcher, Promise};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

fn inline() -> Option<Arc<dyn sealant::Dispatcher>> {
    Some(Arc::new(InlineDispatcher))
}

/// Route the library's `tracing` log-sink events (PENDING_PROMISE_DEALLOCATED,
/// CAUTERIZED, ...) to stdout when these tests run with `--nocapture`, rather
/// than leaving them silently swallowed.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn s1_basic_chain() {
    init_tracing();
    let observed = Arc::new(AtomicI32::new(0));
    let observed2 = Arc::clone(&observed);

    let result = Promise::fulfilled(1)
        .map(inline(), |v| Ok(v + 1))
        .map(inline(), |v| Ok(v * 3))
        .done(inline(), move |v| {
            observed2.store(v, Ordering::SeqCst);
            Ok(())
        });

    assert_eq!(observed.load(Ordering::SeqCst), 6);
    assert_eq!(result.value(), Some(()));
}

#[test]
fn s2_error_forwarding_skips_later_maps_and_reaches_catch() {
    let second_map_ran = Arc::new(AtomicBool::new(false));
    let second_map_ran2 = Arc::clone(&second_map_ran);
    let captured = Arc::new(Mutex::new(None));
    let captured2 = Arc::clone(&captured);
    let finally_ran = Arc::new(AtomicBool::new(false));
    let finally_ran2 = Arc::clone(&finally_ran);

    let finalizer = Promise::fulfilled(1)
        .map(inline(), |_v| Err(Error::message("x")))
        .map(inline(), move |v: i32| {
            second_map_ran2.store(true, Ordering::SeqCst);
            Ok(v + 1)
        })
        .catch(inline(), None, move |e| {
            *captured2.lock().unwrap() = Some(e.to_string());
        });
    finalizer.finally(move || finally_ran2.store(true, Ordering::SeqCst));

    assert!(!second_map_ran.load(Ordering::SeqCst));
    assert_eq!(captured.lock().unwrap().as_deref(), Some("x"));
    assert!(finally_ran.load(Ordering::SeqCst));
}

#[test]
fn s3_compact_map_miss_skips_done_and_reaches_catch() {
    let observed = Arc::new(AtomicBool::new(false));
    let observed2 = Arc::clone(&observed);
    let captured = Arc::new(Mutex::new(None));
    let captured2 = Arc::clone(&captured);

    Promise::fulfilled("a")
        .compact_map(inline(), |s: &str| Ok(s.parse::<i32>().ok()))
        .done(inline(), move |_v| {
            observed2.store(true, Ordering::SeqCst);
            Ok(())
        })
        .catch(inline(), None, move |e| {
            *captured2.lock().unwrap() = Some(e);
        });

    assert!(!observed.load(Ordering::SeqCst));
    assert!(matches!(
        captured.lock().unwrap().as_ref(),
        Some(Error::CompactMapNil)
    ));
}

#[test]
fn s4_recovery() {
    let observed = Arc::new(AtomicI32::new(0));
    let observed2 = Arc::clone(&observed);

    Promise::rejected(Error::message("x"))
        .recover(inline(), None, |_e| Ok(Promise::fulfilled(42)))
        .done(inline(), move |v| {
            observed2.store(v, Ordering::SeqCst);
            Ok(())
        });

    assert_eq!(observed.load(Ordering::SeqCst), 42);
}

#[test]
fn s5_policy_skip_for_cancellation() {
    let captured = Arc::new(AtomicBool::new(false));
    let captured2 = Arc::clone(&captured);
    let done_ran = Arc::new(AtomicBool::new(false));
    let done_ran2 = Arc::clone(&done_ran);

    let finalizer = Promise::<()>::rejected(Error::Cancelled).catch(
        inline(),
        Some(CatchPolicy::AllErrorsExceptCancellation),
        move |_e| captured2.store(true, Ordering::SeqCst),
    );
    finalizer.finally(move || done_ran2.store(true, Ordering::SeqCst));

    assert!(!captured.load(Ordering::SeqCst));
    assert!(done_ran.load(Ordering::SeqCst));
}

#[test]
fn s6_when_all_fulfilled_preserves_input_order() {
    let (p0, r0) = Promise::pending();
    let (p1, r1) = Promise::pending();
    let (p2, r2) = Promise::pending();

    let all = when_all_fulfilled(&[p0, p1, p2]);

    r1.fulfill(20);
    r2.fulfill(30);
    r0.fulfill(10);

    assert_eq!(all.value(), Some(vec![10, 20, 30]));
}

#[test]
fn s7_race_fulfilled_first_fulfillment_wins() {
    let (p0, r0) = Promise::pending();
    let (p1, r1) = Promise::pending();
    let (p2, r2) = Promise::pending();

    let winner = race_fulfilled(&[p0, p1, p2]);

    r0.reject(Error::message("timeout"));
    r1.fulfill("a");
    r2.fulfill("b");

    assert_eq!(winner.value(), Some("a"));
}

#[test]
fn s7_race_fulfilled_all_reject_yields_no_winner() {
    let (p0, r0) = Promise::pending();
    let (p1, r1) = Promise::pending();
    let (p2, r2) = Promise::pending();

    let winner: Promise<&str> = race_fulfilled(&[p0, p1, p2]);

    r0.reject(Error::message("a"));
    r1.reject(Error::message("b"));
    r2.reject(Error::message("c"));

    assert!(matches!(winner.error(), Some(Error::NoWinner)));
}

#[test]
fn s8_bounded_concurrency_caps_peak_and_preserves_order() {
    use sealant::when_all_fulfilled_concurrently;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let promises = (0..5).map(|i| {
        let active = Arc::clone(&active);
        let peak = Arc::clone(&peak);
        Promise::new(move |resolver| {
            std::thread::spawn(move || {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(10));
                active.fetch_sub(1, Ordering::SeqCst);
                resolver.fulfill(i);
            });
        })
    });

    let all = when_all_fulfilled_concurrently(promises, 2);
    while all.is_pending() {
        std::thread::sleep(Duration::from_millis(2));
    }

    assert_eq!(all.value(), Some(vec![0, 1, 2, 3, 4]));
    assert!(peak.load(Ordering::SeqCst) <= 2);
}
