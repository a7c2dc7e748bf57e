// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Benchmarks for chain composition and aggregation, run with an explicit
//! `InlineDispatcher` so the numbers reflect the settlement/combinator
//! machinery itself rather than thread-pool scheduling overhead.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sealant::{when_all_fulfilled, InlineDispatcher, Promise};
use std::sync::Arc;

fn inline() -> Option<Arc<dyn sealant::Dispatcher>> {
    Some(Arc::new(InlineDispatcher))
}

fn bench_map_chain(c: &mut Criterion) {
    c.bench_function("map chain of 10", |b| {
        b.iter(|| {
            let mut p = Promise::fulfilled(0i64);
            for _ in 0..10 {
                p = p.map(inline(), |v| Ok(v + 1));
            }
            black_box(p.value())
        });
    });
}

fn bench_then_chain(c: &mut Criterion) {
    c.bench_function("then chain of 10", |b| {
        b.iter(|| {
            let mut p = Promise::fulfilled(0i64);
            for _ in 0..10 {
                p = p.then(inline(), |v| Ok(Promise::fulfilled(v + 1)));
            }
            black_box(p.value())
        });
    });
}

fn bench_when_all_fulfilled(c: &mut Criterion) {
    c.bench_function("when_all_fulfilled of 100", |b| {
        b.iter(|| {
            let promises: Vec<_> = (0..100).map(Promise::fulfilled).collect();
            black_box(when_all_fulfilled(&promises).value())
        });
    });
}

criterion_group!(
    benches,
    bench_map_chain,
    bench_then_chain,
    bench_when_all_fulfilled
);
criterion_main!(benches);
