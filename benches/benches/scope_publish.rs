// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::Cell;
use std::rc::Rc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_scope::event::{EventCatalog, EventEnvelope};
use understory_scope::feature::FeatureRegistry;
use understory_scope::registry::{Handler, Registry, Retention, SubscribeOptions};
use understory_scope::resolver::ScopeResolver;

fn counting_handlers(n: usize, hits: &Rc<Cell<u64>>) -> Vec<Rc<Handler<u64>>> {
    (0..n)
        .map(|_| {
            let hits = Rc::clone(hits);
            Handler::new(move |e: &EventEnvelope<u64>| hits.set(hits.get() + *e.value()))
        })
        .collect()
}

fn bench_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_fanout");
    for &n in &[1usize, 16, 256] {
        for retain in [Retention::Weak, Retention::Strong] {
            let hits = Rc::new(Cell::new(0));
            let handlers = counting_handlers(n, &hits);
            let registry = Registry::new("Bench");
            for h in &handlers {
                registry
                    .subscribe("tick", h, SubscribeOptions::default().retain(retain))
                    .unwrap();
            }
            let envelope = EventEnvelope::new("tick", 1_u64);
            group.throughput(Throughput::Elements(n as u64));
            group.bench_function(format!("{retain:?}_n{n}"), |b| {
                b.iter(|| {
                    registry.publish(black_box(&envelope)).unwrap();
                });
            });
            black_box(hits.get());
        }
    }
    group.finish();
}

fn bench_predicate(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_predicate");
    let hits = Rc::new(Cell::new(0));
    let handlers = counting_handlers(64, &hits);
    let registry = Registry::new("Bench");
    for (i, h) in handlers.iter().enumerate() {
        let wanted = i as u64 % 4;
        registry
            .subscribe(
                "tick",
                h,
                SubscribeOptions::<u64>::weak().predicate(move |e| *e.value() % 4 == wanted),
            )
            .unwrap();
    }
    let envelope = EventEnvelope::new("tick", 2_u64);
    group.bench_function("quarter_match_n64", |b| {
        b.iter(|| registry.publish(black_box(&envelope)).unwrap());
    });
    group.finish();
}

fn bench_prune(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_prune");
    for &n in &[16usize, 256] {
        group.bench_function(format!("half_stale_n{n}"), |b| {
            b.iter_batched(
                || {
                    let hits = Rc::new(Cell::new(0));
                    let mut handlers = counting_handlers(n, &hits);
                    let registry = Registry::new("Bench");
                    for h in &handlers {
                        registry.subscribe("tick", h, SubscribeOptions::weak()).unwrap();
                    }
                    handlers.truncate(n / 2);
                    (registry, handlers)
                },
                |(registry, handlers)| {
                    registry.publish(&EventEnvelope::new("tick", 1_u64)).unwrap();
                    black_box(registry.subscriber_count("tick"));
                    drop(handlers);
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut catalog = EventCatalog::new();
    let hovered = catalog.declare::<u64>("hovered").unwrap();
    let mut features = FeatureRegistry::new();
    for label in ["log", "stats", "a11y"] {
        let kind = hovered.clone();
        features
            .register("Tile", label, move |registry| {
                registry.subscribe_fn(&kind, |e: &EventEnvelope<u64>| {
                    black_box(e.value());
                })?;
                Ok(())
            })
            .unwrap();
    }
    let resolver = ScopeResolver::new(&features);
    let board = Registry::new("Board");
    c.bench_function("resolve_new_tile_3_features", |b| {
        b.iter(|| black_box(resolver.resolve(Some(&board), Some("Tile")).unwrap()));
    });
    c.bench_function("resolve_reuse", |b| {
        b.iter(|| black_box(resolver.resolve(Some(&board), None).unwrap()));
    });
}

criterion_group!(benches, bench_fanout, bench_predicate, bench_prune, bench_resolve);
criterion_main!(benches);
