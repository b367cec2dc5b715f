// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::rc::Rc;

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Rect;
use understory_container::container::Container;
use understory_container::policy::PostTransitionPolicy;
use understory_container::registry::{ChildRegistry, InsertionPolicy, TraversalDirection};
use understory_container::types::{Child, ChildId, Screen};

struct Blank;

impl Screen for Blank {
    fn begin_appearance_transition(&self, _appearing: bool, _animated: bool) {}
    fn end_appearance_transition(&self) {}
}

fn gen_children(n: usize) -> Vec<Child<Blank>> {
    let screen = Rc::new(Blank);
    (0..n)
        .map(|i| Child::new(ChildId::from(format!("child-{i:05}")), Rc::clone(&screen)))
        .collect()
}

// Reversed so sorted insertion does real work.
fn gen_children_rev(n: usize) -> Vec<Child<Blank>> {
    let mut out = gen_children(n);
    out.reverse();
    out
}

fn bench_registry_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_insert");
    let policies: [(&str, fn() -> InsertionPolicy<Blank>); 3] = [
        ("prepend", || InsertionPolicy::Prepend),
        ("prepend_unique", || InsertionPolicy::PrependUnique),
        ("sorted_by_id", || InsertionPolicy::sorted(|a, b| a.id().cmp(b.id()))),
    ];
    for &n in &[16usize, 128, 512] {
        let children = gen_children_rev(n);
        group.throughput(Throughput::Elements(n as u64));
        for (name, policy) in &policies {
            group.bench_function(format!("{name}_n{n}"), |b| {
                b.iter_batched(
                    || ChildRegistry::with_policy(Vec::new(), policy()),
                    |mut registry| {
                        for child in &children {
                            registry.insert(child.clone());
                        }
                        black_box(registry.len());
                    },
                    BatchSize::SmallInput,
                )
            });
        }
    }
    group.finish();
}

fn bench_registry_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_lookup");
    for &n in &[16usize, 128, 512] {
        let registry = ChildRegistry::new(gen_children(n));
        let last = ChildId::from(format!("child-{:05}", n - 1));
        group.bench_function(format!("find_last_n{n}"), |b| {
            b.iter(|| black_box(registry.find(black_box(&last)).is_some()))
        });
        group.bench_function(format!("walk_following_n{n}"), |b| {
            b.iter(|| {
                let mut steps = 0_usize;
                let mut at = registry.first();
                while let Some(child) = at {
                    at = registry.neighbor(TraversalDirection::Following, child);
                    steps += 1;
                }
                black_box(steps)
            })
        });
    }
    group.finish();
}

fn bench_transitions(c: &mut Criterion) {
    let mut group = c.benchmark_group("transitions");
    let bounds = Rect::new(0.0, 0.0, 1024.0, 768.0);
    for &n in &[8usize, 64] {
        let children = gen_children(n);
        let ids: Vec<ChildId> = children.iter().map(|c| c.id().clone()).collect();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("cycle_default_animator_n{n}"), |b| {
            b.iter_batched(
                || {
                    let container = Container::with_children(children.clone());
                    container.surface_ready(bounds);
                    container
                },
                |container| {
                    for id in ids.iter().rev() {
                        container.transition_to_id(id, None);
                    }
                    black_box(container.visible_child().is_some());
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("evict_non_visible_n{n}"), |b| {
            b.iter_batched(
                || {
                    let container = Container::with_children(children.clone());
                    container.surface_ready(bounds);
                    let evict = PostTransitionPolicy::remove_all_non_visible();
                    container.set_post_transition_policy(evict);
                    container
                },
                |container| {
                    for child in children.iter().rev() {
                        container.transition_to(child.clone(), None);
                    }
                    black_box(container.registry().len());
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_registry_insert,
    bench_registry_lookup,
    bench_transitions,
);
criterion_main!(benches);
