//! Benchmarks for providers and registry reset

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use lazy_provider::Registry;
use std::hint::black_box;

#[allow(dead_code)]
#[derive(Clone)]
struct SmallService {
    value: i32,
}

#[allow(dead_code)]
#[derive(Clone)]
struct MediumService {
    name: String,
    values: Vec<i32>,
}

fn bench_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("creation");

    group.bench_function("provider", |b| {
        let registry = Registry::new();
        b.iter(|| black_box(registry.provider(|| SmallService { value: 42 })))
    });

    group.bench_function("fallible_provider", |b| {
        let registry = Registry::new();
        b.iter(|| black_box(registry.fallible_provider(|| Ok(SmallService { value: 42 }))))
    });

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");
    let registry = Registry::new();

    let cached = registry.provider(|| MediumService {
        name: "test".to_string(),
        values: vec![1, 2, 3, 4, 5],
    });
    let _ = cached.get();
    group.bench_function("cached", |b| b.iter(|| black_box(cached.get())));

    let mocked = registry.provider(|| SmallService { value: 1 });
    let _ = mocked.mock(SmallService { value: 2 });
    group.bench_function("mocked", |b| b.iter(|| black_box(mocked.get())));

    let cold = registry.provider(|| SmallService { value: 3 });
    group.bench_function("first_use", |b| {
        b.iter(|| {
            cold.reset();
            black_box(cold.get())
        })
    });

    group.finish();
}

fn bench_reset_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("reset_all");

    for count in [10usize, 100, 1000] {
        let registry = Registry::new();
        let providers: Vec<_> = (0..count)
            .map(|i| registry.provider(move || SmallService { value: i as i32 }))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                for provider in &providers {
                    let _ = provider.get();
                }
                registry.reset_all();
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_creation, bench_get, bench_reset_all);
criterion_main!(benches);
