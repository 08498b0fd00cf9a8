//! Criterion micro-benchmarks for factory creation and instance allocation.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use husk_bench::wide_class;
use husk_core::well_known;
use husk_factory::{FactoryConfig, UninitializedFactories};
use husk_test_utils::{Fixtures, SampleClass};

fn bench_create_factory(c: &mut Criterion) {
    let fx = Fixtures::new();
    let cached = UninitializedFactories::new(Arc::clone(&fx.registry));
    let uncached =
        UninitializedFactories::with_config(Arc::clone(&fx.registry), FactoryConfig::uncached());

    c.bench_function("create_factory_cached", |b| {
        b.iter(|| cached.create_factory(black_box(Some(fx.plain_class))))
    });
    c.bench_function("create_factory_uncached", |b| {
        b.iter(|| uncached.create_factory(black_box(Some(fx.plain_class))))
    });
    c.bench_function("create_factory_rejected", |b| {
        b.iter(|| uncached.create_factory(black_box(Some(fx.list_of_canon))))
    });
    c.bench_function("create_typed_factory", |b| {
        b.iter(|| cached.create_typed_factory::<SampleClass>())
    });
}

fn bench_create_instance(c: &mut Criterion) {
    let fx = Fixtures::new();
    let wide = wide_class(&fx.registry, 64).unwrap();
    let factories = UninitializedFactories::new(Arc::clone(&fx.registry));

    let plain = factories.create_factory(Some(fx.plain_class)).unwrap();
    c.bench_function("create_instance_plain", |b| {
        b.iter(|| black_box(plain.create_instance()))
    });

    let wide = factories.create_factory(Some(wide)).unwrap();
    c.bench_function("create_instance_wide64", |b| {
        b.iter(|| black_box(wide.create_instance()))
    });

    let boxed = factories.create_factory(Some(well_known::I64)).unwrap();
    c.bench_function("create_instance_boxed_i64", |b| {
        b.iter(|| black_box(boxed.create_instance()))
    });

    let typed = factories.create_typed_factory::<SampleClass>().unwrap();
    c.bench_function("create_instance_typed_handle", |b| {
        b.iter(|| black_box(typed.create_instance()))
    });
}

criterion_group!(benches, bench_create_factory, bench_create_instance);
criterion_main!(benches);
