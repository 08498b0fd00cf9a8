//! Factory caching and concurrent use.

use std::alloc::Layout;
use std::sync::Arc;

use husk_core::{well_known, ByValue, Managed, TypeKey};
use husk_factory::{FactoryConfig, Instance, InstanceFactory, UninitializedFactories};
use husk_test_utils::{Fixtures, MockOracle, MockType};
use husk_types::{TypeDef, TypeRegistry};

#[test]
fn cache_hit_skips_classification() {
    let mut oracle = MockOracle::new();
    oracle.insert(TypeKey(1), MockType::class("Widget", Layout::new::<u64>()));
    let oracle = Arc::new(oracle);
    let factories = UninitializedFactories::new(Arc::clone(&oracle));

    let first = factories.create_factory(Some(TypeKey(1))).unwrap();
    let lookups = oracle.lookups();
    let second = factories.create_factory(Some(TypeKey(1))).unwrap();

    assert_eq!(oracle.lookups(), lookups);
    assert!(first.ptr_eq(&second));
    let stats = factories.cache_stats();
    assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Money {
    cents: i64,
}

// SAFETY: a zeroed `i64` is valid.
unsafe impl Managed for Money {
    type Storage = ByValue;
}

#[test]
fn typed_factory_sees_binding_added_after_caching() {
    let registry = Arc::new(TypeRegistry::new());
    let money = registry.register::<Money>(TypeDef::value("Money")).unwrap();
    let key = registry.instantiate(well_known::NULLABLE, &[money]).unwrap();
    let factories = UninitializedFactories::new(Arc::clone(&registry));

    let stale = factories.create_factory(Some(key)).unwrap();
    assert!(stale.binding().is_none());

    registry.bind_nullable::<Money>().unwrap();
    let typed = factories.create_typed_factory::<Option<Money>>().unwrap();
    assert_eq!(typed.target_type(), key);
    assert_eq!(typed.create_instance(), None);

    let refreshed = factories.create_factory(Some(key)).unwrap();
    assert!(refreshed.binding().is_some_and(|b| b.is::<Option<Money>>()));
    assert_eq!(factories.cache_stats().entries, 1);
    assert_eq!(
        factories.create_typed_factory::<Money>().unwrap().create_instance(),
        Money { cents: 0 }
    );
}

#[test]
fn capacity_bounds_the_cache() {
    let fx = Fixtures::new();
    let factories = UninitializedFactories::with_config(
        Arc::clone(&fx.registry),
        FactoryConfig::new().with_max_cached_factories(2),
    );
    for (_, ty) in fx.accepted() {
        factories.create_factory(Some(ty)).unwrap();
    }
    assert_eq!(factories.cache_stats().entries, 2);
    assert_eq!(factories.cache_stats().capacity, 2);

    // Uncached types still get working factories.
    let (_, last) = *fx.accepted().last().unwrap();
    let factory = factories.create_factory(Some(last)).unwrap();
    assert_eq!(factory.target_type(), last);
    assert_eq!(factory.create_instance().runtime_type(), Some(last));
}

#[test]
fn concurrent_creation_converges_on_one_factory() {
    let fx = Fixtures::new();
    let factories = UninitializedFactories::new(Arc::clone(&fx.registry));
    let created: Vec<InstanceFactory> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| factories.create_factory(Some(fx.plain_class)).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    let cached = factories.create_factory(Some(fx.plain_class)).unwrap();
    // Racers that lost the insert still return the winner.
    assert!(created.iter().all(|f| f.ptr_eq(&cached)));
}

#[test]
fn concurrent_allocation_yields_distinct_instances() {
    let fx = Fixtures::new();
    let factories = UninitializedFactories::new(Arc::clone(&fx.registry));
    let factory = factories.create_factory(Some(fx.linked_node)).unwrap();

    let instances: Vec<Instance> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let factory = factory.clone();
                s.spawn(move || {
                    let instances: Vec<_> = (0..64).map(|_| factory.create_instance()).collect();
                    assert!(instances.iter().all(|i| i.as_raw().unwrap().is_zeroed()));
                    instances
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });
    // All instances are still alive, so no address can have been reused.
    let addresses: Vec<usize> = instances
        .iter()
        .map(|i| i.as_raw().unwrap().as_ptr() as usize)
        .collect();
    let mut unique = addresses.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), addresses.len());
}

#[test]
fn registry_grows_while_factories_are_in_use() {
    let fx = Fixtures::new();
    let factories = UninitializedFactories::new(Arc::clone(&fx.registry));
    std::thread::scope(|s| {
        s.spawn(|| {
            for i in 0..32 {
                fx.registry
                    .define(
                        husk_types::TypeDef::class(format!("Late{i}"))
                            .with_field("v", husk_types::FieldType::Of(well_known::U16)),
                    )
                    .unwrap();
            }
        });
        s.spawn(|| {
            for _ in 0..32 {
                let f = factories.create_factory(Some(fx.plain_class)).unwrap();
                assert!(f.create_instance().as_raw().unwrap().is_zeroed());
            }
        });
    });
    let late = fx.registry.lookup("Late31").unwrap();
    assert!(factories.create_factory(Some(late)).is_ok());
}
