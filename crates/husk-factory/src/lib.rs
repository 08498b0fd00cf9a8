//! Constructor-free instance factories.
//!
//! [`UninitializedFactories`] turns a type key into an [`InstanceFactory`]:
//! it classifies the type through the oracle, picks an [`AllocStrategy`]
//! and binds an allocation routine that hands out zeroed instances without
//! running any constructor.
//!
//! Two entry points share one creation path:
//!
//! - [`create_factory`](UninitializedFactories::create_factory) takes a
//!   [`TypeKey`] and produces erased [`Instance`]s.
//! - [`create_typed_factory`](UninitializedFactories::create_typed_factory)
//!   takes a [`Managed`] Rust type and produces [`Handle<T>`], `T`, or
//!   `T::default()` depending on its storage class.
//!
//! # Unsafe code
//!
//! Confined to the `raw` module.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod cache;
pub mod config;
pub mod factory;
pub mod instance;
pub mod raw;
pub mod strategy;

pub use cache::{CacheStats, FactoryCache};
pub use config::FactoryConfig;
pub use factory::{InstanceFactory, StorageAdapter, TypedFactory};
pub use instance::Instance;
pub use raw::{Handle, RawAllocator, RawObject, SystemAllocator, SYSTEM};
pub use strategy::AllocStrategy;

use std::alloc::Layout;
use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

use husk_core::{
    FactoryError, IneligibleReason, Managed, StorageClass, TypeKey, TypeMetadataOracle,
};
use husk_eligibility::{classify, EligibilityVerdict};
use tracing::debug;

/// Entry point: creates factories for types described by an oracle.
///
/// Safe to share across threads. Factories are cached per type unless
/// [`FactoryConfig::cache_enabled`] is off.
pub struct UninitializedFactories<O: ?Sized> {
    allocator: &'static dyn RawAllocator,
    cache: Option<FactoryCache>,
    oracle: Arc<O>,
}

impl<O: TypeMetadataOracle + ?Sized> UninitializedFactories<O> {
    /// Factories over `oracle` with the default configuration and the
    /// system allocator.
    pub fn new(oracle: Arc<O>) -> Self {
        Self::with_config(oracle, FactoryConfig::default())
    }

    /// Factories over `oracle` with an explicit configuration.
    pub fn with_config(oracle: Arc<O>, config: FactoryConfig) -> Self {
        Self {
            allocator: &SYSTEM,
            cache: config
                .cache_enabled
                .then(|| FactoryCache::new(config.max_cached_factories)),
            oracle,
        }
    }

    /// Allocate instance storage from `allocator` instead of the global
    /// allocator.
    pub fn with_allocator(mut self, allocator: &'static dyn RawAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    /// The oracle types are classified against.
    pub fn oracle(&self) -> &Arc<O> {
        &self.oracle
    }

    /// Cache counters; all zero when caching is disabled.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.as_ref().map(FactoryCache::stats).unwrap_or_default()
    }

    /// Create a factory for `ty`.
    ///
    /// Fails only when the type is not eligible for constructor-free
    /// allocation (including when no type is given). The returned
    /// factory's [`target_type`](InstanceFactory::target_type) is `ty`.
    pub fn create_factory(&self, ty: Option<TypeKey>) -> Result<InstanceFactory, FactoryError> {
        if let (Some(key), Some(cache)) = (ty, &self.cache) {
            if let Some(factory) = cache.get(key) {
                return Ok(factory);
            }
        }

        let ty = match (ty, classify(&*self.oracle, ty)) {
            (Some(key), EligibilityVerdict::Accepted) => key,
            (ty, verdict) => {
                let err = FactoryError::Ineligible {
                    ty,
                    reason: verdict.reason().unwrap_or(IneligibleReason::NullType),
                };
                debug!(%err, "factory rejected");
                return Err(err);
            }
        };

        let factory = self.build(ty);
        Ok(match &self.cache {
            Some(cache) => cache.insert(factory),
            None => factory,
        })
    }

    fn build(&self, ty: TypeKey) -> InstanceFactory {
        let strategy = AllocStrategy::select(&*self.oracle, ty);
        let binding = self
            .oracle
            .rust_binding(ty)
            .filter(|b| b.storage() == strategy.storage());
        // A bound Rust type dictates the layout its instances live in.
        let layout = binding
            .map(|b| b.layout())
            .or_else(|| self.oracle.resolve_layout(ty))
            .unwrap_or_else(|| {
                debug!(ty = %ty, "accepted type has no layout; using empty storage");
                Layout::new::<()>()
            });
        debug!(
            ty = %ty,
            name = self.oracle.type_name(ty).as_deref().unwrap_or("?"),
            %strategy,
            size = layout.size(),
            rust = binding.map(|b| b.type_name()),
            "created factory"
        );
        InstanceFactory::new(ty, strategy, layout, binding, self.allocator)
    }

    /// Create a typed factory for the Rust type `T`.
    ///
    /// `T` is resolved to its registered key through the oracle and then
    /// goes through [`create_factory`](Self::create_factory). Fails with
    /// [`FactoryError::Unbound`] when `T` has no binding, and with
    /// [`FactoryError::StorageMismatch`] when the oracle's storage shape
    /// for the key disagrees with `T`'s storage class.
    pub fn create_typed_factory<T: Managed>(&self) -> Result<TypedFactory<T>, FactoryError> {
        let unbound = || FactoryError::Unbound {
            type_name: type_name::<T>(),
        };
        let ty = self
            .oracle
            .lookup_rust(TypeId::of::<T>())
            .ok_or_else(unbound)?;
        let mut erased = self.create_factory(Some(ty))?;
        let bound_now = self.oracle.rust_binding(ty).is_some_and(|b| b.is::<T>());
        if bound_now && !erased.binding().is_some_and(|b| b.is::<T>()) {
            // The key was bound after this factory was cached.
            erased = self.build(ty);
            if let Some(cache) = &self.cache {
                cache.replace(erased.clone());
            }
        }

        let expected = <T::Storage as StorageClass>::KIND;
        let found = erased.strategy().storage();
        if expected != found {
            debug!(ty = %ty, %expected, %found, "typed factory storage mismatch");
            return Err(FactoryError::StorageMismatch {
                ty,
                expected,
                found,
            });
        }
        if !erased.binding().is_some_and(|b| b.is::<T>()) {
            return Err(unbound());
        }
        Ok(TypedFactory::new(erased))
    }
}

impl<O: ?Sized> fmt::Debug for UninitializedFactories<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UninitializedFactories")
            .field("cache", &self.cache.as_ref().map(FactoryCache::stats))
            .finish_non_exhaustive()
    }
}
