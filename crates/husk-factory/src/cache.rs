//! Per-type factory cache.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use husk_core::TypeKey;
use tracing::trace;

use crate::factory::InstanceFactory;

/// Snapshot of cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Cached factories.
    pub entries: usize,
    /// Maximum number of cached factories.
    pub capacity: usize,
}

/// Bounded, concurrent map from type to factory.
///
/// Never evicts. When full, [`insert`](Self::insert) hands the factory
/// back without caching it.
#[derive(Debug)]
pub struct FactoryCache {
    entries: DashMap<TypeKey, InstanceFactory>,
    len: AtomicUsize,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FactoryCache {
    /// Create an empty cache holding at most `capacity` factories.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            len: AtomicUsize::new(0),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cached factory for `ty`.
    pub fn get(&self, ty: TypeKey) -> Option<InstanceFactory> {
        match self.entries.get(&ty) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(ty = %ty, "factory cache hit");
                Some(entry.value().clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Cache `factory` under its target type.
    ///
    /// If another factory for the same type is already cached, that one is
    /// returned and `factory` is discarded. Racing creators therefore all
    /// end up with the first inserted factory.
    pub fn insert(&self, factory: InstanceFactory) -> InstanceFactory {
        match self.entries.entry(factory.target_type()) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => {
                let reserved = self
                    .len
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                        (n < self.capacity).then_some(n + 1)
                    })
                    .is_ok();
                if reserved {
                    slot.insert(factory.clone());
                } else {
                    trace!(ty = %factory.target_type(), "factory cache full");
                }
                factory
            }
        }
    }

    /// Overwrite the factory cached for `factory`'s target type.
    ///
    /// Does nothing when that type is not cached, so the capacity bound
    /// is unaffected.
    pub fn replace(&self, factory: InstanceFactory) {
        if let Some(mut entry) = self.entries.get_mut(&factory.target_type()) {
            trace!(ty = %factory.target_type(), "factory cache refresh");
            *entry = factory;
        }
    }

    /// Number of cached factories.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached factories.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
            capacity: self.capacity,
        }
    }
}
