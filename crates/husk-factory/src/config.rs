//! Factory configuration.

/// Configuration for [`UninitializedFactories`](crate::UninitializedFactories).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactoryConfig {
    /// Whether created factories are cached per type.
    ///
    /// Default: `true`. Caching only saves repeated classification; an
    /// uncached factory behaves identically.
    pub cache_enabled: bool,

    /// Upper bound on cached factories.
    ///
    /// Default: 4096. Once reached, new factories are still returned but
    /// not cached. Entries are never evicted.
    pub max_cached_factories: usize,
}

impl FactoryConfig {
    /// Default cache capacity.
    pub const DEFAULT_MAX_CACHED_FACTORIES: usize = 4096;

    /// Caching enabled with the default capacity.
    pub fn new() -> Self {
        Self {
            cache_enabled: true,
            max_cached_factories: Self::DEFAULT_MAX_CACHED_FACTORIES,
        }
    }

    /// Caching disabled.
    pub fn uncached() -> Self {
        Self {
            cache_enabled: false,
            ..Self::new()
        }
    }

    /// Set the cache capacity.
    pub fn with_max_cached_factories(mut self, max: usize) -> Self {
        self.max_cached_factories = max;
        self
    }
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self::new()
    }
}
