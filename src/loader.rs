//! Read-through loader interface.

/// Externally supplied loader consulted on a get miss when read-through
/// is enabled for the cache.
///
/// Implementations are shared, not owned: the cache holds an `Arc` and
/// drops it when stopped. The loader's lifetime, and any retry policy,
/// are the caller's responsibility.
pub trait CacheLoader<K, V>: Send + Sync {
    /// Load the value for `key`, or `None` if the backing source has no
    /// entry for it. A failure propagates to the caller of the cache
    /// operation that triggered the load.
    fn load(&self, key: &K) -> anyhow::Result<Option<V>>;
}
