//! Key/value stores backing caches.
//!
//! Two store variants sit behind one capability interface, selected at
//! build time by the cache configuration:
//! - [`ByReferenceStore`] - values shared with callers as-is
//! - [`ByValueStore`] - values copied on every boundary crossing

mod by_reference;
mod by_value;
mod copier;

pub use by_reference::ByReferenceStore;
pub use by_value::ByValueStore;
pub use copier::{CloneCopier, SerdeCopier, ValueCopier};

use std::sync::Arc;

/// Capability interface of a cache's backing store.
///
/// Single-key operations are atomic with respect to concurrent callers
/// on the same key: no two concurrent mutations of one key can
/// interleave into a lost update. `put_all` carries no cross-key
/// atomicity, and `snapshot` is a weakly-consistent view taken at call
/// time.
pub trait Store<K, V>: Send + Sync {
    fn contains_key(&self, key: &K) -> bool;

    fn get(&self, key: &K) -> Option<Arc<V>>;

    fn put(&self, key: K, value: Arc<V>);

    fn put_all(&self, entries: Vec<(K, Arc<V>)>);

    /// Insert only if no entry exists; reports whether it was inserted.
    fn put_if_absent(&self, key: K, value: Arc<V>) -> bool;

    fn remove(&self, key: &K) -> bool;

    fn get_and_remove(&self, key: &K) -> Option<Arc<V>>;

    /// Compare-and-swap: replace only if the current value equals
    /// `old`, otherwise leave the store unmodified.
    fn replace_if_equals(&self, key: &K, old: &V, new: Arc<V>) -> bool;

    /// Replace only if an entry is currently present.
    fn replace(&self, key: &K, value: Arc<V>) -> bool;

    fn get_and_replace(&self, key: &K, value: Arc<V>) -> Option<Arc<V>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self);

    /// Point-in-time copy of all entries, restartable by iterating the
    /// returned vector again.
    fn snapshot(&self) -> Vec<(K, Arc<V>)>;
}
