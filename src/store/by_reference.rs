//! Store-by-reference: values shared with callers verbatim.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::Store;

/// Backing store that keeps values as-is.
///
/// Callers and the store share the same `Arc` allocation, so object
/// identity is preserved across a put/get round trip. Per-key atomicity
/// comes from the concurrent map's shard locks.
pub struct ByReferenceStore<K, V> {
    map: DashMap<K, Arc<V>>,
}

impl<K, V> ByReferenceStore<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }
}

impl<K, V> Default for ByReferenceStore<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Store<K, V> for ByReferenceStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: PartialEq + Send + Sync,
{
    fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn get(&self, key: &K) -> Option<Arc<V>> {
        self.map.get(key).map(|entry| Arc::clone(entry.value()))
    }

    fn put(&self, key: K, value: Arc<V>) {
        self.map.insert(key, value);
    }

    fn put_all(&self, entries: Vec<(K, Arc<V>)>) {
        for (key, value) in entries {
            self.map.insert(key, value);
        }
    }

    fn put_if_absent(&self, key: K, value: Arc<V>) -> bool {
        match self.map.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    fn remove(&self, key: &K) -> bool {
        self.map.remove(key).is_some()
    }

    fn get_and_remove(&self, key: &K) -> Option<Arc<V>> {
        self.map.remove(key).map(|(_, value)| value)
    }

    fn replace_if_equals(&self, key: &K, old: &V, new: Arc<V>) -> bool {
        // The shard write lock spans the compare and the write.
        match self.map.get_mut(key) {
            Some(mut entry) if entry.value().as_ref() == old => {
                *entry.value_mut() = new;
                true
            }
            _ => false,
        }
    }

    fn replace(&self, key: &K, value: Arc<V>) -> bool {
        match self.map.get_mut(key) {
            Some(mut entry) => {
                *entry.value_mut() = value;
                true
            }
            None => false,
        }
    }

    fn get_and_replace(&self, key: &K, value: Arc<V>) -> Option<Arc<V>> {
        self.map
            .get_mut(key)
            .map(|mut entry| std::mem::replace(entry.value_mut(), value))
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&self) {
        self.map.clear();
    }

    fn snapshot(&self) -> Vec<(K, Arc<V>)> {
        self.map
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect()
    }
}
