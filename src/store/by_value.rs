//! Store-by-value: values copied on every boundary crossing.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{Store, ValueCopier};

/// Backing store that isolates callers from stored values.
///
/// Every put copies the value on the way in and every get copies it on
/// the way out, through the configured [`ValueCopier`], so no two
/// external handles ever alias a stored value. Operations that remove
/// an entry hand back the store's own copy: nothing else holds it once
/// it leaves the map.
pub struct ByValueStore<K, V> {
    map: DashMap<K, Arc<V>>,
    copier: Arc<dyn ValueCopier<V>>,
}

impl<K, V> ByValueStore<K, V>
where
    K: Eq + Hash,
{
    pub fn new(copier: Arc<dyn ValueCopier<V>>) -> Self {
        Self {
            map: DashMap::new(),
            copier,
        }
    }

    fn copy_in(&self, value: &V) -> Arc<V> {
        Arc::new(self.copier.copy(value))
    }
}

impl<K, V> Store<K, V> for ByValueStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: PartialEq + Send + Sync,
{
    fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn get(&self, key: &K) -> Option<Arc<V>> {
        self.map
            .get(key)
            .map(|entry| Arc::new(self.copier.copy(entry.value())))
    }

    fn put(&self, key: K, value: Arc<V>) {
        self.map.insert(key, self.copy_in(&value));
    }

    fn put_all(&self, entries: Vec<(K, Arc<V>)>) {
        for (key, value) in entries {
            self.map.insert(key, self.copy_in(&value));
        }
    }

    fn put_if_absent(&self, key: K, value: Arc<V>) -> bool {
        match self.map.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(self.copy_in(&value));
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
        match self.map.get_mut(key) {
            Some(mut entry) if entry.value().as_ref() == old => {
                *entry.value_mut() = self.copy_in(&new);
                true
            }
            _ => false,
        }
    }

    fn replace(&self, key: &K, value: Arc<V>) -> bool {
        match self.map.get_mut(key) {
            Some(mut entry) => {
                *entry.value_mut() = self.copy_in(&value);
                true
            }
            None => false,
        }
    }

    fn get_and_replace(&self, key: &K, value: Arc<V>) -> Option<Arc<V>> {
        self.map
            .get_mut(key)
            .map(|mut entry| std::mem::replace(entry.value_mut(), self.copy_in(&value)))
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
            .map(|entry| {
                (
                    entry.key().clone(),
                    Arc::new(self.copier.copy(entry.value())),
                )
            })
            .collect()
    }
}
