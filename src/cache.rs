//! A named, lifecycle-managed cache wrapping a backing store.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::listener::ListenerRegistration;
use crate::loader::CacheLoader;
use crate::status::Status;
use crate::store::Store;

/// Type-erased view of a cache, used by the manager's registry to hold
/// and tear down entries of any key/value type.
pub trait ManagedCache: Send + Sync {
    fn name(&self) -> &str;

    fn status(&self) -> Status;

    /// Transition out of UNINITIALISED. Invoked by the manager's
    /// registration path; a stopped cache is never restarted.
    fn start(&self) -> Result<(), CacheError>;

    /// Release the store and drop the loader/listener references.
    /// Safe to call more than once.
    fn stop(&self) -> Result<(), CacheError>;
}

/// A single named cache: one backing store, an immutable configuration
/// snapshot, and optional loader/listener collaborators.
///
/// Caches are built exclusively through
/// [`CacheBuilder`](crate::CacheBuilder); registering with the owning
/// manager is what starts them. Every key/value operation fails with an
/// illegal-state error once the cache is no longer STARTED.
///
/// Values cross the boundary as `Arc<V>`. Under by-reference semantics
/// the returned `Arc` is the stored allocation itself; under by-value
/// semantics it is a fresh copy on every crossing.
pub struct Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: PartialEq + Send + Sync + 'static,
{
    name: Arc<str>,
    config: CacheConfig,
    status: RwLock<Status>,
    store: Box<dyn Store<K, V>>,
    loader: RwLock<Option<Arc<dyn CacheLoader<K, V>>>>,
    listeners: RwLock<Vec<ListenerRegistration<K, V>>>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: PartialEq + Send + Sync + 'static,
{
    pub(crate) fn new(
        name: impl Into<Arc<str>>,
        config: CacheConfig,
        store: Box<dyn Store<K, V>>,
        loader: Option<Arc<dyn CacheLoader<K, V>>>,
        listeners: Vec<ListenerRegistration<K, V>>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            status: RwLock::new(Status::Uninitialised),
            store,
            loader: RwLock::new(loader),
            listeners: RwLock::new(listeners),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> Status {
        *self.status.read()
    }

    /// The configuration snapshot captured when this cache was built.
    pub fn configuration(&self) -> &CacheConfig {
        &self.config
    }

    fn ensure_started(&self) -> Result<(), CacheError> {
        let status = *self.status.read();
        if status == Status::Started {
            Ok(())
        } else {
            Err(CacheError::NotStarted {
                name: self.name.to_string(),
                status,
            })
        }
    }

    pub fn contains_key(&self, key: &K) -> Result<bool, CacheError> {
        self.ensure_started()?;
        Ok(self.store.contains_key(key))
    }

    /// Look up `key`, consulting the loader on a miss when the
    /// configuration enables read-through.
    ///
    /// A loaded value is stored (the store's copy-in rules apply) and
    /// returned; a loader failure propagates as [`CacheError::Loader`].
    pub fn get(&self, key: &K) -> Result<Option<Arc<V>>, CacheError> {
        self.ensure_started()?;
        if let Some(value) = self.store.get(key) {
            return Ok(Some(value));
        }
        let loader = self.loader.read().clone();
        if self.config.read_through
            && let Some(loader) = loader
            && let Some(value) = loader.load(key).map_err(CacheError::Loader)?
        {
            let value = Arc::new(value);
            self.store.put(key.clone(), Arc::clone(&value));
            self.notify_put(key, &value);
            return Ok(Some(value));
        }
        Ok(None)
    }

    pub fn put(&self, key: K, value: impl Into<Arc<V>>) -> Result<(), CacheError> {
        self.ensure_started()?;
        let value = value.into();
        self.store.put(key.clone(), Arc::clone(&value));
        self.notify_put(&key, &value);
        Ok(())
    }

    /// Bulk insert. Interleaves arbitrarily with concurrent single-key
    /// operations on overlapping keys.
    pub fn put_all(&self, entries: impl IntoIterator<Item = (K, V)>) -> Result<(), CacheError> {
        self.ensure_started()?;
        let entries: Vec<(K, Arc<V>)> = entries
            .into_iter()
            .map(|(key, value)| (key, Arc::new(value)))
            .collect();
        self.store.put_all(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), Arc::clone(value)))
                .collect(),
        );
        for (key, value) in &entries {
            self.notify_put(key, value);
        }
        Ok(())
    }

    /// Insert only if absent; reports whether the entry was inserted.
    pub fn put_if_absent(&self, key: K, value: impl Into<Arc<V>>) -> Result<bool, CacheError> {
        self.ensure_started()?;
        let value = value.into();
        let inserted = self.store.put_if_absent(key.clone(), Arc::clone(&value));
        if inserted {
            self.notify_put(&key, &value);
        }
        Ok(inserted)
    }

    pub fn remove(&self, key: &K) -> Result<bool, CacheError> {
        self.ensure_started()?;
        let removed = self.store.remove(key);
        if removed {
            self.notify_remove(key);
        }
        Ok(removed)
    }

    pub fn get_and_remove(&self, key: &K) -> Result<Option<Arc<V>>, CacheError> {
        self.ensure_started()?;
        let removed = self.store.get_and_remove(key);
        if removed.is_some() {
            self.notify_remove(key);
        }
        Ok(removed)
    }

    /// Compare-and-swap: replace only if the current value equals `old`.
    pub fn replace_if_equals(
        &self,
        key: &K,
        old: &V,
        new: impl Into<Arc<V>>,
    ) -> Result<bool, CacheError> {
        self.ensure_started()?;
        let new = new.into();
        let replaced = self.store.replace_if_equals(key, old, Arc::clone(&new));
        if replaced {
            self.notify_put(key, &new);
        }
        Ok(replaced)
    }

    /// Replace only if an entry is currently present.
    pub fn replace(&self, key: &K, value: impl Into<Arc<V>>) -> Result<bool, CacheError> {
        self.ensure_started()?;
        let value = value.into();
        let replaced = self.store.replace(key, Arc::clone(&value));
        if replaced {
            self.notify_put(key, &value);
        }
        Ok(replaced)
    }

    pub fn get_and_replace(
        &self,
        key: &K,
        value: impl Into<Arc<V>>,
    ) -> Result<Option<Arc<V>>, CacheError> {
        self.ensure_started()?;
        let value = value.into();
        let previous = self.store.get_and_replace(key, Arc::clone(&value));
        if previous.is_some() {
            self.notify_put(key, &value);
        }
        Ok(previous)
    }

    pub fn len(&self) -> Result<usize, CacheError> {
        self.ensure_started()?;
        Ok(self.store.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        self.ensure_started()?;
        Ok(self.store.is_empty())
    }

    pub fn remove_all(&self) -> Result<(), CacheError> {
        self.ensure_started()?;
        self.store.clear();
        self.notify_remove_all();
        Ok(())
    }

    /// Point-in-time snapshot of all entries; restartable and weakly
    /// consistent with respect to later mutations.
    pub fn entries(&self) -> Result<Vec<(K, Arc<V>)>, CacheError> {
        self.ensure_started()?;
        Ok(self.store.snapshot())
    }

    /// A start in any state other than UNINITIALISED is a no-op: a
    /// cache replaced before its builder thread got here must stay
    /// stopped, never resurrect.
    pub(crate) fn start_internal(&self) -> Result<(), CacheError> {
        let mut status = self.status.write();
        if *status == Status::Uninitialised {
            *status = Status::Started;
            debug!(cache = %self.name, "cache started");
        }
        Ok(())
    }

    pub(crate) fn stop_internal(&self) -> Result<(), CacheError> {
        {
            let mut status = self.status.write();
            if matches!(*status, Status::Stopping | Status::Stopped) {
                return Ok(());
            }
            *status = Status::Stopping;
        }
        self.store.clear();
        self.loader.write().take();
        self.listeners.write().clear();
        *self.status.write() = Status::Stopped;
        debug!(cache = %self.name, "cache stopped");
        Ok(())
    }

    fn notify_put(&self, key: &K, value: &Arc<V>) {
        for registration in self.listeners.read().iter() {
            registration.listener.on_put(key, value);
        }
    }

    fn notify_remove(&self, key: &K) {
        for registration in self.listeners.read().iter() {
            registration.listener.on_remove(key);
        }
    }

    fn notify_remove_all(&self) {
        for registration in self.listeners.read().iter() {
            registration.listener.on_remove_all();
        }
    }
}

impl<K, V> ManagedCache for Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: PartialEq + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        Cache::name(self)
    }

    fn status(&self) -> Status {
        Cache::status(self)
    }

    fn start(&self) -> Result<(), CacheError> {
        self.start_internal()
    }

    fn stop(&self) -> Result<(), CacheError> {
        self.stop_internal()
    }
}

impl<K, V> fmt::Debug for Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: PartialEq + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("name", &self.name)
            .field("status", &self.status())
            .field("entries", &self.store.len())
            .finish()
    }
}
