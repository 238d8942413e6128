//! Process-wide registry of named caches.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::builder::CacheBuilder;
use crate::cache::{Cache, ManagedCache};
use crate::config::{CacheConfig, CacheEnvironment};
use crate::error::CacheError;
use crate::status::Status;

/// Handle type of the unsupported transaction surface. Uninhabited: no
/// transaction can ever be produced.
pub enum UserTransaction {}

/// Registry entry: the typed cache for downcast retrieval, plus a
/// type-erased lifecycle handle so untyped entries can still be stopped.
struct RegistryEntry {
    typed: Box<dyn Any + Send + Sync>,
    lifecycle: Arc<dyn ManagedCache>,
    type_id: TypeId,
    type_name: &'static str,
}

/// Registry mapping cache names to cache instances.
///
/// At most one cache is registered per name at any instant; a cache
/// that is removed or replaced is stopped exactly once. The registry
/// lock is held only for map-level swaps and never across a cache's
/// `start()`/`stop()`.
///
/// ## Example
///
/// ```rust
/// use cachet::{CacheEnvironment, CacheManager};
///
/// let manager = CacheManager::new(CacheEnvironment::default(), "app")?;
/// let users = manager.create_cache_builder::<u64, String>("users").build()?;
/// users.put(1, "ada".to_string())?;
/// assert_eq!(users.get(&1)?.expect("present").as_str(), "ada");
/// manager.shutdown();
/// # Ok::<(), cachet::CacheError>(())
/// ```
pub struct CacheManager {
    name: Arc<str>,
    env: CacheEnvironment,
    status: RwLock<Status>,
    caches: Mutex<HashMap<String, RegistryEntry>>,
}

impl CacheManager {
    /// Construct a manager in the given environment.
    ///
    /// The manager is STARTED on return; there is no caller-visible
    /// UNINITIALISED window. An empty name is a usage error.
    pub fn new(env: CacheEnvironment, name: &str) -> Result<Self, CacheError> {
        if name.is_empty() {
            return Err(CacheError::EmptyName);
        }
        info!(manager = name, "cache manager started");
        Ok(Self {
            name: name.into(),
            env,
            status: RwLock::new(Status::Started),
            caches: Mutex::new(HashMap::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> Status {
        *self.status.read()
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

    /// A fresh, independent builder for a cache named `name`.
    pub fn create_cache_builder<K, V>(&self, name: &str) -> CacheBuilder<'_, K, V>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: PartialEq + Send + Sync + 'static,
    {
        CacheBuilder::new(self, name)
    }

    /// Default configuration snapshot from this manager's environment.
    pub fn create_cache_configuration(&self) -> CacheConfig {
        self.env.default_config().clone()
    }

    /// Look up a registered cache by name.
    ///
    /// # Panics
    /// Panics if a cache is registered under `name` with different
    /// key/value types.
    pub fn get_cache<K, V>(&self, name: &str) -> Option<Arc<Cache<K, V>>>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: PartialEq + Send + Sync + 'static,
    {
        let caches = self.caches.lock();
        caches.get(name).map(|entry| {
            let expected = TypeId::of::<Cache<K, V>>();
            if entry.type_id != expected {
                panic!(
                    "cache '{}' type mismatch: expected {}, got {}",
                    name,
                    std::any::type_name::<Cache<K, V>>(),
                    entry.type_name
                );
            }
            Arc::clone(entry.typed.downcast_ref::<Arc<Cache<K, V>>>().unwrap())
        })
    }

    /// Point-in-time snapshot of all registered caches.
    pub fn caches(&self) -> Vec<Arc<dyn ManagedCache>> {
        self.caches
            .lock()
            .values()
            .map(|entry| Arc::clone(&entry.lifecycle))
            .collect()
    }

    /// Names of all registered caches, point-in-time.
    pub fn cache_names(&self) -> Vec<String> {
        self.caches.lock().keys().cloned().collect()
    }

    /// Remove and stop the cache registered under `name`; reports
    /// whether one was actually removed.
    ///
    /// The registry lock is released before the evicted cache is
    /// stopped, so a stop in progress never blocks unrelated lookups.
    pub fn remove_cache(&self, name: &str) -> Result<bool, CacheError> {
        if name.is_empty() {
            return Err(CacheError::EmptyName);
        }
        self.ensure_started()?;
        let removed = { self.caches.lock().remove(name) };
        match removed {
            Some(entry) => {
                debug!(manager = %self.name, cache = name, "cache removed");
                entry.lifecycle.stop()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Registration path used by a builder's `build()`.
    ///
    /// The swap happens under the registry lock; starting the new cache
    /// and stopping any replaced one happen after it is released. The
    /// registry therefore never has a gap for the name, and the old
    /// cache is stopped exactly once.
    pub(crate) fn register<K, V>(&self, cache: Arc<Cache<K, V>>) -> Result<(), CacheError>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: PartialEq + Send + Sync + 'static,
    {
        self.ensure_started()?;
        let name = cache.name().to_string();
        let entry = RegistryEntry {
            typed: Box::new(Arc::clone(&cache)),
            lifecycle: Arc::clone(&cache) as Arc<dyn ManagedCache>,
            type_id: TypeId::of::<Cache<K, V>>(),
            type_name: std::any::type_name::<Cache<K, V>>(),
        };
        let previous = { self.caches.lock().insert(name.clone(), entry) };
        cache.start_internal()?;
        // The new cache is already registered and started; a failing
        // stop on the replaced cache is tolerated here, as in shutdown.
        if let Some(previous) = previous
            && let Err(error) = previous.lifecycle.stop()
        {
            warn!(manager = %self.name, cache = %name, %error, "error stopping replaced cache");
        }
        debug!(manager = %self.name, cache = %name, "cache registered");
        Ok(())
    }

    /// Stop every registered cache and permanently stop the manager.
    ///
    /// The registry is drained in one critical section and the drained
    /// caches are stopped outside it. A failing stop on one cache is
    /// logged and does not prevent the rest from stopping; the manager
    /// reaches STOPPED unconditionally. A second call is a no-op.
    pub fn shutdown(&self) {
        {
            let mut status = self.status.write();
            if matches!(*status, Status::Stopping | Status::Stopped) {
                return;
            }
            *status = Status::Stopping;
        }
        let drained: Vec<(String, Arc<dyn ManagedCache>)> = {
            let mut caches = self.caches.lock();
            caches
                .drain()
                .map(|(name, entry)| (name, entry.lifecycle))
                .collect()
        };
        for (name, cache) in drained {
            if let Err(error) = cache.stop() {
                warn!(manager = %self.name, cache = %name, %error, "error stopping cache during shutdown");
            }
        }
        *self.status.write() = Status::Stopped;
        info!(manager = %self.name, "cache manager stopped");
    }

    /// Transactions are deliberately not part of this facility.
    pub fn user_transaction(&self) -> Result<UserTransaction, CacheError> {
        Err(CacheError::TransactionsUnsupported)
    }
}

impl fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let caches = self.caches.lock();
        f.debug_struct("CacheManager")
            .field("name", &self.name)
            .field("status", &self.status())
            .field("cache_count", &caches.len())
            .field("cache_names", &caches.keys().collect::<Vec<_>>())
            .finish()
    }
}

static DEFAULT_MANAGER: Lazy<CacheManager> = Lazy::new(|| {
    CacheManager::new(CacheEnvironment::default(), "default").expect("default manager name is valid")
});

/// Process-wide default manager, for callers that do not need isolated
/// managers of their own.
pub fn default_manager() -> &'static CacheManager {
    &DEFAULT_MANAGER
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    /// Route logs through the test-capture writer so the warnings from
    /// tolerated stop failures show up in test output.
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("cachet=debug"))
            .with_test_writer()
            .try_init();
    }

    fn manager() -> CacheManager {
        CacheManager::new(CacheEnvironment::default(), "test-manager").unwrap()
    }

    /// A registry occupant whose stop always fails, for exercising the
    /// tolerated-failure paths.
    struct BrokenCache {
        stop_attempts: AtomicUsize,
    }

    impl ManagedCache for BrokenCache {
        fn name(&self) -> &str {
            "broken"
        }

        fn status(&self) -> Status {
            Status::Started
        }

        fn start(&self) -> Result<(), CacheError> {
            Ok(())
        }

        fn stop(&self) -> Result<(), CacheError> {
            self.stop_attempts.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::Configuration("store already torn down".into()))
        }
    }

    fn insert_broken(manager: &CacheManager, name: &str) -> Arc<BrokenCache> {
        let broken = Arc::new(BrokenCache {
            stop_attempts: AtomicUsize::new(0),
        });
        manager.caches.lock().insert(
            name.to_string(),
            RegistryEntry {
                typed: Box::new(()),
                lifecycle: Arc::clone(&broken) as Arc<dyn ManagedCache>,
                type_id: TypeId::of::<()>(),
                type_name: "()",
            },
        );
        broken
    }

    #[test]
    fn test_new_rejects_empty_name() {
        assert!(matches!(
            CacheManager::new(CacheEnvironment::default(), ""),
            Err(CacheError::EmptyName)
        ));
    }

    #[test]
    fn test_new_manager_is_started() {
        let manager = manager();
        assert_eq!(manager.status(), Status::Started);
        assert_eq!(manager.name(), "test-manager");
    }

    #[test]
    fn test_built_cache_is_registered_and_started() {
        let manager = manager();
        manager
            .create_cache_builder::<String, String>("users")
            .build()
            .unwrap();
        let cache = manager.get_cache::<String, String>("users").unwrap();
        assert_eq!(cache.name(), "users");
        assert_eq!(cache.status(), Status::Started);
    }

    #[test]
    fn test_replacement_stops_old_cache_and_swaps_atomically() {
        let manager = manager();
        let first = manager
            .create_cache_builder::<String, String>("users")
            .build()
            .unwrap();
        let second = manager
            .create_cache_builder::<String, String>("users")
            .build()
            .unwrap();
        assert_eq!(first.status(), Status::Stopped);
        assert_eq!(second.status(), Status::Started);
        let registered = manager.get_cache::<String, String>("users").unwrap();
        assert!(Arc::ptr_eq(&registered, &second));
        assert_eq!(manager.caches().len(), 1);
    }

    #[test]
    fn test_remove_cache_missing_returns_false() {
        let manager = manager();
        assert!(!manager.remove_cache("nope").unwrap());
    }

    #[test]
    fn test_remove_cache_stops_and_unregisters() {
        let manager = manager();
        let cache = manager
            .create_cache_builder::<String, String>("users")
            .build()
            .unwrap();
        assert!(manager.remove_cache("users").unwrap());
        assert_eq!(cache.status(), Status::Stopped);
        assert!(manager.get_cache::<String, String>("users").is_none());
        assert!(manager.caches().is_empty());
    }

    #[test]
    fn test_remove_cache_rejects_empty_name() {
        let manager = manager();
        assert!(matches!(
            manager.remove_cache(""),
            Err(CacheError::EmptyName)
        ));
    }

    #[test]
    fn test_shutdown_stops_everything_and_is_terminal() {
        let manager = manager();
        let a = manager
            .create_cache_builder::<String, String>("a")
            .build()
            .unwrap();
        let b = manager
            .create_cache_builder::<u64, u64>("b")
            .build()
            .unwrap();
        manager.shutdown();
        assert_eq!(manager.status(), Status::Stopped);
        assert_eq!(a.status(), Status::Stopped);
        assert_eq!(b.status(), Status::Stopped);
        assert!(manager.caches().is_empty());
        // Terminal: a second shutdown is a no-op and building fails.
        manager.shutdown();
        assert!(matches!(
            manager.create_cache_builder::<String, String>("c").build(),
            Err(CacheError::NotStarted { .. })
        ));
        assert!(matches!(
            manager.remove_cache("a"),
            Err(CacheError::NotStarted { .. })
        ));
    }

    #[test]
    fn test_shutdown_survives_a_failing_stop() {
        init_tracing();
        let manager = manager();
        let healthy = manager
            .create_cache_builder::<String, String>("healthy")
            .build()
            .unwrap();
        let broken = insert_broken(&manager, "doomed");
        manager.shutdown();
        assert_eq!(broken.stop_attempts.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.status(), Status::Stopped);
        assert_eq!(manager.status(), Status::Stopped);
        assert!(manager.caches().is_empty());
    }

    #[test]
    fn test_replacement_tolerates_failing_stop_of_old_cache() {
        init_tracing();
        let manager = manager();
        let broken = insert_broken(&manager, "users");
        let replacement = manager
            .create_cache_builder::<String, String>("users")
            .build()
            .unwrap();
        assert_eq!(broken.stop_attempts.load(Ordering::SeqCst), 1);
        assert_eq!(replacement.status(), Status::Started);
        let registered = manager.get_cache::<String, String>("users").unwrap();
        assert!(Arc::ptr_eq(&registered, &replacement));
    }

    #[test]
    fn test_user_transaction_is_unsupported() {
        let manager = manager();
        assert!(matches!(
            manager.user_transaction(),
            Err(CacheError::TransactionsUnsupported)
        ));
    }

    #[test]
    #[should_panic(expected = "type mismatch")]
    fn test_get_cache_with_wrong_types_panics() {
        let manager = manager();
        manager
            .create_cache_builder::<String, String>("users")
            .build()
            .unwrap();
        let _ = manager.get_cache::<u64, u64>("users");
    }

    #[test]
    fn test_independent_managers_do_not_share_registries() {
        let left = CacheManager::new(CacheEnvironment::default(), "left").unwrap();
        let right = CacheManager::new(CacheEnvironment::default(), "right").unwrap();
        left.create_cache_builder::<String, String>("users")
            .build()
            .unwrap();
        assert!(right.get_cache::<String, String>("users").is_none());
    }

    #[test]
    fn test_default_manager_is_shared_and_started() {
        let manager = default_manager();
        assert_eq!(manager.name(), "default");
        assert_eq!(manager.status(), Status::Started);
    }

    #[test]
    fn test_concurrent_registration_under_distinct_names() {
        let manager = Arc::new(manager());
        let threads: Vec<_> = (0..8)
            .map(|t| {
                let manager = Arc::clone(&manager);
                thread::spawn(move || {
                    manager
                        .create_cache_builder::<u64, u64>(&format!("cache-{t}"))
                        .build()
                        .unwrap();
                })
            })
            .collect();
        for handle in threads {
            handle.join().unwrap();
        }
        assert_eq!(manager.caches().len(), 8);
        for t in 0..8 {
            let cache = manager.get_cache::<u64, u64>(&format!("cache-{t}")).unwrap();
            assert_eq!(cache.status(), Status::Started);
        }
    }

    #[test]
    fn test_concurrent_replacement_leaves_one_started_cache() {
        let manager = Arc::new(manager());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                thread::spawn(move || {
                    manager
                        .create_cache_builder::<u64, u64>("contested")
                        .build()
                        .unwrap()
                })
            })
            .collect();
        let built: Vec<_> = threads.into_iter().map(|h| h.join().unwrap()).collect();
        let winner = manager.get_cache::<u64, u64>("contested").unwrap();
        assert_eq!(winner.status(), Status::Started);
        // Every losing cache was stopped; only the registered one runs.
        let started = built
            .iter()
            .filter(|c| c.status() == Status::Started)
            .count();
        assert_eq!(started, 1);
        assert!(built.iter().any(|c| Arc::ptr_eq(c, &winner)));
    }
}
