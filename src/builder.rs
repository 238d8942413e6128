//! Fluent, single-use cache construction.

use std::hash::Hash;
use std::sync::Arc;

use crate::cache::Cache;
use crate::config::{CacheConfig, StoreSemantics};
use crate::error::CacheError;
use crate::listener::{CacheEntryListener, ListenerRegistration, NotificationScope};
use crate::loader::CacheLoader;
use crate::manager::CacheManager;
use crate::store::{ByReferenceStore, ByValueStore, Store, ValueCopier};

/// Accumulates configuration for a new cache, then materializes it and
/// registers it with the owning manager.
///
/// Every setter consumes and returns the builder, and [`build`] consumes
/// it outright, so a builder can neither be reconfigured after building
/// nor built twice. Repeated setter calls are last-write-wins.
///
/// [`build`]: CacheBuilder::build
pub struct CacheBuilder<'m, K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: PartialEq + Send + Sync + 'static,
{
    manager: &'m CacheManager,
    name: String,
    config: Option<CacheConfig>,
    loader: Option<Arc<dyn CacheLoader<K, V>>>,
    copier: Option<Arc<dyn ValueCopier<V>>>,
    listeners: Vec<ListenerRegistration<K, V>>,
}

impl<'m, K, V> CacheBuilder<'m, K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: PartialEq + Send + Sync + 'static,
{
    pub(crate) fn new(manager: &'m CacheManager, name: &str) -> Self {
        Self {
            manager,
            name: name.to_string(),
            config: None,
            loader: None,
            copier: None,
            listeners: Vec::new(),
        }
    }

    /// Set the configuration snapshot for the cache. Without one, the
    /// manager's default configuration is used.
    #[must_use]
    pub fn set_cache_configuration(mut self, config: CacheConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Attach a loader for read-through population.
    #[must_use]
    pub fn set_cache_loader(mut self, loader: Arc<dyn CacheLoader<K, V>>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the copy strategy for store-by-value mode. Required when the
    /// configuration selects by-value semantics.
    #[must_use]
    pub fn set_value_copier(mut self, copier: Arc<dyn ValueCopier<V>>) -> Self {
        self.copier = Some(copier);
        self
    }

    /// Register a listener along with its delivery options.
    #[must_use]
    pub fn register_cache_entry_listener(
        mut self,
        listener: Arc<dyn CacheEntryListener<K, V>>,
        scope: NotificationScope,
        synchronous: bool,
    ) -> Self {
        self.listeners.push(ListenerRegistration {
            listener,
            scope,
            synchronous,
        });
        self
    }

    /// Materialize the cache and register it with the owning manager.
    ///
    /// The manager starts the new cache; any cache previously registered
    /// under the same name is replaced and stopped. Fails if the name is
    /// empty, if by-value semantics were selected without a copier, or
    /// if the manager is no longer started.
    pub fn build(self) -> Result<Arc<Cache<K, V>>, CacheError> {
        if self.name.is_empty() {
            return Err(CacheError::EmptyName);
        }
        let config = self
            .config
            .unwrap_or_else(|| self.manager.create_cache_configuration());
        let store: Box<dyn Store<K, V>> = match config.store_semantics {
            StoreSemantics::ByReference => Box::new(ByReferenceStore::new()),
            StoreSemantics::ByValue => {
                let copier = self.copier.ok_or_else(|| {
                    CacheError::Configuration("store-by-value requires a value copier".into())
                })?;
                Box::new(ByValueStore::new(copier))
            }
        };
        let cache = Arc::new(Cache::new(
            self.name.as_str(),
            config,
            store,
            self.loader,
            self.listeners,
        ));
        self.manager.register(Arc::clone(&cache))?;
        Ok(cache)
    }
}
