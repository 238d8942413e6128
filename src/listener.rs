//! Cache entry listener registration surface.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Breadth under which a registered listener receives change
/// notifications. Consumed opaquely by the dispatch collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationScope {
    Local,
    Remote,
}

/// Externally supplied observer of cache mutations.
///
/// The cache invokes these hooks after a put, after a successful
/// remove, and after a bulk clear. All hooks default to no-ops so
/// implementations override only what they need.
pub trait CacheEntryListener<K, V>: Send + Sync {
    fn on_put(&self, _key: &K, _value: &V) {}
    fn on_remove(&self, _key: &K) {}
    fn on_remove_all(&self) {}
}

/// A listener together with its delivery options.
///
/// The scope and synchronous flag are recorded for the dispatch
/// collaborator; the core invokes every registration in-line.
pub struct ListenerRegistration<K, V> {
    pub listener: Arc<dyn CacheEntryListener<K, V>>,
    pub scope: NotificationScope,
    pub synchronous: bool,
}
