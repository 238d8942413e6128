//! Cachet - minimal cache management.
//!
//! A process-wide registry of named, lifecycle-managed caches, each
//! backed by a key/value store with selectable value semantics.
//!
//! ## Architecture
//!
//! - `manager` - process-wide registry mapping cache names to caches
//! - `builder` - single-use, chainable cache construction
//! - `cache` - a named cache: store + config snapshot + collaborators
//! - `store` - by-reference and by-value backing stores
//! - `config` - cache configuration and the manager environment
//! - `loader` / `listener` - externally supplied collaborator interfaces
//!
//! ## Usage
//!
//! ```rust
//! use cachet::{CacheConfig, CacheEnvironment, CacheManager};
//!
//! let manager = CacheManager::new(CacheEnvironment::default(), "app")?;
//!
//! let sessions = manager
//!     .create_cache_builder::<u64, String>("sessions")
//!     .set_cache_configuration(CacheConfig::default().read_through(false))
//!     .build()?;
//!
//! sessions.put(42, "alice".to_string())?;
//! assert!(sessions.contains_key(&42)?);
//!
//! manager.shutdown();
//! # Ok::<(), cachet::CacheError>(())
//! ```

mod builder;
mod cache;
mod config;
mod error;
mod listener;
mod loader;
mod manager;
mod status;
mod store;

pub use builder::CacheBuilder;
pub use cache::{Cache, ManagedCache};
pub use config::{CacheConfig, CacheEnvironment, StoreSemantics};
pub use error::CacheError;
pub use listener::{CacheEntryListener, ListenerRegistration, NotificationScope};
pub use loader::CacheLoader;
pub use manager::{CacheManager, UserTransaction, default_manager};
pub use status::Status;
pub use store::{ByReferenceStore, ByValueStore, CloneCopier, SerdeCopier, Store, ValueCopier};
