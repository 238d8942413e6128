//! Cache configuration and the manager environment.

use serde::{Deserialize, Serialize};

/// Value semantics of a cache's backing store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreSemantics {
    /// Stored values are shared with callers directly. Object identity
    /// is preserved verbatim; direct aliasing is the accepted tradeoff.
    #[default]
    ByReference,
    /// Values are copied on every entry and exit, so no caller ever
    /// holds a reference that aliases a stored value.
    ByValue,
}

/// Configuration for a cache instance.
///
/// A cache captures an immutable snapshot of this at build time; later
/// changes to the value a caller kept have no effect on the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether values are stored by reference or by value.
    pub store_semantics: StoreSemantics,

    /// Whether a get miss may consult the configured loader.
    pub read_through: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            store_semantics: StoreSemantics::ByReference,
            read_through: true,
        }
    }
}

impl CacheConfig {
    /// Select store-by-value semantics (builder pattern).
    #[must_use]
    pub fn by_value(mut self) -> Self {
        self.store_semantics = StoreSemantics::ByValue;
        self
    }

    /// Select store-by-reference semantics (builder pattern).
    #[must_use]
    pub fn by_reference(mut self) -> Self {
        self.store_semantics = StoreSemantics::ByReference;
        self
    }

    /// Enable or disable read-through population on a get miss.
    #[must_use]
    pub fn read_through(mut self, enabled: bool) -> Self {
        self.read_through = enabled;
        self
    }
}

/// Execution environment a manager is constructed in.
///
/// Supplies the defaults the manager's configuration factory hands out.
/// Independent environments let multiple managers coexist without
/// sharing any state.
#[derive(Debug, Clone, Default)]
pub struct CacheEnvironment {
    default_config: CacheConfig,
}

impl CacheEnvironment {
    /// Create an environment with the given default configuration.
    pub fn new(default_config: CacheConfig) -> Self {
        Self { default_config }
    }

    /// The configuration handed out by managers in this environment.
    pub fn default_config(&self) -> &CacheConfig {
        &self.default_config
    }
}
