//! Pluggable value-copy strategies for store-by-value mode.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Strategy a by-value store uses to copy values across the cache
/// boundary. Implementations must produce a value sharing no interior
/// state with the original.
pub trait ValueCopier<V>: Send + Sync {
    fn copy(&self, value: &V) -> V;
}

/// Copies via `Clone`. Correct whenever the value's `Clone` is a deep
/// copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct CloneCopier;

impl<V: Clone> ValueCopier<V> for CloneCopier {
    fn copy(&self, value: &V) -> V {
        value.clone()
    }
}

/// Copies via a serde_json round trip. Guarantees a deep copy for any
/// serializable value, at the cost of serialization overhead.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeCopier;

impl<V> ValueCopier<V> for SerdeCopier
where
    V: Serialize + DeserializeOwned,
{
    /// # Panics
    /// Panics if the value fails to serialize or deserialize; a value
    /// stored by a by-value cache must round-trip cleanly.
    fn copy(&self, value: &V) -> V {
        let bytes = serde_json::to_vec(value).expect("value failed to serialize for copy");
        serde_json::from_slice(&bytes).expect("value failed to deserialize for copy")
    }
}
