//! Error types for cache and manager operations.

use thiserror::Error;

use crate::status::Status;

/// Errors surfaced by the cache manager, the builder and individual
/// caches.
///
/// Usage errors (empty names, incomplete configuration) are reported
/// immediately, never tolerated silently. Collaborator failures from a
/// loader are wrapped in [`CacheError::Loader`] and carry the original
/// error as their source.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A manager or cache name was empty.
    #[error("name must not be empty")]
    EmptyName,

    /// An operation was attempted outside the STARTED window.
    #[error("'{name}' is {status}, expected STARTED")]
    NotStarted { name: String, status: Status },

    /// Invalid or incomplete build-time configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Transactions are deliberately not part of this facility.
    #[error("user transactions are not supported")]
    TransactionsUnsupported,

    /// A cache loader failed while populating a missing entry.
    #[error("cache loader failed")]
    Loader(#[source] anyhow::Error),
}
