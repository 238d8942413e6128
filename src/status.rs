//! Lifecycle status shared by caches and the cache manager.

use std::fmt;

/// Lifecycle state of a cache or a cache manager.
///
/// The only legal forward path is
/// `Uninitialised -> Started -> Stopping -> Stopped`; `Stopped` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Uninitialised,
    Started,
    Stopping,
    Stopped,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Uninitialised => "UNINITIALISED",
            Status::Started => "STARTED",
            Status::Stopping => "STOPPING",
            Status::Stopped => "STOPPED",
        })
    }
}
