//! Core trait definitions

use crate::error::WaybillResult;

/// Persistent key-value storage backing the session.
///
/// Every method is synchronous: a session write must complete without a
/// suspension point so no reader ever observes half of it. Implementations
/// must tolerate their backing store disappearing between calls, in which
/// case `read` returns `Ok(None)`.
pub trait SessionStorage: Send + Sync + std::fmt::Debug {
    /// Read the value stored under `key`
    fn read(&self, key: &str) -> WaybillResult<Option<String>>;

    /// Replace the value stored under `key` in one step
    fn write(&self, key: &str, value: &str) -> WaybillResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> WaybillResult<()>;
}
