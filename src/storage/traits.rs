//! Abstract key/value ledger trait.
//!
//! The ledger is the single persistence seam for every stateful component.
//! The explicit [`Scope`] parameter names the persistence tier on every
//! call, which is what makes the persistence rules testable without a host
//! environment.

use thiserror::Error;

/// Persistence tier for a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Cleared when the session ends. Does not survive a restart.
    Ephemeral,
    /// Survives process restarts.
    Durable,
}

impl Scope {
    /// All scopes, ephemeral first.
    pub const ALL: [Self; 2] = [Self::Ephemeral, Self::Durable];

    /// The other scope.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Ephemeral => Self::Durable,
            Self::Durable => Self::Ephemeral,
        }
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend error (poisoned lock, unavailable store).
    #[error("Storage backend error: {0}")]
    BackendError(String),

    /// Serialization of a value document failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Key/value persistence over two scopes.
///
/// Contract: values written to [`Scope::Durable`] remain readable after a
/// process restart; values in [`Scope::Ephemeral`] do not. There is no
/// ordering or atomicity guarantee across keys — callers must tolerate
/// partially-written state after a crash between two writes, and must treat
/// any missing expected key as the locked/default state.
pub trait StorageLedger: Send + Sync {
    /// Read a value. `Ok(None)` when the key is absent.
    fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, scope: Scope, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing an absent key is a no-op.
    fn remove(&self, scope: Scope, key: &str) -> Result<(), StorageError>;
}
