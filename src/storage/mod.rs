//! Two-scope key/value persistence.
//!
//! Values are structured text: every stored document is JSON. Reads of
//! malformed documents degrade to "absent" rather than failing — a corrupt
//! ledger entry must never crash the platform, and a missing expected key
//! always means the locked/default state.

pub mod memory;
pub mod traits;

pub use memory::MemoryLedger;
pub use traits::{Scope, StorageError, StorageLedger};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Well-known ledger keys.
pub mod keys {
    /// Durable user registry (JSON array of user records).
    pub const USER_REGISTRY: &str = "users";
    /// Current session identity (present in either scope).
    pub const CURRENT_SESSION: &str = "current_session";
    /// Durable remember-me preference flag ("true"/"false").
    pub const REMEMBER_ME: &str = "remember_me";
    /// Durable plaintext recovery record for autofill.
    pub const RECOVERY_RECORD: &str = "recovery_record";
    /// Identity-linked unlock flag.
    pub const IDENTITY_LINKED: &str = "wallet_linked";
    /// Value-verified unlock flag.
    pub const VALUE_VERIFIED: &str = "purchase_verified";
    /// Durable gate snapshot for remembered sessions.
    pub const GATE_SNAPSHOT: &str = "gate_remember";
    /// Active purchase record.
    pub const PURCHASE_RECORD: &str = "purchase_record";
    /// Capped capture log (most recent 100 entries).
    pub const CAPTURE_LOG: &str = "capture_log";
    /// Advisory onboarding flow state.
    pub const FLOW_STATE: &str = "flow_state";
}

/// Reads and deserializes a JSON document from the ledger.
///
/// A missing key and a corrupt document both yield `Ok(None)`: persisted
/// state that cannot be parsed is treated as absent (fail closed).
///
/// # Errors
///
/// Propagates backend errors only.
pub fn read_json<T: DeserializeOwned>(
    ledger: &dyn StorageLedger,
    scope: Scope,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = ledger.get(scope, key)? else {
        return Ok(None);
    };
    Ok(serde_json::from_str(&raw).ok())
}

/// Serializes and writes a JSON document to the ledger.
///
/// # Errors
///
/// Returns `SerializationError` if encoding fails, or the backend error.
pub fn write_json<T: Serialize>(
    ledger: &dyn StorageLedger,
    scope: Scope,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;
    ledger.set(scope, key, &raw)
}

/// Removes a key from every scope.
///
/// # Errors
///
/// Propagates backend errors.
pub fn remove_everywhere(ledger: &dyn StorageLedger, key: &str) -> Result<(), StorageError> {
    for scope in Scope::ALL {
        ledger.remove(scope, key)?;
    }
    Ok(())
}
