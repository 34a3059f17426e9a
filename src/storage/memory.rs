//! In-memory ledger backend.
//!
//! Thread-safe reference implementation of [`StorageLedger`], intended for
//! embedded usage and tests. `end_session` models the end of a visit: the
//! ephemeral scope is dropped, the durable scope survives.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::storage::traits::{Scope, StorageError, StorageLedger};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::BackendError(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct LedgerState {
    ephemeral: HashMap<String, String>,
    durable: HashMap<String, String>,
}

impl LedgerState {
    fn map(&self, scope: Scope) -> &HashMap<String, String> {
        match scope {
            Scope::Ephemeral => &self.ephemeral,
            Scope::Durable => &self.durable,
        }
    }

    fn map_mut(&mut self, scope: Scope) -> &mut HashMap<String, String> {
        match scope {
            Scope::Ephemeral => &mut self.ephemeral,
            Scope::Durable => &mut self.durable,
        }
    }
}

/// Thread-safe in-memory two-scope ledger.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every ephemeral entry, keeping durable ones.
    ///
    /// Models a session ending (or a process restart) so tests can assert
    /// the restart-survival contract of the durable scope.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the state lock is poisoned.
    pub fn end_session(&self) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("end_session"))?;
        state.ephemeral.clear();
        Ok(())
    }

    /// Number of entries in a scope. Test/diagnostic helper.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the state lock is poisoned.
    pub fn len(&self, scope: Scope) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("len"))?;
        Ok(state.map(scope).len())
    }

    /// Returns true when the scope holds no entries.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the state lock is poisoned.
    pub fn is_empty(&self, scope: Scope) -> Result<bool, StorageError> {
        Ok(self.len(scope)? == 0)
    }
}

impl StorageLedger for MemoryLedger {
    fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("ledger.get"))?;
        Ok(state.map(scope).get(key).cloned())
    }

    fn set(&self, scope: Scope, key: &str, value: &str) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("ledger.set"))?;
        state.map_mut(scope).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, scope: Scope, key: &str) -> Result<(), StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("ledger.remove"))?;
        state.map_mut(scope).remove(key);
        Ok(())
    }
}
