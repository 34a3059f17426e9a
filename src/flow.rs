//! Advisory onboarding flow tracker.
//!
//! An append-only record of which milestones the session has completed.
//! Duplicate insertions are no-ops and the set only grows until `reset`.
//! This is display metadata: authorization always comes from the access
//! gate, never from here.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::PlatformResult;
use crate::storage::{self, keys, Scope, StorageLedger};

/// Onboarding milestone tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    /// The credential-capture step completed.
    WalletConnected,
    /// The purchase-verification step completed.
    Verified,
    /// The gated feature was entered while unlocked.
    WatchTradeUnlocked,
}

/// Append-only milestone set for the active session.
pub struct FlowStateTracker {
    ledger: Arc<dyn StorageLedger>,
    completed: BTreeSet<Milestone>,
}

impl FlowStateTracker {
    /// Creates an empty tracker, restoring any persisted milestones.
    /// Corrupt persisted state reads as empty.
    ///
    /// # Errors
    ///
    /// Propagates ledger backend errors.
    pub fn new(ledger: Arc<dyn StorageLedger>) -> PlatformResult<Self> {
        let completed: BTreeSet<Milestone> =
            storage::read_json(ledger.as_ref(), Scope::Ephemeral, keys::FLOW_STATE)?
                .unwrap_or_default();
        Ok(Self { ledger, completed })
    }

    /// Records a milestone. Recording one already present is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates ledger backend errors.
    pub fn record(&mut self, milestone: Milestone) -> PlatformResult<()> {
        if self.completed.insert(milestone) {
            storage::write_json(
                self.ledger.as_ref(),
                Scope::Ephemeral,
                keys::FLOW_STATE,
                &self.completed,
            )?;
        }
        Ok(())
    }

    /// Whether a milestone has been recorded.
    #[must_use]
    pub fn completed(&self, milestone: Milestone) -> bool {
        self.completed.contains(&milestone)
    }

    /// All recorded milestones, in declaration order.
    #[must_use]
    pub fn milestones(&self) -> Vec<Milestone> {
        self.completed.iter().copied().collect()
    }

    /// Clears the tracker back to its initial value.
    ///
    /// # Errors
    ///
    /// Propagates ledger backend errors.
    pub fn reset(&mut self) -> PlatformResult<()> {
        self.completed.clear();
        self.ledger.remove(Scope::Ephemeral, keys::FLOW_STATE)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryLedger;

    #[test]
    fn test_record_is_monotone_and_idempotent() {
        let mut flow = FlowStateTracker::new(Arc::new(MemoryLedger::new())).unwrap();
        assert!(!flow.completed(Milestone::WalletConnected));

        flow.record(Milestone::WalletConnected).unwrap();
        flow.record(Milestone::WalletConnected).unwrap();
        flow.record(Milestone::Verified).unwrap();

        assert!(flow.completed(Milestone::WalletConnected));
        assert!(flow.completed(Milestone::Verified));
        assert_eq!(
            flow.milestones(),
            vec![Milestone::WalletConnected, Milestone::Verified]
        );
    }

    #[test]
    fn test_persists_within_session() {
        let ledger = Arc::new(MemoryLedger::new());
        let mut flow =
            FlowStateTracker::new(Arc::clone(&ledger) as Arc<dyn StorageLedger>).unwrap();
        flow.record(Milestone::WatchTradeUnlocked).unwrap();

        let reloaded = FlowStateTracker::new(ledger as Arc<dyn StorageLedger>).unwrap();
        assert!(reloaded.completed(Milestone::WatchTradeUnlocked));
    }

    #[test]
    fn test_reset() {
        let mut flow = FlowStateTracker::new(Arc::new(MemoryLedger::new())).unwrap();
        flow.record(Milestone::Verified).unwrap();
        flow.reset().unwrap();
        assert!(flow.milestones().is_empty());
    }

    #[test]
    fn test_corrupt_state_reads_as_empty() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger.set(Scope::Ephemeral, keys::FLOW_STATE, "[oops").unwrap();
        let flow = FlowStateTracker::new(ledger as Arc<dyn StorageLedger>).unwrap();
        assert!(flow.milestones().is_empty());
    }
}
