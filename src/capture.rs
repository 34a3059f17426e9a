//! Outbound notification seam and the local capture log.
//!
//! Delivery is an opaque, fire-and-forget capability behind the [`Notifier`]
//! trait. The platform guarantees at least one sink: every submission is
//! appended to the local capture log, so a `DeliveryFailed` from the
//! notifier is recovered locally and never fatal.
//!
//! Payloads carry submission metadata only — never the credential text.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NotifyError, PlatformResult};
use crate::storage::{self, keys, Scope, StorageLedger};

/// Most-recent entries retained by the capture log.
pub const CAPTURE_LOG_CAP: usize = 100;

/// Metadata describing a credential-capture submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturePayload {
    /// Submission kind tag (e.g. `wallet_link`).
    pub kind: String,
    /// Wallet label the user selected.
    pub wallet_type: String,
    /// Which credential shape was submitted.
    pub credential_type: String,
    /// Submission time.
    pub at: DateTime<Utc>,
    /// Originating platform label.
    pub platform_label: String,
}

/// Fire-and-forget outbound delivery capability.
pub trait Notifier: Send + Sync {
    /// Attempts to deliver the payload.
    ///
    /// # Errors
    ///
    /// `NotifyError::DeliveryFailed` when the sink is unreachable; callers
    /// are expected to fall back to the local capture log.
    fn notify(&self, payload: &CapturePayload) -> Result<(), NotifyError>;
}

/// Notifier that accepts everything without delivering anywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _payload: &CapturePayload) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Notifier that always reports delivery failure. Test double for the
/// local-fallback path.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(&self, _payload: &CapturePayload) -> Result<(), NotifyError> {
        Err(NotifyError::DeliveryFailed {
            message: "notifier sink unavailable".to_string(),
        })
    }
}

/// Durable, capped audit log of capture payloads.
pub struct CaptureLog {
    ledger: Arc<dyn StorageLedger>,
}

impl CaptureLog {
    /// Creates a view over the ledger-backed log.
    #[must_use]
    pub fn new(ledger: Arc<dyn StorageLedger>) -> Self {
        Self { ledger }
    }

    /// Appends a payload, evicting the oldest entries beyond the cap.
    ///
    /// # Errors
    ///
    /// Propagates ledger backend errors.
    pub fn append(&self, payload: &CapturePayload) -> PlatformResult<()> {
        let mut entries = self.entries()?;
        entries.push(payload.clone());
        if entries.len() > CAPTURE_LOG_CAP {
            let excess = entries.len() - CAPTURE_LOG_CAP;
            entries.drain(..excess);
        }
        storage::write_json(
            self.ledger.as_ref(),
            Scope::Durable,
            keys::CAPTURE_LOG,
            &entries,
        )?;
        Ok(())
    }

    /// All retained entries, oldest first. A corrupt log reads as empty.
    ///
    /// # Errors
    ///
    /// Propagates ledger backend errors.
    pub fn entries(&self) -> PlatformResult<Vec<CapturePayload>> {
        Ok(
            storage::read_json(self.ledger.as_ref(), Scope::Durable, keys::CAPTURE_LOG)?
                .unwrap_or_default(),
        )
    }
}
