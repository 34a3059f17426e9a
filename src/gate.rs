//! Access gate: the two unlock flags and the purchase record.
//!
//! The gated feature is enabled iff both flags are true; there is no
//! partial-unlock state anywhere in this API. Flags are sticky within a
//! session, persist durably only for remembered sessions, and are reset
//! entirely on logout. Reads are fail closed: a missing or corrupt key is
//! a locked flag, never an unlocked one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PlatformResult;
use crate::storage::{self, keys, Scope, StorageLedger};

/// Asset used for the simulated purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Solana.
    Sol,
    /// USD Coin.
    Usdc,
    /// Bonk.
    Bonk,
    /// dogwifhat.
    Wif,
}

impl AssetKind {
    /// Fixed demo unit price in USD.
    #[must_use]
    pub const fn unit_price(self) -> f64 {
        match self {
            Self::Sol => 100.00,
            Self::Usdc => 1.00,
            Self::Bonk => 0.000_025_67,
            Self::Wif => 3.21,
        }
    }

    /// Upper-case ticker label.
    #[must_use]
    pub const fn ticker(self) -> &'static str {
        match self {
            Self::Sol => "SOL",
            Self::Usdc => "USDC",
            Self::Bonk => "BONK",
            Self::Wif => "WIF",
        }
    }
}

/// Immutable record of a verified purchase.
///
/// Created only by a successful verification step; a later purchase
/// supersedes (replaces) the active record, never merges with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// USD amount, at or above the verification policy minimum.
    pub amount: f64,
    /// Asset the purchase was denominated in.
    pub asset: AssetKind,
    /// When verification succeeded.
    pub verified_at: DateTime<Utc>,
    /// Display reference id.
    pub reference_id: String,
}

impl PurchaseRecord {
    /// Quantity of the asset this purchase corresponds to.
    #[must_use]
    pub fn asset_amount(&self) -> f64 {
        self.amount / self.asset.unit_price()
    }
}

/// The two independently-settable unlock flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessFlags {
    /// The credential-capture step completed.
    pub identity_linked: bool,
    /// The simulated purchase-verification step completed.
    pub value_verified: bool,
}

impl AccessFlags {
    /// Both flags set — the only unlocked state.
    #[must_use]
    pub const fn unlocked(self) -> bool {
        self.identity_linked && self.value_verified
    }
}

/// Durable snapshot written for remembered sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct GateSnapshot {
    identity_linked: bool,
    value_verified: bool,
    last_linked: DateTime<Utc>,
}

/// Owns [`AccessFlags`] and the active [`PurchaseRecord`].
pub struct AccessGate {
    ledger: Arc<dyn StorageLedger>,
    flags: AccessFlags,
    purchase: Option<PurchaseRecord>,
}

impl AccessGate {
    /// Creates a locked gate over the ledger.
    #[must_use]
    pub fn new(ledger: Arc<dyn StorageLedger>) -> Self {
        Self {
            ledger,
            flags: AccessFlags::default(),
            purchase: None,
        }
    }

    /// Restores flags and the purchase record from persisted state.
    ///
    /// A flag is set only when some scope holds the literal `"true"`;
    /// anything missing or corrupt reads as locked.
    ///
    /// # Errors
    ///
    /// Propagates ledger backend errors.
    pub fn restore(&mut self) -> PlatformResult<()> {
        self.flags = AccessFlags {
            identity_linked: self.read_flag(keys::IDENTITY_LINKED)?,
            value_verified: self.read_flag(keys::VALUE_VERIFIED)?,
        };
        self.purchase = None;
        for scope in Scope::ALL {
            if let Some(record) =
                storage::read_json(self.ledger.as_ref(), scope, keys::PURCHASE_RECORD)?
            {
                self.purchase = Some(record);
            }
        }
        Ok(())
    }

    fn read_flag(&self, key: &str) -> PlatformResult<bool> {
        for scope in Scope::ALL {
            if self.ledger.get(scope, key)?.as_deref() == Some("true") {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Scope flag writes go to: durable only when the session opted into
    /// being remembered, ephemeral for the visit otherwise.
    fn write_scope(&self) -> PlatformResult<Scope> {
        let remembered = self
            .ledger
            .get(Scope::Durable, keys::REMEMBER_ME)?
            .as_deref()
            == Some("true");
        Ok(if remembered {
            Scope::Durable
        } else {
            Scope::Ephemeral
        })
    }

    /// Marks the credential-capture step complete.
    ///
    /// # Errors
    ///
    /// Propagates ledger backend errors.
    pub fn mark_identity_linked(&mut self) -> PlatformResult<()> {
        self.flags.identity_linked = true;
        let scope = self.write_scope()?;
        self.ledger.set(scope, keys::IDENTITY_LINKED, "true")?;
        self.refresh_snapshot()
    }

    /// Marks the purchase-verification step complete, superseding any
    /// previously active record.
    ///
    /// # Errors
    ///
    /// Propagates ledger backend errors.
    pub fn mark_value_verified(&mut self, record: PurchaseRecord) -> PlatformResult<()> {
        self.flags.value_verified = true;
        let scope = self.write_scope()?;
        self.ledger.set(scope, keys::VALUE_VERIFIED, "true")?;
        storage::write_json(self.ledger.as_ref(), scope, keys::PURCHASE_RECORD, &record)?;
        self.purchase = Some(record);
        self.refresh_snapshot()
    }

    fn refresh_snapshot(&self) -> PlatformResult<()> {
        if self.write_scope()? == Scope::Durable {
            let snapshot = GateSnapshot {
                identity_linked: self.flags.identity_linked,
                value_verified: self.flags.value_verified,
                last_linked: Utc::now(),
            };
            storage::write_json(
                self.ledger.as_ref(),
                Scope::Durable,
                keys::GATE_SNAPSHOT,
                &snapshot,
            )?;
        }
        Ok(())
    }

    /// Whether the gated feature is enabled.
    ///
    /// Recomputed from the flags on every call; never cached beyond a
    /// single evaluation.
    #[must_use]
    pub fn is_feature_unlocked(&self) -> bool {
        self.flags.unlocked()
    }

    /// Current flag pair.
    #[must_use]
    pub const fn flags(&self) -> AccessFlags {
        self.flags
    }

    /// The active purchase record, if a verification succeeded.
    #[must_use]
    pub fn purchase(&self) -> Option<&PurchaseRecord> {
        self.purchase.as_ref()
    }

    /// Clears both flags, the purchase record, and every gate key in every
    /// scope. Called on logout so no unlock state leaks to the next
    /// anonymous visitor.
    ///
    /// # Errors
    ///
    /// Propagates ledger backend errors.
    pub fn reset(&mut self) -> PlatformResult<()> {
        self.flags = AccessFlags::default();
        self.purchase = None;
        let ledger = self.ledger.as_ref();
        storage::remove_everywhere(ledger, keys::IDENTITY_LINKED)?;
        storage::remove_everywhere(ledger, keys::VALUE_VERIFIED)?;
        storage::remove_everywhere(ledger, keys::PURCHASE_RECORD)?;
        ledger.remove(Scope::Durable, keys::GATE_SNAPSHOT)?;
        Ok(())
    }
}
