//! # watchtrade
//!
//! The platform core behind a simulated copy-trading site: account
//! registration and login with scoped persistence, a two-flag access gate
//! in front of the headline feature, a credential-capture pipeline with a
//! local audit log, and a timed, randomized profit/loss simulation engine.
//!
//! Everything is a plain in-process component over a pluggable
//! [`storage::StorageLedger`]; no network, no real funds, no real trades.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use watchtrade::{
//!     CredentialKind, LatencyProfile, MemoryLedger, NullNotifier, Platform,
//!     PlatformConfig, WalletKind,
//! };
//!
//! let config = PlatformConfig {
//!     latency: LatencyProfile::none(),
//!     ..PlatformConfig::default()
//! };
//! let mut platform = Platform::new(
//!     Arc::new(MemoryLedger::new()),
//!     Box::new(NullNotifier),
//!     config,
//! )
//! .unwrap();
//!
//! platform.register("Ada", "ada@example.com", "s3cretpass").unwrap();
//! let phrase = "alpha bravo charlie delta echo foxtrot golf hotel india juliet kilo lima";
//! platform
//!     .submit_credentials(WalletKind::Phantom, CredentialKind::Phrase, phrase)
//!     .unwrap();
//! assert!(!platform.gate().is_feature_unlocked()); // purchase not verified yet
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]

pub mod capture;
pub mod engine;
pub mod error;
pub mod flow;
pub mod gate;
pub mod platform;
pub mod session;
pub mod storage;
pub mod validator;

pub use capture::{CaptureLog, CapturePayload, FailingNotifier, Notifier, NullNotifier, CAPTURE_LOG_CAP};
pub use engine::{
    EngineConfig, EnginePhase, LogKind, SimulationEngine, SimulationState, TickDraw, TradeLog,
    TradeLogEntry, TradeSide, TRADE_LOG_CAP,
};
pub use error::{
    AuthError, EngineError, GateError, NotifyError, PlatformError, PlatformResult, ValidationError,
};
pub use flow::{FlowStateTracker, Milestone};
pub use gate::{AccessFlags, AccessGate, AssetKind, PurchaseRecord};
pub use platform::{
    CaptureReceipt, CredentialKind, LatencyProfile, Navigation, Platform, PlatformConfig,
    ServiceTag, VerifyPolicy, View, WalletKind,
};
pub use session::{SessionIdentity, SessionStore, UserRecord};
pub use storage::{MemoryLedger, Scope, StorageError, StorageLedger};
