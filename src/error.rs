//! Error types for watchtrade.
//!
//! All errors are strongly typed using thiserror. This enables pattern
//! matching on specific failure conditions and keeps user-facing messaging
//! at the caller's boundary: `register`, `login`, and the gated operations
//! return tagged results and never panic past their own layer.

use thiserror::Error;

use crate::storage::StorageError;

/// Validation errors raised during input validation.
///
/// These are always recoverable: the caller re-prompts with a corrected
/// value and no state has been mutated.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Display name was blank or whitespace.
    #[error("Display name cannot be empty")]
    EmptyDisplayName,

    /// Email did not match the accepted shape.
    #[error("Invalid email format: {email}")]
    InvalidEmail {
        /// The rejected input.
        email: String,
    },

    /// Password shorter than the minimum length.
    #[error("Password must be at least {min} characters")]
    PasswordTooShort {
        /// The enforced minimum.
        min: usize,
    },

    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Pass phrase was not exactly 12 alphabetic words.
    #[error("Invalid pass phrase: expected exactly 12 alphabetic words")]
    InvalidPhrase,

    /// Private key was not 64 hex characters.
    #[error("Invalid private key: expected 64 hex characters")]
    InvalidPrivateKey,

    /// Amount below the verification policy minimum.
    #[error("Amount {actual} is below the minimum of {minimum}")]
    AmountBelowMinimum {
        /// The policy minimum.
        minimum: f64,
        /// The rejected amount.
        actual: f64,
    },

    /// An engine config field failed range validation.
    #[error("Engine config field '{field}' is out of range: {value}")]
    ConfigOutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
}

/// Authentication failures from the session store.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Registration attempted with an email already in the registry.
    #[error("Email already registered: {email}")]
    DuplicateEmail {
        /// The duplicate email (case-folded).
        email: String,
    },

    /// Unknown email or wrong password. Deliberately indistinct.
    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// Access-gate failures.
#[derive(Debug, Error)]
pub enum GateError {
    /// The gated feature was invoked while one or both unlock flags are unset.
    #[error("Feature is locked: connect a wallet and verify a purchase first")]
    FeatureLocked,

    /// The simulated payment verification drew a refusal.
    #[error("Payment verification failed")]
    VerificationRefused,
}

/// Simulation engine failures.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `stop` was called from a phase other than `Running`.
    #[error("Simulation is not running")]
    NotRunning,
}

/// Outbound notification failures.
///
/// Never fatal: the platform recovers by appending the payload to the local
/// capture log.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The delivery sink rejected or never received the payload.
    #[error("Notification delivery failed: {message}")]
    DeliveryFailed {
        /// Sink-provided failure detail.
        message: String,
    },
}

/// Top-level error type for watchtrade.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Input validation failure.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Authentication failure.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Access-gate failure.
    #[error("Gate error: {0}")]
    Gate(#[from] GateError),

    /// Simulation engine failure.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Outbound notification failure.
    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),

    /// Ledger backend failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invariant violation that should not occur in normal operation.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the violated invariant.
        message: String,
    },
}

impl PlatformError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an authentication error.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Returns true if the gated feature rejected the operation.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        matches!(self, Self::Gate(GateError::FeatureLocked))
    }

    /// Returns true if this error leaves the platform in a recoverable
    /// state that only needs a corrected retry from the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Auth(_) | Self::Gate(_) | Self::Notify(_) => true,
            Self::Engine(EngineError::NotRunning) => true,
            Self::Storage(_) | Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for watchtrade operations.
pub type PlatformResult<T> = Result<T, PlatformError>;
