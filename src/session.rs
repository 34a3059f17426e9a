//! Session store: user registry and the logged-in identity.
//!
//! The registry is a durable JSON document owned exclusively by this module.
//! The current session is a redacted projection of a user record — it never
//! carries the credential hash — and lives in the ephemeral scope unless the
//! user opted into being remembered.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, PlatformResult, ValidationError};
use crate::storage::{self, keys, Scope, StorageLedger};
use crate::validator;

/// A registered user. Mutated only on registration and login
/// (remember-preference update); never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Stable user id.
    pub id: Uuid,
    /// Display name as entered at registration.
    pub display_name: String,
    /// Case-folded email; unique across the registry.
    pub email: String,
    /// One-way blake3 digest of the credential.
    pub credential_hash: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Whether the last login asked to be remembered.
    pub remember_me: bool,
}

/// Redacted projection of a [`UserRecord`] held as the current session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionIdentity {
    /// Stable user id.
    pub id: Uuid,
    /// Display name.
    pub display_name: String,
    /// Case-folded email.
    pub email: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Whether this session opted into durable persistence.
    pub remember_me: bool,
}

impl SessionIdentity {
    fn from_record(record: &UserRecord, remember_me: bool) -> Self {
        Self {
            id: record.id,
            display_name: record.display_name.clone(),
            email: record.email.clone(),
            created_at: record.created_at,
            remember_me,
        }
    }

    /// Up to two upper-cased initials for avatar display.
    #[must_use]
    pub fn initials(&self) -> String {
        self.display_name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// Plaintext autofill record written when remember-me is set.
///
/// The registry stores only a one-way digest while this record keeps the
/// credential readable (see DESIGN.md). Erased on any non-remembered login
/// and on logout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryRecord {
    /// Case-folded email.
    pub email: String,
    /// The credential, readable for autofill.
    pub password: String,
    /// When the remembered login happened.
    pub last_login: DateTime<Utc>,
}

/// Owns the user registry and the logged-in identity.
pub struct SessionStore {
    ledger: Arc<dyn StorageLedger>,
    users: Vec<UserRecord>,
    current: Option<SessionIdentity>,
}

impl SessionStore {
    /// Loads the registry from durable storage, seeding the demo user when
    /// the registry is empty at first run. A corrupt registry document is
    /// treated as empty.
    ///
    /// # Errors
    ///
    /// Propagates ledger backend errors.
    pub fn new(ledger: Arc<dyn StorageLedger>) -> PlatformResult<Self> {
        let users: Vec<UserRecord> =
            storage::read_json(ledger.as_ref(), Scope::Durable, keys::USER_REGISTRY)?
                .unwrap_or_default();

        let mut store = Self {
            ledger,
            users,
            current: None,
        };
        if store.users.is_empty() {
            store.users.push(demo_user());
            store.persist_registry()?;
        }
        Ok(store)
    }

    fn persist_registry(&self) -> PlatformResult<()> {
        storage::write_json(
            self.ledger.as_ref(),
            Scope::Durable,
            keys::USER_REGISTRY,
            &self.users,
        )?;
        Ok(())
    }

    /// Registers a new account and establishes an ephemeral session.
    ///
    /// A fresh registration has not opted into persistence, so the identity
    /// is written to the ephemeral scope only.
    ///
    /// # Errors
    ///
    /// `ValidationError` for malformed inputs; `AuthError::DuplicateEmail`
    /// when the case-folded email already exists.
    pub fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
    ) -> PlatformResult<SessionIdentity> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyDisplayName.into());
        }
        let email = validator::check_email(email)?;
        validator::check_password(password)?;

        if self.users.iter().any(|u| u.email == email) {
            return Err(AuthError::DuplicateEmail { email }.into());
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            display_name: name.to_string(),
            email,
            credential_hash: hash_credential(password),
            created_at: Utc::now(),
            remember_me: false,
        };
        let identity = SessionIdentity::from_record(&record, false);
        self.users.push(record);
        self.persist_registry()?;

        storage::write_json(
            self.ledger.as_ref(),
            Scope::Ephemeral,
            keys::CURRENT_SESSION,
            &identity,
        )?;
        self.ledger
            .set(Scope::Durable, keys::REMEMBER_ME, "false")?;

        self.current = Some(identity.clone());
        Ok(identity)
    }

    /// Authenticates against the registry and establishes a session.
    ///
    /// When `remember_me` is set the identity goes to durable storage and a
    /// plaintext recovery record is written for autofill; otherwise the
    /// identity stays ephemeral and the recovery record is erased. The
    /// opposite scope is always cleared to prevent stale duplicate sessions.
    ///
    /// # Errors
    ///
    /// `ValidationError` for malformed inputs;
    /// `AuthError::InvalidCredentials` when no record matches.
    pub fn login(
        &mut self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> PlatformResult<SessionIdentity> {
        let email = validator::check_email(email)?;
        validator::check_password(password)?;

        let hash = hash_credential(password);
        let Some(record) = self
            .users
            .iter_mut()
            .find(|u| u.email == email && u.credential_hash == hash)
        else {
            return Err(AuthError::InvalidCredentials.into());
        };

        record.remember_me = remember_me;
        let identity = SessionIdentity::from_record(record, remember_me);
        self.persist_registry()?;

        let ledger = self.ledger.as_ref();
        if remember_me {
            storage::write_json(ledger, Scope::Durable, keys::CURRENT_SESSION, &identity)?;
            ledger.remove(Scope::Ephemeral, keys::CURRENT_SESSION)?;
            ledger.set(Scope::Durable, keys::REMEMBER_ME, "true")?;
            let recovery = RecoveryRecord {
                email,
                password: password.to_string(),
                last_login: Utc::now(),
            };
            storage::write_json(ledger, Scope::Durable, keys::RECOVERY_RECORD, &recovery)?;
        } else {
            storage::write_json(ledger, Scope::Ephemeral, keys::CURRENT_SESSION, &identity)?;
            ledger.remove(Scope::Durable, keys::CURRENT_SESSION)?;
            ledger.set(Scope::Durable, keys::REMEMBER_ME, "false")?;
            ledger.remove(Scope::Durable, keys::RECOVERY_RECORD)?;
        }

        self.current = Some(identity.clone());
        Ok(identity)
    }

    /// Restores a persisted session at startup.
    ///
    /// Durable storage wins over ephemeral when both are present: a durable
    /// identity means the user asked to be remembered. Corrupt documents
    /// read as absent.
    ///
    /// # Errors
    ///
    /// Propagates ledger backend errors.
    pub fn restore_session(&mut self) -> PlatformResult<Option<SessionIdentity>> {
        let ledger = self.ledger.as_ref();
        let durable: Option<SessionIdentity> =
            storage::read_json(ledger, Scope::Durable, keys::CURRENT_SESSION)?;
        let identity = match durable {
            Some(identity) => Some(identity),
            None => storage::read_json(ledger, Scope::Ephemeral, keys::CURRENT_SESSION)?,
        };
        self.current = identity.clone();
        Ok(identity)
    }

    /// Clears the identity from both scopes along with the remember flag
    /// and the recovery record.
    ///
    /// Gate, flow, and engine teardown are orchestrated by the platform;
    /// this only owns the session-scoped keys.
    ///
    /// # Errors
    ///
    /// Propagates ledger backend errors.
    pub fn logout(&mut self) -> PlatformResult<()> {
        let ledger = self.ledger.as_ref();
        storage::remove_everywhere(ledger, keys::CURRENT_SESSION)?;
        ledger.remove(Scope::Durable, keys::REMEMBER_ME)?;
        ledger.remove(Scope::Durable, keys::RECOVERY_RECORD)?;
        self.current = None;
        Ok(())
    }

    /// The logged-in identity, if any.
    #[must_use]
    pub fn current(&self) -> Option<&SessionIdentity> {
        self.current.as_ref()
    }

    /// Whether the active session asked to be remembered (fail closed).
    ///
    /// # Errors
    ///
    /// Propagates ledger backend errors.
    pub fn remember_me(&self) -> PlatformResult<bool> {
        let flag = self.ledger.get(Scope::Durable, keys::REMEMBER_ME)?;
        Ok(flag.as_deref() == Some("true"))
    }

    /// The stored autofill record, if remember-me was set.
    ///
    /// # Errors
    ///
    /// Propagates ledger backend errors.
    pub fn recovery_record(&self) -> PlatformResult<Option<RecoveryRecord>> {
        Ok(storage::read_json(
            self.ledger.as_ref(),
            Scope::Durable,
            keys::RECOVERY_RECORD,
        )?)
    }

    /// Number of registered users (including the demo seed).
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

fn hash_credential(password: &str) -> String {
    blake3::hash(password.as_bytes()).to_hex().to_string()
}

/// Deterministic bootstrap user seeded into an empty registry.
///
/// A convenience for first-run demos, not a security boundary.
fn demo_user() -> UserRecord {
    UserRecord {
        id: Uuid::new_v5(&Uuid::NAMESPACE_OID, b"watchtrade-demo-user"),
        display_name: "Kelly West".to_string(),
        email: "west@example.com".to_string(),
        credential_hash: hash_credential("West123!"),
        created_at: DateTime::UNIX_EPOCH,
        remember_me: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryLedger;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(MemoryLedger::new())).unwrap()
    }

    #[test]
    fn test_empty_registry_is_seeded_once() {
        let ledger = Arc::new(MemoryLedger::new());
        let store = SessionStore::new(Arc::clone(&ledger) as Arc<dyn StorageLedger>).unwrap();
        assert_eq!(store.user_count(), 1);

        // A second store over the same ledger sees the seed, does not re-seed.
        let again = SessionStore::new(ledger as Arc<dyn StorageLedger>).unwrap();
        assert_eq!(again.user_count(), 1);
    }

    #[test]
    fn test_demo_user_is_deterministic() {
        assert_eq!(demo_user(), demo_user());
    }

    #[test]
    fn test_register_success() {
        let mut store = store();
        let identity = store.register("Ada", "ada@x.com", "password1").unwrap();
        assert_eq!(identity.email, "ada@x.com");
        assert!(!identity.remember_me);
        assert_eq!(store.user_count(), 2);
        assert!(store.current().is_some());
    }

    #[test]
    fn test_register_duplicate_email_case_insensitive() {
        let mut store = store();
        store.register("Ada", "ada@x.com", "password1").unwrap();
        let err = store.register("Ada Two", "ADA@X.COM", "password1").unwrap_err();
        assert!(err.is_auth());
        assert_eq!(store.user_count(), 2);
    }

    #[test]
    fn test_register_validation() {
        let mut store = store();
        assert!(store.register("", "ada@x.com", "password1").unwrap_err().is_validation());
        assert!(store.register("Ada", "nope", "password1").unwrap_err().is_validation());
        assert!(store.register("Ada", "ada@x.com", "short").unwrap_err().is_validation());
        assert_eq!(store.user_count(), 1);
        assert!(store.current().is_none());
    }

    #[test]
    fn test_login_wrong_password_leaves_session_unchanged() {
        let mut store = store();
        store.register("Ada", "ada@x.com", "password1").unwrap();
        let before = store.current().cloned();

        let err = store.login("ada@x.com", "password2", false).unwrap_err();
        assert!(err.is_auth());
        assert_eq!(store.current().cloned(), before);
    }

    #[test]
    fn test_identity_never_carries_hash() {
        let ledger = Arc::new(MemoryLedger::new());
        let mut store = SessionStore::new(Arc::clone(&ledger) as Arc<dyn StorageLedger>).unwrap();
        store.register("Ada", "ada@x.com", "password1").unwrap();

        let raw = ledger
            .get(Scope::Ephemeral, keys::CURRENT_SESSION)
            .unwrap()
            .unwrap();
        assert!(!raw.contains(&hash_credential("password1")));
    }

    #[test]
    fn test_login_remember_scopes() {
        let ledger = Arc::new(MemoryLedger::new());
        let mut store = SessionStore::new(Arc::clone(&ledger) as Arc<dyn StorageLedger>).unwrap();
        store.register("Ada", "ada@x.com", "password1").unwrap();

        store.login("ada@x.com", "password1", true).unwrap();
        assert!(store.remember_me().unwrap());
        assert!(ledger.get(Scope::Durable, keys::CURRENT_SESSION).unwrap().is_some());
        assert!(ledger.get(Scope::Ephemeral, keys::CURRENT_SESSION).unwrap().is_none());
        let recovery = store.recovery_record().unwrap().unwrap();
        assert_eq!(recovery.email, "ada@x.com");
        assert_eq!(recovery.password, "password1");

        store.login("ada@x.com", "password1", false).unwrap();
        assert!(!store.remember_me().unwrap());
        assert!(ledger.get(Scope::Durable, keys::CURRENT_SESSION).unwrap().is_none());
        assert!(ledger.get(Scope::Ephemeral, keys::CURRENT_SESSION).unwrap().is_some());
        assert!(store.recovery_record().unwrap().is_none());
    }

    #[test]
    fn test_restore_prefers_durable() {
        let ledger = Arc::new(MemoryLedger::new());
        let mut store = SessionStore::new(Arc::clone(&ledger) as Arc<dyn StorageLedger>).unwrap();
        store.register("Ada", "ada@x.com", "password1").unwrap();
        store.register("Bob", "bob@x.com", "password1").unwrap();

        store.login("ada@x.com", "password1", true).unwrap();
        // An ephemeral identity on top of a durable one must lose.
        let bob = store.users.iter().find(|u| u.email == "bob@x.com").unwrap();
        let bob_identity = SessionIdentity::from_record(bob, false);
        storage::write_json(
            ledger.as_ref(),
            Scope::Ephemeral,
            keys::CURRENT_SESSION,
            &bob_identity,
        )
        .unwrap();

        let restored = store.restore_session().unwrap().unwrap();
        assert_eq!(restored.email, "ada@x.com");
        assert!(restored.remember_me);
    }

    #[test]
    fn test_logout_then_restore_none() {
        let mut store = store();
        store.register("Ada", "ada@x.com", "password1").unwrap();
        store.login("ada@x.com", "password1", true).unwrap();

        store.logout().unwrap();
        assert!(store.current().is_none());
        assert!(store.restore_session().unwrap().is_none());
        assert!(store.recovery_record().unwrap().is_none());
        assert!(!store.remember_me().unwrap());
    }

    #[test]
    fn test_corrupt_registry_degrades_to_seed() {
        let ledger = Arc::new(MemoryLedger::new());
        ledger
            .set(Scope::Durable, keys::USER_REGISTRY, "{broken")
            .unwrap();
        let store = SessionStore::new(ledger as Arc<dyn StorageLedger>).unwrap();
        assert_eq!(store.user_count(), 1);
    }

    #[test]
    fn test_initials() {
        let mut store = store();
        let identity = store.register("ada lovelace", "ada@x.com", "password1").unwrap();
        assert_eq!(identity.initials(), "AL");
    }
}
