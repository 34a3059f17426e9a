//! Stateless format validators.
//!
//! Everything here is a pure function over the input string. The credential
//! submission path calls these again at submission time, so a caller that
//! skips the live per-keystroke check cannot bypass validation.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ValidationError;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Number of words a recovery phrase must contain.
pub const PHRASE_WORD_COUNT: usize = 12;

/// Hex character count of a private key, after stripping any `0x` prefix.
pub const PRIVATE_KEY_LEN: usize = 64;

fn word_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z]+$").expect("valid word regex"))
}

fn hex_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9a-fA-F]{64}$").expect("valid key regex"))
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

/// Returns true iff `input` trims to exactly 12 whitespace-separated
/// alphabetic words.
#[must_use]
pub fn is_valid_phrase(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return false;
    }
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if words.len() != PHRASE_WORD_COUNT {
        return false;
    }
    words.iter().all(|w| word_regex().is_match(w))
}

/// Returns true iff `input` trims to 64 hex characters, with an optional
/// `0x` prefix accepted and stripped.
#[must_use]
pub fn is_valid_private_key(input: &str) -> bool {
    let trimmed = input.trim();
    let cleaned = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    cleaned.len() == PRIVATE_KEY_LEN && hex_key_regex().is_match(cleaned)
}

/// Returns true iff `input` has the basic `local@domain.tld` shape.
#[must_use]
pub fn is_valid_email(input: &str) -> bool {
    email_regex().is_match(input.trim())
}

/// Validates an email, returning the case-folded form.
///
/// # Errors
///
/// Returns `ValidationError::InvalidEmail` if the shape check fails.
pub fn check_email(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if !is_valid_email(trimmed) {
        return Err(ValidationError::InvalidEmail {
            email: trimmed.to_string(),
        });
    }
    Ok(trimmed.to_lowercase())
}

/// Validates a password against the minimum length policy.
///
/// # Errors
///
/// Returns `ValidationError::PasswordTooShort` when too short.
pub fn check_password(input: &str) -> Result<(), ValidationError> {
    if input.len() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

/// Validates that a password and its confirmation agree.
///
/// # Errors
///
/// Returns `ValidationError::PasswordMismatch` when they differ.
pub fn check_passwords_match(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}
