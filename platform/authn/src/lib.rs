//! Platform authentication helpers.
//!
//! Accounts authenticate with an email and password. Passwords are stored as
//! argon2 PHC strings; sessions are server-side rows whose lifetime is set by
//! [`SessionPolicy`].

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use rand_core::OsRng;
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 8;
const MAX_EMAIL_LEN: usize = 320;
const MAX_DISPLAY_NAME_LEN: usize = 128;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthnError {
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,
    #[error("display name must be between 1 and {MAX_DISPLAY_NAME_LEN} characters")]
    InvalidDisplayName,
    #[error("stored password hash is malformed")]
    MalformedHash,
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Trim and lower-case an email address, rejecting obviously malformed input.
pub fn normalize_email(value: &str) -> Result<String, AuthnError> {
    let trimmed = value.trim().to_lowercase();
    if trimmed.is_empty() || trimmed.len() > MAX_EMAIL_LEN {
        return Err(AuthnError::InvalidEmail);
    }
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(AuthnError::InvalidEmail);
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') || trimmed.contains(' ') {
        return Err(AuthnError::InvalidEmail);
    }
    Ok(trimmed)
}

pub fn validate_display_name(value: &str) -> Result<String, AuthnError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(AuthnError::InvalidDisplayName);
    }
    Ok(trimmed.to_string())
}

pub fn hash_password(password: &str) -> Result<String, AuthnError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthnError::WeakPassword);
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthnError::Hashing(err.to_string()))
}

pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthnError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| AuthnError::MalformedHash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Lifetime of a login session.
#[derive(Clone, Copy, Debug)]
pub struct SessionPolicy {
    pub ttl: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::days(30),
        }
    }
}

impl SessionPolicy {
    pub fn from_hours(hours: i64) -> Self {
        Self {
            ttl: Duration::hours(hours.max(1)),
        }
    }

    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.ttl).unwrap_or(now)
    }
}
