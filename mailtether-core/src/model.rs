//! Core domain types for credential records.
//!
//! This module defines the value types shared across the crate:
//! - [`OwnerId`] - Identifier of the site user that owns an application password
//! - [`PasswordMeta`] - Metadata describing an issued password
//! - [`IssuedPassword`] - One-time artifact pairing the plaintext with its metadata
//! - [`ApplicationPasswordRecord`] - The persisted record (never the plaintext)
//! - [`StagedPassword`] - Short-lived plaintext staging entry

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Secret;

/// How long a staged plaintext password stays retrievable.
pub const STAGING_TTL_MINUTES: i64 = 10;

/// Display name under which Mailtether manages its application password.
pub const MANAGED_PASSWORD_NAME: &str = "Mailtether Content Sync";

/// Identifier of the site user an application password belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(u64);

impl OwnerId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for OwnerId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata describing an issued application password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordMeta {
    /// Stable identifier assigned by the issuer, used for later revocation.
    pub identifier: String,
    /// Display name of the password.
    pub name: String,
    /// When the password was created.
    pub created_at: DateTime<Utc>,
}

/// A freshly issued application password.
///
/// The plaintext is only available at issue time; everything persisted
/// afterwards goes through [`ApplicationPasswordRecord`].
#[derive(Debug, Clone)]
pub struct IssuedPassword {
    pub secret: Secret,
    pub meta: PasswordMeta,
}

/// Persisted description of the managed application password.
///
/// Deliberately omits the plaintext; revealing it goes through the staging
/// flow in [`crate::credentials`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationPasswordRecord {
    /// The site user the password was issued for.
    pub owner: OwnerId,
    /// Issuer-assigned identifier, used for revocation.
    pub identifier: String,
    /// Display name of the password.
    pub name: String,
    /// When the password was created.
    pub created_at: DateTime<Utc>,
}

impl ApplicationPasswordRecord {
    pub fn new(owner: OwnerId, meta: PasswordMeta) -> Self {
        Self {
            owner,
            identifier: meta.identifier,
            name: meta.name,
            created_at: meta.created_at,
        }
    }
}

/// Short-lived plaintext staging entry.
///
/// Written when a password is provisioned, consumed at most once, and ignored
/// after [`STAGING_TTL_MINUTES`] has elapsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedPassword {
    pub secret: Secret,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
}

impl StagedPassword {
    /// Stage a plaintext with a fresh TTL measured from `now`.
    pub fn fresh(secret: Secret, now: DateTime<Utc>) -> Self {
        Self {
            secret,
            expires_at: now + Duration::minutes(STAGING_TTL_MINUTES),
            consumed: false,
        }
    }

    /// Whether the staging window has closed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_id_display() {
        let owner = OwnerId::new(42);
        assert_eq!(owner.to_string(), "42");
        assert_eq!(owner.get(), 42);
    }

    #[test]
    fn test_record_from_meta() {
        let meta = PasswordMeta {
            identifier: "uuid-1".to_string(),
            name: MANAGED_PASSWORD_NAME.to_string(),
            created_at: Utc::now(),
        };
        let record = ApplicationPasswordRecord::new(OwnerId::new(7), meta.clone());
        assert_eq!(record.owner, OwnerId::new(7));
        assert_eq!(record.identifier, meta.identifier);
        assert_eq!(record.name, MANAGED_PASSWORD_NAME);
    }

    #[test]
    fn test_staged_password_expiry() {
        let now = Utc::now();
        let staged = StagedPassword::fresh(Secret::new("pw"), now);

        assert!(!staged.consumed);
        assert!(!staged.is_expired(now + Duration::minutes(STAGING_TTL_MINUTES - 1)));
        assert!(staged.is_expired(now + Duration::minutes(STAGING_TTL_MINUTES)));
    }

    #[test]
    fn test_staged_password_serde_round_trip() {
        let staged = StagedPassword::fresh(Secret::new("pw"), Utc::now());
        let json = serde_json::to_value(&staged).unwrap();
        let back: StagedPassword = serde_json::from_value(json).unwrap();
        assert_eq!(back.secret.expose(), "pw");
        assert!(!back.consumed);
    }
}
