//! Application password issuance seam.
//!
//! The host site owns the credential-issuance primitive; the core only needs
//! the small surface in [`PasswordIssuer`]. Two implementations ship here:
//!
//! - [`LocalPasswordIssuer`] - Issues real random secrets and keeps its
//!   ledger in the option store; backs the CLI.
//! - [`UnavailableIssuer`] - Models installations without the capability.
//!
//! Plaintext secrets exist only in the [`IssuedPassword`] returned from
//! `create`; the ledger persists metadata records only.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::model::{ApplicationPasswordRecord, IssuedPassword, OwnerId, PasswordMeta};
use crate::store::{OptionStore, Secret, StoreError, ISSUED_PASSWORDS_KEY};

const SECRET_LENGTH: usize = 24;
const SECRET_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Errors from the issuance capability.
#[derive(Debug, Error)]
pub enum IssueError {
    /// The capability is not present on this installation.
    #[error("application passwords are not available")]
    Unavailable,

    /// The issuer refused the request.
    #[error("issuer rejected the request: {message}")]
    Rejected { message: String },

    /// The issuer's backing storage failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Host capability for creating and revoking application passwords.
#[async_trait]
pub trait PasswordIssuer: Send + Sync {
    /// Whether this installation can issue application passwords at all.
    fn available(&self) -> bool;

    /// Issue a new password for `owner` under the given display name.
    ///
    /// The returned artifact is the only moment the plaintext is visible.
    async fn create(&self, owner: OwnerId, name: &str) -> Result<IssuedPassword, IssueError>;

    /// List metadata for every password issued to `owner`.
    async fn list(&self, owner: OwnerId) -> Result<Vec<PasswordMeta>, IssueError>;

    /// Revoke a password by its issuer-assigned identifier.
    async fn delete(&self, owner: OwnerId, identifier: &str) -> Result<(), IssueError>;
}

/// Issuer backed by the option store.
///
/// Mirrors the host primitive's rules: display names are unique per owner,
/// and deletion of an unknown identifier is refused rather than ignored.
pub struct LocalPasswordIssuer<S: OptionStore> {
    store: Arc<S>,
}

impl<S: OptionStore> LocalPasswordIssuer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn ledger(&self) -> Result<Vec<ApplicationPasswordRecord>, IssueError> {
        let value = self.store.get(ISSUED_PASSWORDS_KEY).await?;
        Ok(value
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default())
    }

    async fn save_ledger(
        &self,
        ledger: &[ApplicationPasswordRecord],
    ) -> Result<(), IssueError> {
        let value = serde_json::to_value(ledger).map_err(StoreError::from)?;
        self.store.set(ISSUED_PASSWORDS_KEY, value).await?;
        Ok(())
    }
}

impl<S: OptionStore> std::fmt::Debug for LocalPasswordIssuer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalPasswordIssuer").finish()
    }
}

#[async_trait]
impl<S: OptionStore> PasswordIssuer for LocalPasswordIssuer<S> {
    fn available(&self) -> bool {
        true
    }

    async fn create(&self, owner: OwnerId, name: &str) -> Result<IssuedPassword, IssueError> {
        let mut ledger = self.ledger().await?;

        if ledger
            .iter()
            .any(|entry| entry.owner == owner && entry.name == name)
        {
            return Err(IssueError::Rejected {
                message: format!("a password named '{}' already exists for this user", name),
            });
        }

        let meta = PasswordMeta {
            identifier: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        let secret = Secret::new(generate_secret());

        ledger.push(ApplicationPasswordRecord::new(owner, meta.clone()));
        self.save_ledger(&ledger).await?;

        debug!(%owner, identifier = %meta.identifier, "issued application password");

        Ok(IssuedPassword { secret, meta })
    }

    async fn list(&self, owner: OwnerId) -> Result<Vec<PasswordMeta>, IssueError> {
        let ledger = self.ledger().await?;
        Ok(ledger
            .into_iter()
            .filter(|entry| entry.owner == owner)
            .map(|entry| PasswordMeta {
                identifier: entry.identifier,
                name: entry.name,
                created_at: entry.created_at,
            })
            .collect())
    }

    async fn delete(&self, owner: OwnerId, identifier: &str) -> Result<(), IssueError> {
        let mut ledger = self.ledger().await?;
        let before = ledger.len();
        ledger.retain(|entry| !(entry.owner == owner && entry.identifier == identifier));

        if ledger.len() == before {
            return Err(IssueError::Rejected {
                message: format!("no application password with identifier '{}'", identifier),
            });
        }

        self.save_ledger(&ledger).await?;
        debug!(%owner, identifier, "revoked application password");
        Ok(())
    }
}

/// Issuer for installations without the application password capability.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableIssuer;

#[async_trait]
impl PasswordIssuer for UnavailableIssuer {
    fn available(&self) -> bool {
        false
    }

    async fn create(&self, _owner: OwnerId, _name: &str) -> Result<IssuedPassword, IssueError> {
        Err(IssueError::Unavailable)
    }

    async fn list(&self, _owner: OwnerId) -> Result<Vec<PasswordMeta>, IssueError> {
        Err(IssueError::Unavailable)
    }

    async fn delete(&self, _owner: OwnerId, _identifier: &str) -> Result<(), IssueError> {
        Err(IssueError::Unavailable)
    }
}

fn generate_secret() -> String {
    let mut rng = rand::thread_rng();
    (0..SECRET_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..SECRET_CHARSET.len());
            SECRET_CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryOptionStore;

    fn issuer() -> LocalPasswordIssuer<MemoryOptionStore> {
        LocalPasswordIssuer::new(Arc::new(MemoryOptionStore::new()))
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let issuer = issuer();
        let owner = OwnerId::new(1);

        let issued = issuer.create(owner, "Content Sync").await.unwrap();
        assert_eq!(issued.secret.expose().len(), SECRET_LENGTH);
        assert!(!issued.meta.identifier.is_empty());

        let listed = issuer.list(owner).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].identifier, issued.meta.identifier);
        assert_eq!(listed[0].name, "Content Sync");
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let issuer = issuer();
        let owner = OwnerId::new(1);

        issuer.create(owner, "Content Sync").await.unwrap();
        let err = issuer.create(owner, "Content Sync").await.unwrap_err();
        assert!(matches!(err, IssueError::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_same_name_different_owner_is_fine() {
        let issuer = issuer();

        issuer.create(OwnerId::new(1), "Content Sync").await.unwrap();
        issuer.create(OwnerId::new(2), "Content Sync").await.unwrap();

        assert_eq!(issuer.list(OwnerId::new(1)).await.unwrap().len(), 1);
        assert_eq!(issuer.list(OwnerId::new(2)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_entry() {
        let issuer = issuer();
        let owner = OwnerId::new(1);

        let issued = issuer.create(owner, "Content Sync").await.unwrap();
        issuer.delete(owner, &issued.meta.identifier).await.unwrap();

        assert!(issuer.list(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_identifier_rejected() {
        let issuer = issuer();
        let err = issuer.delete(OwnerId::new(1), "nope").await.unwrap_err();
        assert!(matches!(err, IssueError::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_unavailable_issuer() {
        let issuer = UnavailableIssuer;
        assert!(!issuer.available());
        let err = issuer.create(OwnerId::new(1), "x").await.unwrap_err();
        assert!(matches!(err, IssueError::Unavailable));
    }

    #[test]
    fn test_generated_secret_uses_charset() {
        let secret = generate_secret();
        assert_eq!(secret.len(), SECRET_LENGTH);
        assert!(secret.bytes().all(|b| SECRET_CHARSET.contains(&b)));
    }
}
