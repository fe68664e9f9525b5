//! Typed credential accessors over the opaque option store.
//!
//! [`CredentialStore`] knows the shape of every persisted record; callers
//! never touch raw keys or JSON. Two operations carry behavior beyond plain
//! reads and writes:
//!
//! - [`save_token`](CredentialStore::save_token) pairs the token write with a
//!   connection-status reset, so a stale "connected" verdict never outlives
//!   the token it was produced against.
//! - [`take_staged_password`](CredentialStore::take_staged_password) is the
//!   one-shot read of a staged plaintext: consumed or expired entries are
//!   deleted and read as absent.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::MailtetherError;
use crate::model::{ApplicationPasswordRecord, StagedPassword};
use crate::status::ConnectionStatus;
use crate::store::{
    OptionStore, Secret, StoreError, ACCESS_TOKEN_KEY, APP_PASSWORD_KEY,
    APP_PASSWORD_STAGING_KEY, CONNECTION_STATUS_KEY, SYNC_ENABLED_KEY,
};

/// Typed read/write access to the persisted credential state.
#[derive(Debug)]
pub struct CredentialStore<S: OptionStore> {
    store: Arc<S>,
}

impl<S: OptionStore> Clone for CredentialStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: OptionStore> CredentialStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The stored access token, or an empty string if none is saved.
    pub async fn access_token(&self) -> Result<String, StoreError> {
        let value = self.store.get(ACCESS_TOKEN_KEY).await?;
        Ok(value
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default())
    }

    /// Whether a non-empty token is saved.
    pub async fn has_token(&self) -> Result<bool, StoreError> {
        Ok(!self.access_token().await?.is_empty())
    }

    /// Save a new access token and reset the connection status.
    ///
    /// Input is trimmed first; an empty result is refused without touching
    /// storage. The status reset follows the token write within the same
    /// invocation, so readers never see a fresh token paired with a stale
    /// verdict.
    pub async fn save_token(&self, raw: &str) -> Result<(), MailtetherError> {
        let token = raw.trim();
        if token.is_empty() {
            return Err(MailtetherError::EmptyToken);
        }

        self.store
            .set(ACCESS_TOKEN_KEY, Value::String(token.to_string()))
            .await?;
        self.store
            .set(
                CONNECTION_STATUS_KEY,
                serde_json::to_value(ConnectionStatus::reset_after_save())
                    .map_err(StoreError::from)?,
            )
            .await?;

        info!("access token saved; connection status reset");
        Ok(())
    }

    /// Whether content sync is enabled. Defaults to `false`.
    pub async fn sync_enabled(&self) -> Result<bool, StoreError> {
        let value = self.store.get(SYNC_ENABLED_KEY).await?;
        Ok(value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    pub async fn set_sync_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        debug!(enabled, "setting sync flag");
        self.store.set(SYNC_ENABLED_KEY, Value::Bool(enabled)).await
    }

    /// The managed application password record, if one has been provisioned.
    ///
    /// An unreadable record reads as absent.
    pub async fn password_record(
        &self,
    ) -> Result<Option<ApplicationPasswordRecord>, StoreError> {
        let value = self.store.get(APP_PASSWORD_KEY).await?;
        Ok(value.and_then(|v| serde_json::from_value(v).ok()))
    }

    pub async fn save_password_record(
        &self,
        record: &ApplicationPasswordRecord,
    ) -> Result<(), StoreError> {
        self.store
            .set(APP_PASSWORD_KEY, serde_json::to_value(record)?)
            .await
    }

    /// Stage a plaintext password for one-time retrieval.
    ///
    /// The staging window opens now and closes after
    /// [`STAGING_TTL_MINUTES`](crate::model::STAGING_TTL_MINUTES).
    pub async fn stage_password(&self, secret: Secret) -> Result<(), StoreError> {
        let staged = StagedPassword::fresh(secret, Utc::now());
        self.store
            .set(APP_PASSWORD_STAGING_KEY, serde_json::to_value(&staged)?)
            .await
    }

    /// Take the staged plaintext, at most once.
    ///
    /// Returns `None` when no entry exists, the entry was already consumed,
    /// or its window has expired; stale entries are deleted on the way out.
    /// A successful take marks the entry consumed and then deletes it.
    pub async fn take_staged_password(&self) -> Result<Option<Secret>, StoreError> {
        let Some(value) = self.store.get(APP_PASSWORD_STAGING_KEY).await? else {
            return Ok(None);
        };

        let staged: StagedPassword = match serde_json::from_value(value) {
            Ok(staged) => staged,
            Err(_) => {
                self.store.delete(APP_PASSWORD_STAGING_KEY).await?;
                return Ok(None);
            }
        };

        if staged.consumed || staged.is_expired(Utc::now()) {
            debug!("staged password consumed or expired; discarding");
            self.store.delete(APP_PASSWORD_STAGING_KEY).await?;
            return Ok(None);
        }

        let mut spent = staged.clone();
        spent.consumed = true;
        self.store
            .set(APP_PASSWORD_STAGING_KEY, serde_json::to_value(&spent)?)
            .await?;
        self.store.delete(APP_PASSWORD_STAGING_KEY).await?;

        info!("staged application password handed out");
        Ok(Some(staged.secret))
    }
}
