//! Gated settings facade.
//!
//! [`SettingsService`] is the single entry point the operator surface talks
//! to. It composes the credential store, status tracker, connection verifier,
//! and password manager, and checks the [`AdminGate`] before every operation,
//! reads included. A refused gate is a hard stop: nothing is read or written.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mailtether_core::client::HttpApiFactory;
//! use mailtether_core::config::ApiConfig;
//! use mailtether_core::issuer::LocalPasswordIssuer;
//! use mailtether_core::service::{OperatorGate, SettingsService};
//! use mailtether_core::store::FileOptionStore;
//!
//! let store = Arc::new(FileOptionStore::load()?);
//! let issuer = Arc::new(LocalPasswordIssuer::new(Arc::clone(&store)));
//! let service = SettingsService::new(
//!     store,
//!     Arc::new(HttpApiFactory::new()),
//!     issuer,
//!     OperatorGate::new(Some(1.into())),
//!     ApiConfig::default(),
//! );
//!
//! let outcome = service.save_token("mm_live_abc123").await?;
//! println!("{}", outcome);
//! ```

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::credentials::CredentialStore;
use crate::error::MailtetherError;
use crate::issuer::PasswordIssuer;
use crate::model::OwnerId;
use crate::notice::OutcomeCode;
use crate::password::{ApplicationPasswordManager, EnsureOutcome};
use crate::probe::ApiClientFactory;
use crate::status::{AppPasswordStatus, ConnectionStatus, StatusTracker};
use crate::store::{OptionStore, Secret};
use crate::verifier::ConnectionVerifier;

/// Request-authenticity and identity gate.
///
/// The host decides who may manage Mailtether settings; the core only asks.
pub trait AdminGate: Send + Sync {
    /// Whether the current caller may manage settings.
    fn is_authorized(&self) -> bool;

    /// The site user acting in this invocation, if any.
    fn acting_user(&self) -> Option<OwnerId>;
}

/// Gate for a trusted operator session, e.g. the CLI on its own host.
///
/// Always authorized; the acting user is fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct OperatorGate {
    owner: Option<OwnerId>,
}

impl OperatorGate {
    pub fn new(owner: Option<OwnerId>) -> Self {
        Self { owner }
    }
}

impl AdminGate for OperatorGate {
    fn is_authorized(&self) -> bool {
        true
    }

    fn acting_user(&self) -> Option<OwnerId> {
        self.owner
    }
}

/// The settings surface: every operation the operator UI exposes.
pub struct SettingsService<S, F, I, G>
where
    S: OptionStore,
    F: ApiClientFactory,
    I: PasswordIssuer,
    G: AdminGate,
{
    credentials: CredentialStore<S>,
    status: StatusTracker<S>,
    verifier: ConnectionVerifier<S, F>,
    passwords: ApplicationPasswordManager<S, I>,
    gate: G,
}

impl<S, F, I, G> SettingsService<S, F, I, G>
where
    S: OptionStore,
    F: ApiClientFactory,
    I: PasswordIssuer,
    G: AdminGate,
{
    pub fn new(store: Arc<S>, factory: Arc<F>, issuer: Arc<I>, gate: G, config: ApiConfig) -> Self {
        let credentials = CredentialStore::new(Arc::clone(&store));
        let status = StatusTracker::new(store);
        let verifier = ConnectionVerifier::new(
            credentials.clone(),
            status.clone(),
            factory,
            config,
        );
        let passwords =
            ApplicationPasswordManager::new(credentials.clone(), status.clone(), issuer);

        Self {
            credentials,
            status,
            verifier,
            passwords,
            gate,
        }
    }

    fn authorize(&self) -> Result<(), MailtetherError> {
        if self.gate.is_authorized() {
            Ok(())
        } else {
            warn!("settings operation refused by the admin gate");
            Err(MailtetherError::Unauthorized)
        }
    }

    /// Save a new access token.
    ///
    /// Empty (post-trim) input maps to the `token_missing` outcome and stores
    /// nothing.
    pub async fn save_token(&self, raw: &str) -> Result<OutcomeCode, MailtetherError> {
        self.authorize()?;

        match self.credentials.save_token(raw).await {
            Ok(()) => Ok(OutcomeCode::TokenSaved),
            Err(MailtetherError::EmptyToken) => Ok(OutcomeCode::TokenMissing),
            Err(e) => Err(e),
        }
    }

    /// Run a connection test against the remote service.
    ///
    /// Availability faults from probe resolution become the distinct
    /// `sdk_unavailable` outcome; they never record a failed connection.
    pub async fn test_connection(&self) -> Result<OutcomeCode, MailtetherError> {
        self.authorize()?;

        match self.verifier.test_connection().await {
            Err(MailtetherError::Probe(e)) => {
                warn!(error = %e, "connection test aborted before any remote call");
                Ok(OutcomeCode::SdkUnavailable)
            }
            other => other,
        }
    }

    /// Switch content sync on or off.
    ///
    /// Enabling also runs the idempotent password provisioning; the toggle
    /// outcome reports the switch itself, with provisioning details left in
    /// the password status. Disabling keeps the stored record but resets the
    /// password status with disabled messaging.
    pub async fn set_sync_enabled(&self, enabled: bool) -> Result<OutcomeCode, MailtetherError> {
        self.authorize()?;

        self.credentials.set_sync_enabled(enabled).await?;

        if enabled {
            let outcome = self
                .passwords
                .ensure(self.gate.acting_user(), false)
                .await?;
            debug!(?outcome, "provisioning ran on sync enable");
            Ok(OutcomeCode::SyncEnabled)
        } else {
            self.passwords.mark_disabled().await?;
            Ok(OutcomeCode::SyncDisabled)
        }
    }

    /// Rotate the managed application password.
    pub async fn regenerate_application_password(
        &self,
    ) -> Result<OutcomeCode, MailtetherError> {
        self.authorize()?;

        let outcome = self.passwords.ensure(self.gate.acting_user(), true).await?;
        Ok(match outcome {
            EnsureOutcome::Provisioned | EnsureOutcome::AlreadyProvisioned => {
                OutcomeCode::PasswordRegenerated
            }
            EnsureOutcome::NotAvailable => OutcomeCode::PasswordUnavailable,
            EnsureOutcome::NoOwner | EnsureOutcome::Failed => OutcomeCode::PasswordFailed,
        })
    }

    /// Reveal the staged application password plaintext, at most once.
    pub async fn reveal_staged_password(&self) -> Result<Option<Secret>, MailtetherError> {
        self.authorize()?;
        self.passwords.reveal_staged().await
    }

    pub async fn connection_status(&self) -> Result<ConnectionStatus, MailtetherError> {
        self.authorize()?;
        Ok(self.status.connection_status().await?)
    }

    pub async fn app_password_status(&self) -> Result<AppPasswordStatus, MailtetherError> {
        self.authorize()?;
        Ok(self.status.app_password_status().await?)
    }

    pub async fn sync_enabled(&self) -> Result<bool, MailtetherError> {
        self.authorize()?;
        Ok(self.credentials.sync_enabled().await?)
    }

    pub async fn has_token(&self) -> Result<bool, MailtetherError> {
        self.authorize()?;
        Ok(self.credentials.has_token().await?)
    }
}
