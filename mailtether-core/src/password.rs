//! Application password provisioning and rotation.
//!
//! [`ApplicationPasswordManager::ensure`] is the single entry point: enabling
//! sync, regenerating, and idempotent re-checks all converge on it. The flow
//! is availability check, owner resolution, find-or-create by the fixed
//! managed name, with rotation deleting strictly before creating. Issuance
//! failures are recorded into the password status and reported as an
//! [`EnsureOutcome`], never propagated as errors.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::credentials::CredentialStore;
use crate::error::MailtetherError;
use crate::issuer::PasswordIssuer;
use crate::model::{ApplicationPasswordRecord, OwnerId, MANAGED_PASSWORD_NAME};
use crate::status::{AppPasswordState, AppPasswordStatus, StatusTracker};
use crate::store::{OptionStore, Secret};

const MSG_NOT_AVAILABLE: &str = "Application passwords are not available on this site.";
const MSG_NO_OWNER: &str = "No site user is available to own the application password.";
const MSG_LIST_FAILED: &str = "Could not inspect existing application passwords.";
const MSG_DELETE_FAILED: &str = "Could not remove the existing application password.";
const MSG_CREATE_FAILED: &str = "Could not create an application password.";
const MSG_PENDING: &str = "Application password created. Reveal it within 10 minutes.";
const MSG_ALREADY: &str = "An application password already exists.";
const MSG_DISABLED: &str = "Content sync is disabled.";
const MSG_SENT: &str = "Application password delivered. It cannot be shown again.";

/// How an [`ensure`](ApplicationPasswordManager::ensure) run concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The site cannot issue application passwords; nothing was attempted.
    NotAvailable,
    /// No stored record and no acting user to own a new password.
    NoOwner,
    /// A managed password already existed; no new plaintext was produced.
    AlreadyProvisioned,
    /// A new password was issued and its plaintext staged.
    Provisioned,
    /// Issuance or rotation failed; details are in the password status.
    Failed,
}

/// Provisions and rotates the managed application password.
pub struct ApplicationPasswordManager<S: OptionStore, I: PasswordIssuer> {
    credentials: CredentialStore<S>,
    status: StatusTracker<S>,
    issuer: Arc<I>,
}

impl<S: OptionStore, I: PasswordIssuer> ApplicationPasswordManager<S, I> {
    pub fn new(
        credentials: CredentialStore<S>,
        status: StatusTracker<S>,
        issuer: Arc<I>,
    ) -> Self {
        Self {
            credentials,
            status,
            issuer,
        }
    }

    /// Make sure a managed application password exists.
    ///
    /// The owner is taken from the stored record when present, otherwise from
    /// `acting_user`. With `force_regenerate` an existing password is revoked
    /// before a new one is issued; there are never two live managed passwords
    /// past that single transition.
    pub async fn ensure(
        &self,
        acting_user: Option<OwnerId>,
        force_regenerate: bool,
    ) -> Result<EnsureOutcome, MailtetherError> {
        if !self.issuer.available() {
            self.status
                .set_app_password_status(AppPasswordStatus::new(
                    AppPasswordState::NotAvailable,
                    MSG_NOT_AVAILABLE,
                ))
                .await?;
            return Ok(EnsureOutcome::NotAvailable);
        }

        let record = self.credentials.password_record().await?;
        let Some(owner) = record.as_ref().map(|r| r.owner).or(acting_user) else {
            warn!("no owner available for the application password");
            self.status
                .set_app_password_status(AppPasswordStatus::new(
                    AppPasswordState::Error,
                    MSG_NO_OWNER,
                ))
                .await?;
            return Ok(EnsureOutcome::NoOwner);
        };

        let existing = match self.issuer.list(owner).await {
            Ok(listing) => listing
                .into_iter()
                .find(|meta| meta.name == MANAGED_PASSWORD_NAME),
            Err(e) => {
                warn!(error = %e, "could not list application passwords");
                self.status
                    .set_app_password_status(AppPasswordStatus::new(
                        AppPasswordState::Error,
                        MSG_LIST_FAILED,
                    ))
                    .await?;
                return Ok(EnsureOutcome::Failed);
            }
        };

        if let Some(meta) = existing {
            if force_regenerate {
                // Rotation: the old password must be gone before a new one
                // exists.
                if let Err(e) = self.issuer.delete(owner, &meta.identifier).await {
                    warn!(error = %e, identifier = %meta.identifier, "could not revoke existing password");
                    self.status
                        .set_app_password_status(AppPasswordStatus::new(
                            AppPasswordState::Error,
                            MSG_DELETE_FAILED,
                        ))
                        .await?;
                    return Ok(EnsureOutcome::Failed);
                }
                info!(identifier = %meta.identifier, "revoked application password for rotation");
            } else {
                self.credentials
                    .save_password_record(&ApplicationPasswordRecord::new(owner, meta))
                    .await?;
                let recorded = self
                    .status
                    .advance_app_password_status(AppPasswordState::Pending, MSG_ALREADY)
                    .await?;
                debug!(state = %recorded, "application password already provisioned");
                return Ok(EnsureOutcome::AlreadyProvisioned);
            }
        }

        let issued = match self.issuer.create(owner, MANAGED_PASSWORD_NAME).await {
            Ok(issued) => issued,
            Err(e) => {
                warn!(error = %e, "application password creation failed");
                self.status
                    .set_app_password_status(AppPasswordStatus::new(
                        AppPasswordState::Error,
                        MSG_CREATE_FAILED,
                    ))
                    .await?;
                return Ok(EnsureOutcome::Failed);
            }
        };

        if issued.secret.is_empty() || issued.meta.identifier.is_empty() {
            warn!("issuer returned a malformed artifact");
            self.status
                .set_app_password_status(AppPasswordStatus::new(
                    AppPasswordState::Error,
                    MSG_CREATE_FAILED,
                ))
                .await?;
            return Ok(EnsureOutcome::Failed);
        }

        self.credentials
            .save_password_record(&ApplicationPasswordRecord::new(owner, issued.meta.clone()))
            .await?;
        self.credentials.stage_password(issued.secret).await?;
        self.status
            .set_app_password_status(AppPasswordStatus::new(
                AppPasswordState::Pending,
                MSG_PENDING,
            ))
            .await?;

        info!(%owner, "provisioned application password");
        Ok(EnsureOutcome::Provisioned)
    }

    /// Hand out the staged plaintext, at most once.
    ///
    /// A successful reveal is the `pending` to `sent` handover; after it the
    /// plaintext is gone for good. An absent, consumed, or expired staging
    /// entry reveals nothing and changes no status.
    pub async fn reveal_staged(&self) -> Result<Option<Secret>, MailtetherError> {
        let Some(secret) = self.credentials.take_staged_password().await? else {
            return Ok(None);
        };

        self.status
            .advance_app_password_status(AppPasswordState::Sent, MSG_SENT)
            .await?;
        info!("application password plaintext delivered");
        Ok(Some(secret))
    }

    /// Record that content sync was switched off.
    ///
    /// The stored record survives; only the status is forced back to
    /// `not_created` with disabled messaging.
    pub async fn mark_disabled(&self) -> Result<(), MailtetherError> {
        self.status
            .set_app_password_status(AppPasswordStatus::new(
                AppPasswordState::NotCreated,
                MSG_DISABLED,
            ))
            .await?;
        Ok(())
    }
}
