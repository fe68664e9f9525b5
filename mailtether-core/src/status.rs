//! Connection and application password status tracking.
//!
//! Two small state machines live here:
//! - [`ConnectionState`] - Result of the last inbound token verification
//! - [`AppPasswordState`] - Lifecycle of the managed application password
//!
//! Both are persisted as JSON records ([`ConnectionStatus`],
//! [`AppPasswordStatus`]) and read back merged over defaults, so records
//! written by older versions never surface missing fields.
//!
//! The application password machine has one non-obvious transition rule:
//! `sent` is sticky. Once the plaintext has been handed to the operator, a
//! later `pending` proposal (say, from re-running ensure) must not claim the
//! password is deliverable again. [`advance`] encodes that rule.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{
    OptionStore, StoreError, APP_PASSWORD_STATUS_KEY, CONNECTION_STATUS_KEY,
};

/// Result of the most recent connection test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No test has run since the token was last saved.
    #[default]
    NotTested,
    /// The last test reached the service and was accepted.
    Connected,
    /// The last test produced a definitive failure.
    NotConnected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::NotTested => "not_tested",
            ConnectionState::Connected => "connected",
            ConnectionState::NotConnected => "not_connected",
        }
    }

    /// Human-readable label for display surfaces.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::NotTested => "Not tested",
            ConnectionState::Connected => "Connected",
            ConnectionState::NotConnected => "Not connected",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted record of the last connection test.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConnectionStatus {
    #[serde(default)]
    pub state: ConnectionState,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub tested_at: Option<DateTime<Utc>>,
}

impl ConnectionStatus {
    pub fn new(state: ConnectionState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
            tested_at: Some(Utc::now()),
        }
    }

    /// Record written when a token is saved: the previous test result no
    /// longer applies, but no new test has run.
    pub fn reset_after_save() -> Self {
        Self {
            state: ConnectionState::NotTested,
            message: "Token saved. Connection has not been tested yet.".to_string(),
            tested_at: None,
        }
    }
}

/// Lifecycle state of the managed application password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppPasswordState {
    /// No managed password exists.
    #[default]
    NotCreated,
    /// A password exists and its plaintext is staged for one-time pickup.
    Pending,
    /// The plaintext was handed out; it can no longer be retrieved.
    Sent,
    /// The site cannot issue application passwords.
    NotAvailable,
    /// The last provisioning attempt failed.
    Error,
}

impl AppPasswordState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppPasswordState::NotCreated => "not_created",
            AppPasswordState::Pending => "pending",
            AppPasswordState::Sent => "sent",
            AppPasswordState::NotAvailable => "not_available",
            AppPasswordState::Error => "error",
        }
    }

    /// Human-readable label for display surfaces.
    pub fn label(&self) -> &'static str {
        match self {
            AppPasswordState::NotCreated => "Not created",
            AppPasswordState::Pending => "Pending delivery",
            AppPasswordState::Sent => "Delivered",
            AppPasswordState::NotAvailable => "Not available",
            AppPasswordState::Error => "Error",
        }
    }
}

impl std::fmt::Display for AppPasswordState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted record of the application password lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppPasswordStatus {
    #[serde(default)]
    pub state: AppPasswordState,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AppPasswordStatus {
    pub fn new(state: AppPasswordState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
            updated_at: Some(Utc::now()),
        }
    }
}

/// Apply the transition rule: `sent` is sticky against `pending`.
///
/// Every other proposal replaces the current state unconditionally.
pub fn advance(current: AppPasswordState, proposed: AppPasswordState) -> AppPasswordState {
    match (current, proposed) {
        (AppPasswordState::Sent, AppPasswordState::Pending) => AppPasswordState::Sent,
        (_, proposed) => proposed,
    }
}

/// Store-backed reader/writer for both status records.
///
/// Cloning is cheap; trackers share the underlying store.
#[derive(Debug)]
pub struct StatusTracker<S: OptionStore> {
    store: Arc<S>,
}

impl<S: OptionStore> Clone for StatusTracker<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: OptionStore> StatusTracker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Read the connection status, merged over defaults.
    ///
    /// Missing or unreadable records yield [`ConnectionStatus::default`].
    pub async fn connection_status(&self) -> Result<ConnectionStatus, StoreError> {
        let value = self.store.get(CONNECTION_STATUS_KEY).await?;
        Ok(value
            .map(|v| serde_json::from_value(v).unwrap_or_default())
            .unwrap_or_default())
    }

    pub async fn set_connection_status(&self, status: ConnectionStatus) -> Result<(), StoreError> {
        debug!(state = %status.state, "recording connection status");
        self.store
            .set(CONNECTION_STATUS_KEY, serde_json::to_value(&status)?)
            .await
    }

    /// Read the application password status, merged over defaults.
    pub async fn app_password_status(&self) -> Result<AppPasswordStatus, StoreError> {
        let value = self.store.get(APP_PASSWORD_STATUS_KEY).await?;
        Ok(value
            .map(|v| serde_json::from_value(v).unwrap_or_default())
            .unwrap_or_default())
    }

    pub async fn set_app_password_status(
        &self,
        status: AppPasswordStatus,
    ) -> Result<(), StoreError> {
        debug!(state = %status.state, "recording app password status");
        self.store
            .set(APP_PASSWORD_STATUS_KEY, serde_json::to_value(&status)?)
            .await
    }

    /// Propose a new application password state through [`advance`].
    ///
    /// When the proposal survives, the record is rewritten with `message` and
    /// a fresh timestamp. A suppressed proposal leaves the stored record
    /// untouched. Returns the state that is now recorded.
    pub async fn advance_app_password_status(
        &self,
        proposed: AppPasswordState,
        message: impl Into<String> + Send,
    ) -> Result<AppPasswordState, StoreError> {
        let current = self.app_password_status().await?;
        let next = advance(current.state, proposed);

        if next == proposed {
            self.set_app_password_status(AppPasswordStatus {
                state: next,
                message: message.into(),
                updated_at: Some(Utc::now()),
            })
            .await?;
        } else {
            debug!(
                current = %current.state,
                proposed = %proposed,
                "app password status proposal suppressed"
            );
        }

        Ok(next)
    }
}
