//! Opaque option storage abstraction.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for sensitive values that prevents accidental logging
//! - [`OptionStore`] - Trait for the host's key-value option storage
//! - [`MemoryOptionStore`] - In-memory implementation for testing
//! - [`FileOptionStore`] - JSON-file-backed implementation used by the CLI
//!
//! # Storage Key Convention
//!
//! Every record Mailtether persists lives under a fixed key with the
//! `mailtether/` prefix; the full layout is declared by the `*_KEY` constants
//! below. Values are JSON; the typed wrappers in [`crate::credentials`] and
//! [`crate::status`] own the record shapes.
//!
//! # Example
//!
//! ```rust,ignore
//! use mailtether_core::store::{MemoryOptionStore, OptionStore, ACCESS_TOKEN_KEY};
//!
//! let store = MemoryOptionStore::new();
//! store.set(ACCESS_TOKEN_KEY, serde_json::json!("mm_live_abc123")).await.unwrap();
//!
//! let token = store.get(ACCESS_TOKEN_KEY).await.unwrap();
//! assert!(token.is_some());
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

mod file;
mod memory;

pub use file::FileOptionStore;
pub use memory::MemoryOptionStore;

/// Option key holding the inbound API access token.
pub const ACCESS_TOKEN_KEY: &str = "mailtether/access_token";

/// Option key holding the [`crate::status::ConnectionStatus`] record.
pub const CONNECTION_STATUS_KEY: &str = "mailtether/connection_status";

/// Option key holding the content-sync toggle.
pub const SYNC_ENABLED_KEY: &str = "mailtether/sync_enabled";

/// Option key holding the managed application password metadata.
pub const APP_PASSWORD_KEY: &str = "mailtether/app_password";

/// Option key holding the [`crate::status::AppPasswordStatus`] record.
pub const APP_PASSWORD_STATUS_KEY: &str = "mailtether/app_password_status";

/// Option key holding the one-shot plaintext staging record.
pub const APP_PASSWORD_STAGING_KEY: &str = "mailtether/app_password_staging";

/// Option key holding the local issuer's ledger of issued passwords.
pub const ISSUED_PASSWORDS_KEY: &str = "mailtether/issued_passwords";

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value,
/// and the backing memory is zeroed when the wrapper is dropped.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Consume the secret and return the inner value.
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.0)
    }

    /// Whether the secret holds an empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

/// Error type for option store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend encountered an error.
    #[error("backend error: {message}")]
    BackendError { message: String },

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O error reading or writing the backing file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration directory not available.
    #[error("configuration directory not available")]
    ConfigDirUnavailable,
}

/// Abstraction over the host's option storage.
///
/// The core treats the store as an opaque get/set/delete service with string
/// keys and JSON values; it never assumes anything about the backing medium.
///
/// Implementations include:
/// - [`MemoryOptionStore`] - In-memory storage for testing
/// - [`FileOptionStore`] - JSON file on disk, used by the CLI
#[async_trait]
pub trait OptionStore: Send + Sync {
    /// Retrieve a value by key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Store a value at the given key.
    ///
    /// Overwrites any existing value.
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Delete a value by key.
    ///
    /// Returns `Ok(())` even if the key didn't exist.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
