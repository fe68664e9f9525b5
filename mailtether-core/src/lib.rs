//! # Mailtether Core
//!
//! Core library for the Mailtether site-to-service integration.
//!
//! This crate provides:
//! - Credential lifecycle for the inbound access token and the outbound
//!   application password
//! - Discovery-based connection verification against the Mailtether API
//! - Status tracking for both credentials, with outcome-to-notice routing
//! - Traits for the host seams: option storage, admin gating, password
//!   issuance, and the API client factory
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mailtether_core::{
//!     ApiConfig, HttpApiFactory, LocalPasswordIssuer, MemoryOptionStore,
//!     Notice, OperatorGate, SettingsService,
//! };
//!
//! let store = Arc::new(MemoryOptionStore::new());
//! let issuer = Arc::new(LocalPasswordIssuer::new(Arc::clone(&store)));
//! let service = SettingsService::new(
//!     store,
//!     Arc::new(HttpApiFactory::new()),
//!     issuer,
//!     OperatorGate::new(Some(1.into())),
//!     ApiConfig::default(),
//! );
//!
//! service.save_token("mm_live_abc123").await?;
//! let outcome = service.test_connection().await?;
//! println!("{}", Notice::for_code(outcome).message);
//! ```

pub mod model;
pub mod store;
pub mod status;
pub mod credentials;
pub mod probe;
pub mod verifier;
pub mod issuer;
pub mod password;
pub mod notice;
pub mod config;
pub mod client;
pub mod service;
pub mod error;

// Re-export commonly used types at crate root
pub use model::{
    ApplicationPasswordRecord,
    IssuedPassword,
    OwnerId,
    PasswordMeta,
    StagedPassword,
    MANAGED_PASSWORD_NAME,
    STAGING_TTL_MINUTES,
};

pub use store::{
    FileOptionStore,
    MemoryOptionStore,
    OptionStore,
    Secret,
    StoreError,
};

pub use status::{
    advance,
    AppPasswordState,
    AppPasswordStatus,
    ConnectionState,
    ConnectionStatus,
    StatusTracker,
};

pub use credentials::CredentialStore;

pub use probe::{
    resolve_probe,
    ApiClientFactory,
    ApiFault,
    ConstructorStyle,
    ProbeApi,
    ProbeCandidate,
    ProbeError,
    ResolvedProbe,
    PROBE_CANDIDATES,
};

pub use verifier::ConnectionVerifier;

pub use issuer::{
    IssueError,
    LocalPasswordIssuer,
    PasswordIssuer,
    UnavailableIssuer,
};

pub use password::{ApplicationPasswordManager, EnsureOutcome};

pub use notice::{Notice, NoticeKind, OutcomeCode};

pub use config::{
    is_local_dev_host,
    ApiConfig,
    ApiCredentials,
    DEFAULT_API_HOST,
};

pub use client::HttpApiFactory;

pub use service::{AdminGate, OperatorGate, SettingsService};

pub use error::MailtetherError;
