//! Crate-level error type.
//!
//! Remote and provisioning faults are recorded into status records by the
//! verifier and password manager rather than surfaced here; what remains are
//! validation, authorization, availability, and infrastructure failures.

use thiserror::Error;

use crate::probe::ProbeError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum MailtetherError {
    /// The gate refused the request; nothing was read or written.
    #[error("not authorized to manage Mailtether settings")]
    Unauthorized,

    /// A token save was attempted with empty input.
    #[error("access token must not be empty")]
    EmptyToken,

    /// Option storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The connectivity probe could not be resolved.
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// Invalid configuration.
    #[error("configuration error: {message}")]
    Config { message: String },
}
