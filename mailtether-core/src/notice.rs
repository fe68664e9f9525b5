//! Outcome codes and user-facing notice routing.
//!
//! Every mutating operation on the settings surface finishes with an
//! [`OutcomeCode`]. The code travels in stable snake_case form (the CLI
//! prints it, a web front end would put it in a redirect parameter) and maps
//! to exactly one [`Notice`] here. The lookup is pure: no state, no side
//! effects, and unknown raw strings resolve to nothing rather than an error.

/// Stable code describing how a settings operation concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeCode {
    TokenSaved,
    TokenMissing,
    ConnectionSuccess,
    ConnectionFailed,
    SdkUnavailable,
    SyncEnabled,
    SyncDisabled,
    PasswordRegenerated,
    PasswordFailed,
    PasswordUnavailable,
}

impl OutcomeCode {
    /// Wire form of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeCode::TokenSaved => "token_saved",
            OutcomeCode::TokenMissing => "token_missing",
            OutcomeCode::ConnectionSuccess => "connection_success",
            OutcomeCode::ConnectionFailed => "connection_failed",
            OutcomeCode::SdkUnavailable => "sdk_unavailable",
            OutcomeCode::SyncEnabled => "sync_enabled",
            OutcomeCode::SyncDisabled => "sync_disabled",
            OutcomeCode::PasswordRegenerated => "password_regenerated",
            OutcomeCode::PasswordFailed => "password_failed",
            OutcomeCode::PasswordUnavailable => "password_unavailable",
        }
    }

    /// Parse the wire form. Unknown strings are absent, not an error.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "token_saved" => Some(OutcomeCode::TokenSaved),
            "token_missing" => Some(OutcomeCode::TokenMissing),
            "connection_success" => Some(OutcomeCode::ConnectionSuccess),
            "connection_failed" => Some(OutcomeCode::ConnectionFailed),
            "sdk_unavailable" => Some(OutcomeCode::SdkUnavailable),
            "sync_enabled" => Some(OutcomeCode::SyncEnabled),
            "sync_disabled" => Some(OutcomeCode::SyncDisabled),
            "password_regenerated" => Some(OutcomeCode::PasswordRegenerated),
            "password_failed" => Some(OutcomeCode::PasswordFailed),
            "password_unavailable" => Some(OutcomeCode::PasswordUnavailable),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a notice reports success or a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A user-facing notice for one outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: &'static str,
}

impl Notice {
    /// The notice for a known outcome code.
    pub fn for_code(code: OutcomeCode) -> Self {
        let (kind, message) = match code {
            OutcomeCode::TokenSaved => (NoticeKind::Success, "Access token saved."),
            OutcomeCode::TokenMissing => {
                (NoticeKind::Error, "No access token saved. Enter a token first.")
            }
            OutcomeCode::ConnectionSuccess => (NoticeKind::Success, "Connection successful."),
            OutcomeCode::ConnectionFailed => (
                NoticeKind::Error,
                "Connection test failed. See the connection status for details.",
            ),
            OutcomeCode::SdkUnavailable => (
                NoticeKind::Error,
                "The Mailtether API client is not available on this site.",
            ),
            OutcomeCode::SyncEnabled => (NoticeKind::Success, "Content sync enabled."),
            OutcomeCode::SyncDisabled => (NoticeKind::Success, "Content sync disabled."),
            OutcomeCode::PasswordRegenerated => (
                NoticeKind::Success,
                "Application password regenerated. Reveal it within 10 minutes.",
            ),
            OutcomeCode::PasswordFailed => (
                NoticeKind::Error,
                "Could not provision the application password. See the password status for details.",
            ),
            OutcomeCode::PasswordUnavailable => (
                NoticeKind::Error,
                "Application passwords are not available on this site.",
            ),
        };
        Self { kind, message }
    }

    /// Resolve a notice from the wire form of a code.
    pub fn lookup(raw: &str) -> Option<Self> {
        OutcomeCode::parse(raw).map(Self::for_code)
    }
}
