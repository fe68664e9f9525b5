//! Discovery-based API probe resolution.
//!
//! The remote client surface differs between installations, so the probe to
//! use for a connection test is not known at compile time. This module
//! resolves one at runtime from a declarative candidate table:
//!
//! - [`ProbeCandidate`] - A resource with its method names in preference order
//! - [`ConstructorStyle`] - Degrading construction sequence for a client
//! - [`ApiClientFactory`] / [`ProbeApi`] - The seam to the actual transport
//! - [`resolve_probe`] - Walks candidates and styles, returns the first match
//!
//! Resolution is pure: it never touches stored state and performs no network
//! calls. `supports` is a local capability check; the single network call
//! happens later through [`ProbeApi::call`].

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::config::ApiCredentials;

/// A probe candidate: one API resource and its methods in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeCandidate {
    pub resource: &'static str,
    pub methods: &'static [&'static str],
}

/// Candidates considered for the connectivity probe, most specific first.
///
/// Account-level reads are preferred because they exercise the same
/// authorization scope the integration needs; the trailing `ping` candidates
/// exist for stripped-down installations.
pub const PROBE_CANDIDATES: &[ProbeCandidate] = &[
    ProbeCandidate {
        resource: "account",
        methods: &["get_account"],
    },
    ProbeCandidate {
        resource: "accounts",
        methods: &["get_account", "list_accounts"],
    },
    ProbeCandidate {
        resource: "users",
        methods: &["get_current_user", "get_me", "get_user"],
    },
    ProbeCandidate {
        resource: "default",
        methods: &["ping", "get_ping"],
    },
];

/// How much configuration a client construction attempt carries.
///
/// Tried in declaration order; the first style the factory accepts wins and
/// no further styles are attempted for that candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructorStyle {
    /// Full transport with host configuration applied.
    ConfiguredTransport,
    /// A default transport without host-specific configuration.
    TransportOnly,
    /// No transport arguments at all.
    Bare,
}

impl ConstructorStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstructorStyle::ConfiguredTransport => "configured_transport",
            ConstructorStyle::TransportOnly => "transport_only",
            ConstructorStyle::Bare => "bare",
        }
    }
}

impl std::fmt::Display for ConstructorStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Degradation order for construction attempts.
pub const CONSTRUCTOR_STYLES: &[ConstructorStyle] = &[
    ConstructorStyle::ConfiguredTransport,
    ConstructorStyle::TransportOnly,
    ConstructorStyle::Bare,
];

/// A fault returned by the remote API during a probe call.
#[derive(Debug, Error)]
pub enum ApiFault {
    /// The service responded with a non-success status code.
    #[error("API returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The service could not be reached.
    #[error("network error: {message}")]
    Network { message: String },

    /// Any other failure in the client.
    #[error("API client error: {message}")]
    Other { message: String },
}

/// Errors resolving a probe. These are availability faults: nothing was
/// invoked remotely and no connection verdict can be drawn from them.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The client library is not present on this installation.
    #[error("the API client library is not available")]
    SdkUnavailable,

    /// Every candidate failed to construct or supported none of its methods.
    #[error("no supported connectivity probe could be resolved")]
    NoSupportedProbe,
}

/// A constructed client plus one method name it has confirmed support for.
pub struct ResolvedProbe {
    pub api: Box<dyn ProbeApi>,
    pub method: &'static str,
}

impl std::fmt::Debug for ResolvedProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedProbe")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

/// A constructed API client capable of a connectivity probe.
#[async_trait]
pub trait ProbeApi: Send + Sync {
    /// Local capability check; no network traffic.
    fn supports(&self, method: &str) -> bool;

    /// Invoke the probe method once against the remote service.
    async fn call(&self, method: &str) -> Result<(), ApiFault>;
}

/// Constructs probe clients for named API resources.
pub trait ApiClientFactory: Send + Sync {
    /// Whether the client library is present at all.
    fn available(&self) -> bool;

    /// Attempt to construct a client for `resource` with the given style.
    ///
    /// Returns `None` when the resource is unknown or the style is not
    /// constructible; the resolver then degrades to the next style.
    fn construct(
        &self,
        resource: &str,
        style: ConstructorStyle,
        credentials: &ApiCredentials,
    ) -> Option<Box<dyn ProbeApi>>;
}

/// Resolve the connectivity probe to use.
///
/// Walks `candidates` in order. For each, construction is attempted over the
/// degrading [`CONSTRUCTOR_STYLES`]; the first successful construction is
/// final for that candidate. The first method in the candidate's preference
/// list the instance `supports` resolves the probe. A constructed instance
/// supporting none of the listed methods sends resolution to the next
/// candidate.
pub fn resolve_probe(
    factory: &dyn ApiClientFactory,
    candidates: &[ProbeCandidate],
    credentials: &ApiCredentials,
) -> Result<ResolvedProbe, ProbeError> {
    if !factory.available() {
        return Err(ProbeError::SdkUnavailable);
    }

    for candidate in candidates {
        let Some(api) = construct_degrading(factory, candidate.resource, credentials) else {
            debug!(resource = candidate.resource, "candidate not constructible");
            continue;
        };

        for &method in candidate.methods {
            if api.supports(method) {
                debug!(
                    resource = candidate.resource,
                    method, "resolved connectivity probe"
                );
                return Ok(ResolvedProbe { api, method });
            }
        }

        debug!(
            resource = candidate.resource,
            "constructed client supports none of the candidate methods"
        );
    }

    Err(ProbeError::NoSupportedProbe)
}

fn construct_degrading(
    factory: &dyn ApiClientFactory,
    resource: &str,
    credentials: &ApiCredentials,
) -> Option<Box<dyn ProbeApi>> {
    for style in CONSTRUCTOR_STYLES {
        if let Some(api) = factory.construct(resource, *style, credentials) {
            debug!(resource, style = %style, "constructed probe client");
            return Some(api);
        }
    }
    None
}
