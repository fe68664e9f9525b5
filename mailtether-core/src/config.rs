//! API endpoint configuration.

use url::Url;

use crate::error::MailtetherError;
use crate::store::Secret;

/// Production endpoint of the Mailtether service.
pub const DEFAULT_API_HOST: &str = "https://api.mailtether.io/v1";

/// Configuration for outbound API calls.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: Url,
}

impl ApiConfig {
    pub fn new(api_host: Url) -> Self {
        Self { api_host }
    }

    /// Parse a host override, e.g. from the CLI config file.
    pub fn from_host_str(raw: &str) -> Result<Self, MailtetherError> {
        let api_host = Url::parse(raw).map_err(|e| MailtetherError::Config {
            message: format!("invalid API host '{}': {}", raw, e),
        })?;
        Ok(Self { api_host })
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_host: Url::parse(DEFAULT_API_HOST).expect("default API host is a valid URL"),
        }
    }
}

/// Credentials assembled for a probe: where to call and what to present.
#[derive(Debug, Clone)]
pub struct ApiCredentials {
    pub host: Url,
    pub token: Secret,
}

/// Whether `url` points at a local development host.
///
/// Matches `localhost`, `*.localhost`, and `*.test` hostnames only. Relaxed
/// TLS verification (the `insecure-dev-transport` feature) is confined to
/// hosts matching this check.
pub fn is_local_dev_host(url: &Url) -> bool {
    match url.host_str() {
        Some(host) => {
            host == "localhost" || host.ends_with(".localhost") || host.ends_with(".test")
        }
        None => false,
    }
}
