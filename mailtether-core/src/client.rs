//! Production API client factory backed by reqwest.
//!
//! [`HttpApiFactory`] implements the [`ApiClientFactory`] seam against the
//! real Mailtether HTTP API. It knows a subset of the probe candidate
//! resources; candidates it does not know fail construction, which sends the
//! resolver on to the next one.
//!
//! Relaxed TLS verification for local development hosts is double-gated: the
//! crate must be built with the `insecure-dev-transport` feature AND the
//! target host must match [`is_local_dev_host`]. It is loud in the logs when
//! active and can never apply to a production host.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::config::ApiCredentials;
use crate::probe::{ApiClientFactory, ApiFault, ConstructorStyle, ProbeApi};
use crate::store::Secret;

const USER_AGENT: &str = concat!("mailtether/", env!("CARGO_PKG_VERSION"));

/// Resources this client can probe, with the endpoint each method maps to.
fn endpoint_for(resource: &str, method: &str) -> Option<&'static str> {
    match (resource, method) {
        ("account", "get_account") => Some("account"),
        ("users", "get_current_user") => Some("me"),
        ("default", "ping") => Some("ping"),
        _ => None,
    }
}

/// Factory for HTTP probe clients against the Mailtether API.
///
/// Stateless; the target host and token arrive with the credentials at
/// construction time.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpApiFactory;

impl HttpApiFactory {
    pub fn new() -> Self {
        Self
    }

    fn configured_client(&self, host: &Url) -> Option<reqwest::Client> {
        let builder = reqwest::Client::builder().user_agent(USER_AGENT);
        let builder = apply_dev_transport(builder, host);
        builder.build().ok()
    }
}

/// Relax certificate verification when the target is a local development
/// host. Only compiled in with the `insecure-dev-transport` feature.
#[cfg(feature = "insecure-dev-transport")]
fn apply_dev_transport(builder: reqwest::ClientBuilder, host: &Url) -> reqwest::ClientBuilder {
    if crate::config::is_local_dev_host(host) {
        tracing::warn!(%host, "accepting invalid TLS certificates for a local development host");
        return builder.danger_accept_invalid_certs(true);
    }
    builder
}

#[cfg(not(feature = "insecure-dev-transport"))]
fn apply_dev_transport(builder: reqwest::ClientBuilder, _host: &Url) -> reqwest::ClientBuilder {
    builder
}

impl ApiClientFactory for HttpApiFactory {
    fn available(&self) -> bool {
        true
    }

    fn construct(
        &self,
        resource: &str,
        style: ConstructorStyle,
        credentials: &ApiCredentials,
    ) -> Option<Box<dyn ProbeApi>> {
        // Resources without an endpoint mapping can't be probed over HTTP.
        if !matches!(resource, "account" | "users" | "default") {
            return None;
        }

        let client = match style {
            ConstructorStyle::ConfiguredTransport => self.configured_client(&credentials.host)?,
            ConstructorStyle::TransportOnly => reqwest::Client::builder().build().ok()?,
            // A probe cannot run without a transport.
            ConstructorStyle::Bare => return None,
        };

        Some(Box::new(HttpProbeApi {
            client,
            resource: resource.to_string(),
            host: credentials.host.clone(),
            token: credentials.token.clone(),
        }))
    }
}

/// One constructed probe client bound to a resource, host, and token.
struct HttpProbeApi {
    client: reqwest::Client,
    resource: String,
    host: Url,
    token: Secret,
}

impl HttpProbeApi {
    fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.host.as_str().trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ProbeApi for HttpProbeApi {
    fn supports(&self, method: &str) -> bool {
        endpoint_for(&self.resource, method).is_some()
    }

    async fn call(&self, method: &str) -> Result<(), ApiFault> {
        let Some(path) = endpoint_for(&self.resource, method) else {
            return Err(ApiFault::Other {
                message: format!("unsupported probe method: {}", method),
            });
        };

        let url = self.endpoint_url(path);
        debug!(%url, "probing remote service");

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.token.expose())
            .send()
            .await
            .map_err(map_transport_fault)?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "probe succeeded");
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(ApiFault::Status {
                status: status.as_u16(),
                message,
            })
        }
    }
}

fn map_transport_fault(e: reqwest::Error) -> ApiFault {
    if e.is_connect() || e.is_timeout() {
        ApiFault::Network {
            message: e.to_string(),
        }
    } else {
        ApiFault::Other {
            message: e.to_string(),
        }
    }
}
