//! Connection verification against the remote service.
//!
//! [`ConnectionVerifier::test_connection`] runs the whole procedure: obtain
//! the token, resolve a probe ([`crate::probe`]), invoke it exactly once, and
//! classify the result into a connection-status write. Remote faults are
//! recorded, never propagated; availability faults (no client library, no
//! resolvable probe) propagate without any status write, because they say
//! nothing about whether the credentials work.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{ApiConfig, ApiCredentials};
use crate::credentials::CredentialStore;
use crate::error::MailtetherError;
use crate::notice::OutcomeCode;
use crate::probe::{resolve_probe, ApiClientFactory, ApiFault, PROBE_CANDIDATES};
use crate::status::{ConnectionState, ConnectionStatus, StatusTracker};
use crate::store::{OptionStore, Secret};

const MSG_NO_TOKEN: &str = "No access token is saved.";
const MSG_SUCCESS: &str = "Connection successful.";
const MSG_UNAUTHORIZED: &str = "Unauthorized. Please check the token.";
const MSG_NETWORK: &str = "Network error. Please try again.";
const MSG_API_ERROR: &str = "The Mailtether API returned an error.";
const MSG_UNEXPECTED: &str = "Unexpected error while testing the connection.";

/// Runs connection tests and records their verdicts.
pub struct ConnectionVerifier<S: OptionStore, F: ApiClientFactory> {
    credentials: CredentialStore<S>,
    status: StatusTracker<S>,
    factory: Arc<F>,
    config: ApiConfig,
}

impl<S: OptionStore, F: ApiClientFactory> ConnectionVerifier<S, F> {
    pub fn new(
        credentials: CredentialStore<S>,
        status: StatusTracker<S>,
        factory: Arc<F>,
        config: ApiConfig,
    ) -> Self {
        Self {
            credentials,
            status,
            factory,
            config,
        }
    }

    /// Test connectivity with the stored token.
    ///
    /// Every path writes the connection status exactly once, except an `Err`
    /// from probe resolution, which leaves the stored verdict untouched.
    pub async fn test_connection(&self) -> Result<OutcomeCode, MailtetherError> {
        let token = self.credentials.access_token().await?;
        if token.is_empty() {
            self.status
                .set_connection_status(ConnectionStatus::new(
                    ConnectionState::NotConnected,
                    MSG_NO_TOKEN,
                ))
                .await?;
            return Ok(OutcomeCode::TokenMissing);
        }

        let credentials = ApiCredentials {
            host: self.config.api_host.clone(),
            token: Secret::new(token),
        };

        let resolved = resolve_probe(self.factory.as_ref(), PROBE_CANDIDATES, &credentials)?;

        match resolved.api.call(resolved.method).await {
            Ok(()) => {
                info!(method = resolved.method, "connection test succeeded");
                self.status
                    .set_connection_status(ConnectionStatus::new(
                        ConnectionState::Connected,
                        MSG_SUCCESS,
                    ))
                    .await?;
                Ok(OutcomeCode::ConnectionSuccess)
            }
            Err(fault) => {
                let message = classify_fault(&fault);
                warn!(method = resolved.method, %fault, "connection test failed");
                self.status
                    .set_connection_status(ConnectionStatus::new(
                        ConnectionState::NotConnected,
                        message,
                    ))
                    .await?;
                Ok(OutcomeCode::ConnectionFailed)
            }
        }
    }
}

/// Map a remote fault to the stored status message.
///
/// Status 0 means the client never got an HTTP response and is treated as a
/// network problem.
fn classify_fault(fault: &ApiFault) -> &'static str {
    match fault {
        ApiFault::Status {
            status: 401 | 403, ..
        } => MSG_UNAUTHORIZED,
        ApiFault::Status { status: 0, .. } | ApiFault::Network { .. } => MSG_NETWORK,
        ApiFault::Status { .. } => MSG_API_ERROR,
        ApiFault::Other { .. } => MSG_UNEXPECTED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{ConstructorStyle, ProbeApi, ProbeError};
    use crate::store::MemoryOptionStore;
    use async_trait::async_trait;

    #[derive(Debug, Clone, Copy)]
    enum Behavior {
        Succeed,
        Status(u16),
        Network,
        Other,
    }

    struct TestApi {
        behavior: Behavior,
    }

    #[async_trait]
    impl ProbeApi for TestApi {
        fn supports(&self, method: &str) -> bool {
            method == "get_account"
        }

        async fn call(&self, _method: &str) -> Result<(), ApiFault> {
            match self.behavior {
                Behavior::Succeed => Ok(()),
                Behavior::Status(status) => Err(ApiFault::Status {
                    status,
                    message: "remote refused".to_string(),
                }),
                Behavior::Network => Err(ApiFault::Network {
                    message: "connection refused".to_string(),
                }),
                Behavior::Other => Err(ApiFault::Other {
                    message: "marshaling failure".to_string(),
                }),
            }
        }
    }

    struct TestFactory {
        available: bool,
        constructible: bool,
        behavior: Behavior,
    }

    impl TestFactory {
        fn with_behavior(behavior: Behavior) -> Self {
            Self {
                available: true,
                constructible: true,
                behavior,
            }
        }
    }

    impl ApiClientFactory for TestFactory {
        fn available(&self) -> bool {
            self.available
        }

        fn construct(
            &self,
            _resource: &str,
            _style: ConstructorStyle,
            _credentials: &ApiCredentials,
        ) -> Option<Box<dyn ProbeApi>> {
            if self.constructible {
                Some(Box::new(TestApi {
                    behavior: self.behavior,
                }))
            } else {
                None
            }
        }
    }

    async fn verifier_with(
        factory: TestFactory,
        token: Option<&str>,
    ) -> (
        ConnectionVerifier<MemoryOptionStore, TestFactory>,
        StatusTracker<MemoryOptionStore>,
    ) {
        let store = Arc::new(MemoryOptionStore::new());
        let credentials = CredentialStore::new(Arc::clone(&store));
        if let Some(token) = token {
            credentials.save_token(token).await.unwrap();
        }

        let status = StatusTracker::new(Arc::clone(&store));
        let verifier = ConnectionVerifier::new(
            credentials,
            status.clone(),
            Arc::new(factory),
            ApiConfig::default(),
        );
        (verifier, status)
    }

    #[tokio::test]
    async fn test_missing_token_records_not_connected() {
        let (verifier, status) =
            verifier_with(TestFactory::with_behavior(Behavior::Succeed), None).await;

        let outcome = verifier.test_connection().await.unwrap();
        assert_eq!(outcome, OutcomeCode::TokenMissing);

        let record = status.connection_status().await.unwrap();
        assert_eq!(record.state, ConnectionState::NotConnected);
        assert_eq!(record.message, MSG_NO_TOKEN);
        assert!(record.tested_at.is_some());
    }

    #[tokio::test]
    async fn test_successful_probe_records_connected() {
        let (verifier, status) =
            verifier_with(TestFactory::with_behavior(Behavior::Succeed), Some("tok")).await;

        let outcome = verifier.test_connection().await.unwrap();
        assert_eq!(outcome, OutcomeCode::ConnectionSuccess);

        let record = status.connection_status().await.unwrap();
        assert_eq!(record.state, ConnectionState::Connected);
        assert_eq!(record.message, MSG_SUCCESS);
        assert!(record.tested_at.is_some());
    }

    #[tokio::test]
    async fn test_unauthorized_statuses() {
        for code in [401u16, 403] {
            let (verifier, status) = verifier_with(
                TestFactory::with_behavior(Behavior::Status(code)),
                Some("tok"),
            )
            .await;

            let outcome = verifier.test_connection().await.unwrap();
            assert_eq!(outcome, OutcomeCode::ConnectionFailed);

            let record = status.connection_status().await.unwrap();
            assert_eq!(record.state, ConnectionState::NotConnected);
            assert_eq!(record.message, MSG_UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_network_faults_classified() {
        for behavior in [Behavior::Network, Behavior::Status(0)] {
            let (verifier, status) =
                verifier_with(TestFactory::with_behavior(behavior), Some("tok")).await;

            verifier.test_connection().await.unwrap();
            let record = status.connection_status().await.unwrap();
            assert_eq!(record.message, MSG_NETWORK);
        }
    }

    #[tokio::test]
    async fn test_server_error_classified_as_api_error() {
        let (verifier, status) = verifier_with(
            TestFactory::with_behavior(Behavior::Status(500)),
            Some("tok"),
        )
        .await;

        verifier.test_connection().await.unwrap();
        let record = status.connection_status().await.unwrap();
        assert_eq!(record.message, MSG_API_ERROR);
    }

    #[tokio::test]
    async fn test_other_fault_classified_as_unexpected() {
        let (verifier, status) =
            verifier_with(TestFactory::with_behavior(Behavior::Other), Some("tok")).await;

        verifier.test_connection().await.unwrap();
        let record = status.connection_status().await.unwrap();
        assert_eq!(record.message, MSG_UNEXPECTED);
    }

    #[tokio::test]
    async fn test_unavailable_sdk_leaves_status_untouched() {
        let factory = TestFactory {
            available: false,
            constructible: false,
            behavior: Behavior::Succeed,
        };
        let (verifier, status) = verifier_with(factory, Some("tok")).await;

        let err = verifier.test_connection().await.unwrap_err();
        assert!(matches!(
            err,
            MailtetherError::Probe(ProbeError::SdkUnavailable)
        ));

        // Saving the token reset the status; the failed resolution must not
        // have replaced that record.
        let record = status.connection_status().await.unwrap();
        assert_eq!(record.state, ConnectionState::NotTested);
    }

    #[tokio::test]
    async fn test_unresolvable_probe_leaves_status_untouched() {
        let factory = TestFactory {
            available: true,
            constructible: false,
            behavior: Behavior::Succeed,
        };
        let (verifier, status) = verifier_with(factory, Some("tok")).await;

        let err = verifier.test_connection().await.unwrap_err();
        assert!(matches!(
            err,
            MailtetherError::Probe(ProbeError::NoSupportedProbe)
        ));

        let record = status.connection_status().await.unwrap();
        assert_eq!(record.state, ConnectionState::NotTested);
    }
}
