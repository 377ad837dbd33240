// ============================================
// File: crates/display-registrar/src/client.rs
// ============================================
//! # Registry API Client
//!
//! ## Creation Reason
//! Issues the single authenticated registration report per invocation.
//! One invocation maps to one scheduled run: failures are logged and
//! surfaced to the caller, and retry is left entirely to the next
//! scheduled run.
//!
//! ## Main Logical Flow
//! 1. Load the credential (fail fast when absent)
//! 2. Detect live device identity (abort before any network call when
//!    no usable address exists)
//! 3. One POST to the registry, classify the response
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never add in-process retries here; coarse-grained backoff is the
//!   external scheduler's fixed polling interval

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{info, warn};

use display_common::{Credential, CredentialStore, DeviceIdentity};

use crate::config::RegistryConfig;
use crate::error::{RegistrarError, Result};
use crate::models::{RegisterRequest, RegisterResponse, RegistrationOutcome};

/// HTTP client for the registry's registration endpoint.
pub struct RegistryClient {
    config: RegistryConfig,
    store: CredentialStore,
    http: Client,
}

impl RegistryClient {
    /// Creates a client with the configured request timeout.
    ///
    /// # Errors
    /// Returns `ClientBuild` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: RegistryConfig, store: CredentialStore) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RegistrarError::ClientBuild {
                reason: e.to_string(),
            })?;
        Ok(Self {
            config,
            store,
            http,
        })
    }

    /// Runs one full registration attempt against live system state.
    ///
    /// # Errors
    /// Returns an error for local misconfiguration (credential missing,
    /// no usable address - in both cases no HTTP request is issued) and
    /// for protocol violations. Registry rejection and network failure
    /// are reported as outcomes, not errors.
    pub async fn register(&self) -> Result<RegistrationOutcome> {
        let credential = self.store.load()?;
        let identity = DeviceIdentity::detect()?;
        self.register_as(&credential, &identity).await
    }

    /// Reports a pre-resolved identity. Used by [`register`] and by
    /// tests that need deterministic device facts.
    ///
    /// [`register`]: Self::register
    pub async fn register_as(
        &self,
        credential: &Credential,
        identity: &DeviceIdentity,
    ) -> Result<RegistrationOutcome> {
        let url = self.config.register_url();
        let request = RegisterRequest::new(credential, identity);

        let response = match self.http.post(&url).json(&request).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    url = %url,
                    hostname = %identity.hostname,
                    ip = %identity.ip,
                    error = %e,
                    "Registration report failed to reach registry"
                );
                return Ok(RegistrationOutcome::Unreachable {
                    reason: e.to_string(),
                });
            }
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(
                url = %url,
                hostname = %identity.hostname,
                ip = %identity.ip,
                status = status.as_u16(),
                "Registry rejected credential"
            );
            return Ok(RegistrationOutcome::Rejected {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            warn!(
                url = %url,
                hostname = %identity.hostname,
                ip = %identity.ip,
                status = status.as_u16(),
                "Registry returned unexpected status"
            );
            return Err(RegistrarError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body: RegisterResponse = response
            .json()
            .await
            .map_err(|e| RegistrarError::invalid_response(e.to_string()))?;

        let outcome = match body.status.as_str() {
            "new" => RegistrationOutcome::New,
            "updated" => RegistrationOutcome::Updated,
            other => {
                return Err(RegistrarError::invalid_response(format!(
                    "unknown status '{other}'"
                )))
            }
        };

        info!(
            hostname = %identity.hostname,
            ip = %identity.ip,
            outcome = %outcome,
            "Registration report accepted"
        );
        Ok(outcome)
    }

    /// Returns the registry configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_identity() -> DeviceIdentity {
        DeviceIdentity::new("kiosk-01", Ipv4Addr::new(192, 168, 1, 20)).unwrap()
    }

    fn test_credential() -> Credential {
        Credential::new("ab".repeat(32)).unwrap()
    }

    async fn client_for(server: &MockServer) -> RegistryClient {
        let config = RegistryConfig {
            base_url: server.uri(),
            request_timeout_secs: 2,
            ..Default::default()
        };
        let store = CredentialStore::new("/nonexistent/api-key");
        RegistryClient::new(config, store).unwrap()
    }

    #[tokio::test]
    async fn test_register_new_device() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/register-pi"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "new",
                "device": {"hostname": "kiosk-01"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let outcome = client
            .register_as(&test_credential(), &test_identity())
            .await
            .unwrap();
        assert_eq!(outcome, RegistrationOutcome::New);
    }

    #[tokio::test]
    async fn test_register_sends_exact_report_body() {
        let server = MockServer::start().await;
        let expected = serde_json::json!({
            "apiKey": "ab".repeat(32),
            "hostname": "kiosk-01",
            "ip": "192.168.1.20"
        });
        Mock::given(method("POST"))
            .and(path("/api/register-pi"))
            .and(body_json(&expected))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "updated"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let outcome = client
            .register_as(&test_credential(), &test_identity())
            .await
            .unwrap();
        assert_eq!(outcome, RegistrationOutcome::Updated);
    }

    #[tokio::test]
    async fn test_rejected_credential_is_an_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let outcome = client
            .register_as(&test_credential(), &test_identity())
            .await
            .unwrap();
        assert_eq!(outcome, RegistrationOutcome::Rejected { status: 401 });
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_registry_server_error_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .register_as(&test_credential(), &test_identity())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegistrarError::UnexpectedStatus { status: 500 }
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .register_as(&test_credential(), &test_identity())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrarError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_unknown_status_field_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "maybe"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .register_as(&test_credential(), &test_identity())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistrarError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        // Bind-then-drop guarantees a closed port.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = RegistryConfig {
            base_url: format!("http://{addr}"),
            request_timeout_secs: 2,
            ..Default::default()
        };
        let client =
            RegistryClient::new(config, CredentialStore::new("/nonexistent/api-key")).unwrap();

        let outcome = client
            .register_as(&test_credential(), &test_identity())
            .await
            .unwrap();
        assert!(matches!(outcome, RegistrationOutcome::Unreachable { .. }));
    }

    #[tokio::test]
    async fn test_missing_credential_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = RegistryConfig {
            base_url: server.uri(),
            ..Default::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("api-key"));
        let client = RegistryClient::new(config, store).unwrap();

        let err = client.register().await.unwrap_err();
        assert!(err.is_configuration_error());
    }
}
