//! Smart Solutions Platform HTTP client.
//!
//! The platform exposes two endpoints this service calls: instance
//! registration and an authenticated connection test. Both sit behind the
//! [`PlatformClient`] trait so the connection manager's state machine is
//! unit-testable without network I/O.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Registration payload sent to `POST /api/odoo/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegistrationRequest {
    pub company_name: String,
    pub admin_email: String,
    pub admin_name: String,
    /// Externally reachable base URL of this instance.
    pub odoo_url: String,
    /// Local database/tenant identifier.
    pub odoo_database: String,
    /// Login of the user who triggered the registration.
    pub odoo_username: String,
    /// Locally generated communication token authenticating this instance.
    pub odoo_api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Credentials issued by the platform on successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationAccepted {
    /// Platform-assigned account identifier, already stringified.
    pub account_id: String,
    /// Bearer credential for subsequent authenticated calls.
    pub sso_token: String,
}

/// Raw response body of the register endpoint.
#[derive(Debug, Deserialize)]
struct RegisterResponseBody {
    success: bool,
    #[serde(default)]
    account_id: Option<serde_json::Value>,
    #[serde(default)]
    sso_token: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Failures reported by the platform or the transport beneath it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    /// HTTP 200 with `success: false`.
    #[error("platform rejected the request: {message}")]
    Rejected { message: String },
    /// HTTP 409: the admin email is already registered on the platform.
    #[error("email already registered on the platform")]
    Conflict,
    /// Any other HTTP status.
    #[error("unexpected platform response HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    /// Timeout, connection refused, DNS failure and friends.
    #[error("platform unreachable: {details}")]
    Transport { details: String },
}

impl PlatformError {
    fn from_transport(err: reqwest::Error) -> Self {
        PlatformError::Transport {
            details: err.to_string(),
        }
    }
}

/// Narrow interface over the platform's two endpoints.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Registers this instance, returning the issued credentials.
    async fn register(
        &self,
        base_url: &str,
        payload: &RegistrationRequest,
    ) -> Result<RegistrationAccepted, PlatformError>;

    /// Probes the platform with the issued API key.
    async fn test_connection(&self, base_url: &str, api_key: &str) -> Result<(), PlatformError>;
}

/// reqwest-backed [`PlatformClient`] with explicit per-call timeouts.
#[derive(Debug, Clone)]
pub struct HttpPlatformClient {
    client: reqwest::Client,
    register_timeout: Duration,
    test_timeout: Duration,
}

impl HttpPlatformClient {
    pub fn new(register_timeout: Duration, test_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            register_timeout,
            test_timeout,
        }
    }
}

impl Default for HttpPlatformClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), Duration::from_secs(10))
    }
}

#[async_trait]
impl PlatformClient for HttpPlatformClient {
    async fn register(
        &self,
        base_url: &str,
        payload: &RegistrationRequest,
    ) -> Result<RegistrationAccepted, PlatformError> {
        let url = format!("{}/api/odoo/register", base_url.trim_end_matches('/'));
        debug!(company_name = %payload.company_name, "Sending registration request");

        let response = self
            .client
            .post(&url)
            .timeout(self.register_timeout)
            .json(payload)
            .send()
            .await
            .map_err(PlatformError::from_transport)?;

        let status = response.status();
        match status.as_u16() {
            200 => {
                let body: RegisterResponseBody = response
                    .json()
                    .await
                    .map_err(PlatformError::from_transport)?;
                if body.success {
                    // account_id may arrive as a number or a string.
                    let account_id = match body.account_id {
                        Some(serde_json::Value::String(s)) => s,
                        Some(other) => other.to_string(),
                        None => String::new(),
                    };
                    Ok(RegistrationAccepted {
                        account_id,
                        sso_token: body.sso_token.unwrap_or_default(),
                    })
                } else {
                    Err(PlatformError::Rejected {
                        message: body.message.unwrap_or_else(|| "Unknown error".to_string()),
                    })
                }
            }
            409 => Err(PlatformError::Conflict),
            code => {
                let body = response.text().await.unwrap_or_default();
                Err(PlatformError::UnexpectedStatus { status: code, body })
            }
        }
    }

    async fn test_connection(&self, base_url: &str, api_key: &str) -> Result<(), PlatformError> {
        let url = format!("{}/api/odoo/test-connection", base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .timeout(self.test_timeout)
            .bearer_auth(api_key)
            .json(&serde_json::json!({ "test": true }))
            .send()
            .await
            .map_err(PlatformError::from_transport)?;

        let status = response.status();
        if status.as_u16() == 200 {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(PlatformError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            })
        }
    }
}
