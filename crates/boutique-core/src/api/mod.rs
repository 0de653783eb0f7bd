//! ============================================================================
//! API Client - HTTP boundary to the boutique REST backend
//! ============================================================================
//! One request core shared by every endpoint:
//! - attaches the bearer token from persisted storage when present
//! - 204 resolves to an explicit empty value, never a JSON parse
//! - JSON failure bodies surface the server's message field
//! - non-JSON failure bodies surface the raw text
//! - non-JSON success bodies resolve to empty with a logged warning
//! - transport failures are wrapped into the uniform ApiError
//! ============================================================================

pub mod auth;
pub mod catalog;
pub mod checkout;

use std::sync::Arc;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::db::LocalStore;

/// Base path of the backend, matching the deployed boutique WAR.
pub const DEFAULT_API_BASE: &str = "http://localhost:8080/boutique_war/api";

/// Uniform error for everything that crosses the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend answered with a failure status. `message` is the
    /// server-provided message when one exists, otherwise a status-based
    /// fallback or the raw text body.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The request never produced an HTTP response.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered successfully but the body did not match the
    /// expected shape.
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

/// Thin client over the boutique REST backend.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<LocalStore>,
}

impl ApiClient {
    /// Create a client against the configured origin: BOUTIQUE_API_URL if
    /// set, otherwise the default local deployment.
    pub fn new(store: Arc<LocalStore>) -> Self {
        let base_url =
            std::env::var("BOUTIQUE_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Self::with_base_url(base_url, store)
    }

    /// Create a client against an explicit base URL.
    pub fn with_base_url(base_url: impl Into<String>, store: Arc<LocalStore>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            store,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The single request core. Resolves to `Value::Null` for empty results.
    pub(crate) async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, &url)
            .header(ACCEPT, "application/json");

        // Bearer token comes from persisted storage; a storage read failure
        // is treated as "no token" so catalog reads keep working.
        match self.store.load_token() {
            Ok(Some(token)) => {
                request = request.bearer_auth(token);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Could not read stored auth token: {}", e);
            }
        }

        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if is_json {
            let parsed: Value = serde_json::from_str(&text)
                .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

            if !status.is_success() {
                let message = parsed
                    .get("message")
                    .and_then(Value::as_str)
                    .or_else(|| parsed.get("error").and_then(Value::as_str))
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
                warn!("API error response from {}: {}", endpoint, message);
                return Err(ApiError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            return Ok(parsed);
        }

        if !status.is_success() {
            let message = if text.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                text
            };
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        // Success with a non-JSON body is a contract violation on the server
        // side; resolve to empty rather than breaking flows that tolerate
        // occasional empty bodies.
        if !text.trim().is_empty() {
            warn!("Received non-JSON response from {}: {}", endpoint, text);
        }
        Ok(Value::Null)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let value = self.request(Method::GET, endpoint, None).await?;
        serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Value,
    ) -> Result<T, ApiError> {
        let value = self.request(Method::POST, endpoint, Some(body)).await?;
        serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    pub(crate) async fn put_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Value,
    ) -> Result<T, ApiError> {
        let value = self.request(Method::PUT, endpoint, Some(body)).await?;
        serde_json::from_value(value).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    pub(crate) async fn delete(&self, endpoint: &str) -> Result<(), ApiError> {
        self.request(Method::DELETE, endpoint, None).await?;
        Ok(())
    }
}
