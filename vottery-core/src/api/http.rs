//! Shared HTTP plumbing for the backend collaborators.
//!
//! All Vottery backend responses use a `{success: bool, ...}` JSON envelope.
//! GET requests retry transient failures with exponential backoff; POST
//! requests are single-shot because the wallet and subscription endpoints
//! are not idempotent.

use backoff::{future::retry_notify, ExponentialBackoff};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Result, VotteryError};

/// Default API base path served by the Vottery deployment.
const DEFAULT_BASE_URL: &str = "https://app.vottery.com/api";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of retry attempts for transient GET failures.
const MAX_RETRIES: u32 = 3;

/// Initial retry interval.
const INITIAL_INTERVAL: Duration = Duration::from_millis(100);

/// Maximum retry interval.
const MAX_INTERVAL: Duration = Duration::from_secs(2);

/// Configuration shared by the API clients.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL including the `/api` path segment.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for transient GET errors.
    pub max_retries: u32,
    /// Bearer token attached to every request when present.
    pub auth_token: Option<String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("VOTTERY_API_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            timeout: DEFAULT_TIMEOUT,
            max_retries: MAX_RETRIES,
            auth_token: None,
        }
    }
}

/// Thin wrapper over `reqwest` carrying the envelope and retry conventions.
pub(crate) struct HttpClient {
    client: Client,
    config: ApiClientConfig,
}

impl HttpClient {
    pub(crate) fn new(config: ApiClientConfig) -> Result<Self> {
        debug!(base_url = %config.base_url, "Creating API client");
        let client = Client::builder().timeout(config.timeout).build().map_err(|e| {
            warn!(error = %e, "Failed to create HTTP client");
            VotteryError::ApiError(format!("Failed to create HTTP client: {e}"))
        })?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Check if an error is transient and should be retried.
    fn is_transient_error(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect() || error.is_request()
    }

    /// Check if an HTTP status code indicates a transient error.
    fn is_transient_status(status: StatusCode) -> bool {
        matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT
                | StatusCode::BAD_GATEWAY
        )
    }

    fn build_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: INITIAL_INTERVAL,
            max_interval: MAX_INTERVAL,
            max_elapsed_time: Some(self.config.timeout * self.config.max_retries),
            ..Default::default()
        }
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<T, backoff::Error<VotteryError>> {
        let response = request.send().await.map_err(|e| {
            if Self::is_transient_error(&e) {
                warn!(error = %e, "Transient request error, will retry");
                backoff::Error::transient(VotteryError::ApiError(format!(
                    "Transient error (will retry): {e}"
                )))
            } else {
                backoff::Error::permanent(VotteryError::HttpError(e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let err = VotteryError::ApiError(format!("API returned status: {status}"));
            return if Self::is_transient_status(status) {
                warn!(status = %status, "Transient HTTP status, will retry");
                Err(backoff::Error::transient(err))
            } else {
                Err(backoff::Error::permanent(err))
            };
        }

        let value: Value = response.json().await.map_err(|e| {
            backoff::Error::permanent(VotteryError::ApiError(format!(
                "Failed to parse API response: {e}"
            )))
        })?;

        unwrap_envelope(value).map_err(backoff::Error::permanent)
    }

    /// GET with transient-error retry.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        retry_notify(
            self.build_backoff(),
            || async {
                let request = self.authorize(self.client.get(&url));
                self.send_once(request).await
            },
            |err: VotteryError, duration: Duration| {
                warn!(
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Retry scheduled"
                );
            },
        )
        .await
    }

    /// POST, single attempt.
    pub(crate) async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let request = self.authorize(self.client.post(&url)).json(body);
        self.send_once(request).await.map_err(|e| match e {
            backoff::Error::Permanent(err) => err,
            backoff::Error::Transient { err, .. } => err,
        })
    }
}

/// Validate the `{success, ...}` envelope and deserialize the body.
pub(crate) fn unwrap_envelope<T: DeserializeOwned>(value: Value) -> Result<T> {
    let success = value
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !success {
        let message = value
            .get("error")
            .or_else(|| value.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_string();
        return Err(VotteryError::ApiError(message));
    }
    serde_json::from_value(value).map_err(|e| VotteryError::SerializationError(e.to_string()))
}
