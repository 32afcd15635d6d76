//! HTTP client for the remote generation API

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::backend::traits::RemoteClient;
use crate::config::{ApiKeyPlacement, RemoteConfig};
use crate::error::{AppError, Result};
use crate::model::result::GenerationResult;

/// Bounded retry with linear backoff for job submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    /// Wait before attempt `n + 1` is `n * backoff_unit`
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt
    }
}

/// Error body returned by the remote on failures
#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    #[serde(default)]
    message: Option<serde_json::Value>,
}

impl RemoteErrorBody {
    fn message(&self) -> Option<String> {
        match &self.message {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) if s.is_empty() => None,
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

/// Remote generation API over HTTP
pub struct HttpRemoteClient {
    client: Client,
    base_url: String,
    api_key: String,
    key_placement: ApiKeyPlacement,
    retry: RetryPolicy,
}

impl HttpRemoteClient {
    /// Create a new client from configuration
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("text2img-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            key_placement: config.api_key_placement,
            retry: RetryPolicy {
                max_attempts: config.max_retries.max(1),
                backoff_unit: config.retry_backoff(),
            },
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.api_key)
    }

    /// Send a request, retrying transport failures and 5xx responses.
    ///
    /// Anything below 500 is returned on the spot: a rejected request will be
    /// rejected again.
    async fn send_with_retry<F>(&self, url: &str, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let max_attempts = self.retry.max_attempts;
        let mut last_failure = None;

        for attempt in 1..=max_attempts {
            debug!(attempt, max_attempts, url = %url, "Sending request to remote API");

            match build().send().await {
                Ok(response) if response.status().as_u16() < 500 => return Ok(response),
                Ok(response) => {
                    warn!(
                        attempt,
                        status = %response.status(),
                        url = %url,
                        "Remote API returned server error"
                    );
                    last_failure = Some(Ok(response));
                }
                Err(e) => {
                    warn!(attempt, error = %e, url = %url, "Remote API request failed");
                    last_failure = Some(Err(e));
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.retry.delay_after(attempt)).await;
            }
        }

        match last_failure {
            // The final 5xx is classified like any other error response.
            Some(Ok(response)) => Ok(response),
            Some(Err(e)) => Err(AppError::ExternalApi(format!(
                "HTTP request failed after {} attempts: {}",
                max_attempts, e
            ))),
            None => Err(AppError::Internal("No request attempt was made".to_string())),
        }
    }

    /// Decode a 2xx body, or turn anything else into a classified error
    async fn read_response(&self, response: Response) -> Result<GenerationResult> {
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::ExternalApi(format!("Failed to read response body: {}", e))
        })?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        serde_json::from_str::<GenerationResult>(&body)
            .map(GenerationResult::normalized)
            .map_err(|e| AppError::ExternalApi(format!("Failed to decode response: {}", e)))
    }
}

/// Map a non-2xx response onto the error taxonomy
pub(crate) fn classify_error(status: StatusCode, body: &str) -> AppError {
    debug!(status = %status, body = %body, "Received error response");

    let parsed = serde_json::from_str::<RemoteErrorBody>(body).ok();
    let remote_message = parsed.as_ref().and_then(RemoteErrorBody::message);

    match status {
        StatusCode::UNAUTHORIZED => {
            AppError::Unauthorized("Invalid or missing API key".to_string())
        }
        StatusCode::BAD_REQUEST => AppError::InvalidRequest(
            remote_message.unwrap_or_else(|| "Invalid request parameters".to_string()),
        ),
        StatusCode::TOO_MANY_REQUESTS => AppError::ExternalApi("rate limit exceeded".to_string()),
        _ => match (parsed, remote_message) {
            (_, Some(message)) => AppError::ExternalApi(message),
            (Some(_), None) => AppError::ExternalApi(format!(
                "Unexpected API error with status code {}",
                status.as_u16()
            )),
            (None, None) if body.to_lowercase().contains("cloudflare") => AppError::ExternalApi(
                format!("Request blocked by Cloudflare (status code {})", status.as_u16()),
            ),
            (None, None) => AppError::ExternalApi(format!(
                "API error with status code {}: {}",
                status.as_u16(),
                body
            )),
        },
    }
}

#[async_trait]
impl RemoteClient for HttpRemoteClient {
    async fn submit(&self, path: &str, mut body: serde_json::Value) -> Result<GenerationResult> {
        let url = self.url(path);

        if self.key_placement == ApiKeyPlacement::Body {
            if let Some(fields) = body.as_object_mut() {
                fields.insert(
                    "key".to_string(),
                    serde_json::Value::String(self.api_key.clone()),
                );
            }
        }

        let response = self
            .send_with_retry(&url, || {
                let builder = self.client.post(&url).json(&body);
                match self.key_placement {
                    ApiKeyPlacement::Header => self.bearer(builder),
                    ApiKeyPlacement::Body => builder,
                }
            })
            .await?;

        self.read_response(response).await
    }

    async fn poll(&self, path: &str) -> Result<GenerationResult> {
        let url = self.url(path);
        debug!(url = %url, "Polling remote job");

        let response = self
            .bearer(self.client.get(&url))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Polling request failed: {}", e)))?;

        self.read_response(response).await
    }
}
