//! Generation orchestrator: validate, submit, and poll until a terminal state
//!
//! Each request is driven through [`GenerationState`] one transition at a
//! time. Polling waits race a [`CancellationToken`] so shutdown or a caller
//! deadline ends the loop at the next wait boundary.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backend::traits::{text2img_poll_path, RemoteClient, TEXT2IMG_PATH};
use crate::backend::wire::RemoteText2ImgRequest;
use crate::config::PollingConfig;
use crate::error::{AppError, Result};
use crate::model::registry::ModelRegistry;
use crate::model::request::{GenerationRequest, Text2ImgRequest};
use crate::model::result::{GenerationResult, GenerationStatus};
use crate::validation::RequestValidator;

/// Fixed-interval polling with an attempt ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

impl From<&PollingConfig> for PollingPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: config.interval(),
            max_attempts: config.max_attempts,
        }
    }
}

/// Where a single generation request stands
#[derive(Debug)]
pub enum GenerationState {
    Validating(Text2ImgRequest),
    Submitting(GenerationRequest),
    /// `attempt` counts polls already made for `job_id`
    Polling { job_id: String, attempt: u32 },
    Completed(GenerationResult),
    Rejected(AppError),
    Failed(AppError),
}

impl GenerationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed(_) | Self::Rejected(_) | Self::Failed(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Validating(_) => "validating",
            Self::Submitting(_) => "submitting",
            Self::Polling { .. } => "polling",
            Self::Completed(_) => "completed",
            Self::Rejected(_) => "rejected",
            Self::Failed(_) => "failed",
        }
    }

    /// Collapse a terminal state into the caller-facing result
    pub fn into_result(self) -> Result<GenerationResult> {
        match self {
            Self::Completed(result) => Ok(result),
            Self::Rejected(err) | Self::Failed(err) => Err(err),
            other => Err(AppError::Internal(format!(
                "Generation stopped in non-terminal state '{}'",
                other.name()
            ))),
        }
    }
}

/// Drives text-to-image requests from validation to a final result
pub struct GenerationOrchestrator {
    validator: RequestValidator,
    client: Arc<dyn RemoteClient>,
    polling: PollingPolicy,
}

impl GenerationOrchestrator {
    pub fn new(
        registry: Arc<ModelRegistry>,
        client: Arc<dyn RemoteClient>,
        polling: PollingPolicy,
    ) -> Self {
        Self {
            validator: RequestValidator::new(registry),
            client,
            polling,
        }
    }

    pub fn polling_policy(&self) -> PollingPolicy {
        self.polling
    }

    /// Run a request to completion
    pub async fn generate(
        &self,
        request: Text2ImgRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationResult> {
        info!(
            model_id = %request.model_id,
            width = ?request.width,
            height = ?request.height,
            samples = ?request.samples,
            "Processing text-to-image request"
        );

        let mut state = GenerationState::Validating(request);
        while !state.is_terminal() {
            state = self.step(state, cancel).await;
        }

        match &state {
            GenerationState::Completed(result) => info!(
                generation_time = ?result.generation_time,
                image_count = result.output.len(),
                "Successfully generated image"
            ),
            GenerationState::Rejected(err) => debug!(error = %err, "Request rejected"),
            GenerationState::Failed(err) => error!(error = %err, "Image generation failed"),
            _ => {}
        }

        state.into_result()
    }

    /// Perform exactly one transition. Terminal states are returned unchanged.
    pub async fn step(&self, state: GenerationState, cancel: &CancellationToken) -> GenerationState {
        match state {
            GenerationState::Validating(request) => self.validate(&request),
            GenerationState::Submitting(request) => self.submit(request).await,
            GenerationState::Polling { job_id, attempt } => {
                self.poll(job_id, attempt, cancel).await
            }
            terminal => terminal,
        }
    }

    fn validate(&self, request: &Text2ImgRequest) -> GenerationState {
        match self.validator.validate(request) {
            Ok(parsed) => GenerationState::Submitting(parsed),
            Err(err) => {
                warn!(model_id = %request.model_id, error = %err, "Request validation failed");
                GenerationState::Rejected(err)
            }
        }
    }

    async fn submit(&self, request: GenerationRequest) -> GenerationState {
        debug!(
            model_id = %request.model_id,
            pixels = request.pixel_count(),
            samples = request.samples,
            "Submitting generation job"
        );

        let body = match serde_json::to_value(RemoteText2ImgRequest::from(request)) {
            Ok(body) => body,
            Err(e) => return GenerationState::Failed(AppError::from(e)),
        };

        match self.client.submit(TEXT2IMG_PATH, body).await {
            Ok(response) => match response.status {
                GenerationStatus::Processing => match response.job_id() {
                    Some(job_id) => {
                        info!(job_id = %job_id, "Request is processing, polling for completion");
                        GenerationState::Polling {
                            job_id: job_id.to_string(),
                            attempt: 0,
                        }
                    }
                    None => GenerationState::Failed(AppError::ExternalApi(
                        "Processing response missing job id".to_string(),
                    )),
                },
                _ => Self::settle(response, "submission"),
            },
            Err(err) => GenerationState::Failed(err),
        }
    }

    async fn poll(&self, job_id: String, attempt: u32, cancel: &CancellationToken) -> GenerationState {
        if attempt >= self.polling.max_attempts {
            return GenerationState::Failed(AppError::Timeout(format!(
                "Image generation timed out after {} polling attempts",
                self.polling.max_attempts
            )));
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return GenerationState::Failed(AppError::Timeout(
                    "Request cancelled while waiting for generation".to_string(),
                ));
            }
            _ = tokio::time::sleep(self.polling.interval) => {}
        }

        let attempt = attempt + 1;
        let response = match self.client.poll(&text2img_poll_path(&job_id)).await {
            Ok(response) => response,
            Err(err) => return GenerationState::Failed(err),
        };

        debug!(
            job_id = %job_id,
            attempt,
            status = %response.status,
            progress = ?response.progress,
            "Polling status"
        );

        if response.is_processing() {
            GenerationState::Polling { job_id, attempt }
        } else {
            Self::settle(response, "polling")
        }
    }

    /// Terminal handling for any non-processing response
    fn settle(response: GenerationResult, phase: &str) -> GenerationState {
        match &response.status {
            GenerationStatus::Success if response.output.is_empty() => GenerationState::Failed(
                AppError::ExternalApi("No images in successful response".to_string()),
            ),
            GenerationStatus::Success => GenerationState::Completed(response),
            GenerationStatus::Error => GenerationState::Failed(AppError::ExternalApi(format!(
                "API returned error: {}",
                response.message.as_deref().unwrap_or("no message")
            ))),
            status => GenerationState::Failed(AppError::ExternalApi(format!(
                "Unexpected status during {}: {}",
                phase, status
            ))),
        }
    }
}
