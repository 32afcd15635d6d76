//! Contract between the orchestrator and the remote generation API

use async_trait::async_trait;

use crate::error::Result;
use crate::model::result::GenerationResult;

/// Path of the text-to-image endpoint, relative to the remote base URL
pub const TEXT2IMG_PATH: &str = "/images/text2img";

/// Path used to poll an asynchronous text-to-image job
pub fn text2img_poll_path(job_id: &str) -> String {
    format!("{}/{}", TEXT2IMG_PATH, job_id)
}

/// Client for the remote generation API
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Submit a job. Transient failures are retried inside the call.
    async fn submit(&self, path: &str, body: serde_json::Value) -> Result<GenerationResult>;

    /// Fetch the current state of a job, once.
    async fn poll(&self, path: &str) -> Result<GenerationResult>;
}
