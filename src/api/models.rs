//! API response models for the auxiliary endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::capabilities::{ModelCapabilities, ModelDescriptor};

/// Liveness probe response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// A single model in the models listing
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub capabilities: ModelCapabilities,
}

impl From<&ModelDescriptor> for ModelInfo {
    fn from(descriptor: &ModelDescriptor) -> Self {
        Self {
            id: descriptor.id.clone(),
            name: descriptor.name.clone(),
            capabilities: descriptor.capabilities.clone(),
        }
    }
}

/// Models listing response
#[derive(Debug, Clone, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
}
