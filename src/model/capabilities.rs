//! Model descriptors and their operational limits

use serde::Serialize;

use crate::model::request::GenerationRequest;
use crate::validation::FieldError;

/// Operational limits of a single model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCapabilities {
    pub max_width: u32,
    pub max_height: u32,
    pub max_samples: u32,
    pub min_inference_steps: u32,
    pub max_inference_steps: u32,
    pub supported_schedulers: Vec<String>,
    pub min_guidance_scale: f64,
    pub max_guidance_scale: f64,
    pub supports_upscale: bool,
    #[serde(rename = "supportsTomeSD")]
    pub supports_tomesd: bool,
    pub supports_karras: bool,
}

impl ModelCapabilities {
    pub fn supports_scheduler(&self, scheduler: &str) -> bool {
        self.supported_schedulers.iter().any(|s| s == scheduler)
    }
}

/// The closed set of model families the gateway knows how to validate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Flux,
    Midjourney,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::Flux, ModelKind::Midjourney];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Flux => "flux",
            Self::Midjourney => "midjourney",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Flux => "Flux",
            Self::Midjourney => "Midjourney",
        }
    }

    /// Stock capability set for this family
    pub fn capabilities(&self) -> ModelCapabilities {
        match self {
            Self::Flux => ModelCapabilities {
                max_width: 768,
                max_height: 768,
                max_samples: 4,
                min_inference_steps: 1,
                max_inference_steps: 20,
                supported_schedulers: schedulers(&[
                    "UniPCMultistepScheduler",
                    "EulerAncestralDiscreteScheduler",
                ]),
                min_guidance_scale: 1.0,
                max_guidance_scale: 20.0,
                supports_upscale: false,
                supports_tomesd: true,
                supports_karras: true,
            },
            Self::Midjourney => ModelCapabilities {
                max_width: 1024,
                max_height: 1024,
                max_samples: 4,
                min_inference_steps: 1,
                max_inference_steps: 20,
                supported_schedulers: schedulers(&[
                    "UniPCMultistepScheduler",
                    "DDIMScheduler",
                    "DPMSolverMultistepScheduler",
                    "EulerAncestralDiscreteScheduler",
                ]),
                min_guidance_scale: 1.0,
                max_guidance_scale: 20.0,
                supports_upscale: true,
                supports_tomesd: true,
                supports_karras: true,
            },
        }
    }

    /// Family-specific rules applied after the shared capability checks.
    pub fn check_request(&self, _request: &GenerationRequest) -> Vec<FieldError> {
        match self {
            // Both hosted families are fully described by their capabilities today.
            Self::Flux | Self::Midjourney => Vec::new(),
        }
    }

    pub fn descriptor(&self) -> ModelDescriptor {
        ModelDescriptor {
            id: self.id().to_string(),
            name: self.display_name().to_string(),
            kind: *self,
            capabilities: self.capabilities(),
        }
    }
}

fn schedulers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// A registered model: identity, family and limits
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    pub kind: ModelKind,
    pub capabilities: ModelCapabilities,
}
