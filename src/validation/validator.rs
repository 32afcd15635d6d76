//! Structural and capability validation of text-to-image requests
//!
//! Validation runs in two groups. Structural rules only look at the request
//! itself; capability rules need the resolved model. All violations inside a
//! group are reported together, and the capability group only runs once the
//! structural group is clean.

use std::sync::Arc;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::model::capabilities::ModelDescriptor;
use crate::model::registry::ModelRegistry;
use crate::model::request::{
    FeatureToggles, GenerationRequest, ModelAddons, Text2ImgRequest, UpscaleLevel,
};
use crate::validation::{FieldError, ValidationErrors};

/// Hard ceiling on output area, whatever the model allows
pub const MAX_PIXEL_COUNT: u64 = 1024 * 1024;

const DIMENSION_RANGE: (i64, i64) = (64, 1024);
const SAMPLES_RANGE: (i64, i64) = (1, 4);
const STEPS_RANGE: (i64, i64) = (1, 20);
const GUIDANCE_RANGE: (f64, f64) = (1.0, 20.0);

/// Scheduler names the remote understands
pub const KNOWN_SCHEDULERS: &[&str] = &[
    "DDPMScheduler",
    "DDIMScheduler",
    "PNDMScheduler",
    "LMSDiscreteScheduler",
    "EulerDiscreteScheduler",
    "EulerAncestralDiscreteScheduler",
    "DPMSolverMultistepScheduler",
    "HeunDiscreteScheduler",
    "KDPM2DiscreteScheduler",
    "DPMSolverSinglestepScheduler",
    "KDPM2AncestralDiscreteScheduler",
    "UniPCMultistepScheduler",
    "DDIMInverseScheduler",
    "DEISMultistepScheduler",
    "IPNDMScheduler",
    "KarrasVeScheduler",
    "ScoreSdeVeScheduler",
    "LCMScheduler",
];

/// Validates requests against the shared bounds and the target model
pub struct RequestValidator {
    registry: Arc<ModelRegistry>,
}

impl RequestValidator {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    /// Run both validation groups and return the parsed request
    pub fn validate(&self, request: &Text2ImgRequest) -> Result<GenerationRequest> {
        let parsed = Self::validate_structure(request)?;
        let model = self.registry.get(&parsed.model_id)?;
        Self::validate_capabilities(&parsed, &model)?;
        Ok(parsed)
    }

    /// Structural rules: presence, shared numeric bounds, enumerated strings
    pub fn validate_structure(request: &Text2ImgRequest) -> Result<GenerationRequest> {
        let mut errors = Vec::new();

        if request.model_id.trim().is_empty() {
            errors.push(FieldError::new("model_id", "is required"));
        }
        if request.prompt.trim().is_empty() {
            errors.push(FieldError::new("prompt", "is required"));
        }

        let width = check_range(&mut errors, "width", request.width, DIMENSION_RANGE);
        let height = check_range(&mut errors, "height", request.height, DIMENSION_RANGE);
        let samples = check_range(&mut errors, "samples", request.samples, SAMPLES_RANGE);
        let num_inference_steps = check_range(
            &mut errors,
            "num_inference_steps",
            request.num_inference_steps,
            STEPS_RANGE,
        );

        if let Some(scale) = request.guidance_scale {
            let (min, max) = GUIDANCE_RANGE;
            if !(min..=max).contains(&scale) {
                errors.push(FieldError::new(
                    "guidance_scale",
                    format!("must be between {} and {}", min, max),
                ));
            }
        }

        let toggles = FeatureToggles {
            safety_checker: parse_toggle(&mut errors, "safety_checker", &request.safety_checker),
            enhance_prompt: parse_toggle(&mut errors, "enhance_prompt", &request.enhance_prompt),
            panorama: parse_toggle(&mut errors, "panorama", &request.panorama),
            self_attention: parse_toggle(&mut errors, "self_attention", &request.self_attention),
            tomesd: parse_toggle(&mut errors, "tomesd", &request.tomesd),
            use_karras_sigmas: parse_toggle(
                &mut errors,
                "use_karras_sigmas",
                &request.use_karras_sigmas,
            ),
        };

        let upscale = parse_upscale(&mut errors, &request.upscale);

        let scheduler = non_empty(&request.scheduler);
        if let Some(name) = &scheduler {
            if !KNOWN_SCHEDULERS.contains(&name.as_str()) {
                errors.push(FieldError::new(
                    "scheduler",
                    format!("'{}' is not a known scheduler", name),
                ));
            }
        }

        if let (Some(w), Some(h)) = (width, height) {
            if w as u64 * h as u64 > MAX_PIXEL_COUNT {
                errors.push(FieldError::new(
                    "dimensions",
                    format!("width x height must not exceed {} pixels", MAX_PIXEL_COUNT),
                ));
            }
        }

        match (width, height, samples, num_inference_steps) {
            (Some(width), Some(height), Some(samples), Some(num_inference_steps))
                if errors.is_empty() =>
            {
                Ok(GenerationRequest {
                    model_id: request.model_id.trim().to_string(),
                    prompt: request.prompt.clone(),
                    negative_prompt: non_empty(&request.negative_prompt),
                    width,
                    height,
                    samples,
                    num_inference_steps,
                    guidance_scale: request.guidance_scale,
                    seed: request.seed,
                    scheduler,
                    upscale,
                    toggles,
                    addons: ModelAddons {
                        embeddings_model: non_empty(&request.embeddings_model),
                        lora_model: non_empty(&request.lora_model),
                        lora_strength: non_empty(&request.lora_strength),
                        clip_skip: non_empty(&request.clip_skip),
                        vae: non_empty(&request.vae),
                    },
                    webhook: non_empty(&request.webhook),
                    track_id: non_empty(&request.track_id),
                })
            }
            _ => {
                debug!(violations = errors.len(), "Structural validation failed");
                Err(AppError::Validation(ValidationErrors::new(errors)))
            }
        }
    }

    /// Capability rules: the request must fit inside the model's limits
    pub fn validate_capabilities(
        request: &GenerationRequest,
        model: &ModelDescriptor,
    ) -> Result<()> {
        let caps = &model.capabilities;
        let mut errors = Vec::new();

        if request.width > caps.max_width {
            errors.push(FieldError::new(
                "width",
                format!("exceeds model maximum of {}", caps.max_width),
            ));
        }
        if request.height > caps.max_height {
            errors.push(FieldError::new(
                "height",
                format!("exceeds model maximum of {}", caps.max_height),
            ));
        }
        if request.samples > caps.max_samples {
            errors.push(FieldError::new(
                "samples",
                format!("exceeds model maximum of {}", caps.max_samples),
            ));
        }
        if request.num_inference_steps < caps.min_inference_steps
            || request.num_inference_steps > caps.max_inference_steps
        {
            errors.push(FieldError::new(
                "num_inference_steps",
                format!(
                    "must be between {} and {} for this model",
                    caps.min_inference_steps, caps.max_inference_steps
                ),
            ));
        }
        if let Some(scale) = request.guidance_scale {
            if scale < caps.min_guidance_scale || scale > caps.max_guidance_scale {
                errors.push(FieldError::new(
                    "guidance_scale",
                    format!(
                        "must be between {} and {} for this model",
                        caps.min_guidance_scale, caps.max_guidance_scale
                    ),
                ));
            }
        }
        if let Some(scheduler) = &request.scheduler {
            if !caps.supports_scheduler(scheduler) {
                errors.push(FieldError::new(
                    "scheduler",
                    format!("'{}' is not supported by this model", scheduler),
                ));
            }
        }
        if request.upscale.is_some() && !caps.supports_upscale {
            errors.push(FieldError::new("upscale", "is not supported by this model"));
        }
        if request.toggles.tomesd == Some(true) && !caps.supports_tomesd {
            errors.push(FieldError::new("tomesd", "is not supported by this model"));
        }
        if request.toggles.use_karras_sigmas == Some(true) && !caps.supports_karras {
            errors.push(FieldError::new(
                "use_karras_sigmas",
                "is not supported by this model",
            ));
        }

        errors.extend(model.kind.check_request(request));

        if errors.is_empty() {
            Ok(())
        } else {
            debug!(
                model_id = %model.id,
                violations = errors.len(),
                "Capability validation failed"
            );
            Err(AppError::Validation(ValidationErrors::new(errors)))
        }
    }
}

fn check_range(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<i64>,
    (min, max): (i64, i64),
) -> Option<u32> {
    match value {
        None => {
            errors.push(FieldError::new(field, "is required"));
            None
        }
        Some(v) if v < min || v > max => {
            errors.push(FieldError::new(
                field,
                format!("must be between {} and {}", min, max),
            ));
            None
        }
        Some(v) => u32::try_from(v).ok(),
    }
}

fn parse_toggle(errors: &mut Vec<FieldError>, field: &'static str, value: &str) -> Option<bool> {
    match value {
        "" => None,
        "yes" => Some(true),
        "no" => Some(false),
        _ => {
            errors.push(FieldError::new(field, "must be one of [yes no]"));
            None
        }
    }
}

fn parse_upscale(errors: &mut Vec<FieldError>, value: &str) -> Option<UpscaleLevel> {
    match value {
        "" | "no" => None,
        "1" => Some(UpscaleLevel::X1),
        "2" => Some(UpscaleLevel::X2),
        "3" => Some(UpscaleLevel::X3),
        _ => {
            errors.push(FieldError::new("upscale", "must be one of [no 1 2 3]"));
            None
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
