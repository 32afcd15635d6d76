//! Request body sent to the remote generation API

use serde::Serialize;

use crate::model::request::GenerationRequest;

/// Remote text-to-image request. Toggles travel as real JSON booleans.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteText2ImgRequest {
    pub model_id: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub num_inference_steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_checker: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhance_prompt: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panorama: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_attention: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upscale: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tomesd: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_karras_sigmas: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeddings_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lora_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lora_strength: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_skip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vae: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
}

impl From<GenerationRequest> for RemoteText2ImgRequest {
    fn from(request: GenerationRequest) -> Self {
        Self {
            model_id: request.model_id,
            prompt: request.prompt,
            negative_prompt: request.negative_prompt,
            width: request.width,
            height: request.height,
            samples: request.samples,
            num_inference_steps: request.num_inference_steps,
            guidance_scale: request.guidance_scale,
            seed: request.seed,
            scheduler: request.scheduler,
            safety_checker: request.toggles.safety_checker,
            enhance_prompt: request.toggles.enhance_prompt,
            panorama: request.toggles.panorama,
            self_attention: request.toggles.self_attention,
            upscale: request.upscale.map(|level| level.as_str()),
            tomesd: request.toggles.tomesd,
            use_karras_sigmas: request.toggles.use_karras_sigmas,
            embeddings_model: request.addons.embeddings_model,
            lora_model: request.addons.lora_model,
            lora_strength: request.addons.lora_strength,
            clip_skip: request.addons.clip_skip,
            vae: request.addons.vae,
            webhook: request.webhook,
            track_id: request.track_id,
        }
    }
}
