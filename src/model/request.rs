//! Text-to-image request types: the inbound wire shape and its validated form

use serde::{Deserialize, Serialize};

/// Text-to-image request as submitted by clients.
///
/// Numeric fields are kept wide and optional so that out-of-range or missing
/// values surface as validation messages instead of JSON decode failures.
/// Feature toggles use the `"yes"` / `"no"` / `""` convention of the remote API.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Text2ImgRequest {
    #[serde(default)]
    pub model_id: String,

    #[serde(default)]
    pub prompt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,

    #[serde(default)]
    pub width: Option<i64>,

    #[serde(default)]
    pub height: Option<i64>,

    #[serde(default)]
    pub samples: Option<i64>,

    #[serde(default)]
    pub num_inference_steps: Option<i64>,

    #[serde(default)]
    pub guidance_scale: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<String>,

    #[serde(default)]
    pub safety_checker: String,

    #[serde(default)]
    pub enhance_prompt: String,

    #[serde(default)]
    pub panorama: String,

    #[serde(default)]
    pub self_attention: String,

    #[serde(default)]
    pub upscale: String,

    #[serde(default)]
    pub tomesd: String,

    #[serde(default)]
    pub use_karras_sigmas: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings_model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lora_model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lora_strength: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_skip: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vae: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
}

/// Upscale factor requested from the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpscaleLevel {
    X1,
    X2,
    X3,
}

impl UpscaleLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X1 => "1",
            Self::X2 => "2",
            Self::X3 => "3",
        }
    }
}

/// Optional feature switches; `None` means the caller left the remote default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureToggles {
    pub safety_checker: Option<bool>,
    pub enhance_prompt: Option<bool>,
    pub panorama: Option<bool>,
    pub self_attention: Option<bool>,
    pub tomesd: Option<bool>,
    pub use_karras_sigmas: Option<bool>,
}

/// Passthrough references forwarded to the remote untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelAddons {
    pub embeddings_model: Option<String>,
    pub lora_model: Option<String>,
    pub lora_strength: Option<String>,
    pub clip_skip: Option<String>,
    pub vae: Option<String>,
}

/// A request that passed structural validation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model_id: String,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
    pub num_inference_steps: u32,
    pub guidance_scale: Option<f64>,
    pub seed: Option<i64>,
    pub scheduler: Option<String>,
    pub upscale: Option<UpscaleLevel>,
    pub toggles: FeatureToggles,
    pub addons: ModelAddons,
    pub webhook: Option<String>,
    pub track_id: Option<String>,
}

impl GenerationRequest {
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}
