//! Outcome of a generation submission or poll

use serde::{Deserialize, Deserializer, Serialize};

/// Status tag reported by the remote API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum GenerationStatus {
    Success,
    Processing,
    Error,
    Other(String),
}

impl From<String> for GenerationStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "success" => Self::Success,
            "processing" => Self::Processing,
            "error" | "failed" => Self::Error,
            _ => Self::Other(value),
        }
    }
}

impl From<GenerationStatus> for String {
    fn from(value: GenerationStatus) -> Self {
        value.as_str().to_string()
    }
}

impl GenerationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Processing => "processing",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote response body, also returned to callers once terminal
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GenerationResult {
    pub status: GenerationStatus,

    /// Generated image URLs
    #[serde(default)]
    pub output: Vec<String>,

    /// Some remote versions report URLs under `images` instead of `output`
    #[serde(default, skip_serializing)]
    pub images: Vec<String>,

    /// Remote job identifier, the correlation key for polling
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_time: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,

    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<String>,
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        self.status == GenerationStatus::Success
    }

    pub fn is_processing(&self) -> bool {
        self.status == GenerationStatus::Processing
    }

    /// Job id, if the remote sent a usable one
    pub fn job_id(&self) -> Option<&str> {
        self.id
            .as_deref()
            .filter(|id| !id.is_empty() && *id != "0")
    }

    /// Fold `images` into `output` so callers only ever read one list
    pub fn normalized(mut self) -> Self {
        if self.output.is_empty() {
            self.output = std::mem::take(&mut self.images);
        } else {
            self.images.clear();
        }
        self
    }
}

/// Accept a string, number, or arbitrary JSON where the remote is inconsistent
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
