//! Model module - Capabilities, registry, and request/result types

pub mod capabilities;
pub mod registry;
pub mod request;
pub mod result;

pub use capabilities::{ModelCapabilities, ModelDescriptor, ModelKind};
pub use registry::ModelRegistry;
pub use request::{FeatureToggles, GenerationRequest, ModelAddons, Text2ImgRequest, UpscaleLevel};
pub use result::{GenerationResult, GenerationStatus};
