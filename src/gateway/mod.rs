//! Gateway module - Generation orchestration

pub mod orchestrator;

pub use orchestrator::{GenerationOrchestrator, GenerationState, PollingPolicy};
