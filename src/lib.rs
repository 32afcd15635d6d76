//! Text-to-Image Gateway
//!
//! An HTTP façade that validates text-to-image requests against per-model
//! capabilities, forwards them to a remote generation API, and polls
//! asynchronous jobs until they finish or time out.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod model;
pub mod validation;

pub use error::{AppError, Result};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use backend::{HttpRemoteClient, RemoteClient};
use gateway::orchestrator::{GenerationOrchestrator, PollingPolicy};
use model::ModelRegistry;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub registry: Arc<ModelRegistry>,
    pub orchestrator: Arc<GenerationOrchestrator>,
    /// Cancelled on shutdown; every request polls under a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Wire the built-in models and the HTTP remote client from settings
    pub fn from_settings(settings: config::Settings) -> Result<Self> {
        let client: Arc<dyn RemoteClient> = Arc::new(HttpRemoteClient::new(&settings.remote)?);
        Self::with_client(settings, client)
    }

    /// Same as [`AppState::from_settings`] with a caller-provided remote client
    pub fn with_client(settings: config::Settings, client: Arc<dyn RemoteClient>) -> Result<Self> {
        let registry = Arc::new(ModelRegistry::with_builtin_models()?);
        let orchestrator = Arc::new(GenerationOrchestrator::new(
            registry.clone(),
            client,
            PollingPolicy::from(&settings.polling),
        ));

        Ok(Self {
            settings: Arc::new(settings),
            registry,
            orchestrator,
            shutdown: CancellationToken::new(),
        })
    }
}
