//! Registry of models the gateway accepts requests for

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::model::capabilities::{ModelDescriptor, ModelKind};

/// Read-mostly map of model id to descriptor.
///
/// Populated at startup and shared behind an `Arc`. Descriptors are stored
/// whole, so a reader either sees a complete descriptor or none at all.
#[derive(Default)]
pub struct ModelRegistry {
    models: RwLock<HashMap<String, Arc<ModelDescriptor>>>,
}

impl ModelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in model family
    pub fn with_builtin_models() -> Result<Self> {
        let registry = Self::new();
        for kind in ModelKind::ALL {
            registry.register(kind.descriptor())?;
        }
        Ok(registry)
    }

    /// Add a model. An id that is already present is an error, never an overwrite.
    pub fn register(&self, descriptor: ModelDescriptor) -> Result<()> {
        let mut models = self.models.write();

        if models.contains_key(&descriptor.id) {
            return Err(AppError::DuplicateModel(descriptor.id));
        }

        info!(model_id = %descriptor.id, kind = ?descriptor.kind, "Registered model");
        models.insert(descriptor.id.clone(), Arc::new(descriptor));
        Ok(())
    }

    /// Look up a model by id
    pub fn get(&self, id: &str) -> Result<Arc<ModelDescriptor>> {
        let model = self
            .models
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::UnknownModel(id.to_string()))?;

        debug!(model_id = %id, "Resolved model");
        Ok(model)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.models.read().contains_key(id)
    }

    /// All registered models, ordered by id
    pub fn list(&self) -> Vec<Arc<ModelDescriptor>> {
        let mut models: Vec<_> = self.models.read().values().cloned().collect();
        models.sort_by(|a, b| a.id.cmp(&b.id));
        models
    }

    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }
}
