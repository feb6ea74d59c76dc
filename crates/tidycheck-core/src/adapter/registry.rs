//! Explicit registry of adapter factories keyed by model-type tag.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::ModelAdapter;
use crate::error::TidyError;

/// Builds adapters for one model type from a serialized model description.
pub trait AdapterFactory: Send + Sync {
    /// Model-type tag this factory handles, e.g. "lm".
    fn model_type(&self) -> &'static str;

    /// Build an adapter from its JSON description.
    fn create(&self, description: &JsonValue) -> Result<Arc<dyn ModelAdapter>, TidyError>;

    /// Human-readable description of the model type.
    fn description(&self) -> &'static str {
        "Fitted model"
    }
}

/// Registry of available adapter factories.
#[derive(Default)]
pub struct AdapterRegistry {
    factories: BTreeMap<String, Arc<dyn AdapterFactory>>,
}

impl AdapterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every adapter this crate ships.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(crate::models::LinearFitFactory));
        registry
    }

    /// Register a factory, replacing any existing one for the same tag.
    pub fn register(&mut self, factory: Arc<dyn AdapterFactory>) {
        self.factories
            .insert(factory.model_type().to_string(), factory);
    }

    /// Build an adapter for a tagged model description.
    pub fn create(
        &self,
        model_type: &str,
        description: &JsonValue,
    ) -> Result<Arc<dyn ModelAdapter>, TidyError> {
        self.factories
            .get(model_type)
            .ok_or_else(|| TidyError::UnknownModelType {
                model_type: model_type.to_string(),
                available: self.available_types().iter().map(|s| s.to_string()).collect(),
            })?
            .create(description)
    }

    /// Build an adapter from a description carrying its own `model_type` field.
    pub fn create_tagged(&self, description: &JsonValue) -> Result<Arc<dyn ModelAdapter>, TidyError> {
        let model_type = description
            .get("model_type")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| {
                TidyError::UnsupportedInput("model description has no `model_type`".to_string())
            })?;
        self.create(model_type, description)
    }

    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    pub fn has_model(&self, model_type: &str) -> bool {
        self.factories.contains_key(model_type)
    }

    pub fn get_factory(&self, model_type: &str) -> Option<&Arc<dyn AdapterFactory>> {
        self.factories.get(model_type)
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("model_types", &self.available_types())
            .finish()
    }
}
