//! The model schema registry.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TidyError;

/// Registry shipped with the crate.
const BUILTIN_REGISTRY_YAML: &str = include_str!("../../../../schemas/models.yaml");

/// JSON Schema every registry document must satisfy.
const REGISTRY_DOCUMENT_SCHEMA: &str = include_str!("../../../../schemas/registry.schema.json");

static BUILTIN: OnceLock<Result<SchemaRegistry, String>> = OnceLock::new();
static DOCUMENT_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

lazy_static! {
    static ref MODEL_TYPE_PATTERN: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_.]*$").unwrap();
    static ref METRIC_NAME_PATTERN: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9._]*$").unwrap();
}

/// Declared glance columns for one model type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub model_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Glance columns in declaration order.
    pub glance: Vec<String>,
}

impl ModelSchema {
    pub fn new<S: AsRef<str>>(model_type: impl Into<String>, glance: &[S]) -> Self {
        Self {
            model_type: model_type.into(),
            description: None,
            glance: glance.iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    /// Reject tags and metric names the document schema would reject.
    fn check(&self) -> Result<(), TidyError> {
        if !MODEL_TYPE_PATTERN.is_match(&self.model_type) {
            return Err(TidyError::SchemaLoad(format!(
                "invalid model type tag '{}'",
                self.model_type
            )));
        }
        if self.glance.is_empty() {
            return Err(TidyError::SchemaLoad(format!(
                "model type '{}' declares no glance columns",
                self.model_type
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for metric in &self.glance {
            if !METRIC_NAME_PATTERN.is_match(metric) {
                return Err(TidyError::SchemaLoad(format!(
                    "invalid glance column '{}' for '{}'",
                    metric, self.model_type
                )));
            }
            if !seen.insert(metric) {
                return Err(TidyError::SchemaLoad(format!(
                    "duplicate glance column '{}' for '{}'",
                    metric, self.model_type
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    schema_version: String,
    models: Vec<ModelSchema>,
}

/// Read-only lookup of model schemas keyed by model-type tag.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schema_version: Option<String>,
    schemas: BTreeMap<String, ModelSchema>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry embedded in the crate, parsed on first use.
    pub fn builtin() -> Result<&'static SchemaRegistry, TidyError> {
        let result = BUILTIN.get_or_init(|| {
            SchemaRegistry::from_yaml(BUILTIN_REGISTRY_YAML).map_err(|e| e.to_string())
        });

        match result {
            Ok(registry) => Ok(registry),
            Err(e) => Err(TidyError::SchemaLoad(e.clone())),
        }
    }

    /// Parse and validate a registry document from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, TidyError> {
        let document: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_document(document)
    }

    /// Parse and validate a registry document from JSON.
    pub fn from_json(json: &str) -> Result<Self, TidyError> {
        let document: serde_json::Value = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Load a registry file; `.json` files are read as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TidyError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    /// Check a parsed document against the registry JSON Schema. All
    /// failures are joined into one `SchemaLoad` message, each prefixed
    /// with the path of the offending value.
    pub fn check_document(document: &serde_json::Value) -> Result<(), TidyError> {
        let compiled = DOCUMENT_SCHEMA.get_or_init(|| {
            let schema: serde_json::Value =
                serde_json::from_str(REGISTRY_DOCUMENT_SCHEMA).map_err(|e| e.to_string())?;
            jsonschema::options().build(&schema).map_err(|e| e.to_string())
        });
        let validator = compiled
            .as_ref()
            .map_err(|e| TidyError::SchemaLoad(format!("registry schema is unusable: {}", e)))?;

        let problems: Vec<String> = validator
            .iter_errors(document)
            .map(|err| match err.instance_path.to_string() {
                path if path.is_empty() => err.to_string(),
                path => format!("{}: {}", path, err),
            })
            .collect();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(TidyError::SchemaLoad(problems.join("; ")))
        }
    }

    fn from_document(document: serde_json::Value) -> Result<Self, TidyError> {
        Self::check_document(&document)?;

        let parsed: RegistryDocument = serde_json::from_value(document)?;
        let mut registry = SchemaRegistry {
            schema_version: Some(parsed.schema_version),
            schemas: BTreeMap::new(),
        };
        for schema in parsed.models {
            if registry.schemas.contains_key(&schema.model_type) {
                return Err(TidyError::SchemaLoad(format!(
                    "model type '{}' declared twice",
                    schema.model_type
                )));
            }
            registry.register(schema)?;
        }

        tracing::debug!(
            models = registry.schemas.len(),
            version = ?registry.schema_version,
            "Loaded schema registry"
        );
        Ok(registry)
    }

    /// Register a schema, replacing any existing one for the same tag.
    pub fn register(&mut self, schema: ModelSchema) -> Result<(), TidyError> {
        schema.check()?;
        self.schemas.insert(schema.model_type.clone(), schema);
        Ok(())
    }

    /// Schema for a model type.
    pub fn get(&self, model_type: &str) -> Option<&ModelSchema> {
        self.schemas.get(model_type)
    }

    /// Schema for a model type, or an `UnknownModelType` error.
    pub fn require(&self, model_type: &str) -> Result<&ModelSchema, TidyError> {
        self.get(model_type)
            .ok_or_else(|| TidyError::UnknownModelType {
                model_type: model_type.to_string(),
                available: self.available_types().iter().map(|s| s.to_string()).collect(),
            })
    }

    pub fn available_types(&self) -> Vec<&str> {
        self.schemas.keys().map(|s| s.as_str()).collect()
    }

    pub fn schema_version(&self) -> Option<&str> {
        self.schema_version.as_deref()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelSchema> {
        self.schemas.values()
    }
}
