//! Error taxonomy.
//!
//! Usage errors (`ConflictingInput`, `UnsupportedInput`, `MissingInput`)
//! fail fast. Contract violations are batched into `SchemaViolation`.

use thiserror::Error;

use crate::violation::Violation;

/// Errors raised by tidying operations and schema loading.
#[derive(Error, Debug)]
pub enum TidyError {
    #[error("Only one of `data` and `newdata` may be supplied")]
    ConflictingInput,

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("{} contract violation(s); first: {}", .0.len(), first_message(.0))]
    SchemaViolation(Vec<Violation>),

    #[error("No data supplied and the training data cannot be reconstructed from the model")]
    MissingInput,

    #[error("Unknown model type: '{model_type}'. Available: {available:?}")]
    UnknownModelType {
        model_type: String,
        available: Vec<String>,
    },

    #[error("Input has {input_rows} rows but the model produced {produced} values")]
    RowMismatch { input_rows: usize, produced: usize },

    #[error("Failed to load schema registry: {0}")]
    SchemaLoad(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn first_message(violations: &[Violation]) -> String {
    violations
        .first()
        .map_or_else(|| "none".to_string(), ToString::to_string)
}

impl From<Vec<Violation>> for TidyError {
    fn from(violations: Vec<Violation>) -> Self {
        TidyError::SchemaViolation(violations)
    }
}
