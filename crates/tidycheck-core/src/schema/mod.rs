//! Per-model-type schemas.
//!
//! Each registered model type declares the glance columns its summary
//! table must carry, in order. Registries are YAML documents checked
//! against `schemas/registry.schema.json` before use.

mod registry;

pub use registry::{ModelSchema, SchemaRegistry};
