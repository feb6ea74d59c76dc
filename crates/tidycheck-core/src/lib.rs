//! # tidycheck-core
//!
//! The tidy-output contract for fitted statistical models.
//!
//! A fitted model is normalized into three tables:
//! - **tidy**: one row per model component (e.g. coefficient)
//! - **glance**: exactly one row of whole-model metrics
//! - **augment**: one row per input observation, with `.`-prefixed
//!   derived columns added to the input
//!
//! This crate produces those tables from a [`ModelAdapter`] and validates
//! any table, produced here or elsewhere, against the rules for its role.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: column set and order depend only on model type and options
//! 2. **Batched**: validators report every violation in one pass
//! 3. **No dropped rows**: augment output has exactly as many rows as its input
//! 4. **Stateless**: the schema registry is read-only after it is loaded
//!
//! ## Example
//!
//! ```rust,ignore
//! use tidycheck_core::{check_model, AugmentInput, ComponentOptions, LinearFit, SchemaRegistry};
//!
//! let model = LinearFit::new(&["(Intercept)", "x"], &[1.5, -0.3])?
//!     .with_training_data(data, "y");
//! let registry = SchemaRegistry::builtin()?;
//! let check = check_model(&model, &ComponentOptions::default(), AugmentInput::default(), registry)?;
//!
//! for report in &check.reports {
//!     println!("{}: {} violation(s)", report.role, report.violations.len());
//! }
//! ```

pub mod adapter;
pub mod error;
pub mod models;
pub mod produce;
pub mod schema;
pub mod stats;
pub mod table;
pub mod validator;
pub mod violation;

// Re-export main types at crate root
pub use adapter::{AdapterFactory, AdapterRegistry, ModelAdapter, Term};
pub use error::TidyError;
pub use models::{LinearFit, LinearFitFactory};
pub use produce::{augment, glance, tidy, AugmentInput};
pub use schema::{ModelSchema, SchemaRegistry};
pub use table::{Column, Role, Table, Value, ValueKind, RESERVED_PREFIX};
pub use validator::{
    validate_input_selection, ComponentOptions, ObservationExpectation, TidyContractValidator,
};
pub use violation::{Location, ValidationReport, Violation, ViolationKind};

use serde::Serialize;

/// All three views of a model together with their validation reports.
#[derive(Debug, Clone, Serialize)]
pub struct ModelCheck {
    pub model_type: String,
    pub tidy: Table,
    pub glance: Table,
    pub augment: Table,
    /// Reports in tidy, glance, augment order.
    pub reports: Vec<ValidationReport>,
}

impl ModelCheck {
    pub fn is_ok(&self) -> bool {
        self.reports.iter().all(ValidationReport::is_ok)
    }

    pub fn violation_count(&self) -> usize {
        self.reports.iter().map(|r| r.violations.len()).sum()
    }
}

/// Produce every view of `model` and validate each against the contract.
///
/// Usage errors (conflicting or missing augment input, unregistered model
/// type) are returned as errors; contract violations end up in the reports.
pub fn check_model(
    model: &dyn ModelAdapter,
    options: &ComponentOptions,
    input: AugmentInput<'_>,
    registry: &SchemaRegistry,
) -> Result<ModelCheck, TidyError> {
    let validator = TidyContractValidator::new(registry);

    let tidy_table = tidy(model, options);
    let glance_table = glance(model, registry)?;
    let base = produce::augment_base(model, input)?;
    let augment_table = produce::augment_onto(model, &base, input.newdata.is_some())?;
    let expectation = ObservationExpectation::from_input(&base, model.response());

    let reports = vec![
        validator.report_component(&tidy_table, options),
        validator.report_summary(&glance_table, model.model_type()),
        validator.report_observation(&augment_table, &expectation),
    ];

    let violations: usize = reports.iter().map(|r| r.violations.len()).sum();
    tracing::info!(
        model_type = model.model_type(),
        terms = tidy_table.row_count(),
        observations = augment_table.row_count(),
        violations,
        "Checked model output"
    );

    Ok(ModelCheck {
        model_type: model.model_type().to_string(),
        tidy: tidy_table,
        glance: glance_table,
        augment: augment_table,
        reports,
    })
}
