//! The tidy-output contract validator.
//!
//! Each check collects every violation it finds and returns them together,
//! so a caller can report all problems in one pass. The one exception is
//! [`validate_input_selection`], which gates whether augmenting can start
//! at all and therefore fails fast.
//!
//! All checks are pure functions of their inputs.

mod component;
mod input;
mod observation;
mod summary;

pub use component::{ComponentOptions, COMPONENT_COLUMNS};
pub use input::validate_input_selection;
pub use observation::{ObservationExpectation, FITTED, RESID, ROWNAMES};
pub(crate) use observation::ADDED_COLUMNS;

use std::collections::HashSet;

use crate::schema::SchemaRegistry;
use crate::table::{Role, Table, ValueKind};
use crate::violation::{ValidationReport, Violation, ViolationKind};

/// Checks produced tables against the contract for their role.
#[derive(Debug, Clone, Copy)]
pub struct TidyContractValidator<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> TidyContractValidator<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'a SchemaRegistry {
        self.registry
    }

    /// Component-level (`tidy`) table.
    pub fn validate_component_table(
        &self,
        table: &Table,
        options: &ComponentOptions,
    ) -> Result<(), Vec<Violation>> {
        tracing::trace!(rows = table.row_count(), ?options, "Validating component table");
        finish(component::check(table, options))
    }

    /// Model-level (`glance`) table for a registered model type.
    pub fn validate_summary_table(
        &self,
        table: &Table,
        model_type: &str,
    ) -> Result<(), Vec<Violation>> {
        tracing::trace!(model_type, "Validating summary table");
        finish(summary::check(table, self.registry.get(model_type), model_type))
    }

    /// Observation-level (`augment`) table.
    pub fn validate_observation_table(
        &self,
        table: &Table,
        expectation: &ObservationExpectation,
    ) -> Result<(), Vec<Violation>> {
        tracing::trace!(
            rows = table.row_count(),
            expected = expectation.input_row_count,
            "Validating observation table"
        );
        finish(observation::check(table, expectation))
    }

    /// Run the component check and wrap it in a report.
    pub fn report_component(&self, table: &Table, options: &ComponentOptions) -> ValidationReport {
        ValidationReport::new(Role::Tidy, self.validate_component_table(table, options))
    }

    /// Run the summary check and wrap it in a report.
    pub fn report_summary(&self, table: &Table, model_type: &str) -> ValidationReport {
        ValidationReport::new(Role::Glance, self.validate_summary_table(table, model_type))
    }

    /// Run the observation check and wrap it in a report.
    pub fn report_observation(
        &self,
        table: &Table,
        expectation: &ObservationExpectation,
    ) -> ValidationReport {
        ValidationReport::new(Role::Augment, self.validate_observation_table(table, expectation))
    }
}

fn finish(violations: Vec<Violation>) -> Result<(), Vec<Violation>> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Checks shared by every role: ragged columns, duplicate column names,
/// and columns that mix value types.
fn check_shape(table: &Table, out: &mut Vec<Violation>) {
    let mut names = HashSet::new();
    for column in &table.columns {
        if !names.insert(column.name.as_str()) {
            out.push(Violation::column(
                ViolationKind::DuplicateValue,
                &column.name,
                "column name appears more than once",
            ));
        }

        if column.values.len() != table.row_count() {
            out.push(Violation::column(
                ViolationKind::RaggedColumn,
                &column.name,
                format!(
                    "column has {} values but the table has {} rows",
                    column.values.len(),
                    table.row_count()
                ),
            ));
        }

        let kinds: HashSet<ValueKind> = column.values.iter().filter_map(|v| v.kind()).collect();
        if kinds.len() > 1 {
            let mut kinds: Vec<_> = kinds.into_iter().collect();
            kinds.sort_by_key(|k| format!("{:?}", k));
            out.push(Violation::column(
                ViolationKind::MixedColumnType,
                &column.name,
                format!("column mixes value types {:?}", kinds),
            ));
        }
    }

    if let Some(row_names) = &table.row_names {
        if row_names.len() != table.row_count() {
            out.push(Violation::table(
                ViolationKind::RaggedColumn,
                format!(
                    "{} row names for {} rows",
                    row_names.len(),
                    table.row_count()
                ),
            ));
        }
    }
}

/// Report a `ColumnOrder` violation when the present columns of `order`
/// do not appear in the table in that relative order.
fn check_relative_order(table: &Table, order: &[&str], out: &mut Vec<Violation>) {
    let present: Vec<&str> = table
        .columns
        .iter()
        .map(|c| c.name.as_str())
        .filter(|name| order.contains(name))
        .collect();
    let expected: Vec<&str> = order
        .iter()
        .copied()
        .filter(|name| present.contains(name))
        .collect();

    if present != expected {
        out.push(Violation::table(
            ViolationKind::ColumnOrder,
            format!("columns {:?} should appear as {:?}", present, expected),
        ));
    }
}
