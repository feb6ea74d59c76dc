//! Model-level (`glance`) checks.

use super::{check_relative_order, check_shape};
use crate::schema::ModelSchema;
use crate::table::{Table, Value};
use crate::violation::{Violation, ViolationKind};

pub(super) fn check(table: &Table, schema: Option<&ModelSchema>, model_type: &str) -> Vec<Violation> {
    let mut out = Vec::new();
    check_shape(table, &mut out);

    if table.row_count() != 1 {
        out.push(Violation::table(
            ViolationKind::RowCount,
            format!("summary tables have exactly one row, found {}", table.row_count()),
        ));
    }

    for column in &table.columns {
        for (row, value) in column.values.iter().enumerate() {
            if matches!(value, Value::Nested(_)) {
                out.push(Violation::cell(
                    ViolationKind::NestedValue,
                    &column.name,
                    row,
                    "summary values must be scalars",
                ));
            }
        }
    }

    let Some(schema) = schema else {
        out.push(Violation::table(
            ViolationKind::UnknownModelType,
            format!("no schema registered for model type '{}'", model_type),
        ));
        return out;
    };

    for name in &schema.glance {
        if !table.has_column(name) {
            out.push(Violation::column(
                ViolationKind::MissingColumn,
                name,
                format!("declared for '{}'; use a missing value when undefined", model_type),
            ));
        }
    }

    for column in &table.columns {
        if !schema.glance.contains(&column.name) {
            out.push(Violation::column(
                ViolationKind::UnexpectedColumn,
                &column.name,
                format!("not declared for '{}'", model_type),
            ));
        }
    }

    let order: Vec<&str> = schema.glance.iter().map(String::as_str).collect();
    check_relative_order(table, &order, &mut out);
    out
}
