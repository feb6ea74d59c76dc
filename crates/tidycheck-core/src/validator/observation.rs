//! Observation-level (`augment`) checks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{check_relative_order, check_shape};
use crate::table::{Table, Value, RESERVED_PREFIX};
use crate::violation::{Violation, ViolationKind};

pub const ROWNAMES: &str = ".rownames";
pub const FITTED: &str = ".fitted";
pub const RESID: &str = ".resid";

/// Columns the augment operation adds itself.
pub(crate) const ADDED_COLUMNS: [&str; 3] = [ROWNAMES, FITTED, RESID];

/// What an observation table must look like, derived from its input.
///
/// `input_columns` is required: any column outside it that lacks the `.`
/// prefix is reported, so an expectation without the input's columns
/// would reject every carried column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationExpectation {
    /// Rows in the input the table was built from.
    pub input_row_count: usize,

    /// Input columns, in input order, that must be carried through.
    pub input_columns: Vec<String>,

    /// Whether the input carried response values.
    #[serde(default)]
    pub has_response: bool,

    /// Whether the input carried row identifiers.
    #[serde(default)]
    pub has_row_names: bool,

    /// Whether those identifiers were unique.
    #[serde(default)]
    pub row_names_unique: bool,
}

impl ObservationExpectation {
    /// Derive the expectation from the input table. `response` names the
    /// response column; the input has a response only if it carries it.
    ///
    /// Input columns that collide with an added column are not expected to
    /// be carried through, since augmenting replaces them.
    pub fn from_input(input: &Table, response: Option<&str>) -> Self {
        let row_names_unique = input.row_names.as_ref().map_or(false, |names| {
            let mut seen = std::collections::HashSet::new();
            names.iter().all(|n| seen.insert(n))
        });

        Self {
            input_row_count: input.row_count(),
            input_columns: input
                .columns
                .iter()
                .map(|c| c.name.clone())
                .filter(|name| !ADDED_COLUMNS.contains(&name.as_str()))
                .collect(),
            has_response: response.map_or(false, |r| input.has_column(r)),
            has_row_names: input.row_names.is_some(),
            row_names_unique,
        }
    }
}

pub(super) fn check(table: &Table, expect: &ObservationExpectation) -> Vec<Violation> {
    let mut out = Vec::new();
    check_shape(table, &mut out);

    if table.row_count() != expect.input_row_count {
        out.push(Violation::table(
            ViolationKind::RowCount,
            format!(
                "input had {} rows but the table has {}",
                expect.input_row_count,
                table.row_count()
            ),
        ));
    }

    for name in &expect.input_columns {
        if !table.has_column(name) {
            out.push(Violation::column(
                ViolationKind::MissingColumn,
                name,
                "input column was not carried through",
            ));
        }
    }

    for column in &table.columns {
        if !expect.input_columns.contains(&column.name) && !column.is_reserved() {
            out.push(Violation::column(
                ViolationKind::UnprefixedColumn,
                &column.name,
                format!("added columns must start with '{}'", RESERVED_PREFIX),
            ));
        }
    }

    match table.column(FITTED) {
        None => out.push(Violation::column(
            ViolationKind::MissingColumn,
            FITTED,
            "fitted values are always added",
        )),
        Some(column) => check_numbers(FITTED, &column.values, &mut out),
    }

    match (table.column(RESID), expect.has_response) {
        (None, true) => out.push(Violation::column(
            ViolationKind::MissingColumn,
            RESID,
            "input carries the response, so residuals are required",
        )),
        (Some(_), false) => out.push(Violation::column(
            ViolationKind::UnexpectedColumn,
            RESID,
            "residuals without response values in the input",
        )),
        (Some(column), true) => check_numbers(RESID, &column.values, &mut out),
        (None, false) => {}
    }

    match (table.column(ROWNAMES), expect.has_row_names) {
        (None, true) => out.push(Violation::column(
            ViolationKind::MissingColumn,
            ROWNAMES,
            "input carried row identifiers",
        )),
        (Some(_), false) => out.push(Violation::column(
            ViolationKind::UnexpectedColumn,
            ROWNAMES,
            "input carried no row identifiers",
        )),
        (Some(column), true) if expect.row_names_unique => {
            let mut first_seen: HashMap<String, usize> = HashMap::new();
            for (row, value) in column.values.iter().enumerate() {
                if let Some(first) = first_seen.get(&row_key(value)) {
                    out.push(Violation::cell(
                        ViolationKind::DuplicateValue,
                        ROWNAMES,
                        row,
                        format!("row identifier repeats row {}", first),
                    ));
                } else {
                    first_seen.insert(row_key(value), row);
                }
            }
        }
        _ => {}
    }

    let mut order: Vec<&str> = vec![ROWNAMES];
    order.extend(expect.input_columns.iter().map(String::as_str));
    order.extend([FITTED, RESID]);
    check_relative_order(table, &order, &mut out);

    out
}

fn check_numbers(name: &str, values: &[Value], out: &mut Vec<Violation>) {
    for (row, value) in values.iter().enumerate() {
        if !matches!(value, Value::Number(_) | Value::Missing) {
            out.push(Violation::cell(
                ViolationKind::NonNumeric,
                name,
                row,
                format!("`{}` must be numeric", name),
            ));
        }
    }
}

fn row_key(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        other => format!("{:?}", other),
    }
}
