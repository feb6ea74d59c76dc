//! Component-level (`tidy`) checks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{check_relative_order, check_shape};
use crate::table::{Table, Value};
use crate::violation::{Violation, ViolationKind};

/// Canonical order of the columns a component table may carry.
pub const COMPONENT_COLUMNS: [&str; 7] = [
    "term",
    "estimate",
    "std.error",
    "statistic",
    "p.value",
    "conf.low",
    "conf.high",
];

const INTERVAL_COLUMNS: [&str; 2] = ["conf.low", "conf.high"];

/// Options a component table was produced with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentOptions {
    /// Whether confidence intervals were requested.
    #[serde(default)]
    pub conf_int: bool,

    /// Interval coverage, in (0, 1).
    #[serde(default = "default_conf_level")]
    pub conf_level: f64,

    /// Only `term` and `estimate`. Takes precedence over `conf_int`.
    #[serde(default)]
    pub quick: bool,
}

fn default_conf_level() -> f64 {
    0.95
}

impl Default for ComponentOptions {
    fn default() -> Self {
        Self {
            conf_int: false,
            conf_level: default_conf_level(),
            quick: false,
        }
    }
}

impl ComponentOptions {
    pub fn quick() -> Self {
        Self {
            quick: true,
            ..Self::default()
        }
    }

    pub fn with_conf_int(level: f64) -> Self {
        Self {
            conf_int: true,
            conf_level: level,
            ..Self::default()
        }
    }

    /// Whether interval columns are expected.
    pub fn wants_intervals(&self) -> bool {
        self.conf_int && !self.quick
    }
}

pub(super) fn check(table: &Table, options: &ComponentOptions) -> Vec<Violation> {
    let mut out = Vec::new();
    check_shape(table, &mut out);
    check_terms(table, &mut out);
    check_numeric(table, "estimate", true, &mut out);

    if options.quick {
        for column in &table.columns {
            if column.name != "term" && column.name != "estimate" {
                out.push(Violation::column(
                    ViolationKind::UnexpectedColumn,
                    &column.name,
                    "quick tables carry only `term` and `estimate`",
                ));
            }
        }
    } else if options.conf_int {
        for name in INTERVAL_COLUMNS {
            check_numeric(table, name, true, &mut out);
        }
        check_intervals(table, &mut out);
    } else {
        for name in INTERVAL_COLUMNS {
            if table.has_column(name) {
                out.push(Violation::column(
                    ViolationKind::UnexpectedColumn,
                    name,
                    "interval column present but intervals were not requested",
                ));
            }
        }
    }

    for name in ["std.error", "statistic", "p.value"] {
        check_numeric(table, name, false, &mut out);
    }

    check_relative_order(table, &COMPONENT_COLUMNS, &mut out);
    out
}

fn check_terms(table: &Table, out: &mut Vec<Violation>) {
    let Some(column) = table.column("term") else {
        out.push(Violation::column(
            ViolationKind::MissingColumn,
            "term",
            "component tables require a `term` column",
        ));
        return;
    };

    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (row, value) in column.values.iter().enumerate() {
        match value {
            Value::Missing => out.push(Violation::cell(
                ViolationKind::NullValue,
                "term",
                row,
                "term must not be missing",
            )),
            Value::Text(term) => {
                if let Some(first) = first_seen.insert(term.as_str(), row) {
                    out.push(Violation::cell(
                        ViolationKind::DuplicateValue,
                        "term",
                        row,
                        format!("term '{}' already appears in row {}", term, first),
                    ));
                    // Keep pointing later duplicates at the first occurrence.
                    first_seen.insert(term.as_str(), first);
                }
            }
            _ => out.push(Violation::cell(
                ViolationKind::NonText,
                "term",
                row,
                "term must be text",
            )),
        }
    }
}

/// Numbers and missing values are accepted; anything else is reported.
fn check_numeric(table: &Table, name: &str, required: bool, out: &mut Vec<Violation>) {
    let Some(column) = table.column(name) else {
        if required {
            out.push(Violation::column(
                ViolationKind::MissingColumn,
                name,
                format!("`{}` is required", name),
            ));
        }
        return;
    };

    for (row, value) in column.values.iter().enumerate() {
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

fn check_intervals(table: &Table, out: &mut Vec<Violation>) {
    let (Some(low), Some(high)) = (table.column("conf.low"), table.column("conf.high")) else {
        return;
    };

    for (row, (lo, hi)) in low.as_numbers().into_iter().zip(high.as_numbers()).enumerate() {
        if let (Some(lo), Some(hi)) = (lo, hi) {
            if lo > hi {
                out.push(Violation::cell(
                    ViolationKind::IntervalInverted,
                    "conf.low",
                    row,
                    format!("conf.low {} exceeds conf.high {}", lo, hi),
                ));
            }
        }
    }
}
