//! Contract violations.
//!
//! Every violation names what went wrong and points at where: the whole
//! table, a column, a row, or a single cell.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::table::Role;

/// What kind of contract rule was broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A required column is absent.
    MissingColumn,
    /// A column is present that the role or options forbid.
    UnexpectedColumn,
    /// Columns are present but not in declaration order.
    ColumnOrder,
    /// A column's length differs from the table row count.
    RaggedColumn,
    /// The row count does not match what the role requires.
    RowCount,
    /// A value that must be present is missing.
    NullValue,
    /// A value that must be unique is repeated.
    DuplicateValue,
    /// A value that must be numeric is not.
    NonNumeric,
    /// A value that must be text is not.
    NonText,
    /// A column mixes value types.
    MixedColumnType,
    /// A cell holds a container instead of a scalar.
    NestedValue,
    /// `conf.low` exceeds `conf.high`.
    IntervalInverted,
    /// An added column lacks the reserved prefix.
    UnprefixedColumn,
    /// No schema is registered for the model type.
    UnknownModelType,
}

/// Where a violation was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "at", rename_all = "snake_case")]
pub enum Location {
    Table,
    Column { column: String },
    Row { row: usize },
    Cell { column: String, row: usize },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Table => write!(f, "table"),
            Location::Column { column } => write!(f, "column `{}`", column),
            Location::Row { row } => write!(f, "row {}", row),
            Location::Cell { column, row } => write!(f, "`{}`[{}]", column, row),
        }
    }
}

/// A single broken rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub location: Location,
    pub message: String,
}

impl Violation {
    pub fn table(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            location: Location::Table,
            message: message.into(),
        }
    }

    pub fn column(kind: ViolationKind, column: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            location: Location::Column {
                column: column.into(),
            },
            message: message.into(),
        }
    }

    pub fn cell(
        kind: ViolationKind,
        column: impl Into<String>,
        row: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            location: Location::Cell {
                column: column.into(),
                row,
            },
            message: message.into(),
        }
    }

    pub fn row(kind: ViolationKind, row: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            location: Location::Row { row },
            message: message.into(),
        }
    }

    /// Column name this violation refers to, if any.
    pub fn column_name(&self) -> Option<&str> {
        match &self.location {
            Location::Column { column } | Location::Cell { column, .. } => Some(column),
            _ => None,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at {}: {}", self.kind, self.location, self.message)
    }
}

/// The outcome of validating one table, for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub role: Role,
    pub violations: Vec<Violation>,
    pub validated_at: DateTime<Utc>,
}

impl ValidationReport {
    pub fn new(role: Role, outcome: Result<(), Vec<Violation>>) -> Self {
        Self {
            role,
            violations: outcome.err().unwrap_or_default(),
            validated_at: Utc::now(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Count of violations of a given kind.
    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_cell() {
        let v = Violation::cell(ViolationKind::NullValue, "term", 3, "term is missing");
        assert_eq!(v.to_string(), "NullValue at `term`[3]: term is missing");
        assert_eq!(v.column_name(), Some("term"));
    }

    #[test]
    fn test_location_serializes_tagged() {
        let v = Violation::column(ViolationKind::MissingColumn, "estimate", "required");
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["kind"], "missing_column");
        assert_eq!(json["location"]["at"], "column");
        assert_eq!(json["location"]["column"], "estimate");
    }

    #[test]
    fn test_report_counts() {
        let report = ValidationReport::new(
            Role::Tidy,
            Err(vec![
                Violation::table(ViolationKind::RowCount, "a"),
                Violation::table(ViolationKind::RowCount, "b"),
                Violation::row(ViolationKind::DuplicateValue, 1, "c"),
            ]),
        );
        assert!(!report.is_ok());
        assert_eq!(report.count(ViolationKind::RowCount), 2);
        assert_eq!(report.count(ViolationKind::NullValue), 0);

        assert!(ValidationReport::new(Role::Glance, Ok(())).is_ok());
    }
}
