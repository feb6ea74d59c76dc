//! Tabular results: tagged-union cells, named columns, and tables.
//!
//! A [`Table`] is an ordered list of named columns plus an explicit row
//! count. Building a table never checks it; shape problems are found by
//! the validator so they can be reported together.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::TidyError;

/// Prefix reserved for columns added by tidying operations.
pub const RESERVED_PREFIX: &str = ".";

/// A single cell.
///
/// `Nested` only exists so that non-scalar input can be detected; the
/// producers in this crate never emit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Missing,
    Logical(bool),
    Number(f64),
    Text(String),
    Nested(Vec<Value>),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Type tag used for uniformity checks. `Missing` has no type.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Missing => None,
            Value::Logical(_) => Some(ValueKind::Logical),
            Value::Number(_) => Some(ValueKind::Number),
            Value::Text(_) => Some(ValueKind::Text),
            Value::Nested(_) => Some(ValueKind::Nested),
        }
    }

    fn from_json(cell: &JsonValue) -> Result<Self, TidyError> {
        Ok(match cell {
            JsonValue::Null => Value::Missing,
            JsonValue::Bool(b) => Value::Logical(*b),
            JsonValue::Number(n) => match n.as_f64() {
                Some(f) => Value::Number(f),
                None => return Err(TidyError::UnsupportedInput(format!("number {n}"))),
            },
            JsonValue::String(s) => Value::Text(s.clone()),
            JsonValue::Array(items) => Value::Nested(
                items.iter().map(Value::from_json).collect::<Result<_, _>>()?,
            ),
            JsonValue::Object(_) => {
                return Err(TidyError::UnsupportedInput(
                    "object-valued cell".to_string(),
                ))
            }
        })
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<Option<f64>> for Value {
    fn from(n: Option<f64>) -> Self {
        n.map_or(Value::Missing, Value::Number)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Logical(b)
    }
}

/// Type of a non-missing cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Logical,
    Number,
    Text,
    Nested,
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn numbers(name: impl Into<String>, values: &[f64]) -> Self {
        Self::new(name, values.iter().copied().map(Value::Number).collect())
    }

    pub fn texts<S: AsRef<str>>(name: impl Into<String>, values: &[S]) -> Self {
        Self::new(
            name,
            values.iter().map(|s| Value::Text(s.as_ref().to_string())).collect(),
        )
    }

    /// Whether the column name carries the reserved prefix.
    pub fn is_reserved(&self) -> bool {
        self.name.starts_with(RESERVED_PREFIX)
    }

    /// Numeric view of the column; `None` for missing or non-numeric cells.
    pub fn as_numbers(&self) -> Vec<Option<f64>> {
        self.values.iter().map(Value::as_number).collect()
    }
}

/// Which of the three canonical views a table claims to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Component level: one row per model component.
    Tidy,
    /// Model level: exactly one row.
    Glance,
    /// Observation level: one row per input observation.
    Augment,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Tidy => write!(f, "tidy"),
            Role::Glance => write!(f, "glance"),
            Role::Augment => write!(f, "augment"),
        }
    }
}

/// An ordered collection of named columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<Column>,

    /// Declared row count. Columns whose length differs are ragged.
    pub n_rows: usize,

    /// Row identifiers carried by the input, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_names: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct ColumnarTable {
    columns: Vec<JsonColumn>,
    #[serde(default)]
    n_rows: Option<usize>,
    #[serde(default)]
    row_names: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct JsonColumn {
    name: String,
    values: Vec<JsonValue>,
}

impl Table {
    /// Build a table; the row count is taken from the first column.
    pub fn new(columns: Vec<Column>) -> Self {
        let n_rows = columns.first().map_or(0, |c| c.values.len());
        Self {
            columns,
            n_rows,
            row_names: None,
        }
    }

    /// An empty table with a fixed row count and no columns.
    pub fn with_rows(n_rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            n_rows,
            row_names: None,
        }
    }

    pub fn with_row_names(mut self, names: Vec<String>) -> Self {
        self.row_names = Some(names);
        self
    }

    pub fn push(&mut self, column: Column) {
        self.columns.push(column);
    }

    pub fn row_count(&self) -> usize {
        self.n_rows
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Cell at `(row, column)`.
    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        self.column(name).and_then(|c| c.values.get(row))
    }

    /// Parse a table from JSON.
    ///
    /// Accepts the columnar form `{"columns": [{"name", "values"}], ...}`
    /// or a list of records `[{"col": value}, ...]`. Record columns keep
    /// the order they are written in, with keys first seen in later
    /// records appended.
    pub fn from_json_value(json: &JsonValue) -> Result<Self, TidyError> {
        match json {
            JsonValue::Object(map) if map.contains_key("columns") => {
                let raw: ColumnarTable = serde_json::from_value(json.clone())
                    .map_err(|e| TidyError::UnsupportedInput(e.to_string()))?;
                let mut columns = Vec::with_capacity(raw.columns.len());
                for col in raw.columns {
                    let values = col
                        .values
                        .iter()
                        .map(Value::from_json)
                        .collect::<Result<Vec<_>, _>>()?;
                    columns.push(Column::new(col.name, values));
                }
                let mut table = Table::new(columns);
                if let Some(n) = raw.n_rows {
                    table.n_rows = n;
                }
                table.row_names = raw.row_names;
                Ok(table)
            }
            JsonValue::Array(records) => Self::from_records(records),
            JsonValue::Object(_) => Err(TidyError::UnsupportedInput(
                "object without a `columns` field".to_string(),
            )),
            other => Err(TidyError::UnsupportedInput(format!(
                "expected a table, found {}",
                json_type_name(other)
            ))),
        }
    }

    /// Parse a table from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, TidyError> {
        let value: JsonValue = serde_json::from_str(json)?;
        Self::from_json_value(&value)
    }

    fn from_records(records: &[JsonValue]) -> Result<Self, TidyError> {
        let mut names: Vec<String> = Vec::new();
        for record in records {
            let JsonValue::Object(map) = record else {
                return Err(TidyError::UnsupportedInput(format!(
                    "record must be an object, found {}",
                    json_type_name(record)
                )));
            };
            for key in map.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }

        let mut table = Table::with_rows(records.len());
        for name in names {
            let mut values = Vec::with_capacity(records.len());
            for record in records {
                let cell = record.get(&name).unwrap_or(&JsonValue::Null);
                values.push(Value::from_json(cell)?);
            }
            table.push(Column::new(name, values));
        }
        Ok(table)
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
