//! Report rendering.

use std::fmt::Write as _;

use anyhow::Result;
use serde::Serialize;
use tidycheck_core::{ModelCheck, SchemaRegistry, Table, ValidationReport, Value};

use crate::args::Format;

/// Serialize any report in the structured formats.
fn structured<T: Serialize>(value: &T, format: Format) -> Result<Option<String>> {
    Ok(match format {
        Format::Json => Some(serde_json::to_string_pretty(value)?),
        Format::Yaml => Some(serde_yaml::to_string(value)?),
        Format::Text => None,
    })
}

pub fn render_report(report: &ValidationReport, format: Format) -> Result<String> {
    if let Some(s) = structured(report, format)? {
        return Ok(s);
    }
    Ok(report_text(report))
}

fn report_text(report: &ValidationReport) -> String {
    let mut out = String::new();
    if report.is_ok() {
        let _ = writeln!(out, "{}: OK", report.role);
        return out;
    }
    let _ = writeln!(
        out,
        "{}: {} violation(s)",
        report.role,
        report.violations.len()
    );
    for v in &report.violations {
        let _ = writeln!(out, "  - {}", v);
    }
    out
}

pub fn render_model_check(check: &ModelCheck, show_tables: bool, format: Format) -> Result<String> {
    if let Some(s) = structured(check, format)? {
        return Ok(s);
    }

    let mut out = String::new();
    let _ = writeln!(out, "model type: {}", check.model_type);
    if show_tables {
        for (name, table) in [("tidy", &check.tidy), ("glance", &check.glance), ("augment", &check.augment)] {
            let _ = writeln!(out, "\n[{}]", name);
            out.push_str(&table_text(table));
        }
        out.push('\n');
    }
    for report in &check.reports {
        out.push_str(&report_text(report));
    }
    Ok(out)
}

pub fn render_schemas(registry: &SchemaRegistry, format: Format) -> Result<String> {
    let schemas: Vec<_> = registry.iter().collect();
    if let Some(s) = structured(&schemas, format)? {
        return Ok(s);
    }

    let mut out = String::new();
    if let Some(version) = registry.schema_version() {
        let _ = writeln!(out, "schema version {}", version);
    }
    for schema in schemas {
        let _ = write!(out, "{}", schema.model_type);
        if let Some(description) = &schema.description {
            let _ = write!(out, " ({})", description);
        }
        let _ = writeln!(out, "\n  {}", schema.glance.join(", "));
    }
    Ok(out)
}

/// Plain tab-separated rendering.
fn table_text(table: &Table) -> String {
    let mut out = table.column_names().join("\t");
    out.push('\n');
    for row in 0..table.row_count() {
        let cells: Vec<String> = table
            .columns
            .iter()
            .map(|c| c.values.get(row).map_or_else(String::new, cell_text))
            .collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    out
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Missing => "NA".to_string(),
        Value::Logical(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Value::Number(n) => format!("{}", n),
        Value::Text(s) => s.clone(),
        Value::Nested(items) => format!("<list of {}>", items.len()),
    }
}
