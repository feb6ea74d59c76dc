//! tidycheck - command-line checks for the tidy-output contract.

mod args;
mod output;

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tidycheck_core::{
    check_model, AdapterRegistry, AugmentInput, ComponentOptions, ObservationExpectation,
    SchemaRegistry, Table, TidyContractValidator,
};

use args::{Args, Commands};

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Run the command; `Ok(false)` means violations were found.
fn run(args: &Args) -> Result<bool> {
    let custom;
    let registry: &SchemaRegistry = match &args.schemas {
        Some(path) => {
            custom = SchemaRegistry::from_file(path)
                .with_context(|| format!("loading schema registry {}", path.display()))?;
            &custom
        }
        None => SchemaRegistry::builtin()?,
    };
    let validator = TidyContractValidator::new(registry);

    let (rendered, ok) = match &args.command {
        Commands::Tidy {
            table,
            conf_int,
            quick,
        } => {
            let table = read_table(table)?;
            let options = ComponentOptions {
                conf_int: *conf_int,
                quick: *quick,
                ..ComponentOptions::default()
            };
            let report = validator.report_component(&table, &options);
            (output::render_report(&report, args.format)?, report.is_ok())
        }

        Commands::Glance { table, model_type } => {
            let table = read_table(table)?;
            let report = validator.report_summary(&table, model_type);
            (output::render_report(&report, args.format)?, report.is_ok())
        }

        Commands::Augment {
            table,
            input,
            response,
        } => {
            let table = read_table(table)?;
            let input = read_table(input)?;
            let expectation = ObservationExpectation::from_input(&input, response.as_deref());
            let report = validator.report_observation(&table, &expectation);
            (output::render_report(&report, args.format)?, report.is_ok())
        }

        Commands::Model {
            model,
            data,
            newdata,
            conf_int,
            conf_level,
            quick,
            show_tables,
        } => {
            let description: serde_json::Value = serde_json::from_str(
                &fs::read_to_string(model)
                    .with_context(|| format!("reading model {}", model.display()))?,
            )
            .with_context(|| format!("parsing model {}", model.display()))?;
            let adapter = AdapterRegistry::with_builtin().create_tagged(&description)?;

            let data = data.as_deref().map(read_table).transpose()?;
            let newdata = newdata.as_deref().map(read_table).transpose()?;
            let input = AugmentInput {
                data: data.as_ref(),
                newdata: newdata.as_ref(),
            };
            let options = ComponentOptions {
                conf_int: *conf_int,
                conf_level: *conf_level,
                quick: *quick,
            };

            let check = check_model(adapter.as_ref(), &options, input, registry)?;
            (
                output::render_model_check(&check, *show_tables, args.format)?,
                check.is_ok(),
            )
        }

        Commands::Schemas => (output::render_schemas(registry, args.format)?, true),
    };

    print!("{}", rendered);
    Ok(ok)
}

fn read_table(path: &Path) -> Result<Table> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading table {}", path.display()))?;
    let table = Table::from_json(&contents)
        .with_context(|| format!("parsing table {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.columns.len(),
        "Loaded table"
    );
    Ok(table)
}
