//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Check tidy/glance/augment tables against the output contract
#[derive(Parser, Debug)]
#[command(name = "tidycheck")]
#[command(version)]
#[command(about = "Check tidy, glance and augment tables against the tidy-output contract", long_about = None)]
pub struct Args {
    /// Schema registry file (YAML or JSON); the built-in registry by default
    #[arg(long, global = true)]
    pub schemas: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text, global = true)]
    pub format: Format,

    /// Verbosity: -v (debug), -vv (trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a component-level (tidy) table
    Tidy {
        /// Table file (JSON)
        table: PathBuf,

        /// The table was produced with confidence intervals
        #[arg(long)]
        conf_int: bool,

        /// The table was produced in quick mode
        #[arg(long)]
        quick: bool,
    },

    /// Validate a model-level (glance) table
    Glance {
        /// Table file (JSON)
        table: PathBuf,

        /// Model type whose schema the table must follow
        #[arg(long)]
        model_type: String,
    },

    /// Validate an observation-level (augment) table against its input
    Augment {
        /// Table file (JSON)
        table: PathBuf,

        /// The input the table was built from (JSON)
        #[arg(long)]
        input: PathBuf,

        /// Response column; residuals are required when the input carries it
        #[arg(long)]
        response: Option<String>,
    },

    /// Produce and validate all three views of a model description
    Model {
        /// Model description file (JSON with a `model_type` field)
        model: PathBuf,

        /// Original data to augment (JSON)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Held-out data to augment (JSON)
        #[arg(long)]
        newdata: Option<PathBuf>,

        /// Add confidence intervals to the tidy table
        #[arg(long)]
        conf_int: bool,

        /// Confidence level for intervals
        #[arg(long, default_value_t = 0.95)]
        conf_level: f64,

        /// Only term and estimate in the tidy table
        #[arg(long)]
        quick: bool,

        /// Also print the produced tables
        #[arg(long)]
        show_tables: bool,
    },

    /// List registered model types and their glance columns
    Schemas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Yaml,
}

impl Args {
    /// Default log filter for the requested verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "tidycheck_core=debug,tidycheck=debug",
            _ => "tidycheck_core=trace,tidycheck=trace",
        }
    }
}
