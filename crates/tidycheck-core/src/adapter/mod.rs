//! Model adapters.
//!
//! A [`ModelAdapter`] is the capability set the tidying operations need
//! from a fitted model. Each model type implements it once, and an
//! [`AdapterRegistry`] maps model-type tags to the factories that build
//! adapters from serialized model descriptions.

mod registry;

pub use registry::{AdapterFactory, AdapterRegistry};

use serde::{Deserialize, Serialize};

use crate::error::TidyError;
use crate::stats::normal_quantile;
use crate::table::{Table, Value};

/// One model component, e.g. a regression coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub name: String,
    pub estimate: f64,
    #[serde(default)]
    pub std_error: Option<f64>,
}

impl Term {
    pub fn new(name: impl Into<String>, estimate: f64) -> Self {
        Self {
            name: name.into(),
            estimate,
            std_error: None,
        }
    }

    pub fn with_std_error(mut self, se: f64) -> Self {
        self.std_error = Some(se);
        self
    }
}

/// Read-only accessors over a fitted model.
///
/// Per-observation vectors use `None` for observations the model could
/// not produce a value for; they are never shortened.
pub trait ModelAdapter: Send + Sync {
    /// Model-type tag used for schema lookup, e.g. "lm".
    fn model_type(&self) -> &str;

    /// Components in model order.
    fn terms(&self) -> Vec<Term>;

    /// Fitted values for the training observations, if available.
    fn fitted(&self) -> Option<Vec<Option<f64>>>;

    /// Residuals for the training observations, if available.
    fn residuals(&self) -> Option<Vec<Option<f64>>>;

    /// The training data, if it can be reconstructed.
    fn training_data(&self) -> Option<Table>;

    /// Name of the response column.
    fn response(&self) -> Option<&str> {
        None
    }

    /// Predictions for each row of `newdata`.
    fn predict(&self, newdata: &Table) -> Result<Vec<Option<f64>>, TidyError>;

    /// Whole-model metrics. Names outside the model's schema are ignored
    /// by `glance`; absent names become missing values.
    fn metrics(&self) -> Vec<(String, Value)>;

    /// Wald intervals per term at the given level; `None` for terms
    /// without a standard error.
    fn conf_int(&self, level: f64) -> Vec<Option<(f64, f64)>> {
        let terms = self.terms();
        let z = if level > 0.0 && level < 1.0 {
            normal_quantile(0.5 + level / 2.0)
        } else {
            None
        };
        let Some(z) = z else {
            return vec![None; terms.len()];
        };
        terms
            .iter()
            .map(|t| {
                t.std_error
                    .map(|se| (t.estimate - z * se, t.estimate + z * se))
            })
            .collect()
    }
}
