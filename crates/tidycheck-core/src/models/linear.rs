//! Linear models (`lm`) described by their estimated coefficients.
//!
//! Coefficients and standard errors are taken as given. Fitted values,
//! residuals and summary metrics are derived from them and the training
//! data when it is available.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::adapter::{AdapterFactory, ModelAdapter, Term};
use crate::error::TidyError;
use crate::table::{Table, Value};

/// Name of the intercept term.
pub const INTERCEPT: &str = "(Intercept)";

/// A linear model given by coefficients over named predictor columns.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    terms: Vec<Term>,
    response: Option<String>,
    data: Option<Table>,
}

impl LinearFit {
    /// Build from term names and matching estimates.
    pub fn new<S: AsRef<str>>(terms: &[S], estimates: &[f64]) -> Result<Self, TidyError> {
        if terms.len() != estimates.len() {
            return Err(TidyError::UnsupportedInput(format!(
                "{} terms but {} estimates",
                terms.len(),
                estimates.len()
            )));
        }
        Ok(Self {
            terms: terms
                .iter()
                .zip(estimates)
                .map(|(name, est)| Term::new(name.as_ref(), *est))
                .collect(),
            response: None,
            data: None,
        })
    }

    pub fn with_std_errors(mut self, std_errors: &[f64]) -> Result<Self, TidyError> {
        if std_errors.len() != self.terms.len() {
            return Err(TidyError::UnsupportedInput(format!(
                "{} terms but {} standard errors",
                self.terms.len(),
                std_errors.len()
            )));
        }
        for (term, se) in self.terms.iter_mut().zip(std_errors) {
            term.std_error = Some(*se);
        }
        Ok(self)
    }

    /// Attach the training data and name its response column.
    pub fn with_training_data(mut self, data: Table, response: impl Into<String>) -> Self {
        self.data = Some(data);
        self.response = Some(response.into());
        self
    }

    /// Name the response column without attaching training data.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    fn has_intercept(&self) -> bool {
        self.terms.iter().any(|t| t.name == INTERCEPT)
    }

    /// Response values of the training data, one per row.
    fn observed(&self) -> Option<Vec<Option<f64>>> {
        let data = self.data.as_ref()?;
        let column = data.column(self.response.as_deref()?)?;
        Some(column.values.iter().map(numeric).collect())
    }

    fn residual_pairs(&self) -> Vec<(f64, f64)> {
        let (Some(observed), Some(fitted)) = (self.observed(), self.fitted()) else {
            return Vec::new();
        };
        observed
            .into_iter()
            .zip(fitted)
            .filter_map(|(y, f)| Some((y?, f?)))
            .collect()
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.is_finite() => Some(*n),
        Value::Logical(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

impl ModelAdapter for LinearFit {
    fn model_type(&self) -> &str {
        "lm"
    }

    fn terms(&self) -> Vec<Term> {
        self.terms.clone()
    }

    fn fitted(&self) -> Option<Vec<Option<f64>>> {
        self.data.as_ref().and_then(|d| self.predict(d).ok())
    }

    fn residuals(&self) -> Option<Vec<Option<f64>>> {
        let observed = self.observed()?;
        let fitted = self.fitted()?;
        Some(
            observed
                .into_iter()
                .zip(fitted)
                .map(|(y, f)| Some(y? - f?))
                .collect(),
        )
    }

    fn training_data(&self) -> Option<Table> {
        self.data.clone()
    }

    fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    fn predict(&self, newdata: &Table) -> Result<Vec<Option<f64>>, TidyError> {
        let mut predictors = Vec::with_capacity(self.terms.len());
        for term in &self.terms {
            if term.name == INTERCEPT {
                predictors.push((term.estimate, None));
                continue;
            }
            let column = newdata.column(&term.name).ok_or_else(|| {
                TidyError::UnsupportedInput(format!("input lacks predictor column `{}`", term.name))
            })?;
            predictors.push((term.estimate, Some(column)));
        }

        let predictions = (0..newdata.row_count())
            .map(|row| {
                predictors.iter().try_fold(0.0, |acc, (coef, column)| match column {
                    None => Some(acc + coef),
                    Some(column) => {
                        let x = column.values.get(row).and_then(numeric)?;
                        Some(acc + coef * x)
                    }
                })
            })
            .collect();
        Ok(predictions)
    }

    fn metrics(&self) -> Vec<(String, Value)> {
        let rank = self.terms.len() as f64;
        let intercept = if self.has_intercept() { 1.0 } else { 0.0 };
        let mut metrics = vec![("df".to_string(), Value::Number(rank - intercept))];

        let pairs = self.residual_pairs();
        if pairs.is_empty() {
            return metrics;
        }

        let n = pairs.len() as f64;
        let rss: f64 = pairs.iter().map(|(y, f)| (y - f).powi(2)).sum();
        let tss: f64 = if intercept > 0.0 {
            let mean = pairs.iter().map(|(y, _)| y).sum::<f64>() / n;
            pairs.iter().map(|(y, _)| (y - mean).powi(2)).sum()
        } else {
            pairs.iter().map(|(y, _)| y * y).sum()
        };
        let df_residual = n - rank;

        let r_squared = if tss > 0.0 { Some(1.0 - rss / tss) } else { None };
        let (adj_r_squared, sigma) = if df_residual > 0.0 {
            (
                r_squared.map(|r2| 1.0 - (1.0 - r2) * (n - intercept) / df_residual),
                Some((rss / df_residual).sqrt()),
            )
        } else {
            (None, None)
        };

        metrics.extend([
            ("r.squared".to_string(), Value::from(r_squared)),
            ("adj.r.squared".to_string(), Value::from(adj_r_squared)),
            ("sigma".to_string(), Value::from(sigma)),
            ("deviance".to_string(), Value::Number(rss)),
            (
                "df.residual".to_string(),
                Value::from(Some(df_residual).filter(|df| *df >= 0.0)),
            ),
            ("nobs".to_string(), Value::Number(n)),
        ]);
        metrics
    }
}

#[derive(Debug, Deserialize)]
struct LinearFitDescription {
    terms: Vec<String>,
    estimates: Vec<f64>,
    #[serde(default)]
    std_errors: Option<Vec<f64>>,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    data: Option<JsonValue>,
}

/// Builds [`LinearFit`] adapters from JSON descriptions:
///
/// ```json
/// {"terms": ["(Intercept)", "x"], "estimates": [1.5, -0.3],
///  "std_errors": [0.2, 0.05], "response": "y", "data": [{"x": 1, "y": 1.2}]}
/// ```
pub struct LinearFitFactory;

impl AdapterFactory for LinearFitFactory {
    fn model_type(&self) -> &'static str {
        "lm"
    }

    fn create(&self, description: &JsonValue) -> Result<Arc<dyn ModelAdapter>, TidyError> {
        let desc: LinearFitDescription = serde_json::from_value(description.clone())
            .map_err(|e| TidyError::UnsupportedInput(format!("lm description: {}", e)))?;

        let mut fit = LinearFit::new(&desc.terms, &desc.estimates)?;
        if let Some(se) = &desc.std_errors {
            fit = fit.with_std_errors(se)?;
        }
        match (desc.data, desc.response) {
            (Some(data), Some(response)) => {
                fit = fit.with_training_data(Table::from_json_value(&data)?, response);
            }
            (Some(_), None) => {
                return Err(TidyError::UnsupportedInput(
                    "lm description has data but no response".to_string(),
                ))
            }
            (None, Some(response)) => fit = fit.with_response(response),
            (None, None) => {}
        }
        Ok(Arc::new(fit))
    }

    fn description(&self) -> &'static str {
        "Linear model fitted by least squares"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;

    fn training() -> Table {
        Table::new(vec![
            Column::numbers("x", &[0.0, 1.0, 2.0, 3.0]),
            Column::numbers("y", &[1.0, 3.0, 5.0, 8.0]),
        ])
    }

    fn fit() -> LinearFit {
        LinearFit::new(&[INTERCEPT, "x"], &[1.0, 2.0])
            .unwrap()
            .with_training_data(training(), "y")
    }

    fn metric(fit: &LinearFit, name: &str) -> Value {
        fit.metrics()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .unwrap_or(Value::Missing)
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(LinearFit::new(&["a"], &[1.0, 2.0]).is_err());
        let fit = LinearFit::new(&["a"], &[1.0]).unwrap();
        assert!(fit.with_std_errors(&[0.1, 0.2]).is_err());
    }

    #[test]
    fn test_fitted_and_residuals() {
        let fit = fit();
        let fitted = fit.fitted().unwrap();
        assert_eq!(fitted, vec![Some(1.0), Some(3.0), Some(5.0), Some(7.0)]);
        let resid = fit.residuals().unwrap();
        assert_eq!(resid, vec![Some(0.0), Some(0.0), Some(0.0), Some(1.0)]);
    }

    #[test]
    fn test_predict_with_missing_predictor_value() {
        let newdata = Table::new(vec![Column::new(
            "x",
            vec![Value::Number(10.0), Value::Missing],
        )]);
        assert_eq!(fit().predict(&newdata).unwrap(), vec![Some(21.0), None]);
    }

    #[test]
    fn test_predict_requires_predictor_columns() {
        let newdata = Table::new(vec![Column::numbers("z", &[1.0])]);
        assert!(matches!(
            fit().predict(&newdata),
            Err(TidyError::UnsupportedInput(_))
        ));
    }

    #[test]
    fn test_metrics() {
        let fit = fit();
        // rss = 1, mean y = 4.25, tss = 10.5625 + 1.5625 + 0.5625 + 14.0625 = 26.75
        assert_eq!(metric(&fit, "deviance"), Value::Number(1.0));
        assert_eq!(metric(&fit, "nobs"), Value::Number(4.0));
        assert_eq!(metric(&fit, "df"), Value::Number(1.0));
        assert_eq!(metric(&fit, "df.residual"), Value::Number(2.0));

        let r2 = metric(&fit, "r.squared").as_number().unwrap();
        assert!((r2 - (1.0 - 1.0 / 26.75)).abs() < 1e-12);
        let adj = metric(&fit, "adj.r.squared").as_number().unwrap();
        assert!((adj - (1.0 - (1.0 - r2) * 3.0 / 2.0)).abs() < 1e-12);
        let sigma = metric(&fit, "sigma").as_number().unwrap();
        assert!((sigma - 0.5_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_saturated_fit_has_missing_sigma() {
        let data = Table::new(vec![
            Column::numbers("x", &[0.0, 1.0]),
            Column::numbers("y", &[1.0, 3.0]),
        ]);
        let fit = LinearFit::new(&[INTERCEPT, "x"], &[1.0, 2.0])
            .unwrap()
            .with_training_data(data, "y");
        assert_eq!(metric(&fit, "df.residual"), Value::Number(0.0));
        assert!(metric(&fit, "sigma").is_missing());
        assert!(metric(&fit, "adj.r.squared").is_missing());
        assert_eq!(metric(&fit, "r.squared"), Value::Number(1.0));
    }

    #[test]
    fn test_underdetermined_fit_has_missing_df_residual() {
        let data = Table::new(vec![
            Column::numbers("x", &[1.0]),
            Column::numbers("y", &[2.0]),
        ]);
        let fit = LinearFit::new(&[INTERCEPT, "x"], &[1.0, 1.0])
            .unwrap()
            .with_training_data(data, "y");
        assert!(metric(&fit, "df.residual").is_missing());
        assert!(metric(&fit, "sigma").is_missing());
        assert!(metric(&fit, "adj.r.squared").is_missing());
        assert_eq!(metric(&fit, "nobs"), Value::Number(1.0));
    }

    #[test]
    fn test_without_data_only_df() {
        let fit = LinearFit::new(&[INTERCEPT, "x"], &[1.5, -0.3]).unwrap();
        assert!(fit.fitted().is_none());
        assert!(fit.training_data().is_none());
        assert_eq!(fit.metrics().len(), 1);
    }

    #[test]
    fn test_factory_round_trip() {
        let model = LinearFitFactory
            .create(&serde_json::json!({
                "terms": ["(Intercept)", "x"],
                "estimates": [1.0, 2.0],
                "std_errors": [0.1, 0.2],
                "response": "y",
                "data": [{"x": 0, "y": 1}, {"x": 1, "y": 3}, {"x": 2, "y": 6}]
            }))
            .unwrap();
        assert_eq!(model.response(), Some("y"));
        assert_eq!(model.terms()[1].std_error, Some(0.2));
        assert_eq!(model.residuals().unwrap(), vec![Some(0.0), Some(0.0), Some(1.0)]);
    }

    #[test]
    fn test_factory_rejects_data_without_response() {
        let result = LinearFitFactory.create(&serde_json::json!({
            "terms": ["x"],
            "estimates": [1.0],
            "data": [{"x": 1}]
        }));
        assert!(matches!(result, Err(TidyError::UnsupportedInput(_))));
    }
}
