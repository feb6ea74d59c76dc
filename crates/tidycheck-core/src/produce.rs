//! Producers for the three canonical views of a fitted model.
//!
//! Column order is fixed: component tables follow [`COMPONENT_COLUMNS`],
//! summary tables follow the model's schema, and observation tables put
//! `.rownames` first, then the input columns, then `.fitted` and `.resid`.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::adapter::ModelAdapter;
use crate::error::TidyError;
use crate::schema::SchemaRegistry;
use crate::stats::two_sided_p;
use crate::table::{Column, Table, Value};
use crate::validator::{
    validate_input_selection, ComponentOptions, ADDED_COLUMNS, COMPONENT_COLUMNS, FITTED, RESID,
    ROWNAMES,
};

/// Inputs to [`augment`]. At most one may be set.
#[derive(Debug, Clone, Copy, Default)]
pub struct AugmentInput<'a> {
    /// The data the model was trained on.
    pub data: Option<&'a Table>,
    /// Held-out data to predict on.
    pub newdata: Option<&'a Table>,
}

impl<'a> AugmentInput<'a> {
    pub fn data(data: &'a Table) -> Self {
        Self {
            data: Some(data),
            newdata: None,
        }
    }

    pub fn newdata(newdata: &'a Table) -> Self {
        Self {
            data: None,
            newdata: Some(newdata),
        }
    }
}

/// Component-level view: one row per term.
pub fn tidy(model: &dyn ModelAdapter, options: &ComponentOptions) -> Table {
    let terms = model.terms();
    let names: Vec<&str> = terms.iter().map(|t| t.name.as_str()).collect();
    let estimates: Vec<f64> = terms.iter().map(|t| t.estimate).collect();

    let mut table = Table::with_rows(terms.len());
    table.push(Column::texts(COMPONENT_COLUMNS[0], &names));
    table.push(Column::numbers(COMPONENT_COLUMNS[1], &estimates));
    if options.quick {
        return table;
    }

    let mut std_error = Vec::with_capacity(terms.len());
    let mut statistic = Vec::with_capacity(terms.len());
    let mut p_value = Vec::with_capacity(terms.len());
    for term in &terms {
        let z = term
            .std_error
            .filter(|se| *se > 0.0)
            .map(|se| term.estimate / se);
        std_error.push(Value::from(term.std_error));
        statistic.push(Value::from(z));
        p_value.push(Value::from(z.map(two_sided_p)));
    }
    table.push(Column::new("std.error", std_error));
    table.push(Column::new("statistic", statistic));
    table.push(Column::new("p.value", p_value));

    if options.wants_intervals() {
        let intervals = model.conf_int(options.conf_level);
        let mut low = Vec::with_capacity(terms.len());
        let mut high = Vec::with_capacity(terms.len());
        for i in 0..terms.len() {
            let bounds = intervals.get(i).copied().flatten();
            low.push(Value::from(bounds.map(|(lo, _)| lo)));
            high.push(Value::from(bounds.map(|(_, hi)| hi)));
        }
        table.push(Column::new("conf.low", low));
        table.push(Column::new("conf.high", high));
    }

    table
}

/// Model-level view: one row with exactly the registered columns.
pub fn glance(model: &dyn ModelAdapter, registry: &SchemaRegistry) -> Result<Table, TidyError> {
    let schema = registry.require(model.model_type())?;
    let mut metrics: HashMap<String, Value> = model.metrics().into_iter().collect();

    let mut table = Table::with_rows(1);
    for name in &schema.glance {
        let value = metrics.remove(name).unwrap_or(Value::Missing);
        table.push(Column::new(name.clone(), vec![value]));
    }

    if !metrics.is_empty() {
        let mut dropped: Vec<&String> = metrics.keys().collect();
        dropped.sort();
        tracing::debug!(
            model_type = model.model_type(),
            ?dropped,
            "Dropping metrics not declared in the schema"
        );
    }

    Ok(table)
}

/// Observation-level view: the input plus `.fitted` and, when the input
/// carries the response, `.resid`.
pub fn augment(model: &dyn ModelAdapter, input: AugmentInput<'_>) -> Result<Table, TidyError> {
    let base = augment_base(model, input)?;
    augment_onto(model, &base, input.newdata.is_some())
}

/// The table augmenting builds on: `data`, `newdata`, or the training
/// data the model reconstructs.
pub(crate) fn augment_base<'a>(
    model: &dyn ModelAdapter,
    input: AugmentInput<'a>,
) -> Result<Cow<'a, Table>, TidyError> {
    let reconstructed = if input.data.is_none() && input.newdata.is_none() {
        model.training_data()
    } else {
        None
    };
    validate_input_selection(
        input.data.is_some(),
        input.newdata.is_some(),
        reconstructed.is_some(),
    )?;

    match (input.data, input.newdata, reconstructed) {
        (Some(data), _, _) => Ok(Cow::Borrowed(data)),
        (_, Some(newdata), _) => Ok(Cow::Borrowed(newdata)),
        (_, _, Some(training)) => Ok(Cow::Owned(training)),
        (None, None, None) => Err(TidyError::MissingInput),
    }
}

/// Add the derived columns to `base`. `predicting` marks held-out data,
/// which is always predicted rather than read from the fit.
pub(crate) fn augment_onto(
    model: &dyn ModelAdapter,
    base: &Table,
    predicting: bool,
) -> Result<Table, TidyError> {
    let n = base.row_count();

    let fitted = match (predicting, model.fitted()) {
        (false, Some(fitted)) => fitted,
        _ => model.predict(base)?,
    };
    if fitted.len() != n {
        return Err(TidyError::RowMismatch {
            input_rows: n,
            produced: fitted.len(),
        });
    }

    let observed: Option<Vec<Option<f64>>> = model
        .response()
        .and_then(|r| base.column(r))
        .map(|c| c.values.iter().map(Value::as_number).collect());
    let resid = observed.map(|observed| {
        let own = if !predicting {
            model.residuals().filter(|r| r.len() == n)
        } else {
            None
        };
        own.unwrap_or_else(|| {
            observed
                .iter()
                .zip(&fitted)
                .map(|(y, f)| Some((*y)? - (*f)?))
                .collect()
        })
    });

    let mut table = Table::with_rows(n);
    if let Some(row_names) = &base.row_names {
        table.push(Column::texts(ROWNAMES, row_names));
    }
    for column in &base.columns {
        if ADDED_COLUMNS.contains(&column.name.as_str()) {
            tracing::warn!(column = %column.name, "Input column collides with an added column and is replaced");
            continue;
        }
        table.push(column.clone());
    }
    table.push(Column::new(FITTED, fitted.into_iter().map(Value::from).collect()));
    if let Some(resid) = resid {
        table.push(Column::new(RESID, resid.into_iter().map(Value::from).collect()));
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LinearFit, INTERCEPT};
    use crate::validator::{ObservationExpectation, TidyContractValidator};

    fn training() -> Table {
        Table::new(vec![
            Column::numbers("x", &[0.0, 1.0, 2.0, 3.0]),
            Column::numbers("y", &[1.0, 3.0, 5.0, 8.0]),
        ])
    }

    fn fit() -> LinearFit {
        LinearFit::new(&[INTERCEPT, "x"], &[1.0, 2.0])
            .unwrap()
            .with_std_errors(&[0.5, 0.25])
            .unwrap()
            .with_training_data(training(), "y")
    }

    #[test]
    fn test_tidy_concrete_scenario() {
        let model = LinearFit::new(&[INTERCEPT, "x"], &[1.5, -0.3]).unwrap();
        let table = tidy(&model, &ComponentOptions::quick());
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_names(), vec!["term", "estimate"]);
        assert_eq!(table.get(0, "term"), Some(&Value::from(INTERCEPT)));
        assert_eq!(table.get(0, "estimate"), Some(&Value::Number(1.5)));
        assert_eq!(table.get(1, "term"), Some(&Value::from("x")));
        assert_eq!(table.get(1, "estimate"), Some(&Value::Number(-0.3)));
    }

    #[test]
    fn test_tidy_full_columns() {
        let table = tidy(&fit(), &ComponentOptions::with_conf_int(0.9));
        assert_eq!(table.column_names(), COMPONENT_COLUMNS.to_vec());
        assert_eq!(table.get(1, "statistic"), Some(&Value::Number(8.0)));
        let p = table.get(1, "p.value").and_then(Value::as_number).unwrap();
        assert!(p < 1e-10);

        let registry = SchemaRegistry::builtin().unwrap();
        let validator = TidyContractValidator::new(registry);
        assert!(validator
            .validate_component_table(&table, &ComponentOptions::with_conf_int(0.9))
            .is_ok());
    }

    #[test]
    fn test_tidy_without_std_errors_has_missing_intervals() {
        let model = LinearFit::new(&["x"], &[2.0]).unwrap();
        let table = tidy(&model, &ComponentOptions::with_conf_int(0.95));
        assert!(table.get(0, "std.error").unwrap().is_missing());
        assert!(table.get(0, "p.value").unwrap().is_missing());
        assert!(table.get(0, "conf.low").unwrap().is_missing());
        assert!(table.get(0, "conf.high").unwrap().is_missing());
    }

    #[test]
    fn test_glance_fills_schema() {
        let registry = SchemaRegistry::builtin().unwrap();
        let table = glance(&fit(), registry).unwrap();
        assert_eq!(table.row_count(), 1);
        let expected: Vec<&str> = registry.get("lm").unwrap().glance.iter().map(String::as_str).collect();
        assert_eq!(table.column_names(), expected);

        // Without data every data-derived metric is missing, but present.
        let bare = LinearFit::new(&[INTERCEPT, "x"], &[1.5, -0.3]).unwrap();
        let table = glance(&bare, registry).unwrap();
        assert_eq!(table.column_names(), expected);
        assert!(table.get(0, "sigma").unwrap().is_missing());
        assert_eq!(table.get(0, "df"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn test_glance_unregistered_model_type() {
        let registry = SchemaRegistry::new();
        assert!(matches!(
            glance(&fit(), &registry),
            Err(TidyError::UnknownModelType { .. })
        ));
    }

    #[test]
    fn test_augment_reconstructs_training_data() {
        let table = augment(&fit(), AugmentInput::default()).unwrap();
        assert_eq!(table.column_names(), vec!["x", "y", FITTED, RESID]);
        assert_eq!(table.get(3, RESID), Some(&Value::Number(1.0)));

        let expect = ObservationExpectation::from_input(&training(), Some("y"));
        let registry = SchemaRegistry::builtin().unwrap();
        assert!(TidyContractValidator::new(registry)
            .validate_observation_table(&table, &expect)
            .is_ok());
    }

    #[test]
    fn test_augment_newdata_without_response() {
        let newdata = Table::new(vec![Column::numbers("x", &[5.0, 6.0])]);
        let table = augment(&fit(), AugmentInput::newdata(&newdata)).unwrap();
        assert_eq!(table.column_names(), vec!["x", FITTED]);
        assert_eq!(table.get(1, FITTED), Some(&Value::Number(13.0)));
    }

    #[test]
    fn test_augment_newdata_with_response() {
        let newdata = Table::new(vec![
            Column::numbers("x", &[5.0]),
            Column::numbers("y", &[10.0]),
        ]);
        let table = augment(&fit(), AugmentInput::newdata(&newdata)).unwrap();
        assert_eq!(table.get(0, RESID), Some(&Value::Number(-1.0)));
    }

    #[test]
    fn test_augment_row_names_first() {
        let named = training().with_row_names(
            ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect(),
        );
        let table = augment(&fit(), AugmentInput::data(&named)).unwrap();
        assert_eq!(table.column_names(), vec![ROWNAMES, "x", "y", FITTED, RESID]);
        assert_eq!(table.get(2, ROWNAMES), Some(&Value::from("c")));
    }

    #[test]
    fn test_augment_conflicting_and_missing_input() {
        let data = training();
        let both = AugmentInput {
            data: Some(&data),
            newdata: Some(&data),
        };
        assert!(matches!(augment(&fit(), both), Err(TidyError::ConflictingInput)));

        let bare = LinearFit::new(&[INTERCEPT, "x"], &[1.5, -0.3]).unwrap();
        assert!(matches!(
            augment(&bare, AugmentInput::default()),
            Err(TidyError::MissingInput)
        ));
    }

    #[test]
    fn test_augment_data_row_mismatch() {
        let short = Table::new(vec![
            Column::numbers("x", &[0.0, 1.0]),
            Column::numbers("y", &[1.0, 3.0]),
        ]);
        assert!(matches!(
            augment(&fit(), AugmentInput::data(&short)),
            Err(TidyError::RowMismatch {
                input_rows: 2,
                produced: 4
            })
        ));
    }

    #[test]
    fn test_augment_replaces_colliding_column() {
        let mut data = training();
        data.push(Column::numbers(FITTED, &[0.0; 4]));
        let table = augment(&fit(), AugmentInput::data(&data)).unwrap();
        assert_eq!(table.column_names(), vec!["x", "y", FITTED, RESID]);
        assert_eq!(table.get(0, FITTED), Some(&Value::Number(1.0)));
    }
}
