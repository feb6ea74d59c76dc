//! Property tests for the tidy/glance/augment contract.

use proptest::prelude::*;
use tidycheck_core::{
    augment, glance, tidy, AugmentInput, Column, ComponentOptions, LinearFit,
    ObservationExpectation, SchemaRegistry, Table, TidyContractValidator, TidyError, Value,
};

/// A linear model over predictors x0..xk with an intercept, plus a
/// training frame of `rows` observations.
fn model_strategy() -> impl Strategy<Value = (LinearFit, Table)> {
    (1usize..4, 1usize..20)
        .prop_flat_map(|(k, rows)| {
            (
                prop::collection::vec(-10.0f64..10.0, k + 1),
                prop::collection::vec(0.001f64..5.0, k + 1),
                prop::collection::vec(prop::collection::vec(-100.0f64..100.0, rows), k),
                prop::collection::vec(-100.0f64..100.0, rows),
            )
        })
        .prop_map(|(estimates, std_errors, predictors, response)| {
            let mut terms = vec!["(Intercept)".to_string()];
            let mut columns = Vec::new();
            for (i, values) in predictors.iter().enumerate() {
                terms.push(format!("x{}", i));
                columns.push(Column::numbers(format!("x{}", i), values));
            }
            columns.push(Column::numbers("y", &response));
            let data = Table::new(columns);

            let model = LinearFit::new(&terms, &estimates)
                .unwrap()
                .with_std_errors(&std_errors)
                .unwrap()
                .with_training_data(data.clone(), "y");
            (model, data)
        })
}

fn options_strategy() -> impl Strategy<Value = ComponentOptions> {
    (any::<bool>(), any::<bool>(), 0.5f64..0.999).prop_map(|(conf_int, quick, conf_level)| {
        ComponentOptions {
            conf_int,
            conf_level,
            quick,
        }
    })
}

proptest! {
    #[test]
    fn tidy_column_order_is_stable((model, _) in model_strategy(), options in options_strategy()) {
        let first = tidy(&model, &options);
        let second = tidy(&model, &options);
        prop_assert_eq!(first.column_names(), second.column_names());
    }

    #[test]
    fn tidy_output_satisfies_contract((model, _) in model_strategy(), options in options_strategy()) {
        let registry = SchemaRegistry::builtin().unwrap();
        let validator = TidyContractValidator::new(registry);
        let table = tidy(&model, &options);
        prop_assert!(validator.validate_component_table(&table, &options).is_ok());
    }

    #[test]
    fn conf_low_never_exceeds_conf_high((model, _) in model_strategy(), level in 0.01f64..0.999) {
        let table = tidy(&model, &ComponentOptions::with_conf_int(level));
        let low = table.column("conf.low").unwrap().as_numbers();
        let high = table.column("conf.high").unwrap().as_numbers();
        for (lo, hi) in low.into_iter().zip(high) {
            if let (Some(lo), Some(hi)) = (lo, hi) {
                prop_assert!(lo <= hi);
            }
        }
    }

    #[test]
    fn quick_tables_have_exactly_term_and_estimate(
        (model, _) in model_strategy(),
        conf_int in any::<bool>(),
    ) {
        let options = ComponentOptions { quick: true, conf_int, ..ComponentOptions::default() };
        let table = tidy(&model, &options);
        prop_assert_eq!(table.column_names(), vec!["term", "estimate"]);
    }

    #[test]
    fn augment_keeps_every_row((model, data) in model_strategy(), holdout in 0usize..30) {
        let reconstructed = augment(&model, AugmentInput::default()).unwrap();
        prop_assert_eq!(reconstructed.row_count(), data.row_count());

        let explicit = augment(&model, AugmentInput::data(&data)).unwrap();
        prop_assert_eq!(explicit.row_count(), data.row_count());

        let predictors: Vec<Column> = data
            .columns
            .iter()
            .filter(|c| c.name != "y")
            .map(|c| Column::numbers(c.name.clone(), &vec![1.0; holdout]))
            .collect();
        let mut newdata = Table::new(predictors);
        newdata.n_rows = holdout;
        let predicted = augment(&model, AugmentInput::newdata(&newdata)).unwrap();
        prop_assert_eq!(predicted.row_count(), holdout);
    }

    #[test]
    fn supplying_data_and_newdata_always_conflicts((model, data) in model_strategy()) {
        let both = AugmentInput { data: Some(&data), newdata: Some(&data) };
        prop_assert!(matches!(augment(&model, both), Err(TidyError::ConflictingInput)));
    }

    #[test]
    fn residuals_follow_response_availability((model, data) in model_strategy()) {
        let registry = SchemaRegistry::builtin().unwrap();
        let validator = TidyContractValidator::new(registry);

        let training = augment(&model, AugmentInput::default()).unwrap();
        prop_assert!(training.has_column(".fitted"));
        prop_assert!(training.has_column(".resid"));
        let expect = ObservationExpectation::from_input(&data, Some("y"));
        prop_assert!(validator.validate_observation_table(&training, &expect).is_ok());

        let holdout = Table::new(
            data.columns.iter().filter(|c| c.name != "y").cloned().collect(),
        );
        let predicted = augment(&model, AugmentInput::newdata(&holdout)).unwrap();
        prop_assert!(predicted.has_column(".fitted"));
        prop_assert!(!predicted.has_column(".resid"));
        let expect = ObservationExpectation::from_input(&holdout, Some("y"));
        prop_assert!(validator.validate_observation_table(&predicted, &expect).is_ok());
    }

    #[test]
    fn glance_has_one_row((model, _) in model_strategy()) {
        let registry = SchemaRegistry::builtin().unwrap();
        let table = glance(&model, registry).unwrap();
        prop_assert_eq!(table.row_count(), 1);
        let validator = TidyContractValidator::new(registry);
        prop_assert!(validator.validate_summary_table(&table, "lm").is_ok());
    }
}

#[test]
fn tidy_concrete_scenario() {
    let model = LinearFit::new(&["(Intercept)", "x"], &[1.5, -0.3]).unwrap();
    let table = tidy(&model, &ComponentOptions::quick());

    assert_eq!(table.row_count(), 2);
    assert_eq!(table.column_names(), vec!["term", "estimate"]);
    assert_eq!(table.get(0, "term"), Some(&Value::from("(Intercept)")));
    assert_eq!(table.get(0, "estimate"), Some(&Value::Number(1.5)));
    assert_eq!(table.get(1, "term"), Some(&Value::from("x")));
    assert_eq!(table.get(1, "estimate"), Some(&Value::Number(-0.3)));
}

#[test]
fn glance_one_row_for_every_registered_type() {
    let registry = SchemaRegistry::builtin().unwrap();
    let validator = TidyContractValidator::new(registry);
    for schema in registry.iter() {
        // A table with every declared metric missing is still schema-valid.
        let mut table = Table::with_rows(1);
        for name in &schema.glance {
            table.push(Column::new(name.clone(), vec![Value::Missing]));
        }
        assert_eq!(table.row_count(), 1);
        assert!(validator
            .validate_summary_table(&table, &schema.model_type)
            .is_ok());
    }
}
