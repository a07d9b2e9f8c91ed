//! Property-based tests for rota-math.
//!
//! Uses proptest to verify statistical and model invariants across many
//! random inputs.

use proptest::prelude::*;
use rota_math::{
    coefficient_of_variation, gini, mean, percentile, population_std, ForestConfig,
    IsolationForest, IsolationForestConfig, RandomForestRegressor, StandardScaler,
};

const TOL: f64 = 1e-9;

fn loads() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0..40.0f64, 1..30)
}

fn matrix(max_rows: usize) -> impl Strategy<Value = Vec<Vec<f64>>> {
    (1..6usize).prop_flat_map(move |width| {
        prop::collection::vec(prop::collection::vec(-50.0..50.0f64, width), 1..max_rows)
    })
}

// ============================================================================
// Descriptive statistics
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Equal loads have no variation.
    #[test]
    fn cv_of_constant_is_zero(value in 0.5..40.0f64, n in 1..20usize) {
        let v = vec![value; n];
        prop_assert!(coefficient_of_variation(&v).abs() < TOL);
    }

    /// Scaling every load by a constant leaves the CV unchanged.
    #[test]
    fn cv_is_scale_invariant(v in loads(), k in 0.5..10.0f64) {
        prop_assume!(mean(&v) > 0.0);
        let scaled: Vec<f64> = v.iter().map(|x| x * k).collect();
        let a = coefficient_of_variation(&v);
        let b = coefficient_of_variation(&scaled);
        prop_assert!((a - b).abs() < 1e-7, "cv {} vs {}", a, b);
    }

    #[test]
    fn std_is_non_negative(v in loads()) {
        prop_assert!(population_std(&v) >= 0.0);
    }

    #[test]
    fn gini_in_unit_interval(v in loads()) {
        let g = gini(&v);
        prop_assert!((0.0..1.0).contains(&g), "gini {}", g);
    }

    /// Percentile stays within the sample range.
    #[test]
    fn percentile_bounded(v in loads(), q in 0.0..100.0f64) {
        let p = percentile(&v, q);
        let lo = v.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = v.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(p >= lo - TOL && p <= hi + TOL);
    }
}

// ============================================================================
// Scaling and models
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Standardised columns have zero mean.
    #[test]
    fn scaled_columns_are_centred(rows in matrix(20)) {
        let (_, scaled) = StandardScaler::fit_transform(&rows).unwrap();
        let width = rows[0].len();
        for c in 0..width {
            let col: Vec<f64> = scaled.iter().map(|r| r[c]).collect();
            prop_assert!(mean(&col).abs() < 1e-6);
        }
    }

    /// Isolation scores always lie in [-1, 0).
    #[test]
    fn isolation_scores_in_range(rows in matrix(40)) {
        let config = IsolationForestConfig { n_estimators: 20, ..Default::default() };
        let results = IsolationForest::fit_score(&rows, &config).unwrap();
        prop_assert_eq!(results.len(), rows.len());
        for (_, s) in results {
            prop_assert!((-1.0..0.0).contains(&s), "score {}", s);
        }
    }

    /// Forest predictions never leave the range of the training targets.
    #[test]
    fn forest_predictions_bounded(rows in matrix(30), seed in 0u64..1000) {
        let y: Vec<f64> = rows.iter().map(|r| if r[0] > 0.0 { 1.0 } else { 0.0 }).collect();
        let config = ForestConfig { n_estimators: 8, seed, ..Default::default() };
        let forest = RandomForestRegressor::fit(&rows, &y, &config).unwrap();
        for row in &rows {
            let p = forest.predict_row(row).unwrap();
            prop_assert!((-TOL..=1.0 + TOL).contains(&p), "prediction {}", p);
        }
    }
}
