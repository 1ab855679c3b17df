// In tests/reduce_tests.rs

use approx::assert_abs_diff_eq;
use finance_pca::dataset::{build_matrix, extract_features, generate_finance_data, FinanceMetric};
use finance_pca::projection::{component_angle, project_onto_angle, projected_variance};
use finance_pca::{
    reduce, reduce_rows, standardize, DecompositionStrategy, PcaConfig, PcaEngine, PcaError,
    PcaResult,
};
use ndarray::{array, Array2, ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::thread;

const DEFAULT_FLOAT_TOLERANCE_F64: f64 = 1e-9;

fn random_matrix(n_samples: usize, n_features: usize, seed: u64) -> Array2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Array2::from_shape_fn((n_samples, n_features), |_| rng.gen_range(0.0..100.0))
}

fn sample_variance(column: ArrayView1<f64>) -> f64 {
    let n = column.len() as f64;
    let mean = column.sum() / n;
    column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
}

// Helper for comparing component sets allowing for sign flips per row.
// Returns the chosen sign for each row so scores can be compared with it.
fn assert_rows_are_close_with_sign_flips(
    a: ArrayView2<f64>,
    b: ArrayView2<f64>,
    tolerance: f64,
    context: &str,
) -> Vec<f64> {
    assert_eq!(a.dim(), b.dim(), "Dimensions differ for {}", context);
    let mut signs = Vec::with_capacity(a.nrows());
    for (r, (row_a, row_b)) in a.rows().into_iter().zip(b.rows()).enumerate() {
        let direct = row_a
            .iter()
            .zip(row_b.iter())
            .all(|(x, y)| (x - y).abs() < tolerance);
        let flipped = row_a
            .iter()
            .zip(row_b.iter())
            .all(|(x, y)| (x + y).abs() < tolerance);
        assert!(
            direct || flipped,
            "Row {} of {} differs beyond a sign flip: {:?} vs {:?}",
            r,
            context,
            row_a,
            row_b
        );
        signs.push(if direct { 1.0 } else { -1.0 });
    }
    signs
}

fn assert_orthonormal(result: &PcaResult) {
    let c = &result.components;
    for i in 0..c.nrows() {
        assert_abs_diff_eq!(c.row(i).dot(&c.row(i)), 1.0, epsilon = 1e-9);
        for j in (i + 1)..c.nrows() {
            assert_abs_diff_eq!(c.row(i).dot(&c.row(j)), 0.0, epsilon = 1e-9);
        }
    }
}

#[test]
fn standardization_invariant_holds_for_random_inputs() {
    for seed in 0..5 {
        let x = random_matrix(6 + seed as usize, 4, seed);
        let st = standardize(x.view()).unwrap();
        for column in st.data.columns() {
            assert_abs_diff_eq!(column.sum() / column.len() as f64, 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(sample_variance(column).sqrt(), 1.0, epsilon = 1e-12);
        }
    }
}

#[test]
fn orthonormal_components_for_every_rank() {
    let x = random_matrix(20, 6, 42);
    for k in 1..=6 {
        let result = reduce(x.view(), k).unwrap();
        assert_orthonormal(&result);
        assert_eq!(result.components.dim(), (k, 6));
        assert_eq!(result.transformed.dim(), (20, k));
        assert_eq!(result.explained_variance.len(), k);
    }
}

#[test]
fn explained_variance_bounds_and_full_sum() {
    let x = random_matrix(15, 5, 7);
    let result = reduce(x.view(), 5).unwrap();
    assert!(result.explained_variance.iter().all(|&v| (0.0..=1.0).contains(&v)));
    assert_abs_diff_eq!(
        result.explained_variance.sum(),
        1.0,
        epsilon = DEFAULT_FLOAT_TOLERANCE_F64
    );
    for w in result.explained_variance.as_slice().unwrap().windows(2) {
        assert!(w[0] >= w[1] - 1e-12);
    }
}

#[test]
fn repeated_runs_agree_up_to_sign() {
    let x = random_matrix(25, 4, 3);
    let first = reduce(x.view(), 3).unwrap();
    let second = reduce(x.view(), 3).unwrap();
    let signs = assert_rows_are_close_with_sign_flips(
        first.components.view(),
        second.components.view(),
        1e-8,
        "components",
    );
    for (j, sign) in signs.iter().enumerate() {
        for (a, b) in first
            .transformed
            .column(j)
            .iter()
            .zip(second.transformed.column(j).iter())
        {
            assert_abs_diff_eq!(*a, sign * *b, epsilon = 1e-8);
        }
    }
}

#[test]
fn symmetric_square_scenario() {
    let x = array![[1.0, 1.0], [1.0, 3.0], [3.0, 1.0], [3.0, 3.0]];
    let st = standardize(x.view()).unwrap();
    for column in st.data.columns() {
        assert_abs_diff_eq!(column.sum(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sample_variance(column), 1.0, epsilon = 1e-12);
    }
    let result = reduce(x.view(), 2).unwrap();
    assert_orthonormal(&result);
    assert_abs_diff_eq!(result.explained_variance[0], 0.5, epsilon = 1e-9);
    assert_abs_diff_eq!(result.explained_variance[1], 0.5, epsilon = 1e-9);
}

#[test]
fn constant_feature_scenario() {
    let x = array![[3.0, 7.0, 1.0], [5.0, 7.0, 0.0], [4.0, 7.0, 2.5], [9.0, 7.0, 1.5]];
    let st = standardize(x.view()).unwrap();
    assert!(st.data.column(1).iter().all(|&v| v == 0.0));
    assert!(st.data.iter().all(|v| v.is_finite()));

    let result = reduce(x.view(), 2).unwrap();
    assert!(result.transformed.iter().all(|v| v.is_finite()));
    assert!(result.explained_variance.iter().all(|v| v.is_finite()));
}

#[test]
fn no_reduction_preserves_total_variance() {
    let x = random_matrix(12, 4, 19);
    let result = reduce(x.view(), 4).unwrap();
    let score_variance: f64 = result
        .transformed
        .columns()
        .into_iter()
        .map(sample_variance)
        .sum();
    assert_abs_diff_eq!(score_variance, result.total_variance, epsilon = 1e-9);
    assert_abs_diff_eq!(result.total_variance, 4.0, epsilon = 1e-9);
    assert_abs_diff_eq!(result.explained_variance.sum(), 1.0, epsilon = 1e-9);
}

#[test]
fn nested_rows_entry_point() {
    let rows = vec![vec![1.0, 2.0], vec![2.0, 1.0], vec![4.0, 4.5]];
    let result = reduce_rows(&rows, 1).unwrap();
    assert_eq!(result.transformed.dim(), (3, 1));

    let ragged = vec![vec![1.0, 2.0], vec![2.0]];
    assert!(matches!(reduce_rows(&ragged, 1), Err(PcaError::InvalidInput(_))));
    assert!(matches!(reduce_rows(&[], 1), Err(PcaError::InvalidInput(_))));
    assert!(matches!(reduce_rows(&rows, 3), Err(PcaError::InvalidInput(_))));
}

#[test]
fn reduced_rows_serialize_with_consumer_field_names() {
    let x = array![[1.0, 1.0], [1.0, 3.0], [3.0, 1.0], [3.0, 3.0]];
    let rows = reduce(x.view(), 2).unwrap().to_rows();
    let json = serde_json::to_value(&rows).unwrap();
    assert_eq!(json["transformed"].as_array().unwrap().len(), 4);
    assert_eq!(json["components"].as_array().unwrap().len(), 2);
    assert_eq!(json["explainedVariance"].as_array().unwrap().len(), 2);
}

#[test]
fn engine_is_shareable_across_threads() {
    let engine = Arc::new(PcaEngine::new(PcaConfig {
        random_seed: Some(2025),
        ..PcaConfig::default()
    }));
    let handles: Vec<_> = (0..4)
        .map(|seed| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let x = random_matrix(20, 5, seed);
                engine.reduce(x.view(), 2).map(|r| r.explained_variance.len())
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), 2);
    }
}

#[test]
fn finance_dataset_is_dominated_by_first_component() {
    let mut rng = ChaCha8Rng::seed_from_u64(2025);
    let records = generate_finance_data(&mut rng);
    let features = extract_features(&records);

    for strategy in [
        DecompositionStrategy::ExactWithFallback,
        DecompositionStrategy::PowerIteration,
    ] {
        let engine = PcaEngine::new(PcaConfig {
            strategy,
            random_seed: Some(1),
            ..PcaConfig::default()
        });
        let result = engine.reduce(features.view(), 2).unwrap();
        assert_eq!(result.transformed.dim(), (25, 2));
        assert!(
            result.explained_variance[0] > 0.5,
            "{:?}: {:?}",
            strategy,
            result.explained_variance
        );
        assert!(result.explained_variance.sum() <= 1.0 + 1e-12);
    }
}

#[test]
fn first_component_maximizes_projected_variance_in_two_dimensions() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let records = generate_finance_data(&mut rng);
    let x = build_matrix(&records, &[FinanceMetric::Pe, FinanceMetric::Roe]);
    let st = standardize(x.view()).unwrap();
    let result = reduce(x.view(), 1).unwrap();

    let best_angle = component_angle(result.components.row(0)).unwrap();
    let best = projected_variance(project_onto_angle(st.data.view(), best_angle).unwrap().view());
    assert_abs_diff_eq!(best, result.eigenvalues[0], epsilon = 1e-9);

    for step in 0..36 {
        let angle = step as f64 * std::f64::consts::PI / 36.0;
        let v = projected_variance(project_onto_angle(st.data.view(), angle).unwrap().view());
        assert!(v <= best + 1e-9, "angle {} beats first component: {} > {}", angle, v, best);
    }
}
