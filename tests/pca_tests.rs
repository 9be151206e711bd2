use approx::assert_abs_diff_eq;
use ndarray::Array2;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use nipals_pca::{
    cross_validate, fit, CrossValidation, KFold, LeaveOneOut, PcaConfig, PcaError, Preprocessing,
};

/// Random matrix with per-column scaling so the singular spectrum has clear
/// gaps and every component converges quickly.
fn generate_test_data(n_samples: usize, n_features: usize, seed: u64) -> Array2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Array2::from_shape_fn((n_samples, n_features), |(_, column)| {
        rng.gen_range(-1.0..1.0) * (column + 1) as f64
    })
}

fn center_config(num_components: usize) -> PcaConfig {
    PcaConfig {
        num_components: Some(num_components),
        preprocessing: Preprocessing::Center,
    }
}

#[test]
fn loadings_have_unit_norm() {
    let data = generate_test_data(12, 5, 42);
    let model = fit(data.view(), &center_config(5)).unwrap();

    for column in model.loadings().columns() {
        assert_abs_diff_eq!(column.dot(&column).sqrt(), 1.0, epsilon = 1e-9);
    }
}

#[test]
fn calibration_press_is_non_increasing() {
    let data = generate_test_data(15, 6, 7);
    let model = fit(data.view(), &center_config(6)).unwrap();

    let press = model.calibration().press();
    for pair in press.windows(2) {
        assert!(
            pair[1] <= pair[0] + 1e-8,
            "total PRESS increased from {} to {}",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn cumulative_explained_variance_is_monotone_and_bounded() {
    let data = generate_test_data(15, 6, 11);
    let model = fit(data.view(), &center_config(6)).unwrap();

    let cumulative = model.calibration().cumulative_explained();
    assert_abs_diff_eq!(cumulative[0], 0.0, epsilon = 1e-12);
    for pair in cumulative.windows(2) {
        assert!(pair[1] >= pair[0] - 1e-8);
    }
    for &value in cumulative.iter() {
        assert!((-1e-8..=100.0 + 1e-8).contains(&value));
    }
}

#[test]
fn full_rank_reconstruction_round_trips() {
    let data = generate_test_data(10, 3, 3);
    let model = fit(data.view(), &center_config(3)).unwrap();

    let last_residual = model.residual(3).unwrap();
    for value in last_residual.iter() {
        assert_abs_diff_eq!(*value, 0.0, epsilon = 1e-3);
    }

    let reconstruction = model.reconstruction(3).unwrap();
    for (a, b) in reconstruction.iter().zip(data.iter()) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-3);
    }
}

#[test]
fn linearly_dependent_columns_are_explained_by_two_components() {
    // Column 3 = column 1 + column 2, so two components carry everything.
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut data = Array2::from_shape_fn((10, 3), |(row, column)| match column {
        0 | 1 => rng.gen_range(-2.0..2.0) * (row as f64 * 0.1 + 1.0),
        _ => 0.0,
    });
    for row in 0..10 {
        data[[row, 2]] = data[[row, 0]] + data[[row, 1]];
    }

    let model = fit(data.view(), &center_config(2)).unwrap();

    let residual = model.residual(2).unwrap();
    for value in residual.iter() {
        assert_abs_diff_eq!(*value, 0.0, epsilon = 1e-3);
    }
    let cumulative = model.calibration().cumulative_explained();
    assert_abs_diff_eq!(cumulative[2], 100.0, epsilon = 1e-3);
}

#[test]
fn component_request_is_silently_capped() {
    let data = generate_test_data(10, 4, 5);
    let config = PcaConfig {
        num_components: Some(50),
        preprocessing: Preprocessing::Center,
    };
    let model = fit(data.view(), &config).unwrap();

    assert_eq!(model.num_components(), 4);
    assert_eq!(model.scores().ncols(), 4);
    assert_eq!(model.loadings().ncols(), 4);
}

#[test]
fn leave_one_out_runs_one_fold_per_observation() {
    let data = generate_test_data(5, 3, 21);
    let result = cross_validate(data.view(), &center_config(2), &LeaveOneOut).unwrap();

    assert_eq!(result.fold_params().len(), 5);
    for prediction in result.predictions() {
        assert_eq!(prediction.nrows(), 5);
        assert!(prediction.iter().all(|value| value.is_finite()));
    }

    // Each fold's mean comes from the other four rows, so no two folds can
    // share parameters on generic data.
    for fold in 1..5 {
        let first = result.fold_params()[0].mean();
        let other = result.fold_params()[fold].mean();
        assert!(first.iter().zip(other.iter()).any(|(a, b)| (a - b).abs() > 1e-12));
    }
}

#[test]
fn test_rows_never_influence_their_folds_parameters() {
    let data = generate_test_data(6, 4, 33);
    let config = center_config(2);
    let baseline = cross_validate(data.view(), &config, &KFold::new(2)).unwrap();

    // Perturb only the rows fold 0 predicts (its test block) and rerun.
    let mut perturbed = data.clone();
    for row in 0..3 {
        for value in perturbed.row_mut(row).iter_mut() {
            *value += 1000.0;
        }
    }
    let rerun = cross_validate(perturbed.view(), &config, &KFold::new(2)).unwrap();

    let before = baseline.fold_params()[0].mean();
    let after = rerun.fold_params()[0].mean();
    for (a, b) in before.iter().zip(after.iter()) {
        assert_abs_diff_eq!(a, b, epsilon = 1e-12);
    }
}

#[test]
fn constant_column_fails_standardization_without_infinities() {
    let mut data = generate_test_data(8, 3, 17);
    for row in 0..8 {
        data[[row, 1]] = 4.2;
    }
    let config = PcaConfig {
        num_components: Some(2),
        preprocessing: Preprocessing::Standardize,
    };
    let result = fit(data.view(), &config);
    assert!(matches!(result, Err(PcaError::ConstantColumn { column: 1 })));
}

#[test]
fn kfold_validation_produces_complete_tables() {
    let data = generate_test_data(9, 4, 13);
    let config = center_config(3);
    let result = cross_validate(data.view(), &config, &KFold::new(3)).unwrap();

    assert_eq!(result.num_components(), 3);
    assert_eq!(result.predictions().len(), 3);
    for prediction in result.predictions() {
        assert_eq!(prediction.dim(), (9, 4));
    }

    let summary = result.summary();
    assert_eq!(summary.press().len(), 4);
    assert_eq!(summary.press_per_variable().dim(), (4, 4));
    assert_abs_diff_eq!(summary.cumulative_explained()[0], 0.0, epsilon = 1e-12);
    assert_eq!(summary.explained_per_component().len(), 3);
}

#[test]
fn label_folds_hold_out_whole_groups() {
    let data = generate_test_data(6, 3, 29);
    let strategy = CrossValidation::LeaveOneLabelOut {
        labels: vec![1, 1, 2, 2, 3, 3],
    };
    let result = cross_validate(data.view(), &center_config(2), &strategy).unwrap();

    assert_eq!(result.fold_params().len(), 3);
    assert_eq!(result.prediction(2).unwrap().nrows(), 6);
}

#[test]
fn zero_component_request_is_a_configuration_error() {
    let data = generate_test_data(6, 3, 1);
    let config = PcaConfig {
        num_components: Some(0),
        preprocessing: Preprocessing::Center,
    };
    assert!(matches!(
        fit(data.view(), &config),
        Err(PcaError::ZeroComponents)
    ));
}

#[test]
fn all_zero_data_reports_degeneracy_not_nan() {
    let data = Array2::<f64>::zeros((6, 3));
    let result = fit(data.view(), &center_config(2));
    assert!(matches!(
        result,
        Err(PcaError::DegenerateResidual { component: 1 })
    ));
}

#[test]
fn validated_explained_variance_tracks_structure() {
    // Strong rank-2 structure plus small noise: cross-validation should
    // attribute most of the variance to the first two components.
    let mut rng = ChaCha8Rng::seed_from_u64(55);
    let mut data = Array2::zeros((20, 5));
    for row in 0..20 {
        let a: f64 = rng.gen_range(-3.0..3.0);
        let b: f64 = rng.gen_range(-3.0..3.0);
        for column in 0..5 {
            let weight_a = (column as f64 + 1.0) * 0.5;
            let weight_b = 2.5 - column as f64 * 0.4;
            data[[row, column]] =
                a * weight_a + b * weight_b + rng.gen_range(-0.01..0.01);
        }
    }

    let result = cross_validate(data.view(), &center_config(2), &KFold::new(5)).unwrap();
    let cumulative = result.summary().cumulative_explained();
    assert!(
        cumulative[2] > 95.0,
        "expected two components to explain most variance, got {}",
        cumulative[2]
    );

    let model = fit(data.view(), &center_config(2)).unwrap();
    assert!(model.calibration().cumulative_explained()[2] > 99.0);
}

#[test]
fn calibration_matches_between_center_and_standardize_per_variable_tables() {
    let data = generate_test_data(12, 4, 61);
    let centered = fit(data.view(), &center_config(3)).unwrap();
    let standardized = fit(
        data.view(),
        &PcaConfig {
            num_components: Some(3),
            preprocessing: Preprocessing::Standardize,
        },
    )
    .unwrap();

    // The aggregation formulas differ by mode; both tables must still have
    // the baseline sentinel and full component range.
    assert_eq!(centered.calibration().cumulative_explained().len(), 4);
    assert_eq!(standardized.calibration().cumulative_explained().len(), 4);
    assert_abs_diff_eq!(
        standardized.calibration().cumulative_explained()[0],
        0.0,
        epsilon = 1e-12
    );
}
