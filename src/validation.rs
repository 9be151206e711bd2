use log::{debug, info};
use ndarray::{s, Array2, ArrayView2, Axis};
use rayon::prelude::*;

use crate::calibration::{validation_baseline, VarianceSummary};
use crate::config::PcaConfig;
use crate::error::{PcaError, Result};
use crate::folds::{FoldIndices, FoldSource};
use crate::nipals::decompose;
use crate::preprocess::PreprocessingParams;

/// Out-of-fold predictions for one fold, in original units, plus the
/// train-derived preprocessing parameters that produced them.
struct FoldOutcome {
    /// One (test_rows × p) prediction per cumulative component count.
    predictions: Vec<Array2<f64>>,
    params: PreprocessingParams,
}

/// Cross-validation result: assembled out-of-fold predictions and the
/// validation-side statistics.
#[derive(Clone, Debug)]
pub struct ValidationResult {
    num_components: usize,
    predictions: Vec<Array2<f64>>,
    summary: VarianceSummary,
    fold_params: Vec<PreprocessingParams>,
}

impl ValidationResult {
    /// Number of components refitted in every fold.
    pub fn num_components(&self) -> usize {
        self.num_components
    }

    /// Assembled out-of-fold reconstructions, one (n × p) matrix per
    /// cumulative component count 1..=k, rows in original input order.
    pub fn predictions(&self) -> &[Array2<f64>] {
        &self.predictions
    }

    /// Out-of-fold reconstruction for `count` components (1-based).
    pub fn prediction(&self, count: usize) -> Option<&Array2<f64>> {
        count
            .checked_sub(1)
            .and_then(|index| self.predictions.get(index))
    }

    /// Validation-side PRESS/MSE/RMSE and explained-variance tables.
    pub fn summary(&self) -> &VarianceSummary {
        &self.summary
    }

    /// Train-derived preprocessing parameters of each fold, in fold order.
    pub fn fold_params(&self) -> &[PreprocessingParams] {
        &self.fold_params
    }
}

/// Estimates predictive explained variance by refitting the model once per
/// fold and predicting each observation out-of-fold.
///
/// Every fold derives its preprocessing parameters from its training rows
/// only and applies them unchanged to its test rows; the test rows never
/// inform the parameters they are judged against. Folds are processed in
/// parallel and reduced in fold order, so the assembled predictions are
/// deterministic.
///
/// # Errors
///
/// Configuration errors as in [`crate::fit`]; `InvalidFolds` if the fold
/// source's test sets do not cover every row exactly once or contain
/// out-of-range indices; `FoldFailed` naming the lowest-indexed fold whose
/// refit failed (a partial validation pass would be misleading, so the
/// whole pass aborts).
pub fn cross_validate<F: FoldSource>(
    data: ArrayView2<f64>,
    config: &PcaConfig,
    folds: &F,
) -> Result<ValidationResult> {
    let n_rows = data.nrows();
    let n_cols = data.ncols();
    if n_rows == 0 || n_cols == 0 {
        return Err(PcaError::EmptyInput {
            rows: n_rows,
            cols: n_cols,
        });
    }
    if n_rows < 2 {
        return Err(PcaError::TooFewRows { rows: n_rows });
    }

    let mut num_components = config.resolve_components(n_rows, n_cols)?;
    let fold_list = folds.folds(n_rows)?;
    check_fold_coverage(&fold_list, n_rows)?;

    // A fold-local decomposition cannot extract more components than its
    // own training block supports.
    let smallest_train = fold_list
        .iter()
        .map(|fold| fold.train.len())
        .min()
        .unwrap_or(0);
    if smallest_train.min(n_cols) < num_components {
        log::warn!(
            "Clamping cross-validation components from {} to {} (smallest training fold has {} rows)",
            num_components,
            smallest_train.min(n_cols),
            smallest_train
        );
        num_components = smallest_train.min(n_cols);
    }
    if num_components == 0 {
        return Err(PcaError::InvalidFolds(
            "a fold has an empty training set".to_string(),
        ));
    }

    info!(
        "Cross-validating NIPALS PCA: {} rows, {} columns, {} components, {} folds",
        n_rows,
        n_cols,
        num_components,
        fold_list.len()
    );

    // Folds are independent; process them in parallel, then report the
    // lowest-indexed failure (if any) for a deterministic error.
    let outcomes: Vec<Result<FoldOutcome>> = fold_list
        .par_iter()
        .map(|fold| process_fold(data, fold, config, num_components))
        .collect();

    let mut fold_outcomes = Vec::with_capacity(outcomes.len());
    for (fold, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(result) => fold_outcomes.push(result),
            Err(source) => {
                return Err(PcaError::FoldFailed {
                    fold,
                    source: Box::new(source),
                })
            }
        }
    }

    // Scatter each fold's partial predictions back to the original row
    // positions, one assembled matrix per cumulative component count.
    let mut predictions = vec![Array2::zeros((n_rows, n_cols)); num_components];
    for (fold, outcome) in fold_list.iter().zip(&fold_outcomes) {
        for (assembled, fold_prediction) in predictions.iter_mut().zip(&outcome.predictions) {
            for (local_row, &global_row) in fold.test.iter().enumerate() {
                assembled
                    .row_mut(global_row)
                    .assign(&fold_prediction.row(local_row));
            }
        }
    }

    let baseline = validation_baseline(data);
    let summary = VarianceSummary::summarize(data, &predictions, baseline, config.preprocessing);

    Ok(ValidationResult {
        num_components,
        predictions,
        summary,
        fold_params: fold_outcomes
            .into_iter()
            .map(|outcome| outcome.params)
            .collect(),
    })
}

/// Refits the model on one fold's training rows and predicts its test rows
/// for every cumulative component count.
fn process_fold(
    data: ArrayView2<f64>,
    fold: &FoldIndices,
    config: &PcaConfig,
    num_components: usize,
) -> Result<FoldOutcome> {
    let train = data.select(Axis(0), &fold.train);
    let test = data.select(Axis(0), &fold.test);

    // Parameters come from the training rows only; the same parameters are
    // applied to the test rows.
    let params = PreprocessingParams::fit(train.view(), config.preprocessing)?;
    let train_processed = params.apply(train.view());
    let test_processed = params.apply(test.view());

    let decomposition = decompose(train_processed.view(), num_components)?;
    let projected = test_processed.dot(&decomposition.loadings);
    debug!(
        "Fold with {} train / {} test rows projected onto {} components",
        fold.train.len(),
        fold.test.len(),
        num_components
    );

    let mut fold_predictions = Vec::with_capacity(num_components);
    for count in 1..=num_components {
        let partial_scores = projected.slice(s![.., ..count]);
        let partial_loadings = decomposition.loadings.slice(s![.., ..count]);
        let reconstruction = partial_scores.dot(&partial_loadings.t());
        fold_predictions.push(params.restore(reconstruction.view()));
    }

    Ok(FoldOutcome {
        predictions: fold_predictions,
        params,
    })
}

/// Checks that train/test indices are in bounds, that train and test are
/// disjoint and non-empty within each fold, and that the test sets cover
/// every row exactly once.
fn check_fold_coverage(fold_list: &[FoldIndices], n_rows: usize) -> Result<()> {
    if fold_list.is_empty() {
        return Err(PcaError::InvalidFolds("fold source yielded no folds".to_string()));
    }

    let mut coverage = vec![0usize; n_rows];
    for (fold, indices) in fold_list.iter().enumerate() {
        if indices.train.is_empty() || indices.test.is_empty() {
            return Err(PcaError::InvalidFolds(format!(
                "fold {} has an empty train or test set",
                fold
            )));
        }
        for &row in indices.train.iter().chain(indices.test.iter()) {
            if row >= n_rows {
                return Err(PcaError::InvalidFolds(format!(
                    "fold {} references row {} of a {}-row matrix",
                    fold, row, n_rows
                )));
            }
        }
        for &row in &indices.test {
            if indices.train.contains(&row) {
                return Err(PcaError::InvalidFolds(format!(
                    "fold {} uses row {} for both training and testing",
                    fold, row
                )));
            }
            coverage[row] += 1;
        }
    }

    if let Some(row) = coverage.iter().position(|&count| count != 1) {
        return Err(PcaError::InvalidFolds(format!(
            "row {} is predicted {} times across the test sets (expected exactly once)",
            row, coverage[row]
        )));
    }
    Ok(())
}
