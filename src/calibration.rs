use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::config::Preprocessing;

/// Subtracts each column's own mean from `matrix`.
pub(crate) fn center_columns(matrix: ArrayView2<f64>) -> Array2<f64> {
    let n_rows = matrix.nrows();
    let mean = matrix.sum_axis(Axis(0)) / n_rows as f64;
    let mut centered = matrix.to_owned();
    centered -= &mean;
    centered
}

/// Zero-model PRESS per variable for the calibration regime: the sum of
/// squared column-centered values.
pub(crate) fn calibration_baseline(original: ArrayView2<f64>) -> Array1<f64> {
    center_columns(original)
        .mapv(|value| value * value)
        .sum_axis(Axis(0))
}

/// Zero-model PRESS per variable for the validation regime: the unbiased
/// sample variance scaled by n²/n. Distinct from the calibration baseline
/// because the null model is itself estimated under cross-validation bias.
pub(crate) fn validation_baseline(original: ArrayView2<f64>) -> Array1<f64> {
    let n_rows = original.nrows();
    original.var_axis(Axis(0), 1.0) * n_rows as f64
}

/// PRESS, MSE, RMSE and explained-variance tables for one regime
/// (calibration or validation).
///
/// Rows of the per-variable tables and entries of the totals are indexed by
/// cumulative component count; index 0 is the zero-model baseline.
#[derive(Clone, Debug)]
pub struct VarianceSummary {
    press_per_variable: Array2<f64>,
    mse_per_variable: Array2<f64>,
    rmse_per_variable: Array2<f64>,
    cumulative_explained_per_variable: Array2<f64>,
    press_total: Array1<f64>,
    mse_total: Array1<f64>,
    rmse_total: Array1<f64>,
    cumulative_explained_total: Array1<f64>,
    explained_per_component: Array1<f64>,
}

impl VarianceSummary {
    /// Builds the full table set from the original matrix and one
    /// reconstruction per cumulative component count (1..=k), both in
    /// original units.
    ///
    /// `baseline_press` supplies the per-variable zero-model row; callers
    /// pick [`calibration_baseline`] or [`validation_baseline`]. PRESS for
    /// k ≥ 1 compares the column-centered original against the
    /// column-centered reconstruction.
    ///
    /// The aggregate explained-variance formula is matched to the
    /// preprocessing mode: the ratio of aggregate MSEs under `Center`, the
    /// mean of per-variable percentages under `Standardize`. The two are
    /// not numerically identical and are both kept.
    pub(crate) fn summarize(
        original: ArrayView2<f64>,
        reconstructions: &[Array2<f64>],
        baseline_press: Array1<f64>,
        mode: Preprocessing,
    ) -> Self {
        let n_rows = original.nrows();
        let n_cols = original.ncols();
        let num_components = reconstructions.len();

        let centered_original = center_columns(original);

        let mut press_per_variable = Array2::zeros((num_components + 1, n_cols));
        press_per_variable.row_mut(0).assign(&baseline_press);
        for (index, reconstruction) in reconstructions.iter().enumerate() {
            let diff = &centered_original - &center_columns(reconstruction.view());
            let press = diff.mapv(|value| value * value).sum_axis(Axis(0));
            press_per_variable.row_mut(index + 1).assign(&press);
        }

        let mse_per_variable = &press_per_variable / n_rows as f64;
        let rmse_per_variable = mse_per_variable.mapv(f64::sqrt);

        let baseline_mse = mse_per_variable.row(0).to_owned();
        let mut cumulative_explained_per_variable = Array2::zeros(mse_per_variable.dim());
        for (index, mse_row) in mse_per_variable.rows().into_iter().enumerate() {
            let explained = (&baseline_mse - &mse_row) / &baseline_mse * 100.0;
            cumulative_explained_per_variable
                .row_mut(index)
                .assign(&explained);
        }

        let press_total = press_per_variable.sum_axis(Axis(1));
        let mse_total = mse_per_variable.sum_axis(Axis(1)) / n_cols as f64;
        let rmse_total = mse_total.mapv(f64::sqrt);

        let cumulative_explained_total = match mode {
            Preprocessing::Center => {
                let baseline = mse_total[0];
                mse_total.mapv(|mse| (baseline - mse) / baseline * 100.0)
            }
            Preprocessing::Standardize => cumulative_explained_per_variable
                .mean_axis(Axis(1))
                .unwrap_or_else(|| Array1::zeros(num_components + 1)),
        };

        let explained_per_component = Array1::from_iter(
            cumulative_explained_total
                .windows(2)
                .into_iter()
                .map(|pair| pair[1] - pair[0]),
        );

        VarianceSummary {
            press_per_variable,
            mse_per_variable,
            rmse_per_variable,
            cumulative_explained_per_variable,
            press_total,
            mse_total,
            rmse_total,
            cumulative_explained_total,
            explained_per_component,
        }
    }

    /// PRESS per variable; shape (k+1, p), row 0 is the zero-model baseline.
    pub fn press_per_variable(&self) -> &Array2<f64> {
        &self.press_per_variable
    }

    /// MSE per variable; shape (k+1, p).
    pub fn mse_per_variable(&self) -> &Array2<f64> {
        &self.mse_per_variable
    }

    /// RMSE per variable; shape (k+1, p).
    pub fn rmse_per_variable(&self) -> &Array2<f64> {
        &self.rmse_per_variable
    }

    /// Cumulative explained variance per variable, in percent; shape (k+1, p).
    pub fn cumulative_explained_per_variable(&self) -> &Array2<f64> {
        &self.cumulative_explained_per_variable
    }

    /// Total PRESS for component counts 0..=k.
    pub fn press(&self) -> &Array1<f64> {
        &self.press_total
    }

    /// Total MSE for component counts 0..=k.
    pub fn mse(&self) -> &Array1<f64> {
        &self.mse_total
    }

    /// Total RMSE for component counts 0..=k.
    pub fn rmse(&self) -> &Array1<f64> {
        &self.rmse_total
    }

    /// Total cumulative explained variance in percent for component counts
    /// 0..=k; entry 0 is always zero.
    pub fn cumulative_explained(&self) -> &Array1<f64> {
        &self.cumulative_explained_total
    }

    /// Explained variance contributed by each individual component, in
    /// percent; length k.
    pub fn explained_per_component(&self) -> &Array1<f64> {
        &self.explained_per_component
    }
}
