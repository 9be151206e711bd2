use log::info;
use ndarray::{s, Array1, Array2, ArrayView2};

use crate::calibration::{calibration_baseline, VarianceSummary};
use crate::config::{PcaConfig, Preprocessing};
use crate::error::{PcaError, Result};
use crate::nipals::decompose;
use crate::preprocess::PreprocessingParams;

/// Fits a PCA model to `data` and computes all calibration diagnostics.
///
/// The returned [`PcaModel`] is immutable: scores, loadings, residuals,
/// reconstructions and the calibration statistics are all computed here,
/// and the accessors are pure reads. Cross-validation is a separate entry
/// point, [`crate::cross_validate`].
///
/// # Errors
///
/// Returns a configuration error for an empty matrix, fewer than 2 rows or
/// a zero component request; a numerical-degeneracy error when
/// standardizing a constant column or when a residual direction vanishes;
/// and a non-convergence error when a component fails to converge within
/// the iteration budget.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use nipals_pca::{fit, PcaConfig};
///
/// let data = array![
///     [1.0, 4.0, 2.0],
///     [3.0, 1.0, 0.5],
///     [0.0, 2.0, 5.0],
///     [2.0, 0.0, 1.0]
/// ];
/// let model = fit(data.view(), &PcaConfig::default()).unwrap();
/// assert_eq!(model.scores().nrows(), 4);
/// assert_eq!(model.loadings().nrows(), 3);
/// ```
pub fn fit(data: ArrayView2<f64>, config: &PcaConfig) -> Result<PcaModel> {
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

    let num_components = config.resolve_components(n_rows, n_cols)?;
    info!(
        "Fitting NIPALS PCA: {} rows, {} columns, {} components",
        n_rows, n_cols, num_components
    );

    let params = PreprocessingParams::fit(data, config.preprocessing)?;
    let preprocessed = params.apply(data);
    let decomposition = decompose(preprocessed.view(), num_components)?;

    // Cumulative reconstructions X̂_k = T[:, :k]·P[:, :k]ᵀ, restored to
    // original units so they compare against the input.
    let mut reconstructions = Vec::with_capacity(num_components);
    for count in 1..=num_components {
        let scores = decomposition.scores.slice(s![.., ..count]);
        let loadings = decomposition.loadings.slice(s![.., ..count]);
        let reconstruction = scores.dot(&loadings.t());
        reconstructions.push(params.restore(reconstruction.view()));
    }

    let single_component_reconstructions = decomposition
        .rank_one_terms
        .iter()
        .map(|term| params.restore(term.view()))
        .collect();

    let baseline = calibration_baseline(data);
    let calibration =
        VarianceSummary::summarize(data, &reconstructions, baseline, config.preprocessing);

    let correlation_loadings = correlation_loadings(&decomposition.scores, preprocessed.view());

    Ok(PcaModel {
        preprocessing: config.preprocessing,
        num_components,
        params,
        scores: decomposition.scores,
        loadings: decomposition.loadings,
        residuals: decomposition.residuals,
        single_component_reconstructions,
        reconstructions,
        correlation_loadings,
        calibration,
    })
}

/// Pearson correlation between each score column and each preprocessed
/// variable; shape (n_cols, k).
fn correlation_loadings(scores: &Array2<f64>, preprocessed: ArrayView2<f64>) -> Array2<f64> {
    let mut table = Array2::zeros((preprocessed.ncols(), scores.ncols()));
    for (component, score) in scores.columns().into_iter().enumerate() {
        let score_centered = &score - score.mean().unwrap_or(0.0);
        let score_ss = score_centered.dot(&score_centered);
        for (variable, column) in preprocessed.columns().into_iter().enumerate() {
            let column_centered = &column - column.mean().unwrap_or(0.0);
            let column_ss = column_centered.dot(&column_centered);
            table[[variable, component]] =
                score_centered.dot(&column_centered) / (score_ss * column_ss).sqrt();
        }
    }
    table
}

/// A fitted PCA model: scores, loadings, residuals, reconstructions and
/// calibration statistics, all computed eagerly by [`fit`].
#[derive(Clone, Debug)]
pub struct PcaModel {
    preprocessing: Preprocessing,
    num_components: usize,
    params: PreprocessingParams,
    scores: Array2<f64>,
    loadings: Array2<f64>,
    residuals: Vec<Array2<f64>>,
    single_component_reconstructions: Vec<Array2<f64>>,
    reconstructions: Vec<Array2<f64>>,
    correlation_loadings: Array2<f64>,
    calibration: VarianceSummary,
}

impl PcaModel {
    /// The preprocessing mode the model was fitted under.
    pub fn preprocessing(&self) -> Preprocessing {
        self.preprocessing
    }

    /// Number of components actually extracted (after clamping).
    pub fn num_components(&self) -> usize {
        self.num_components
    }

    /// Per-column means of the input data.
    pub fn means(&self) -> &Array1<f64> {
        self.params.mean()
    }

    /// Per-column sample standard deviations; `None` under center-only
    /// preprocessing.
    pub fn scale(&self) -> Option<&Array1<f64>> {
        self.params.scale()
    }

    /// Score matrix T, shape (n_rows, k). Column j holds the scores of
    /// component j+1.
    pub fn scores(&self) -> &Array2<f64> {
        &self.scores
    }

    /// Loading matrix P, shape (n_cols, k). Columns have unit norm.
    pub fn loadings(&self) -> &Array2<f64> {
        &self.loadings
    }

    /// Correlation loadings, shape (n_cols, k): the Pearson correlation
    /// between each score vector and each preprocessed variable.
    pub fn correlation_loadings(&self) -> &Array2<f64> {
        &self.correlation_loadings
    }

    /// Deflated residual matrices E_1..E_k, in preprocessed units.
    pub fn residuals(&self) -> &[Array2<f64>] {
        &self.residuals
    }

    /// Residual after `count` components (1-based); `None` if out of range.
    pub fn residual(&self, count: usize) -> Option<&Array2<f64>> {
        count.checked_sub(1).and_then(|index| self.residuals.get(index))
    }

    /// Cumulative reconstructions X̂_1..X̂_k in original units.
    pub fn reconstructions(&self) -> &[Array2<f64>] {
        &self.reconstructions
    }

    /// Reconstruction from the first `count` components (1-based).
    pub fn reconstruction(&self, count: usize) -> Option<&Array2<f64>> {
        count
            .checked_sub(1)
            .and_then(|index| self.reconstructions.get(index))
    }

    /// Rank-1 reconstruction of a single component (1-based), in original
    /// units.
    pub fn single_component_reconstruction(&self, component: usize) -> Option<&Array2<f64>> {
        component
            .checked_sub(1)
            .and_then(|index| self.single_component_reconstructions.get(index))
    }

    /// Calibration-side PRESS/MSE/RMSE and explained-variance tables.
    pub fn calibration(&self) -> &VarianceSummary {
        &self.calibration
    }

    /// Projects new observations onto the first `count` fitted loadings.
    ///
    /// The new data is preprocessed with the parameters stored at fit time
    /// (never recomputed), then multiplied onto the loadings. `count` is
    /// clamped to the fitted component count.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if the column count differs from the fitted
    /// data; `ZeroComponents` if `count` is zero.
    pub fn project(&self, new_data: ArrayView2<f64>, count: usize) -> Result<Array2<f64>> {
        if new_data.ncols() != self.loadings.nrows() {
            return Err(PcaError::DimensionMismatch {
                expected: self.loadings.nrows(),
                actual: new_data.ncols(),
            });
        }
        if count == 0 {
            return Err(PcaError::ZeroComponents);
        }
        let count = count.min(self.num_components);
        let preprocessed = self.params.apply(new_data);
        Ok(preprocessed.dot(&self.loadings.slice(s![.., ..count])))
    }
}
