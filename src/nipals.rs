use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{PcaError, Result};

/// Convergence threshold on the squared change of the score vector between
/// iterations.
pub(crate) const CONVERGENCE_TOLERANCE: f64 = 1.0e-8;

/// Upper bound on power iterations per component. Exhausting it surfaces
/// [`PcaError::NonConvergence`] instead of spinning forever.
pub(crate) const MAX_ITERATIONS: usize = 500;

/// Loading norms at or below this are treated as a vanished residual
/// direction rather than divided through.
const DEGENERATE_NORM_THRESHOLD: f64 = 1e-12;

/// One extracted score/loading pair. The loading has unit Euclidean norm.
pub(crate) struct Component {
    pub score: Array1<f64>,
    pub loading: Array1<f64>,
}

/// Runs one NIPALS power iteration against `residual` until the score
/// vector converges, returning the dominant score/loading pair.
///
/// The iteration is seeded with the first column of the residual. Each pass
/// computes `p = Rᵀt / ‖Rᵀt‖` and `t = Rp`; it terminates when the squared
/// change in `t` drops below [`CONVERGENCE_TOLERANCE`].
///
/// `component` is the 1-based index of the component being extracted and is
/// only used for error reporting.
pub(crate) fn extract_component(
    residual: ArrayView2<f64>,
    component: usize,
) -> Result<Component> {
    let mut score = residual.column(0).to_owned();

    for iteration in 0..MAX_ITERATIONS {
        let raw_loading = residual.t().dot(&score);
        let norm = raw_loading.dot(&raw_loading).sqrt();
        if !norm.is_finite() || norm <= DEGENERATE_NORM_THRESHOLD {
            return Err(PcaError::DegenerateResidual { component });
        }

        let loading = raw_loading / norm;
        let new_score = residual.dot(&loading);

        let delta = &score - &new_score;
        let squared_change = delta.dot(&delta);
        score = new_score;

        if squared_change < CONVERGENCE_TOLERANCE {
            debug!(
                "Component {} converged after {} iterations",
                component,
                iteration + 1
            );
            return Ok(Component { score, loading });
        }
    }

    Err(PcaError::NonConvergence {
        component,
        max_iterations: MAX_ITERATIONS,
    })
}

/// Result of decomposing a preprocessed matrix into `k` components.
pub(crate) struct Decomposition {
    /// Score matrix T, shape (n_rows, k).
    pub scores: Array2<f64>,
    /// Loading matrix P, shape (n_cols, k). Columns have unit norm.
    pub loadings: Array2<f64>,
    /// Deflated residual E_j after each component, in preprocessed units.
    pub residuals: Vec<Array2<f64>>,
    /// Rank-1 term t_j·p_jᵀ of each component, in preprocessed units.
    pub rank_one_terms: Vec<Array2<f64>>,
}

/// Repeatedly extracts components from `preprocessed`, deflating the
/// residual between extractions.
///
/// The same code path serves the calibration fit and every fold-local refit
/// during cross-validation.
pub(crate) fn decompose(
    preprocessed: ArrayView2<f64>,
    num_components: usize,
) -> Result<Decomposition> {
    let n_rows = preprocessed.nrows();
    let n_cols = preprocessed.ncols();

    let mut scores = Array2::zeros((n_rows, num_components));
    let mut loadings = Array2::zeros((n_cols, num_components));
    let mut residuals = Vec::with_capacity(num_components);
    let mut rank_one_terms = Vec::with_capacity(num_components);

    let mut residual = preprocessed.to_owned();
    for j in 0..num_components {
        let Component { score, loading } = extract_component(residual.view(), j + 1)?;

        let rank_one = outer_product(score.view(), loading.view());
        residual -= &rank_one;

        scores.column_mut(j).assign(&score);
        loadings.column_mut(j).assign(&loading);
        residuals.push(residual.clone());
        rank_one_terms.push(rank_one);
    }

    Ok(Decomposition {
        scores,
        loadings,
        residuals,
        rank_one_terms,
    })
}

/// Outer product t·pᵀ, shape (t.len(), p.len()).
fn outer_product(score: ArrayView1<f64>, loading: ArrayView1<f64>) -> Array2<f64> {
    let column = score.insert_axis(Axis(1));
    let row = loading.insert_axis(Axis(0));
    column.dot(&row)
}
