use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::config::Preprocessing;
use crate::error::{PcaError, Result};

/// Standard deviations at or below this threshold are treated as zero
/// variance when standardizing.
const ZERO_VARIANCE_THRESHOLD: f64 = 1e-12;

/// Column statistics derived from a reference (training) matrix.
///
/// The parameters are derived exactly once from the reference matrix and
/// then applied unchanged to any other matrix. During cross-validation the
/// test fold is preprocessed with the training fold's parameters; the test
/// rows never inform their own centering or scaling.
#[derive(Clone, Debug)]
pub struct PreprocessingParams {
    mean: Array1<f64>,
    scale: Option<Array1<f64>>,
}

impl PreprocessingParams {
    /// Derives centering (and, for [`Preprocessing::Standardize`], scaling)
    /// parameters from `reference`.
    ///
    /// Scaling uses the sample standard deviation (n−1 denominator).
    ///
    /// # Errors
    ///
    /// - `TooFewRows` if standardization is requested with fewer than 2 rows.
    /// - `ConstantColumn` if standardization is requested and a column has
    ///   zero variance.
    pub fn fit(reference: ArrayView2<f64>, mode: Preprocessing) -> Result<Self> {
        let n_rows = reference.nrows();
        let mean = reference
            .mean_axis(Axis(0))
            .ok_or(PcaError::EmptyInput { rows: 0, cols: reference.ncols() })?;

        let scale = match mode {
            Preprocessing::Center => None,
            Preprocessing::Standardize => {
                if n_rows < 2 {
                    return Err(PcaError::TooFewRows { rows: n_rows });
                }
                let std_dev = reference.std_axis(Axis(0), 1.0);
                if let Some(column) = std_dev
                    .iter()
                    .position(|&s| !s.is_finite() || s <= ZERO_VARIANCE_THRESHOLD)
                {
                    return Err(PcaError::ConstantColumn { column });
                }
                Some(std_dev)
            }
        };

        Ok(PreprocessingParams { mean, scale })
    }

    /// Applies the stored parameters: subtract the mean and, when scaling
    /// is present, divide by the standard deviation.
    pub fn apply(&self, matrix: ArrayView2<f64>) -> Array2<f64> {
        let mut processed = matrix.to_owned();
        processed -= &self.mean;
        if let Some(scale) = &self.scale {
            processed /= scale;
        }
        processed
    }

    /// Inverse of [`apply`](Self::apply): re-expresses a preprocessed-unit
    /// matrix in the original units of the reference data.
    pub fn restore(&self, matrix: ArrayView2<f64>) -> Array2<f64> {
        let mut restored = matrix.to_owned();
        if let Some(scale) = &self.scale {
            restored *= scale;
        }
        restored += &self.mean;
        restored
    }

    /// Per-column means of the reference matrix.
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Per-column sample standard deviations; `None` under center-only
    /// preprocessing.
    pub fn scale(&self) -> Option<&Array1<f64>> {
        self.scale.as_ref()
    }
}
