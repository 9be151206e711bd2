use crate::error::{PcaError, Result};

/// How the input matrix is preprocessed before decomposition.
///
/// Both modes subtract the per-column mean. `Standardize` additionally
/// divides each column by its sample standard deviation (n−1 denominator)
/// so all variables carry equal variance into the decomposition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preprocessing {
    /// Subtract the per-column mean only.
    Center,
    /// Subtract the per-column mean and divide by the per-column sample
    /// standard deviation.
    Standardize,
}

/// Configuration for fitting a PCA model.
///
/// Cross-validation is not configured here: [`crate::cross_validate`] takes
/// the fold source as an explicit argument, keeping calibration and
/// validation as two separate entry points.
#[derive(Clone, Debug)]
pub struct PcaConfig {
    /// Target number of principal components.
    ///
    /// `None` means min(n_rows, n_cols). A request above that bound is
    /// silently clamped to it; requesting zero components is a
    /// configuration error reported at fit time.
    pub num_components: Option<usize>,
    /// Preprocessing applied to the input (and, during cross-validation,
    /// refitted on each training fold).
    pub preprocessing: Preprocessing,
}

impl Default for PcaConfig {
    /// All components up to min(n, p), center-only preprocessing.
    fn default() -> Self {
        PcaConfig {
            num_components: None,
            preprocessing: Preprocessing::Center,
        }
    }
}

impl PcaConfig {
    /// Resolves the effective component count for an `n_rows` × `n_cols`
    /// input, clamping to min(n, p).
    pub(crate) fn resolve_components(&self, n_rows: usize, n_cols: usize) -> Result<usize> {
        let max_components = n_rows.min(n_cols);
        match self.num_components {
            Some(0) => Err(PcaError::ZeroComponents),
            Some(requested) if requested > max_components => {
                log::warn!(
                    "Requested {} components but the input supports at most {}; clamping",
                    requested,
                    max_components
                );
                Ok(max_components)
            }
            Some(requested) => Ok(requested),
            None => Ok(max_components),
        }
    }
}
