use thiserror::Error;

/// Errors that can occur while fitting or cross-validating a PCA model.
#[derive(Error, Debug)]
pub enum PcaError {
    // Configuration errors, reported before any computation starts
    #[error("Input matrix is empty: {rows} rows, {cols} columns")]
    EmptyInput { rows: usize, cols: usize },

    #[error("Input matrix must have at least 2 rows, got {rows}")]
    TooFewRows { rows: usize },

    #[error("Requested number of components must be positive")]
    ZeroComponents,

    #[error("Invalid fold specification: {0}")]
    InvalidFolds(String),

    #[error("Data has {actual} columns but the model was fitted with {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    // Numerical errors
    #[error("Column {column} has zero variance and cannot be standardized")]
    ConstantColumn { column: usize },

    #[error("Residual norm vanished while extracting component {component}")]
    DegenerateResidual { component: usize },

    #[error("Component {component} did not converge within {max_iterations} iterations")]
    NonConvergence {
        component: usize,
        max_iterations: usize,
    },

    // Cross-validation errors: a failed fold aborts the whole pass
    #[error("Cross-validation fold {fold} failed: {source}")]
    FoldFailed {
        fold: usize,
        #[source]
        source: Box<PcaError>,
    },
}

/// Result type for PCA operations
pub type Result<T> = std::result::Result<T, PcaError>;
