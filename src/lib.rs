// Principal component analysis (PCA) by the NIPALS algorithm

#![doc = include_str!("../README.md")]

mod calibration;
mod config;
mod error;
mod folds;
mod model;
mod nipals;
mod preprocess;
mod validation;

pub use calibration::VarianceSummary;
pub use config::{PcaConfig, Preprocessing};
pub use error::{PcaError, Result};
pub use folds::{
    CrossValidation, FoldIndices, FoldSource, KFold, LeaveOneLabelOut, LeaveOneOut,
};
pub use model::{fit, PcaModel};
pub use preprocess::PreprocessingParams;
pub use validation::{cross_validate, ValidationResult};
