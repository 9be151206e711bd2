use crate::error::{PcaError, Result};

/// Row indices of one cross-validation round.
#[derive(Clone, Debug)]
pub struct FoldIndices {
    /// Rows the fold-local model is fitted on.
    pub train: Vec<usize>,
    /// Rows predicted out-of-fold.
    pub test: Vec<usize>,
}

/// Produces the train/test index pairs for a cross-validation pass.
///
/// A source must yield a finite sequence whose test sets cover every row of
/// the dataset exactly once; the cross-validation engine checks this before
/// fitting anything.
pub trait FoldSource {
    /// Returns the fold list for a dataset with `n_rows` observations.
    fn folds(&self, n_rows: usize) -> Result<Vec<FoldIndices>>;
}

/// Full cross-validation: n folds, each holding out a single row.
#[derive(Clone, Copy, Debug, Default)]
pub struct LeaveOneOut;

impl FoldSource for LeaveOneOut {
    fn folds(&self, n_rows: usize) -> Result<Vec<FoldIndices>> {
        if n_rows < 2 {
            return Err(PcaError::InvalidFolds(format!(
                "leave-one-out needs at least 2 rows, got {}",
                n_rows
            )));
        }
        Ok((0..n_rows)
            .map(|held_out| FoldIndices {
                train: (0..n_rows).filter(|&row| row != held_out).collect(),
                test: vec![held_out],
            })
            .collect())
    }
}

/// K-fold cross-validation over contiguous, near-equal blocks.
///
/// The first `n_rows % k` folds take one extra row, so fold sizes differ by
/// at most one.
#[derive(Clone, Copy, Debug)]
pub struct KFold {
    folds: usize,
}

impl KFold {
    pub fn new(folds: usize) -> Self {
        KFold { folds }
    }
}

impl FoldSource for KFold {
    fn folds(&self, n_rows: usize) -> Result<Vec<FoldIndices>> {
        if self.folds < 2 {
            return Err(PcaError::InvalidFolds(format!(
                "k-fold needs at least 2 folds, got {}",
                self.folds
            )));
        }
        if self.folds > n_rows {
            return Err(PcaError::InvalidFolds(format!(
                "cannot split {} rows into {} folds",
                n_rows, self.folds
            )));
        }

        let base_size = n_rows / self.folds;
        let remainder = n_rows % self.folds;
        let mut start = 0;
        let mut folds = Vec::with_capacity(self.folds);
        for fold in 0..self.folds {
            let size = base_size + usize::from(fold < remainder);
            let end = start + size;
            folds.push(FoldIndices {
                train: (0..start).chain(end..n_rows).collect(),
                test: (start..end).collect(),
            });
            start = end;
        }
        Ok(folds)
    }
}

/// One fold per distinct label value; each fold holds out every row
/// carrying that label. Folds are ordered by ascending label.
#[derive(Clone, Debug)]
pub struct LeaveOneLabelOut {
    labels: Vec<i64>,
}

impl LeaveOneLabelOut {
    pub fn new(labels: Vec<i64>) -> Self {
        LeaveOneLabelOut { labels }
    }
}

impl FoldSource for LeaveOneLabelOut {
    fn folds(&self, n_rows: usize) -> Result<Vec<FoldIndices>> {
        if self.labels.len() != n_rows {
            return Err(PcaError::InvalidFolds(format!(
                "label vector has {} entries for {} rows",
                self.labels.len(),
                n_rows
            )));
        }

        let mut distinct: Vec<i64> = self.labels.clone();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() < 2 {
            return Err(PcaError::InvalidFolds(
                "leave-one-label-out needs at least 2 distinct labels".to_string(),
            ));
        }

        Ok(distinct
            .into_iter()
            .map(|label| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..n_rows).partition(|&row| self.labels[row] == label);
                FoldIndices { train, test }
            })
            .collect())
    }
}

/// The built-in cross-validation strategies, matching the fold sources
/// above. Useful when the strategy is picked from configuration rather than
/// supplied as a custom [`FoldSource`].
#[derive(Clone, Debug)]
pub enum CrossValidation {
    /// One fold per observation.
    LeaveOneOut,
    /// K contiguous folds of near-equal size.
    KFold { folds: usize },
    /// One fold per distinct label.
    LeaveOneLabelOut { labels: Vec<i64> },
}

impl FoldSource for CrossValidation {
    fn folds(&self, n_rows: usize) -> Result<Vec<FoldIndices>> {
        match self {
            CrossValidation::LeaveOneOut => LeaveOneOut.folds(n_rows),
            CrossValidation::KFold { folds } => KFold::new(*folds).folds(n_rows),
            CrossValidation::LeaveOneLabelOut { labels } => {
                LeaveOneLabelOut::new(labels.clone()).folds(n_rows)
            }
        }
    }
}
