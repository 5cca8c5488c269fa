//! Walk-forward splits

use crate::error::{AutoForecastError, Result};
use serde::{Deserialize, Serialize};

/// One train/test split; training data strictly precedes test data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold: usize,
}

/// Walk-forward splits over `n_samples` time-ordered rows.
///
/// The rows are divided into `n_folds + 1` contiguous blocks. Fold `i`
/// tests on block `i + 1` and trains on every earlier index, so the
/// training window expands as folds advance and the first block is only
/// ever trained on. The last fold's test block absorbs the remainder.
pub fn walk_forward(n_samples: usize, n_folds: usize) -> Result<Vec<FoldSplit>> {
    if n_folds == 0 {
        return Err(AutoForecastError::Validation(
            "walk-forward validation needs at least one fold".to_string(),
        ));
    }
    let block = n_samples / (n_folds + 1);
    if block == 0 {
        return Err(AutoForecastError::Validation(format!(
            "{n_samples} samples cannot form {n_folds} walk-forward folds"
        )));
    }

    let mut splits = Vec::with_capacity(n_folds);
    for fold in 0..n_folds {
        let test_start = (fold + 1) * block;
        let test_end = if fold == n_folds - 1 {
            n_samples
        } else {
            test_start + block
        };
        splits.push(FoldSplit {
            train_indices: (0..test_start).collect(),
            test_indices: (test_start..test_end).collect(),
            fold,
        });
    }
    Ok(splits)
}
