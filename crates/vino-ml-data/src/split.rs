use log::info;

use crate::dataset::Dataset;
use crate::error::{DataError, DataResult};

/// A training prefix and a test suffix of one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
}

/// Number of training records for `n` records at `ratio`: `floor(n * ratio)`.
pub fn train_size(n: usize, ratio: f64) -> usize {
    (n as f64 * ratio).floor() as usize
}

/// Partition `dataset` into its first `floor(n * ratio)` records (train) and
/// the rest (test), keeping the order within each part.
///
/// `ratio` must lie strictly between 0 and 1. An empty dataset yields two
/// empty parts; a non-empty one must leave at least one training record.
/// There is no stratification: class balance follows the shuffle.
pub fn split(dataset: &Dataset, ratio: f64) -> DataResult<Split> {
    if !ratio.is_finite() || ratio <= 0.0 || ratio >= 1.0 {
        return Err(DataError::InvalidSplit(format!(
            "ratio must be in (0, 1), got {}",
            ratio
        )));
    }

    let n = dataset.len();
    let n_train = train_size(n, ratio);
    if n > 0 && n_train == 0 {
        return Err(DataError::InvalidSplit(format!(
            "ratio {} leaves no training records out of {}",
            ratio, n
        )));
    }

    let (train, test) = dataset.records().split_at(n_train);
    info!("split {} records into {} train / {} test", n, train.len(), test.len());
    Ok(Split {
        train: dataset.with_records(train.to_vec()),
        test: dataset.with_records(test.to_vec()),
    })
}
