use serde::{Deserialize, Serialize};
use vino_ml_core::Tensor;

use crate::dataset::Dataset;
use crate::error::{DataError, DataResult};

/// Feature columns of a dataset as an `[n, k]` tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub values: Tensor,
}

impl FeatureMatrix {
    pub fn rows(&self) -> usize {
        self.values.rows()
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    /// The matrix as plain rows, one `Vec` per sample.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values.iter_rows().map(<[f64]>::to_vec).collect()
    }
}

/// Target column of a dataset as an `[n]` tensor, row-aligned with the
/// matching [`FeatureMatrix`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelVector {
    pub name: String,
    pub values: Tensor,
}

impl LabelVector {
    pub fn len(&self) -> usize {
        self.values.numel()
    }

    pub fn is_empty(&self) -> bool {
        self.values.numel() == 0
    }
}

/// Split `dataset` into its feature columns (every column except `target`,
/// in original order) and its `target` column.
pub fn separate(dataset: &Dataset, target: &str) -> DataResult<(FeatureMatrix, LabelVector)> {
    let target_idx = dataset
        .column_index(target)
        .ok_or_else(|| DataError::UnknownColumn(target.to_string()))?;

    let columns: Vec<String> = dataset
        .columns()
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != target_idx)
        .map(|(_, c)| c.clone())
        .collect();
    let k = columns.len();

    let mut features = Vec::with_capacity(dataset.len() * k);
    let mut labels = Vec::with_capacity(dataset.len());
    for record in dataset {
        for (i, &v) in record.values().iter().enumerate() {
            if i == target_idx {
                labels.push(v);
            } else {
                features.push(v);
            }
        }
    }

    let n = labels.len();
    Ok((
        FeatureMatrix {
            columns,
            values: Tensor::new(features, vec![n, k])?,
        },
        LabelVector {
            name: target.to_string(),
            values: Tensor::new(labels, vec![n])?,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Record;

    fn sample() -> Dataset {
        Dataset::new(
            vec!["alcohol".into(), "quality".into(), "pH".into()],
            vec![
                Record::new(vec![9.5, 6.0, 3.1]),
                Record::new(vec![12.1, 7.0, 3.05]),
                Record::new(vec![8.8, 5.0, 3.3]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_separate_middle_target() {
        let (x, y) = separate(&sample(), "quality").unwrap();
        assert_eq!(x.columns, vec!["alcohol", "pH"]);
        assert_eq!(x.values.shape_vec(), vec![3, 2]);
        assert_eq!(x.values.row(1).unwrap(), &[12.1, 3.05]);
        assert_eq!(y.name, "quality");
        assert_eq!(y.values.data(), &[6.0, 7.0, 5.0]);
        assert_eq!(x.rows(), y.len());
    }

    #[test]
    fn test_unknown_target() {
        let err = separate(&sample(), "score").unwrap_err();
        assert!(matches!(err, DataError::UnknownColumn(name) if name == "score"));
    }

    #[test]
    fn test_separate_empty_dataset_keeps_width() {
        let empty = Dataset::new(sample().columns().to_vec(), vec![]).unwrap();
        let (x, y) = separate(&empty, "quality").unwrap();
        assert_eq!(x.values.shape_vec(), vec![0, 2]);
        assert!(y.is_empty());
    }

    #[test]
    fn test_to_rows() {
        let (x, _) = separate(&sample(), "quality").unwrap();
        assert_eq!(x.to_rows()[2], vec![8.8, 3.3]);
    }
}
