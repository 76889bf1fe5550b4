use serde::{Deserialize, Serialize};

use crate::error::{DataError, DataResult};

/// One labeled sample: a value per dataset column, in column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    values: Vec<f64>,
}

impl Record {
    pub fn new(values: Vec<f64>) -> Self {
        Record { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Named columns plus an ordered sequence of records of matching width.
///
/// Datasets are never mutated after construction; every pipeline stage
/// builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    /// Build a dataset, rejecting records whose width differs from the
    /// column count. Record `i` is reported as line `i + 2` (after the header).
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> DataResult<Self> {
        if let Some((i, r)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != columns.len())
        {
            return Err(DataError::MalformedInput {
                line: i as u64 + 2,
                reason: format!("expected {} fields, found {}", columns.len(), r.len()),
            });
        }
        Ok(Dataset { columns, records })
    }

    /// Same columns, different records. Callers guarantee the widths.
    pub(crate) fn with_records(&self, records: Vec<Record>) -> Self {
        Dataset {
            columns: self.columns.clone(),
            records,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, in record order.
    pub fn column(&self, name: &str) -> DataResult<Vec<f64>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| DataError::UnknownColumn(name.to_string()))?;
        Ok(self.records.iter().map(|r| r.values[idx]).collect())
    }

    /// Records as plain rows, e.g. for JSON encoding.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.records.iter().map(|r| r.values.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_rejects_ragged_records() {
        let err = Dataset::new(
            cols(&["a", "b"]),
            vec![Record::new(vec![1.0, 2.0]), Record::new(vec![3.0])],
        )
        .unwrap_err();
        assert!(matches!(err, DataError::MalformedInput { line: 3, .. }));
    }

    #[test]
    fn test_column_access() {
        let ds = Dataset::new(
            cols(&["alcohol", "quality"]),
            vec![Record::new(vec![9.5, 6.0]), Record::new(vec![12.1, 7.0])],
        )
        .unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.column_index("quality"), Some(1));
        assert_eq!(ds.column("alcohol").unwrap(), vec![9.5, 12.1]);
        assert!(matches!(
            ds.column("pH"),
            Err(DataError::UnknownColumn(name)) if name == "pH"
        ));
        assert_eq!(ds.to_rows()[1], vec![12.1, 7.0]);
    }
}
