use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, Trim, WriterBuilder};
use log::{debug, info};

use crate::dataset::{Dataset, Record};
use crate::error::{DataError, DataResult};

/// Load a delimited file with a header row into a [`Dataset`].
///
/// Every data row must have as many fields as the header and every field
/// must parse as a finite `f64`.
pub fn load_dataset<P: AsRef<Path>>(path: P, delimiter: u8) -> DataResult<Dataset> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let dataset = read_dataset(file, delimiter)?;
    info!(
        "loaded {} records with {} columns from {}",
        dataset.len(),
        dataset.columns().len(),
        path.display()
    );
    Ok(dataset)
}

/// Parse delimited text from any reader. Blank lines are skipped.
pub fn read_dataset<R: Read>(reader: R, delimiter: u8) -> DataResult<Dataset> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let columns: Vec<String> = rdr
        .headers()
        .map_err(|e| malformed_or_csv(e, 1))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(DataError::MalformedInput {
            line: 1,
            reason: "missing header row".into(),
        });
    }
    debug!("header: {:?}", columns);

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result.map_err(|e| malformed_or_csv(e, records.len() as u64 + 2))?;
        let line = row.position().map_or(records.len() as u64 + 2, |p| p.line());

        if row.len() != columns.len() {
            return Err(DataError::MalformedInput {
                line,
                reason: format!("expected {} fields, found {}", columns.len(), row.len()),
            });
        }

        let mut values = Vec::with_capacity(columns.len());
        for (field, column) in row.iter().zip(&columns) {
            let value = field
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| DataError::MalformedInput {
                    line,
                    reason: format!("non-numeric value {:?} in column {:?}", field, column),
                })?;
            values.push(value);
        }
        records.push(Record::new(values));
    }

    Dataset::new(columns, records)
}

/// Undecodable bytes are a bad row, not a reader failure.
fn malformed_or_csv(err: csv::Error, fallback_line: u64) -> DataError {
    if let csv::ErrorKind::Utf8 { pos, err: utf8 } = err.kind() {
        return DataError::MalformedInput {
            line: pos.as_ref().map_or(fallback_line, |p| p.line()),
            reason: format!("invalid UTF-8: {utf8}"),
        };
    }
    DataError::Csv(err)
}

/// Write a dataset back out with a header row.
pub fn write_dataset<W: Write>(dataset: &Dataset, writer: W, delimiter: u8) -> DataResult<()> {
    let mut wtr = WriterBuilder::new().delimiter(delimiter).from_writer(writer);
    wtr.write_record(dataset.columns())?;
    for record in dataset {
        wtr.write_record(record.values().iter().map(|v| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\"fixed acidity\";\"volatile acidity\";\"quality\"
7;0.27;6
6.3;0.3;6

8.1;0.28;5
";

    #[test]
    fn test_read_semicolon_file() {
        let ds = read_dataset(SAMPLE.as_bytes(), b';').unwrap();
        assert_eq!(ds.columns(), &["fixed acidity", "volatile acidity", "quality"]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.records()[2].values(), &[8.1, 0.28, 5.0]);
    }

    #[test]
    fn test_row_count_matches_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "a;b").unwrap();
        for i in 0..57 {
            writeln!(file, "{};{}", i, i * 2).unwrap();
        }
        file.flush().unwrap();
        let ds = load_dataset(file.path(), b';').unwrap();
        assert_eq!(ds.len(), 57);
    }

    #[test]
    fn test_field_count_mismatch() {
        let text = "a;b;c\n1;2;3\n4;5\n";
        let err = read_dataset(text.as_bytes(), b';').unwrap_err();
        match err {
            DataError::MalformedInput { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("expected 3 fields"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_numeric_value() {
        let text = "a;b\n1;2\n3;x\n";
        let err = read_dataset(text.as_bytes(), b';').unwrap_err();
        assert!(matches!(err, DataError::MalformedInput { line: 3, .. }));
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let err = read_dataset(&b"a;quality\n1;\xff\n"[..], b';').unwrap_err();
        match err {
            DataError::MalformedInput { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("UTF-8"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = read_dataset(&b"a;\xfequality\n1;2\n"[..], b';').unwrap_err();
        assert!(matches!(err, DataError::MalformedInput { line: 1, .. }));
    }

    #[test]
    fn test_missing_value_is_malformed() {
        let text = "a;b\n1;\n";
        assert!(matches!(
            read_dataset(text.as_bytes(), b';'),
            Err(DataError::MalformedInput { line: 2, .. })
        ));
    }

    #[test]
    fn test_non_finite_value_is_malformed() {
        let text = "a;b\n1;NaN\n";
        assert!(read_dataset(text.as_bytes(), b';').is_err());
    }

    #[test]
    fn test_wrong_delimiter_is_malformed() {
        let err = read_dataset(SAMPLE.as_bytes(), b',').unwrap_err();
        assert!(matches!(err, DataError::MalformedInput { .. }));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            read_dataset("".as_bytes(), b';'),
            Err(DataError::MalformedInput { line: 1, .. })
        ));
    }

    #[test]
    fn test_header_only_is_empty_dataset() {
        let ds = read_dataset("a;quality\n".as_bytes(), b';').unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.columns().len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let err = load_dataset("/definitely/not/here.csv", b';').unwrap_err();
        assert!(matches!(err, DataError::Io(_)));
    }

    #[test]
    fn test_write_then_read() {
        let ds = read_dataset(SAMPLE.as_bytes(), b';').unwrap();
        let mut buf = Vec::new();
        write_dataset(&ds, &mut buf, b';').unwrap();
        let back = read_dataset(buf.as_slice(), b';').unwrap();
        assert_eq!(back, ds);
    }
}
