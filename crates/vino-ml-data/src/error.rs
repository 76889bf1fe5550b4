use thiserror::Error;
use vino_ml_core::TensorError;

/// Failures of the data preparation stages. All are raised where they are
/// detected and abort the run.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("malformed input at line {line}: {reason}")]
    MalformedInput { line: u64, reason: String },

    #[error("invalid split: {0}")]
    InvalidSplit(String),

    #[error("unknown column: {0:?}")]
    UnknownColumn(String),

    #[error("delimiter {0:?} is not a single-byte ASCII character")]
    InvalidDelimiter(char),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Tensor(#[from] TensorError),
}

pub type DataResult<T> = Result<T, DataError>;
