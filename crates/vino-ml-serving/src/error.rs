use std::io;
use thiserror::Error;
use vino_ml_core::TensorError;

#[derive(Debug, Error)]
pub enum ServingError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Tensor(#[from] TensorError),

    #[error("Invalid input shape: model expects {expected:?}, got {got:?}")]
    InvalidShape { expected: Vec<usize>, got: Vec<usize> },

    #[error("`{program}` exited with status {status:?}: {stderr}")]
    CommandFailed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Could not parse prediction output: {0}")]
    UnparseablePrediction(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type ServingResult<T> = Result<T, ServingError>;
