use serde::{Deserialize, Serialize};
use vino_ml_core::{Tensor, TensorError, TensorResult};

fn check_lengths(y_true: &[f64], y_pred: &[f64]) -> TensorResult<()> {
    if y_true.len() != y_pred.len() {
        return Err(TensorError::ShapeMismatch {
            expected: vec![y_true.len()],
            got: vec![y_pred.len()],
        });
    }
    if y_true.is_empty() {
        return Err(TensorError::EmptyTensor);
    }
    Ok(())
}

/// Mean Squared Error.
pub fn mse(y_true: &[f64], y_pred: &[f64]) -> TensorResult<f64> {
    check_lengths(y_true, y_pred)?;
    let sum: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(&t, &p)| (t - p) * (t - p))
        .sum();
    Ok(sum / y_true.len() as f64)
}

/// Root Mean Squared Error.
pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> TensorResult<f64> {
    Ok(mse(y_true, y_pred)?.sqrt())
}

/// Mean Absolute Error.
pub fn mae(y_true: &[f64], y_pred: &[f64]) -> TensorResult<f64> {
    check_lengths(y_true, y_pred)?;
    let sum: f64 = y_true.iter().zip(y_pred).map(|(&t, &p)| (t - p).abs()).sum();
    Ok(sum / y_true.len() as f64)
}

/// R² (coefficient of determination). 0 when the truth is constant.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> TensorResult<f64> {
    check_lengths(y_true, y_pred)?;
    let n = y_true.len() as f64;
    let mean_true = y_true.iter().sum::<f64>() / n;

    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(&t, &p)| (t - p) * (t - p))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|&t| (t - mean_true) * (t - mean_true)).sum();

    if ss_tot < 1e-15 {
        return Ok(0.0);
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// Share of predictions that round to the true integer score.
pub fn rounded_accuracy(y_true: &[f64], y_pred: &[f64]) -> TensorResult<f64> {
    check_lengths(y_true, y_pred)?;
    let hits = y_true
        .iter()
        .zip(y_pred)
        .filter(|(&t, &p)| p.round() == t.round())
        .count();
    Ok(hits as f64 / y_true.len() as f64)
}

/// The usual regression scores for one model on one evaluation set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionReport {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    pub rounded_accuracy: f64,
}

impl RegressionReport {
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> TensorResult<Self> {
        let mse = mse(y_true, y_pred)?;
        Ok(RegressionReport {
            mse,
            rmse: mse.sqrt(),
            mae: mae(y_true, y_pred)?,
            r2: r2_score(y_true, y_pred)?,
            rounded_accuracy: rounded_accuracy(y_true, y_pred)?,
        })
    }

    pub fn from_tensors(y_true: &Tensor, y_pred: &Tensor) -> TensorResult<Self> {
        Self::compute(y_true.data(), y_pred.data())
    }
}

impl std::fmt::Display for RegressionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "mse {:.4}  rmse {:.4}  mae {:.4}  r2 {:.4}  exact {:.1}%",
            self.mse,
            self.rmse,
            self.mae,
            self.r2,
            self.rounded_accuracy * 100.0
        )
    }
}
