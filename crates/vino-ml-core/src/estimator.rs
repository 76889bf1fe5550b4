use crate::error::{TensorError, TensorResult};
use crate::tensor::Tensor;

/// A supervised regressor: learns from a feature matrix `[n, k]` and a
/// label vector `[n]`, then predicts a `[m]` vector for `[m, k]` inputs.
pub trait Estimator {
    fn fit(&mut self, x: &Tensor, y: &Tensor) -> TensorResult<()>;
    fn predict(&self, x: &Tensor) -> TensorResult<Tensor>;

    /// Short identifier used in logs and artifact names.
    fn name(&self) -> &str;

    /// Predict a single feature row.
    fn predict_row(&self, row: &[f64]) -> TensorResult<f64> {
        let x = Tensor::new(row.to_vec(), vec![1, row.len()])?;
        let pred = self.predict(&x)?;
        pred.data().first().copied().ok_or(TensorError::EmptyTensor)
    }
}
