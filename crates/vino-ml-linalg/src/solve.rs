use vino_ml_core::{Tensor, TensorError, TensorResult};

use crate::decomposition::lu;

/// Solve the linear system `Ax = b` for a square `A` and a vector `b`.
pub fn solve(a: &Tensor, b: &Tensor) -> TensorResult<Tensor> {
    let (n, _) = a.shape().matrix()?;
    if b.numel() != n {
        return Err(TensorError::ShapeMismatch {
            expected: vec![n],
            got: b.shape_vec(),
        });
    }

    let decomp = lu(a)?;
    let l = decomp.l.data();
    let u = decomp.u.data();

    // Forward substitution: L * y = P * b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[i * n + j] * y[j]).sum();
        y[i] = b.data()[decomp.pivot[i]] - sum;
    }

    // Back substitution: U * x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| u[i * n + j] * x[j]).sum();
        x[i] = (y[i] - sum) / u[i * n + i];
    }

    Tensor::new(x, vec![n])
}
