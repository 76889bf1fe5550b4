use vino_ml_core::{Tensor, TensorError, TensorResult};

/// Mean Squared Error loss and its gradient with respect to `pred`.
///
/// `pred` is the network output `[n, 1]`; `target` is `[n]`.
/// L = mean((pred - target)²), dL/dpred = 2 (pred - target) / n.
pub fn mse_loss(pred: &Tensor, target: &Tensor) -> TensorResult<(f64, Tensor)> {
    let n = target.numel();
    if pred.numel() != n {
        return Err(TensorError::ShapeMismatch {
            expected: vec![n, 1],
            got: pred.shape_vec(),
        });
    }
    if n == 0 {
        return Err(TensorError::EmptyTensor);
    }
    let diff = pred.sub(&target.reshape(pred.shape_vec())?)?;
    let loss = diff.data().iter().map(|d| d * d).sum::<f64>() / n as f64;
    Ok((loss, diff.mul_scalar(2.0 / n as f64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mse_loss() {
        let pred = Tensor::new(vec![6.0, 5.0], vec![2, 1]).unwrap();
        let target = Tensor::from_slice(&[7.0, 5.0]);
        let (loss, grad) = mse_loss(&pred, &target).unwrap();
        assert_relative_eq!(loss, 0.5);
        assert_eq!(grad.shape_vec(), vec![2, 1]);
        assert_relative_eq!(grad.data()[0], -1.0);
        assert_relative_eq!(grad.data()[1], 0.0);
    }

    #[test]
    fn test_mse_loss_length_mismatch() {
        let pred = Tensor::zeros(vec![3, 1]);
        let target = Tensor::zeros(vec![2]);
        assert!(mse_loss(&pred, &target).is_err());
    }
}
