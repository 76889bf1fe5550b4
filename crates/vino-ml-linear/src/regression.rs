use log::info;
use serde::{Deserialize, Serialize};
use vino_ml_core::{Estimator, Tensor, TensorError, TensorResult};
use vino_ml_linalg::solve;

/// Ordinary Least Squares linear regression.
///
/// Fits `y = Xw + b` using the normal equation: `(XᵀX) w = Xᵀy`, solved by
/// LU decomposition rather than an explicit inverse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub weights: Option<Tensor>,
    pub bias: Option<f64>,
    pub fit_intercept: bool,
}

impl LinearRegression {
    pub fn new(fit_intercept: bool) -> Self {
        LinearRegression {
            weights: None,
            bias: None,
            fit_intercept,
        }
    }

    /// Feature count seen during `fit`.
    pub fn n_features(&self) -> Option<usize> {
        self.weights.as_ref().map(Tensor::numel)
    }
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Estimator for LinearRegression {
    fn fit(&mut self, x: &Tensor, y: &Tensor) -> TensorResult<()> {
        let (n, p) = x.shape().matrix()?;
        if y.numel() != n {
            return Err(TensorError::ShapeMismatch {
                expected: vec![n],
                got: y.shape_vec(),
            });
        }
        if n == 0 {
            return Err(TensorError::EmptyTensor);
        }

        // Optionally prepend column of ones for intercept
        let x_aug = if self.fit_intercept {
            let ones_col = Tensor::ones(vec![n, 1]);
            Tensor::concatenate(&[&ones_col, x], 1)?
        } else {
            x.clone()
        };

        let xt = x_aug.t()?;
        let xtx = xt.matmul(&x_aug)?;
        let xty = xt.matmul(&y.reshape(vec![n, 1])?)?;
        let w = solve(&xtx, &xty)?.into_data();

        if self.fit_intercept {
            self.bias = Some(w[0]);
            self.weights = Some(Tensor::new(w[1..].to_vec(), vec![p])?);
        } else {
            self.bias = None;
            self.weights = Some(Tensor::new(w, vec![p])?);
        }

        info!("fitted OLS on {} rows x {} features", n, p);
        Ok(())
    }

    fn predict(&self, x: &Tensor) -> TensorResult<Tensor> {
        let w = self.weights.as_ref().ok_or(TensorError::NotFitted("predict"))?;
        let (n, p) = x.shape().matrix()?;
        if p != w.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![n, w.numel()],
                got: x.shape_vec(),
            });
        }

        let w_col = w.reshape(vec![p, 1])?;
        let mut pred = x.matmul(&w_col)?;
        if let Some(b) = self.bias {
            pred = pred.add_scalar(b);
        }

        // Flatten to 1D
        pred.reshape(vec![n])
    }

    fn name(&self) -> &str {
        "linear"
    }
}
