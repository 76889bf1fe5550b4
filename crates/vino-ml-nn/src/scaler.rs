use serde::{Deserialize, Serialize};
use vino_ml_core::{Tensor, TensorError, TensorResult};

/// Standardize features by removing the mean and scaling to unit variance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Option<Tensor>,
    pub std: Option<Tensor>,
}

impl StandardScaler {
    pub fn new() -> Self {
        StandardScaler {
            mean: None,
            std: None,
        }
    }

    /// Compute per-column mean and std from `[samples, features]` data.
    /// Constant columns get a std of 1 so they map to zero.
    pub fn fit(&mut self, x: &Tensor) -> TensorResult<()> {
        let std = x.std_axis0()?.apply(|v| if v < f64::EPSILON { 1.0 } else { v });
        self.mean = Some(x.mean_axis(0)?);
        self.std = Some(std);
        Ok(())
    }

    /// Transform data using fitted mean and std.
    pub fn transform(&self, x: &Tensor) -> TensorResult<Tensor> {
        let (mean, std) = self
            .mean
            .as_ref()
            .zip(self.std.as_ref())
            .ok_or(TensorError::NotFitted("transform"))?;
        x.sub(mean)?.div(std)
    }

    /// Fit and transform in one step.
    pub fn fit_transform(&mut self, x: &Tensor) -> TensorResult<Tensor> {
        self.fit(x)?;
        self.transform(x)
    }
}
