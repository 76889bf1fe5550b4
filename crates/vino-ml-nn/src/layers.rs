use rand::Rng;
use serde::{Deserialize, Serialize};
use vino_ml_core::{Tensor, TensorError, TensorResult};

/// Element-wise activation applied after a dense layer's affine map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Relu,
    Identity,
}

impl Activation {
    fn apply(self, z: &Tensor) -> Tensor {
        match self {
            Activation::Relu => z.relu(),
            Activation::Identity => z.clone(),
        }
    }

    /// dA/dZ evaluated at the pre-activation `z`.
    fn derivative(self, z: &Tensor) -> Tensor {
        match self {
            Activation::Relu => z.relu_mask(),
            Activation::Identity => Tensor::ones(z.shape_vec()),
        }
    }
}

/// Gradients of one dense layer's parameters.
#[derive(Debug, Clone)]
pub struct DenseGrads {
    pub weight: Tensor,
    pub bias: Tensor,
}

/// Values a dense layer remembers from a training forward pass.
#[derive(Debug, Clone)]
pub struct DenseCache {
    pub input: Tensor,
    pub pre_activation: Tensor,
}

/// Fully connected layer: `a = act(xW + b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dense {
    pub weight: Tensor,
    pub bias: Tensor,
    pub activation: Activation,
}

impl Dense {
    /// Xavier-uniform weights, zero bias.
    pub fn new<R: Rng>(
        in_features: usize,
        out_features: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let scale = (6.0 / (in_features + out_features) as f64).sqrt();
        Dense {
            weight: Tensor::uniform(vec![in_features, out_features], -scale, scale, rng),
            bias: Tensor::zeros(vec![out_features]),
            activation,
        }
    }

    pub fn in_features(&self) -> usize {
        self.weight.rows()
    }

    pub fn out_features(&self) -> usize {
        self.weight.cols()
    }

    /// Inference pass.
    pub fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        let z = input.matmul(&self.weight)?.add(&self.bias)?;
        Ok(self.activation.apply(&z))
    }

    /// Training pass: also returns what `backward` needs.
    pub fn forward_train(&self, input: &Tensor) -> TensorResult<(Tensor, DenseCache)> {
        let z = input.matmul(&self.weight)?.add(&self.bias)?;
        let a = self.activation.apply(&z);
        Ok((
            a,
            DenseCache {
                input: input.clone(),
                pre_activation: z,
            },
        ))
    }

    /// Given dL/dA, return dL/dX and the parameter gradients.
    pub fn backward(
        &self,
        cache: &DenseCache,
        grad_out: &Tensor,
    ) -> TensorResult<(Tensor, DenseGrads)> {
        if grad_out.shape() != cache.pre_activation.shape() {
            return Err(TensorError::ShapeMismatch {
                expected: cache.pre_activation.shape_vec(),
                got: grad_out.shape_vec(),
            });
        }
        let grad_z = grad_out.mul(&self.activation.derivative(&cache.pre_activation))?;
        let grads = DenseGrads {
            weight: cache.input.t()?.matmul(&grad_z)?,
            bias: grad_z.sum_axis(0)?,
        };
        let grad_in = grad_z.matmul(&self.weight.t()?)?;
        Ok((grad_in, grads))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_forward_shapes() {
        let mut rng = StdRng::seed_from_u64(0);
        let layer = Dense::new(11, 4, Activation::Relu, &mut rng);
        let x = Tensor::rand(vec![5, 11], Some(1));
        let y = layer.forward(&x).unwrap();
        assert_eq!(y.shape_vec(), vec![5, 4]);
        assert!(y.data().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_xavier_bounds() {
        let mut rng = StdRng::seed_from_u64(0);
        let layer = Dense::new(200, 50, Activation::Relu, &mut rng);
        let bound = (6.0 / 250.0_f64).sqrt();
        assert!(layer.weight.data().iter().all(|w| w.abs() <= bound));
        assert_eq!(layer.bias.sum_all(), 0.0);
    }

    #[test]
    fn test_backward_matches_finite_differences() {
        let mut rng = StdRng::seed_from_u64(3);
        let layer = Dense::new(3, 2, Activation::Relu, &mut rng);
        let x = Tensor::new(vec![0.5, -1.0, 2.0, 1.5, 0.3, -0.7], vec![2, 3]).unwrap();

        // L = sum(forward(x))
        let loss = |l: &Dense| l.forward(&x).unwrap().sum_all();
        let (out, cache) = layer.forward_train(&x).unwrap();
        let (_, grads) = layer.backward(&cache, &Tensor::ones(out.shape_vec())).unwrap();

        let h = 1e-6;
        for idx in 0..layer.weight.numel() {
            let mut bumped = layer.clone();
            bumped.weight.data_mut()[idx] += h;
            let numeric = (loss(&bumped) - loss(&layer)) / h;
            assert_abs_diff_eq!(grads.weight.data()[idx], numeric, epsilon = 1e-4);
        }
        for idx in 0..layer.bias.numel() {
            let mut bumped = layer.clone();
            bumped.bias.data_mut()[idx] += h;
            let numeric = (loss(&bumped) - loss(&layer)) / h;
            assert_abs_diff_eq!(grads.bias.data()[idx], numeric, epsilon = 1e-4);
        }
    }
}
