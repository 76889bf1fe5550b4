use vino_ml_core::{Tensor, TensorError, TensorResult};

use crate::layers::DenseGrads;
use crate::sequential::Sequential;

/// Adam optimizer over the weights and biases of a [`Sequential`] model.
///
/// Moment buffers are laid out as `[w0, b0, w1, b1, ...]`.
pub struct Adam {
    pub lr: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    pub t: usize,
    m: Vec<Tensor>, // first moment
    v: Vec<Tensor>, // second moment
}

impl Adam {
    pub fn new(model: &Sequential, lr: f64) -> Self {
        let zeros: Vec<Tensor> = model
            .layers()
            .iter()
            .flat_map(|l| [Tensor::zeros(l.weight.shape_vec()), Tensor::zeros(l.bias.shape_vec())])
            .collect();
        Adam {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            t: 0,
            m: zeros.clone(),
            v: zeros,
        }
    }

    /// Apply one update with gradients from [`Sequential::backward`].
    pub fn step(&mut self, model: &mut Sequential, grads: &[DenseGrads]) -> TensorResult<()> {
        if grads.len() * 2 != self.m.len() {
            return Err(TensorError::InvalidOperation(format!(
                "optimizer tracks {} parameters, got gradients for {}",
                self.m.len(),
                grads.len() * 2
            )));
        }

        self.t += 1;
        let bias_correction1 = 1.0 - self.beta1.powi(self.t as i32);
        let bias_correction2 = 1.0 - self.beta2.powi(self.t as i32);

        let params = model
            .layers_mut()
            .iter_mut()
            .flat_map(|l| [&mut l.weight, &mut l.bias]);
        let grads = grads.iter().flat_map(|g| [&g.weight, &g.bias]);

        for (i, (param, grad)) in params.zip(grads).enumerate() {
            self.m[i] = self.m[i]
                .mul_scalar(self.beta1)
                .add(&grad.mul_scalar(1.0 - self.beta1))?;

            let grad_sq = grad.mul(grad)?;
            self.v[i] = self.v[i]
                .mul_scalar(self.beta2)
                .add(&grad_sq.mul_scalar(1.0 - self.beta2))?;

            let m_hat = self.m[i].mul_scalar(1.0 / bias_correction1);
            let v_hat = self.v[i].mul_scalar(1.0 / bias_correction2);

            let denom = v_hat.sqrt().add_scalar(self.epsilon);
            let update = m_hat.div(&denom)?.mul_scalar(self.lr);
            *param = param.sub(&update)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{Activation, Dense};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_first_step_moves_by_lr() {
        let layer = Dense {
            weight: Tensor::new(vec![1.0, -1.0], vec![2, 1]).unwrap(),
            bias: Tensor::zeros(vec![1]),
            activation: Activation::Identity,
        };
        let mut model = Sequential::new().add(layer);
        let mut adam = Adam::new(&model, 0.1);
        let grads = vec![DenseGrads {
            weight: Tensor::new(vec![0.5, -2.0], vec![2, 1]).unwrap(),
            bias: Tensor::from_slice(&[3.0]),
        }];
        adam.step(&mut model, &grads).unwrap();

        // With bias correction the first Adam step is lr * sign(grad).
        let l = &model.layers()[0];
        assert_abs_diff_eq!(l.weight.data()[0], 0.9, epsilon = 1e-6);
        assert_abs_diff_eq!(l.weight.data()[1], -0.9, epsilon = 1e-6);
        assert_abs_diff_eq!(l.bias.data()[0], -0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_gradient_count_checked() {
        let mut model = Sequential::new();
        let mut adam = Adam::new(&model, 0.1);
        let grads = vec![DenseGrads {
            weight: Tensor::zeros(vec![1, 1]),
            bias: Tensor::zeros(vec![1]),
        }];
        assert!(adam.step(&mut model, &grads).is_err());
    }
}
