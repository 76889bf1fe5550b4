use rand::Rng;
use serde::{Deserialize, Serialize};
use vino_ml_core::{Tensor, TensorError, TensorResult};

use crate::layers::{Activation, Dense, DenseCache, DenseGrads};

/// Dense layers applied in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sequential {
    layers: Vec<Dense>,
}

impl Sequential {
    pub fn new() -> Self {
        Sequential { layers: Vec::new() }
    }

    /// ReLU hidden layers of the given widths followed by one linear output.
    pub fn mlp<R: Rng>(in_features: usize, hidden: &[usize], rng: &mut R) -> Self {
        let mut model = Sequential::new();
        let mut width = in_features;
        for &h in hidden {
            model = model.add(Dense::new(width, h, Activation::Relu, rng));
            width = h;
        }
        model.add(Dense::new(width, 1, Activation::Identity, rng))
    }

    /// Add a layer to the model.
    pub fn add(mut self, layer: Dense) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [Dense] {
        &mut self.layers
    }

    /// Input width expected by the first layer.
    pub fn in_features(&self) -> Option<usize> {
        self.layers.first().map(Dense::in_features)
    }

    /// Number of trainable scalars.
    pub fn num_parameters(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weight.numel() + l.bias.numel())
            .sum()
    }

    /// Forward pass through all layers.
    pub fn forward(&self, input: &Tensor) -> TensorResult<Tensor> {
        let mut x = input.clone();
        for layer in &self.layers {
            x = layer.forward(&x)?;
        }
        Ok(x)
    }

    /// Forward pass that keeps per-layer caches for [`Sequential::backward`].
    pub fn forward_train(&self, input: &Tensor) -> TensorResult<(Tensor, Vec<DenseCache>)> {
        let mut x = input.clone();
        let mut caches = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let (out, cache) = layer.forward_train(&x)?;
            caches.push(cache);
            x = out;
        }
        Ok((x, caches))
    }

    /// Backpropagate dL/dOutput; returns gradients in layer order.
    pub fn backward(
        &self,
        caches: &[DenseCache],
        grad_out: &Tensor,
    ) -> TensorResult<Vec<DenseGrads>> {
        if caches.len() != self.layers.len() {
            return Err(TensorError::InvalidOperation(format!(
                "expected {} layer caches, got {}",
                self.layers.len(),
                caches.len()
            )));
        }
        let mut grads = Vec::with_capacity(self.layers.len());
        let mut grad = grad_out.clone();
        for (layer, cache) in self.layers.iter().zip(caches).rev() {
            let (grad_in, layer_grads) = layer.backward(cache, &grad)?;
            grads.push(layer_grads);
            grad = grad_in;
        }
        grads.reverse();
        Ok(grads)
    }
}
