use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use vino_ml_core::{Estimator, Tensor, TensorError, TensorResult};
use vino_ml_data::DataLoader;

use crate::loss::mse_loss;
use crate::optim::Adam;
use crate::scaler::StandardScaler;
use crate::sequential::Sequential;

/// `[network]` section of the run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Widths of the ReLU hidden layers.
    pub hidden: Vec<usize>,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Fraction of the training rows, taken from the end, held out for
    /// per-epoch validation loss.
    pub validation_split: f64,
    /// Standardize inputs with statistics learned in `fit`.
    pub standardize: bool,
    pub seed: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            hidden: vec![200, 50, 25],
            epochs: 4,
            batch_size: 32,
            learning_rate: 1e-3,
            validation_split: 0.1,
            standardize: true,
            seed: 42,
        }
    }
}

/// Losses recorded at the end of one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    pub epoch: usize,
    pub loss: f64,
    pub val_loss: Option<f64>,
}

/// Multi-layer perceptron regressor trained with MSE and Adam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseRegressor {
    pub config: NetworkConfig,
    pub network: Option<Sequential>,
    pub scaler: Option<StandardScaler>,
    pub history: Vec<EpochStats>,
}

impl DenseRegressor {
    pub fn new(config: NetworkConfig) -> Self {
        DenseRegressor {
            config,
            network: None,
            scaler: None,
            history: Vec::new(),
        }
    }

    pub fn n_features(&self) -> Option<usize> {
        self.network.as_ref().and_then(Sequential::in_features)
    }

    fn validate_config(&self) -> TensorResult<()> {
        let c = &self.config;
        if c.batch_size == 0 || c.epochs == 0 {
            return Err(TensorError::InvalidOperation(
                "epochs and batch_size must be positive".into(),
            ));
        }
        if !(0.0..1.0).contains(&c.validation_split) {
            return Err(TensorError::InvalidOperation(format!(
                "validation_split must be in [0, 1), got {}",
                c.validation_split
            )));
        }
        if !(c.learning_rate > 0.0) {
            return Err(TensorError::InvalidOperation(format!(
                "learning_rate must be positive, got {}",
                c.learning_rate
            )));
        }
        Ok(())
    }

    fn scale(&self, x: &Tensor) -> TensorResult<Tensor> {
        match &self.scaler {
            Some(s) => s.transform(x),
            None => Ok(x.clone()),
        }
    }
}

impl Default for DenseRegressor {
    fn default() -> Self {
        Self::new(NetworkConfig::default())
    }
}

impl Estimator for DenseRegressor {
    fn fit(&mut self, x: &Tensor, y: &Tensor) -> TensorResult<()> {
        self.validate_config()?;
        let (n, k) = x.shape().matrix()?;
        if y.numel() != n {
            return Err(TensorError::ShapeMismatch {
                expected: vec![n],
                got: y.shape_vec(),
            });
        }

        let n_val = (n as f64 * self.config.validation_split).floor() as usize;
        let n_train = n - n_val;
        if n_train == 0 {
            return Err(TensorError::EmptyTensor);
        }
        let (x_train, x_val) = (x.slice_rows(0, n_train)?, x.slice_rows(n_train, n)?);
        let (y_train, y_val) = (y.slice_rows(0, n_train)?, y.slice_rows(n_train, n)?);

        self.scaler = if self.config.standardize {
            let mut s = StandardScaler::new();
            s.fit(&x_train)?;
            Some(s)
        } else {
            None
        };
        let x_train = self.scale(&x_train)?;
        let x_val = self.scale(&x_val)?;

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut network = Sequential::mlp(k, &self.config.hidden, &mut rng);
        // Start the output at the label mean instead of zero.
        if let Some(out) = network.layers_mut().last_mut() {
            out.bias = Tensor::from_slice(&[y_train.mean_all()?]);
        }
        let mut optimizer = Adam::new(&network, self.config.learning_rate);

        info!(
            "training {} parameters on {} rows ({} held out) for {} epochs",
            network.num_parameters(),
            n_train,
            n_val,
            self.config.epochs
        );

        self.history.clear();
        let mut loader = DataLoader::new(
            &x_train,
            &y_train,
            self.config.batch_size,
            true,
            self.config.seed,
        )?;
        for epoch in 1..=self.config.epochs {
            let mut total = 0.0;
            for batch in loader.by_ref() {
                let (bx, by) = batch?;
                let (pred, caches) = network.forward_train(&bx)?;
                let (loss, grad) = mse_loss(&pred, &by)?;
                let grads = network.backward(&caches, &grad)?;
                optimizer.step(&mut network, &grads)?;
                total += loss * by.numel() as f64;
            }
            loader.reset();

            let val_loss = if n_val > 0 {
                Some(mse_loss(&network.forward(&x_val)?, &y_val)?.0)
            } else {
                None
            };
            let stats = EpochStats {
                epoch,
                loss: total / n_train as f64,
                val_loss,
            };
            let epochs = self.config.epochs;
            match stats.val_loss {
                Some(v) => info!(
                    "epoch {}/{}: loss {:.4}, val_loss {:.4}",
                    epoch, epochs, stats.loss, v
                ),
                None => info!("epoch {}/{}: loss {:.4}", epoch, epochs, stats.loss),
            }
            self.history.push(stats);
        }
        debug!("optimizer ran {} steps", optimizer.t);

        self.network = Some(network);
        Ok(())
    }

    fn predict(&self, x: &Tensor) -> TensorResult<Tensor> {
        let network = self.network.as_ref().ok_or(TensorError::NotFitted("predict"))?;
        let (n, k) = x.shape().matrix()?;
        if Some(k) != network.in_features() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![n, network.in_features().unwrap_or(0)],
                got: x.shape_vec(),
            });
        }
        network.forward(&self.scale(x)?)?.reshape(vec![n])
    }

    fn name(&self) -> &str {
        "dense"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vino_ml_data::synthetic::wine_like;
    use vino_ml_data::DataPipeline;

    fn small_config() -> NetworkConfig {
        NetworkConfig {
            hidden: vec![16, 8],
            epochs: 40,
            learning_rate: 0.01,
            ..NetworkConfig::default()
        }
    }

    #[test]
    fn test_defaults_match_reference_network() {
        let c = NetworkConfig::default();
        assert_eq!(c.hidden, vec![200, 50, 25]);
        assert_eq!(c.epochs, 4);
        assert_eq!(c.batch_size, 32);
        assert_eq!(c.validation_split, 0.1);
    }

    #[test]
    fn test_learns_wine_quality() {
        let dataset = wine_like(2000, 5).unwrap();
        let prepared = DataPipeline::new("unused").run_on(&dataset).unwrap();

        let mut model = DenseRegressor::new(small_config());
        model
            .fit(&prepared.train_x.values, &prepared.train_y.values)
            .unwrap();

        assert_eq!(model.history.len(), 40);
        let first = model.history.first().unwrap().loss;
        let last = model.history.last().unwrap().loss;
        assert!(last < first, "loss went from {first} to {last}");
        assert!(model.history.iter().all(|s| s.val_loss.is_some()));

        let reference = [7.8, 0.21, 0.49, 1.2, 0.036, 20.0, 99.0, 0.99, 3.05, 0.28, 12.1];
        let pred = model.predict_row(&reference).unwrap();
        assert!((pred - 7.0).abs() < 0.75, "predicted {pred}");

        let test_pred = model.predict(&prepared.test_x.values).unwrap();
        assert_eq!(test_pred.numel(), prepared.test_y.len());
    }

    #[test]
    fn test_training_is_reproducible() {
        let dataset = wine_like(200, 6).unwrap();
        let prepared = DataPipeline::new("unused").run_on(&dataset).unwrap();
        let config = NetworkConfig {
            hidden: vec![4],
            epochs: 2,
            ..NetworkConfig::default()
        };
        let mut a = DenseRegressor::new(config.clone());
        let mut b = DenseRegressor::new(config);
        a.fit(&prepared.train_x.values, &prepared.train_y.values).unwrap();
        b.fit(&prepared.train_x.values, &prepared.train_y.values).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_without_validation_or_scaling() {
        let x = Tensor::from_vec2d(&[vec![1.0], vec![2.0], vec![3.0], vec![4.0]]).unwrap();
        let y = Tensor::from_slice(&[2.0, 4.0, 6.0, 8.0]);
        let mut model = DenseRegressor::new(NetworkConfig {
            hidden: vec![3],
            epochs: 1,
            validation_split: 0.0,
            standardize: false,
            ..NetworkConfig::default()
        });
        model.fit(&x, &y).unwrap();
        assert!(model.scaler.is_none());
        assert_eq!(model.history[0].val_loss, None);
    }

    #[test]
    fn test_predict_before_fit() {
        let model = DenseRegressor::default();
        assert!(matches!(
            model.predict(&Tensor::zeros(vec![1, 11])),
            Err(TensorError::NotFitted(_))
        ));
    }

    #[test]
    fn test_rejects_bad_config() {
        let x = Tensor::zeros(vec![4, 2]);
        let y = Tensor::zeros(vec![4]);
        let mut model = DenseRegressor::new(NetworkConfig {
            validation_split: 1.0,
            ..NetworkConfig::default()
        });
        assert!(model.fit(&x, &y).is_err());

        let mut model = DenseRegressor::new(NetworkConfig {
            batch_size: 0,
            ..NetworkConfig::default()
        });
        assert!(model.fit(&x, &y).is_err());
    }

    #[test]
    fn test_wrong_width_at_predict() {
        let x = Tensor::rand(vec![10, 3], Some(0));
        let y = Tensor::rand(vec![10], Some(1));
        let mut model = DenseRegressor::new(NetworkConfig {
            hidden: vec![2],
            epochs: 1,
            ..NetworkConfig::default()
        });
        model.fit(&x, &y).unwrap();
        assert!(model.predict(&Tensor::zeros(vec![1, 4])).is_err());
    }
}
