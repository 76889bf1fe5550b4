use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use vino_ml_core::{Tensor, TensorError, TensorResult};

/// Mini-batch iterator over a feature matrix and its label vector.
///
/// When shuffling, each call to [`DataLoader::reset`] draws a fresh order
/// from the loader's own seeded generator, so a whole training run is
/// reproducible from one seed.
pub struct DataLoader<'a> {
    features: &'a Tensor,
    labels: &'a Tensor,
    batch_size: usize,
    shuffle: bool,
    rng: StdRng,
    indices: Vec<usize>,
    current: usize,
}

impl<'a> DataLoader<'a> {
    pub fn new(
        features: &'a Tensor,
        labels: &'a Tensor,
        batch_size: usize,
        shuffle: bool,
        seed: u64,
    ) -> TensorResult<Self> {
        let n = features.shape().dim(0)?;
        if n != labels.numel() {
            return Err(TensorError::ShapeMismatch {
                expected: vec![n],
                got: labels.shape_vec(),
            });
        }
        if batch_size == 0 {
            return Err(TensorError::InvalidOperation("batch_size must be positive".into()));
        }
        let mut loader = DataLoader {
            features,
            labels,
            batch_size,
            shuffle,
            rng: StdRng::seed_from_u64(seed),
            indices: (0..n).collect(),
            current: 0,
        };
        loader.reset();
        Ok(loader)
    }

    /// Rewind for the next epoch (reshuffling if enabled).
    pub fn reset(&mut self) {
        self.current = 0;
        if self.shuffle {
            self.indices.shuffle(&mut self.rng);
        }
    }

    /// Number of batches per epoch.
    pub fn len(&self) -> usize {
        self.indices.len().div_ceil(self.batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl<'a> Iterator for DataLoader<'a> {
    type Item = TensorResult<(Tensor, Tensor)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.indices.len() {
            return None;
        }
        let end = (self.current + self.batch_size).min(self.indices.len());
        let batch = &self.indices[self.current..end];
        self.current = end;

        let x = self.features.select_rows(batch);
        let y: Vec<f64> = batch.iter().map(|&i| self.labels.data()[i]).collect();
        Some(x.map(|x| (x, Tensor::from_slice(&y))))
    }
}
