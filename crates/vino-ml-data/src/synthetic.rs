//! Synthetic wine samples for demos and tests.
//!
//! Features are drawn uniformly from typical white wine ranges; quality is
//! driven mostly by alcohol and volatile acidity, plus a little noise, then
//! rounded and clamped to 3..=9 like the real scores.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dataset::{Dataset, Record};
use crate::error::DataResult;
use crate::schema::wine_columns;

const FEATURE_RANGES: [(f64, f64); 11] = [
    (5.5, 8.5),     // fixed acidity
    (0.15, 0.45),   // volatile acidity
    (0.2, 0.5),     // citric acid
    (1.0, 15.0),    // residual sugar
    (0.03, 0.06),   // chlorides
    (15.0, 60.0),   // free sulfur dioxide
    (90.0, 200.0),  // total sulfur dioxide
    (0.99, 1.0),    // density
    (3.0, 3.4),     // pH
    (0.35, 0.6),    // sulphates
    (8.5, 13.5),    // alcohol
];

/// Quality before rounding for a feature row in wine column order.
pub fn latent_quality(features: &[f64; 11]) -> f64 {
    5.6 + 0.8 * (features[10] - 10.5) - 3.0 * (features[1] - 0.28)
}

/// Generate `n` wine-like records with the full wine header.
pub fn wine_like(n: usize, seed: u64) -> DataResult<Dataset> {
    let mut rng = StdRng::seed_from_u64(seed);
    let records = (0..n)
        .map(|_| {
            let features = FEATURE_RANGES.map(|(lo, hi)| rng.gen_range(lo..hi));
            let noise = rng.gen_range(-0.3..0.3);
            let quality = (latent_quality(&features) + noise).round().clamp(3.0, 9.0);
            let mut values = features.to_vec();
            values.push(quality);
            Record::new(values)
        })
        .collect();
    Dataset::new(wine_columns(), records)
}
