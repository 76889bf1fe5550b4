use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::dataset::Dataset;

/// Return a seeded permutation of `dataset`.
///
/// The same seed and the same input order always produce the same output
/// order, which pins down the train/test boundary across runs.
pub fn shuffle(dataset: &Dataset, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut records = dataset.records().to_vec();
    records.shuffle(&mut rng);
    debug!("shuffled {} records with seed {}", records.len(), seed);
    dataset.with_records(records)
}
