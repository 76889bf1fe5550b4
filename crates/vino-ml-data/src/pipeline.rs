use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::csv_io::load_dataset;
use crate::dataset::Dataset;
use crate::error::{DataError, DataResult};
use crate::schema::check_wine_schema;
use crate::separate::{separate, FeatureMatrix, LabelVector};
use crate::shuffle::shuffle;
use crate::split::split;

/// `[data]` section of the run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub path: PathBuf,
    pub delimiter: char,
    pub seed: u64,
    pub train_ratio: f64,
    pub target: String,
    /// Reject files whose header is not exactly the wine layout.
    pub require_wine_schema: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            path: PathBuf::from("winequality-white.csv"),
            delimiter: ';',
            seed: 4,
            train_ratio: 0.8,
            target: "quality".to_string(),
            require_wine_schema: false,
        }
    }
}

/// Model-ready output of the data stages.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub train_x: FeatureMatrix,
    pub train_y: LabelVector,
    pub test_x: FeatureMatrix,
    pub test_y: LabelVector,
    /// The test part with all columns, as handed to the comparator.
    pub test: Dataset,
}

/// Load → shuffle → split → separate, run once.
///
/// ```no_run
/// use vino_ml_data::DataPipeline;
///
/// let prepared = DataPipeline::new("winequality-white.csv")
///     .seed(4)
///     .train_ratio(0.8)
///     .run()?;
/// assert_eq!(prepared.train_x.rows(), prepared.train_y.len());
/// # Ok::<(), vino_ml_data::DataError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DataPipeline {
    config: DataConfig,
}

impl DataPipeline {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        DataPipeline {
            config: DataConfig {
                path: path.as_ref().to_path_buf(),
                ..DataConfig::default()
            },
        }
    }

    pub fn from_config(config: &DataConfig) -> Self {
        DataPipeline {
            config: config.clone(),
        }
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn train_ratio(mut self, ratio: f64) -> Self {
        self.config.train_ratio = ratio;
        self
    }

    pub fn target(mut self, target: &str) -> Self {
        self.config.target = target.to_string();
        self
    }

    pub fn require_wine_schema(mut self, require: bool) -> Self {
        self.config.require_wine_schema = require;
        self
    }

    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    /// Read the configured file and prepare it.
    pub fn run(&self) -> DataResult<PreparedData> {
        let delimiter = delimiter_byte(self.config.delimiter)?;
        let dataset = load_dataset(&self.config.path, delimiter)?;
        self.run_on(&dataset)
    }

    /// Prepare an already loaded dataset.
    pub fn run_on(&self, dataset: &Dataset) -> DataResult<PreparedData> {
        if self.config.require_wine_schema {
            check_wine_schema(dataset)?;
        }
        let shuffled = shuffle(dataset, self.config.seed);
        let parts = split(&shuffled, self.config.train_ratio)?;
        let (train_x, train_y) = separate(&parts.train, &self.config.target)?;
        let (test_x, test_y) = separate(&parts.test, &self.config.target)?;
        info!(
            "prepared {} training and {} test rows with {} features, target {:?}",
            train_x.rows(),
            test_x.rows(),
            train_x.n_features(),
            self.config.target
        );
        Ok(PreparedData {
            train_x,
            train_y,
            test_x,
            test_y,
            test: parts.test,
        })
    }
}

fn delimiter_byte(c: char) -> DataResult<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(DataError::InvalidDelimiter(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_io::write_dataset;
    use crate::schema::WINE_FEATURES;
    use crate::synthetic::wine_like;

    #[test]
    fn test_full_pipeline_on_wine_sized_file() {
        let dataset = wine_like(4898, 11).unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();
        write_dataset(&dataset, file.reopen().unwrap(), b';').unwrap();

        let prepared = DataPipeline::new(file.path())
            .require_wine_schema(true)
            .run()
            .unwrap();
        assert_eq!(prepared.train_x.rows(), 3918);
        assert_eq!(prepared.test_x.rows(), 980);
        assert_eq!(prepared.train_y.len(), 3918);
        assert_eq!(prepared.test_y.len(), 980);
        assert_eq!(prepared.train_x.columns, WINE_FEATURES.to_vec());
        assert_eq!(prepared.test.len(), 980);
    }

    #[test]
    fn test_pipeline_is_reproducible() {
        let dataset = wine_like(300, 2).unwrap();
        let a = DataPipeline::new("unused").run_on(&dataset).unwrap();
        let b = DataPipeline::new("unused").run_on(&dataset).unwrap();
        assert_eq!(a.train_x, b.train_x);
        assert_eq!(a.test_y, b.test_y);

        let c = DataPipeline::new("unused").seed(5).run_on(&dataset).unwrap();
        assert_ne!(a.train_y, c.train_y);
    }

    #[test]
    fn test_test_rows_align_with_labels() {
        let dataset = wine_like(50, 8).unwrap();
        let prepared = DataPipeline::new("unused").run_on(&dataset).unwrap();
        let quality = prepared.test.column("quality").unwrap();
        assert_eq!(quality, prepared.test_y.values.data());
    }

    #[test]
    fn test_missing_target_column() {
        let dataset = wine_like(10, 1).unwrap();
        let err = DataPipeline::new("unused")
            .target("score")
            .run_on(&dataset)
            .unwrap_err();
        assert!(matches!(err, DataError::UnknownColumn(_)));
    }

    #[test]
    fn test_zero_ratio() {
        let dataset = wine_like(10, 1).unwrap();
        let err = DataPipeline::new("unused")
            .train_ratio(0.0)
            .run_on(&dataset)
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidSplit(_)));
    }

    #[test]
    fn test_non_ascii_delimiter() {
        let err = DataPipeline::new("unused").delimiter('§').run().unwrap_err();
        assert!(matches!(err, DataError::InvalidDelimiter('§')));
    }

    #[test]
    fn test_config_defaults() {
        let config = DataConfig::default();
        assert_eq!(config.seed, 4);
        assert_eq!(config.train_ratio, 0.8);
        assert_eq!(config.delimiter, ';');
        assert_eq!(DataPipeline::from_config(&config).config(), &config);
    }
}
