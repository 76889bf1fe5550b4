use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use vino_ml::data::DataConfig;
use vino_ml::nn::NetworkConfig;
use vino_ml::serving::DeploySettings;

/// Whole-run configuration. Every field has a default, so an empty file is
/// a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub data: DataConfig,
    pub network: NetworkConfig,
    pub linear: LinearConfig,
    pub export: ExportConfig,
    pub deploy: DeploySettings,
    pub compare: CompareSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearConfig {
    pub fit_intercept: bool,
}

impl Default for LinearConfig {
    fn default() -> Self {
        LinearConfig { fit_intercept: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory the serving artifacts are written to.
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            dir: PathBuf::from("artifacts"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareSettings {
    pub display_rows: usize,
    /// Feature columns printed beside the predictions.
    pub show_columns: Vec<String>,
}

impl Default for CompareSettings {
    fn default() -> Self {
        CompareSettings {
            display_rows: 10,
            show_columns: vec!["alcohol".into(), "volatile acidity".into()],
        }
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
