use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use vino_ml_core::{Estimator, Tensor, TensorError};
use vino_ml_linear::LinearRegression;
use vino_ml_nn::DenseRegressor;

use crate::error::{ServingError, ServingResult};

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Trained parameters of a servable model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum ModelSpec {
    Linear(LinearRegression),
    Dense(DenseRegressor),
}

impl ModelSpec {
    pub fn estimator(&self) -> &dyn Estimator {
        match self {
            ModelSpec::Linear(m) => m as &dyn Estimator,
            ModelSpec::Dense(m) => m,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelSpec::Linear(_) => "linear",
            ModelSpec::Dense(_) => "dense",
        }
    }

    pub fn fitted_width(&self) -> Option<usize> {
        match self {
            ModelSpec::Linear(m) => m.fitted_width(),
            ModelSpec::Dense(m) => m.fitted_width(),
        }
    }
}

/// Trained estimators that can be packaged into a [`ServingArtifact`].
pub trait Exportable: Estimator {
    /// Input width learned in `fit`, `None` before fitting.
    fn fitted_width(&self) -> Option<usize>;

    fn to_spec(&self) -> ModelSpec;
}

impl Exportable for LinearRegression {
    fn fitted_width(&self) -> Option<usize> {
        self.n_features()
    }

    fn to_spec(&self) -> ModelSpec {
        ModelSpec::Linear(self.clone())
    }
}

impl Exportable for DenseRegressor {
    fn fitted_width(&self) -> Option<usize> {
        self.n_features()
    }

    fn to_spec(&self) -> ModelSpec {
        ModelSpec::Dense(self.clone())
    }
}

/// Self-describing, serialisable form of a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServingArtifact {
    pub format_version: u32,
    pub name: String,
    /// Shape of one instance, e.g. `[11]`.
    pub input_shape: Vec<usize>,
    #[serde(default)]
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub target: Option<String>,
    pub model: ModelSpec,
}

impl ServingArtifact {
    pub fn kind(&self) -> &'static str {
        self.model.kind()
    }

    pub fn width(&self) -> usize {
        self.input_shape.iter().product()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_feature_names(mut self, names: &[String]) -> ServingResult<Self> {
        if names.len() != self.width() {
            return Err(ServingError::InvalidShape {
                expected: self.input_shape.clone(),
                got: vec![names.len()],
            });
        }
        self.feature_names = names.to_vec();
        Ok(self)
    }

    /// Predict one value per instance.
    pub fn predict(&self, rows: &[Vec<f64>]) -> ServingResult<Vec<f64>> {
        let width = self.width();
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            return Err(ServingError::InvalidShape {
                expected: self.input_shape.clone(),
                got: vec![bad.len()],
            });
        }
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let x = Tensor::from_rows(rows, width)?;
        Ok(self.model.estimator().predict(&x)?.into_data())
    }
}

/// Package a fitted model for serving. `input_shape` is the shape of one
/// instance and must agree with the width the model was fitted on.
pub fn wrap_for_serving<M: Exportable + ?Sized>(
    model: &M,
    input_shape: &[usize],
) -> ServingResult<ServingArtifact> {
    let width = model
        .fitted_width()
        .ok_or(TensorError::NotFitted("wrap_for_serving"))?;
    if input_shape.len() != 1 || input_shape[0] != width {
        return Err(ServingError::InvalidShape {
            expected: vec![width],
            got: input_shape.to_vec(),
        });
    }
    Ok(ServingArtifact {
        format_version: ARTIFACT_FORMAT_VERSION,
        name: model.name().to_string(),
        input_shape: input_shape.to_vec(),
        feature_names: Vec::new(),
        target: None,
        model: model.to_spec(),
    })
}

/// Write `<destination>/<name>.json` and return its path.
pub fn export_artifact(artifact: &ServingArtifact, destination: &Path) -> ServingResult<PathBuf> {
    fs::create_dir_all(destination)?;
    let path = destination.join(format!("{}.json", artifact.name));
    let mut writer = BufWriter::new(fs::File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, artifact)?;
    writer.flush()?;
    info!(
        "exported {} model `{}` to {}",
        artifact.kind(),
        artifact.name,
        path.display()
    );
    Ok(path)
}

pub fn load_artifact(path: &Path) -> ServingResult<ServingArtifact> {
    let reader = BufReader::new(fs::File::open(path)?);
    let artifact: ServingArtifact = serde_json::from_reader(reader)?;
    if artifact.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(ServingError::Config(format!(
            "unsupported artifact format version {} in {}",
            artifact.format_version,
            path.display()
        )));
    }
    if artifact.model.fitted_width() != Some(artifact.width()) {
        return Err(ServingError::InvalidShape {
            expected: artifact.input_shape.clone(),
            got: artifact.model.fitted_width().into_iter().collect(),
        });
    }
    Ok(artifact)
}
