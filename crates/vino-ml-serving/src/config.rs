use serde::{Deserialize, Serialize};

use crate::error::{ServingError, ServingResult};

/// Everything needed to deploy one model version. No value is read from the
/// environment; callers pass it explicitly.
///
/// The uploaded file is a VinoML JSON artifact, which no built-in serving
/// framework reads. A version that should answer predictions needs a custom
/// prediction routine: set `prediction_class` and `package_uris`, and
/// `--framework` is then left off the version command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployConfig {
    pub project: String,
    pub region: String,
    /// Cloud storage bucket, e.g. `gs://my-models`.
    pub bucket: String,
    pub model: String,
    pub version: String,
    pub runtime_version: String,
    pub framework: String,
    pub python_version: String,
    /// `module.Class` of a custom prediction routine.
    #[serde(default)]
    pub prediction_class: Option<String>,
    /// Packages holding the routine, as `gs://` URIs.
    #[serde(default)]
    pub package_uris: Vec<String>,
}

impl DeployConfig {
    pub fn validate(&self) -> ServingResult<()> {
        for (field, value) in [
            ("project", &self.project),
            ("region", &self.region),
            ("model", &self.model),
            ("version", &self.version),
            ("runtime_version", &self.runtime_version),
            ("python_version", &self.python_version),
        ] {
            if value.trim().is_empty() {
                return Err(ServingError::Config(format!("`{field}` must not be empty")));
            }
        }
        if !self.bucket.starts_with("gs://") || self.bucket.len() <= "gs://".len() {
            return Err(ServingError::Config(format!(
                "bucket must look like gs://<name>, got {:?}",
                self.bucket
            )));
        }
        match &self.prediction_class {
            None if self.framework.trim().is_empty() => {
                return Err(ServingError::Config(
                    "`framework` must not be empty without a prediction_class".into(),
                ));
            }
            Some(class) if class.trim().is_empty() || self.package_uris.is_empty() => {
                return Err(ServingError::Config(
                    "a prediction_class needs a non-empty name and package_uris".into(),
                ));
            }
            _ => {}
        }
        if let Some(uri) = self.package_uris.iter().find(|u| !u.starts_with("gs://")) {
            return Err(ServingError::Config(format!(
                "package URIs must be gs:// paths, got {uri:?}"
            )));
        }
        Ok(())
    }

    pub fn uses_custom_routine(&self) -> bool {
        self.prediction_class.is_some()
    }

    /// Remote directory the version's artifact is uploaded to.
    pub fn artifact_dir(&self) -> String {
        format!(
            "{}/{}/{}/",
            self.bucket.trim_end_matches('/'),
            self.model,
            self.version
        )
    }
}

/// Name, version and serving setup of one hosted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTarget {
    pub model: String,
    pub version: String,
    pub framework: String,
    #[serde(default)]
    pub prediction_class: Option<String>,
    #[serde(default)]
    pub package_uris: Vec<String>,
}

/// `[deploy]` section of the run configuration: shared settings plus one
/// target per trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploySettings {
    pub project: String,
    pub region: String,
    pub bucket: String,
    pub runtime_version: String,
    pub python_version: String,
    pub network: ModelTarget,
    pub linear: ModelTarget,
}

impl Default for DeploySettings {
    fn default() -> Self {
        DeploySettings {
            project: "vino-ml".into(),
            region: "us-central1".into(),
            bucket: "gs://vino-ml-models".into(),
            runtime_version: "1.15".into(),
            python_version: "3.7".into(),
            network: ModelTarget {
                model: "wine_dense".into(),
                version: "v1".into(),
                framework: "tensorflow".into(),
                prediction_class: None,
                package_uris: Vec::new(),
            },
            linear: ModelTarget {
                model: "wine_linear".into(),
                version: "v1".into(),
                framework: "scikit-learn".into(),
                prediction_class: None,
                package_uris: Vec::new(),
            },
        }
    }
}

impl DeploySettings {
    pub fn config_for(&self, target: &ModelTarget) -> DeployConfig {
        DeployConfig {
            project: self.project.clone(),
            region: self.region.clone(),
            bucket: self.bucket.clone(),
            model: target.model.clone(),
            version: target.version.clone(),
            runtime_version: self.runtime_version.clone(),
            framework: target.framework.clone(),
            python_version: self.python_version.clone(),
            prediction_class: target.prediction_class.clone(),
            package_uris: target.package_uris.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets_are_valid() {
        let settings = DeploySettings::default();
        let network = settings.config_for(&settings.network);
        let linear = settings.config_for(&settings.linear);
        network.validate().unwrap();
        linear.validate().unwrap();
        assert_eq!(network.framework, "tensorflow");
        assert_eq!(linear.model, "wine_linear");
    }

    #[test]
    fn test_artifact_dir() {
        let settings = DeploySettings {
            bucket: "gs://models/".into(),
            ..DeploySettings::default()
        };
        let config = settings.config_for(&settings.network);
        assert_eq!(config.artifact_dir(), "gs://models/wine_dense/v1/");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let settings = DeploySettings::default();
        let mut config = settings.config_for(&settings.network);
        config.bucket = "models".into();
        assert!(matches!(config.validate(), Err(ServingError::Config(_))));

        let mut config = settings.config_for(&settings.network);
        config.version = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_custom_routine_validation() {
        let settings = DeploySettings::default();
        let mut config = settings.config_for(&settings.network);
        config.framework.clear();
        assert!(config.validate().is_err());

        config.prediction_class = Some("vino_predictor.VinoPredictor".into());
        assert!(config.validate().is_err(), "routine without packages");

        config.package_uris = vec!["routines/vino.tar.gz".into()];
        assert!(config.validate().is_err(), "package outside cloud storage");

        config.package_uris = vec!["gs://vino-ml-models/routines/vino.tar.gz".into()];
        config.validate().unwrap();
        assert!(config.uses_custom_routine());
    }
}
