use std::io::Write;

use log::debug;
use serde_json::Value;

use crate::artifact::ServingArtifact;
use crate::error::{ServingError, ServingResult};
use crate::runner::CommandRunner;

/// Anything that maps feature rows to one predicted value per row.
pub trait Predictor {
    fn predict(&self, rows: &[Vec<f64>]) -> ServingResult<Vec<f64>>;
}

/// Evaluates an exported artifact in-process.
#[derive(Debug, Clone)]
pub struct LocalPredictor {
    artifact: ServingArtifact,
}

impl LocalPredictor {
    pub fn new(artifact: ServingArtifact) -> Self {
        LocalPredictor { artifact }
    }

    pub fn artifact(&self) -> &ServingArtifact {
        &self.artifact
    }
}

impl Predictor for LocalPredictor {
    fn predict(&self, rows: &[Vec<f64>]) -> ServingResult<Vec<f64>> {
        self.artifact.predict(rows)
    }
}

/// Queries a deployed model version with `gcloud ai-platform predict`.
pub struct RemotePredictor<R: CommandRunner> {
    pub model: String,
    pub version: String,
    pub project: Option<String>,
    runner: R,
}

impl<R: CommandRunner> RemotePredictor<R> {
    pub fn new(model: impl Into<String>, version: impl Into<String>, runner: R) -> Self {
        RemotePredictor {
            model: model.into(),
            version: version.into(),
            project: None,
            runner,
        }
    }

    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }
}

impl<R: CommandRunner> Predictor for RemotePredictor<R> {
    fn predict(&self, rows: &[Vec<f64>]) -> ServingResult<Vec<f64>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        // One JSON array per line.
        let mut instances = tempfile::Builder::new()
            .prefix("vino-instances-")
            .suffix(".json")
            .tempfile()?;
        for row in rows {
            serde_json::to_writer(&mut instances, row)?;
            writeln!(instances)?;
        }
        instances.flush()?;

        let mut args = vec![
            "ai-platform".to_string(),
            "predict".to_string(),
            "--model".to_string(),
            self.model.clone(),
            "--version".to_string(),
            self.version.clone(),
            "--json-instances".to_string(),
            instances.path().display().to_string(),
        ];
        if let Some(project) = &self.project {
            args.push("--project".to_string());
            args.push(project.clone());
        }

        let output = self.runner.run("gcloud", &args)?.check("gcloud")?;
        let predictions = parse_predictions(&output.stdout)?;
        if predictions.len() != rows.len() {
            return Err(ServingError::UnparseablePrediction(format!(
                "sent {} instances to {}/{} but got {} predictions",
                rows.len(),
                self.model,
                self.version,
                predictions.len()
            )));
        }
        debug!("{}/{} returned {} predictions", self.model, self.version, predictions.len());
        Ok(predictions)
    }
}

/// Parse prediction output in any of the shapes the service prints:
/// a JSON list, `{"predictions": [...]}`, or a text table with a header
/// line followed by one `[x]` (or bare `x`) per instance.
pub fn parse_predictions(output: &str) -> ServingResult<Vec<f64>> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Err(ServingError::UnparseablePrediction("empty output".into()));
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if !value.is_number() {
            return from_json(&value);
        }
    }

    let mut predictions = Vec::new();
    for (i, line) in trimmed.lines().map(str::trim).enumerate() {
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line).ok().as_ref().and_then(extract_number) {
            Some(v) => predictions.push(v),
            None if i == 0 => continue,
            None => {
                return Err(ServingError::UnparseablePrediction(format!(
                    "line {}: {:?}",
                    i + 1,
                    line
                )))
            }
        }
    }
    if predictions.is_empty() {
        return Err(ServingError::UnparseablePrediction(trimmed.to_string()));
    }
    Ok(predictions)
}

fn from_json(value: &Value) -> ServingResult<Vec<f64>> {
    let items = match value {
        Value::Object(map) => match map.get("predictions") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ServingError::UnparseablePrediction(
                    "object without a `predictions` list".into(),
                ))
            }
        },
        Value::Array(items) => items,
        other => return Err(ServingError::UnparseablePrediction(other.to_string())),
    };
    items
        .iter()
        .map(|item| {
            extract_number(item)
                .ok_or_else(|| ServingError::UnparseablePrediction(item.to_string()))
        })
        .collect()
}

/// A number, possibly wrapped in single-element lists or single-key objects
/// such as `{"dense_3": [6.1]}`.
fn extract_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Array(items) if items.len() == 1 => extract_number(&items[0]),
        Value::Object(map) if map.len() == 1 => map.values().next().and_then(extract_number),
        _ => None,
    }
}
