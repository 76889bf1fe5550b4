use std::fmt;
use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use log::info;
use serde::{Deserialize, Serialize};
use vino_ml_metrics::RegressionReport;

use crate::error::{ServingError, ServingResult};
use crate::predict::Predictor;

/// A deployed (or exported) model version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelId {
    pub model: String,
    pub version: String,
}

impl ModelId {
    pub fn new(model: impl Into<String>, version: impl Into<String>) -> Self {
        ModelId {
            model: model.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.model, self.version)
    }
}

/// Inputs of a side-by-side comparison.
///
/// `examples` are full rows laid out like `columns`, the target included.
#[derive(Debug, Clone)]
pub struct CompareConfig {
    pub examples: Vec<Vec<f64>>,
    pub columns: Vec<String>,
    pub left: ModelId,
    pub right: ModelId,
    pub target: String,
    pub model_type: String,
    pub display_rows: usize,
    pub show_columns: Vec<String>,
}

impl CompareConfig {
    pub fn new(
        examples: Vec<Vec<f64>>,
        columns: Vec<String>,
        left: ModelId,
        right: ModelId,
    ) -> Self {
        CompareConfig {
            examples,
            columns,
            left,
            right,
            target: "quality".into(),
            model_type: "regression".into(),
            display_rows: 10,
            show_columns: Vec::new(),
        }
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn model_type(mut self, model_type: impl Into<String>) -> Self {
        self.model_type = model_type.into();
        self
    }

    pub fn display_rows(mut self, rows: usize) -> Self {
        self.display_rows = rows;
        self
    }

    /// Feature columns printed next to the predictions.
    pub fn show_columns(mut self, columns: &[String]) -> Self {
        self.show_columns = columns.to_vec();
        self
    }

    fn column_index(&self, name: &str) -> ServingResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ServingError::Config(format!("unknown column `{name}`")))
    }
}

/// One example with both models' predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparedRow {
    pub features: Vec<f64>,
    pub truth: f64,
    pub left: f64,
    pub right: f64,
}

#[derive(Debug, Clone)]
pub struct Comparison {
    pub left: ModelId,
    pub right: ModelId,
    pub target: String,
    pub feature_columns: Vec<String>,
    pub rows: Vec<ComparedRow>,
    pub left_report: RegressionReport,
    pub right_report: RegressionReport,
    pub display_rows: usize,
    shown: Vec<usize>,
}

impl Comparison {
    /// The model with the lower MSE, `None` on a tie.
    pub fn better(&self) -> Option<&ModelId> {
        if self.left_report.mse < self.right_report.mse {
            Some(&self.left)
        } else if self.right_report.mse < self.left_report.mse {
            Some(&self.right)
        } else {
            None
        }
    }
}

/// Run both predictors on the examples and score them against the target.
pub fn compare(
    config: &CompareConfig,
    left: &dyn Predictor,
    right: &dyn Predictor,
) -> ServingResult<Comparison> {
    if config.model_type != "regression" {
        return Err(ServingError::Config(format!(
            "unsupported model type `{}`",
            config.model_type
        )));
    }
    if config.examples.is_empty() {
        return Err(ServingError::Config("no examples to compare".into()));
    }
    let target_idx = config.column_index(&config.target)?;
    let width = config.columns.len();

    let mut features = Vec::with_capacity(config.examples.len());
    let mut truth = Vec::with_capacity(config.examples.len());
    for row in &config.examples {
        if row.len() != width {
            return Err(ServingError::InvalidShape {
                expected: vec![width],
                got: vec![row.len()],
            });
        }
        truth.push(row[target_idx]);
        features.push(
            row.iter()
                .enumerate()
                .filter(|&(j, _)| j != target_idx)
                .map(|(_, &v)| v)
                .collect::<Vec<f64>>(),
        );
    }
    let feature_columns: Vec<String> = config
        .columns
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != target_idx)
        .map(|(_, c)| c.clone())
        .collect();
    let shown = config
        .show_columns
        .iter()
        .map(|name| {
            feature_columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| ServingError::Config(format!("unknown column `{name}`")))
        })
        .collect::<ServingResult<Vec<usize>>>()?;

    let left_pred = left.predict(&features)?;
    let right_pred = right.predict(&features)?;
    for (id, pred) in [(&config.left, &left_pred), (&config.right, &right_pred)] {
        if pred.len() != truth.len() {
            return Err(ServingError::UnparseablePrediction(format!(
                "{} returned {} predictions for {} examples",
                id,
                pred.len(),
                truth.len()
            )));
        }
    }

    let left_report = RegressionReport::compute(&truth, &left_pred)?;
    let right_report = RegressionReport::compute(&truth, &right_pred)?;
    info!("{}: {}", config.left, left_report);
    info!("{}: {}", config.right, right_report);

    let rows = features
        .into_iter()
        .zip(truth)
        .zip(left_pred.into_iter().zip(right_pred))
        .map(|((features, truth), (left, right))| ComparedRow {
            features,
            truth,
            left,
            right,
        })
        .collect();

    Ok(Comparison {
        left: config.left.clone(),
        right: config.right.clone(),
        target: config.target.clone(),
        feature_columns,
        rows,
        left_report,
        right_report,
        display_rows: config.display_rows,
        shown,
    })
}

fn error_color(error: f64) -> Color {
    match error.abs() {
        e if e < 0.5 => Color::Green,
        e if e < 1.0 => Color::Yellow,
        _ => Color::Red,
    }
}

/// Draw the comparison as a coloured table followed by per-model scores.
pub fn render<W: Write>(comparison: &Comparison, out: &mut W) -> io::Result<()> {
    let left_label = comparison.left.to_string();
    let right_label = comparison.right.to_string();
    let lw = left_label.len().max(8);
    let rw = right_label.len().max(8);

    let mut header = format!("{:>5}", "#");
    for &j in &comparison.shown {
        header.push_str(&format!("  {:>12}", truncate(&comparison.feature_columns[j], 12)));
    }
    header.push_str(&format!(
        "  {:>8}  {:>lw$}  {:>rw$}\n",
        truncate(&comparison.target, 8),
        left_label,
        right_label
    ));
    queue!(
        out,
        SetAttribute(Attribute::Bold),
        Print(header),
        SetAttribute(Attribute::Reset)
    )?;

    for (i, row) in comparison.rows.iter().take(comparison.display_rows).enumerate() {
        let mut prefix = format!("{:>5}", i + 1);
        for &j in &comparison.shown {
            prefix.push_str(&format!("  {:>12.4}", row.features[j]));
        }
        queue!(
            out,
            Print(prefix),
            Print(format!("  {:>8.2}  ", row.truth)),
            SetForegroundColor(error_color(row.left - row.truth)),
            Print(format!("{:>lw$.3}", row.left)),
            ResetColor,
            Print("  "),
            SetForegroundColor(error_color(row.right - row.truth)),
            Print(format!("{:>rw$.3}", row.right)),
            ResetColor,
            Print("\n")
        )?;
    }
    let hidden = comparison.rows.len().saturating_sub(comparison.display_rows);
    if hidden > 0 {
        queue!(
            out,
            SetForegroundColor(Color::DarkGrey),
            Print(format!("  ... {hidden} more rows\n")),
            ResetColor
        )?;
    }

    queue!(out, Print("\n"))?;
    for (id, report) in [
        (&comparison.left, &comparison.left_report),
        (&comparison.right, &comparison.right_report),
    ] {
        let color = if comparison.better() == Some(id) {
            Color::Green
        } else {
            Color::White
        };
        queue!(
            out,
            SetForegroundColor(color),
            Print(format!("{:<width$}  {}\n", id.to_string(), report, width = lw.max(rw))),
            ResetColor
        )?;
    }
    out.flush()
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
