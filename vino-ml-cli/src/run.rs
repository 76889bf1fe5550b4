use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{info, warn};
use vino_ml::core::Estimator;
use vino_ml::data::{DataPipeline, PreparedData};
use vino_ml::linear::LinearRegression;
use vino_ml::metrics::RegressionReport;
use vino_ml::nn::DenseRegressor;
use vino_ml::serving::{
    compare, export_artifact, load_artifact, render, wrap_for_serving, CommandRunner,
    CompareConfig, Comparison, Deployer, DryRunRunner, Exportable, LocalPredictor, ModelId,
    ModelTarget, RemotePredictor, SystemRunner,
};

use crate::args::Args;
use crate::config::RunConfig;

/// Sample used to sanity-check both models after training.
pub const REFERENCE_WINE: [f64; 11] = [
    7.8, 0.21, 0.49, 1.2, 0.036, 20.0, 99.0, 0.99, 3.05, 0.28, 12.1,
];

/// Files written by one run.
#[derive(Debug)]
pub struct RunOutput {
    pub network_artifact: PathBuf,
    pub linear_artifact: PathBuf,
    pub comparison: Comparison,
}

pub fn run(config: &RunConfig, args: &Args) -> Result<RunOutput> {
    let prepared = DataPipeline::from_config(&config.data)
        .run()
        .with_context(|| format!("preparing {}", config.data.path.display()))?;

    let mut linear = LinearRegression::new(config.linear.fit_intercept);
    train(&mut linear, &prepared)?;
    let mut network = DenseRegressor::new(config.network.clone());
    train(&mut network, &prepared)?;

    let network_artifact = export(&network, &config.deploy.network, &prepared, config)?;
    let linear_artifact = export(&linear, &config.deploy.linear, &prepared, config)?;

    let runner: &dyn CommandRunner = if args.dry_run { &DryRunRunner } else { &SystemRunner };
    if args.local {
        info!("--local given, skipping deployment");
    } else {
        for (target, artifact) in [
            (&config.deploy.network, &network_artifact),
            (&config.deploy.linear, &linear_artifact),
        ] {
            Deployer::new(config.deploy.config_for(target), runner)?
                .deploy(artifact)
                .with_context(|| format!("deploying {}", target.model))?;
        }
    }

    let compare_config = CompareConfig::new(
        prepared.test.to_rows(),
        prepared.test.columns().to_vec(),
        ModelId::new(&config.deploy.network.model, &config.deploy.network.version),
        ModelId::new(&config.deploy.linear.model, &config.deploy.linear.version),
    )
    .target(&config.data.target)
    .display_rows(config.compare.display_rows)
    .show_columns(&shown_columns(config, &prepared));

    let comparison = if args.local || args.dry_run {
        if args.dry_run && !args.local {
            info!("dry run: comparing exported artifacts locally");
        }
        let left = LocalPredictor::new(load_artifact(&network_artifact)?);
        let right = LocalPredictor::new(load_artifact(&linear_artifact)?);
        compare(&compare_config, &left, &right)?
    } else {
        let left = remote(&config.deploy.network, config, runner);
        let right = remote(&config.deploy.linear, config, runner);
        compare(&compare_config, &left, &right)?
    };

    render(&comparison, &mut io::stdout().lock())?;
    Ok(RunOutput {
        network_artifact,
        linear_artifact,
        comparison,
    })
}

fn train<M: Estimator>(model: &mut M, prepared: &PreparedData) -> Result<()> {
    info!("fitting {} model", model.name());
    model
        .fit(&prepared.train_x.values, &prepared.train_y.values)
        .with_context(|| format!("training {} model", model.name()))?;

    if prepared.test_x.rows() > 0 {
        let pred = model.predict(&prepared.test_x.values)?;
        let report = RegressionReport::from_tensors(&prepared.test_y.values, &pred)?;
        info!("{} test scores: {}", model.name(), report);
    }
    if prepared.train_x.n_features() == REFERENCE_WINE.len() {
        match model.predict_row(&REFERENCE_WINE) {
            Ok(q) => info!("{} predicts quality {:.2} for the reference wine", model.name(), q),
            Err(e) => warn!("{} could not score the reference wine: {}", model.name(), e),
        }
    }
    Ok(())
}

fn export<M: Exportable>(
    model: &M,
    target: &ModelTarget,
    prepared: &PreparedData,
    config: &RunConfig,
) -> Result<PathBuf> {
    let artifact = wrap_for_serving(model, &[prepared.train_x.n_features()])?
        .named(&target.model)
        .with_target(&config.data.target)
        .with_feature_names(&prepared.train_x.columns)?;
    Ok(export_artifact(&artifact, &config.export.dir)?)
}

fn remote<'r>(
    target: &ModelTarget,
    config: &RunConfig,
    runner: &'r dyn CommandRunner,
) -> RemotePredictor<&'r dyn CommandRunner> {
    RemotePredictor::new(&target.model, &target.version, runner).project(&config.deploy.project)
}

/// Configured display columns that exist in this dataset.
fn shown_columns(config: &RunConfig, prepared: &PreparedData) -> Vec<String> {
    config
        .compare
        .show_columns
        .iter()
        .filter(|name| {
            let present = prepared.train_x.columns.contains(*name);
            if !present {
                warn!("column {:?} not in the dataset, not shown", name);
            }
            present
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use super::*;
    use vino_ml::data::synthetic::wine_like;
    use vino_ml::data::write_dataset;
    use vino_ml::nn::NetworkConfig;

    fn config_in(dir: &std::path::Path) -> RunConfig {
        let csv = dir.join("wine.csv");
        let dataset = wine_like(300, 11).unwrap();
        write_dataset(&dataset, File::create(&csv).unwrap(), b';').unwrap();

        let mut config = RunConfig::default();
        config.data.path = csv;
        config.data.require_wine_schema = true;
        config.network = NetworkConfig {
            hidden: vec![8],
            epochs: 3,
            ..NetworkConfig::default()
        };
        config.export.dir = dir.join("artifacts");
        config
    }

    #[test]
    fn test_local_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let args = Args {
            local: true,
            ..Args::default()
        };
        let output = run(&config, &args).unwrap();

        assert_eq!(output.network_artifact, dir.path().join("artifacts/wine_dense.json"));
        assert_eq!(output.linear_artifact, dir.path().join("artifacts/wine_linear.json"));
        assert!(output.linear_artifact.is_file());
        assert_eq!(output.comparison.rows.len(), 60);
        assert_eq!(output.comparison.feature_columns.len(), 11);
        assert!(output.comparison.right_report.mse < 1.0);
    }

    #[test]
    fn test_dry_run_compares_locally() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let args = Args {
            dry_run: true,
            ..Args::default()
        };
        let output = run(&config, &args).unwrap();
        assert_eq!(output.comparison.left.model, "wine_dense");
        assert_eq!(output.comparison.right.model, "wine_linear");
    }

    #[test]
    fn test_missing_data_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.data.path = dir.path().join("missing.csv");
        let err = run(&config, &Args { local: true, ..Args::default() }).unwrap_err();
        assert!(format!("{err:#}").contains("missing.csv"));
    }
}
