mod args;
mod config;
mod run;

use anyhow::Result;
use env_logger::Env;
use log::info;

use crate::args::{help_text, parse_args};
use crate::config::RunConfig;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let Some(args) = parse_args(std::env::args().skip(1).collect())? else {
        println!("{}", help_text());
        return Ok(());
    };
    let config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => {
            info!("no config file given, using defaults");
            RunConfig::default()
        }
    };
    let output = run::run(&config, &args)?;
    info!(
        "artifacts: {} and {}",
        output.network_artifact.display(),
        output.linear_artifact.display()
    );
    if let Some(best) = output.comparison.better() {
        info!("lower test MSE: {}", best);
    }
    Ok(())
}
