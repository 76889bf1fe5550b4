pub mod artifact;
pub mod compare;
pub mod config;
pub mod deploy;
pub mod error;
pub mod predict;
pub mod runner;

pub use artifact::{
    export_artifact, load_artifact, wrap_for_serving, Exportable, ModelSpec, ServingArtifact,
};
pub use compare::{compare, render, CompareConfig, Comparison, ComparedRow, ModelId};
pub use config::{DeployConfig, DeploySettings, ModelTarget};
pub use deploy::Deployer;
pub use error::{ServingError, ServingResult};
pub use predict::{parse_predictions, LocalPredictor, Predictor, RemotePredictor};
pub use runner::{CommandOutput, CommandRunner, DryRunRunner, SystemRunner};
