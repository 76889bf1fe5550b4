use std::path::Path;

use log::{info, warn};

use crate::config::DeployConfig;
use crate::error::{ServingError, ServingResult};
use crate::runner::CommandRunner;

const GCLOUD: &str = "gcloud";
const GSUTIL: &str = "gsutil";

/// Creates hosted models and versions through the `gcloud` CLI.
pub struct Deployer<R: CommandRunner> {
    config: DeployConfig,
    runner: R,
}

impl<R: CommandRunner> Deployer<R> {
    pub fn new(config: DeployConfig, runner: R) -> ServingResult<Self> {
        config.validate()?;
        Ok(Deployer { config, runner })
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    /// `gsutil cp <local> <remote>`
    pub fn upload(&self, local: &Path, remote: &str) -> ServingResult<()> {
        let local = local.display().to_string();
        let args = to_args(&["cp", local.as_str(), remote]);
        self.runner.run(GSUTIL, &args)?.check(GSUTIL)?;
        Ok(())
    }

    /// `gcloud ai-platform models create`
    pub fn create_model(&self) -> ServingResult<()> {
        let c = &self.config;
        let mut args = to_args(&["ai-platform", "models", "create", c.model.as_str()]);
        push_flags(
            &mut args,
            &[
                ("--regions", c.region.as_str()),
                ("--project", c.project.as_str()),
            ],
        );
        self.runner.run(GCLOUD, &args)?.check(GCLOUD)?;
        Ok(())
    }

    /// `gcloud ai-platform versions create` pointing at an uploaded artifact
    /// directory. With a custom prediction routine the class and packages
    /// replace `--framework`.
    pub fn create_version(&self, artifact_location: &str) -> ServingResult<()> {
        let c = &self.config;
        let mut args = to_args(&["ai-platform", "versions", "create", c.version.as_str()]);
        push_flags(
            &mut args,
            &[
                ("--model", c.model.as_str()),
                ("--origin", artifact_location),
                ("--runtime-version", c.runtime_version.as_str()),
                ("--python-version", c.python_version.as_str()),
            ],
        );
        match &c.prediction_class {
            Some(class) => {
                let packages = c.package_uris.join(",");
                push_flags(
                    &mut args,
                    &[
                        ("--prediction-class", class.as_str()),
                        ("--package-uris", packages.as_str()),
                    ],
                );
            }
            None => push_flags(&mut args, &[("--framework", c.framework.as_str())]),
        }
        push_flags(&mut args, &[("--project", c.project.as_str())]);
        self.runner.run(GCLOUD, &args)?.check(GCLOUD)?;
        Ok(())
    }

    /// Upload, create the model (an existing one is reused) and create the
    /// version. Returns the remote artifact directory.
    pub fn deploy(&self, local_artifact: &Path) -> ServingResult<String> {
        let remote = self.config.artifact_dir();
        info!(
            "deploying {} as {}/{}",
            local_artifact.display(),
            self.config.model,
            self.config.version
        );
        self.upload(local_artifact, &remote)?;
        match self.create_model() {
            Err(ServingError::CommandFailed { stderr, .. })
                if stderr.contains("already exists") =>
            {
                warn!("model `{}` already exists, adding a version to it", self.config.model);
            }
            other => other?,
        }
        self.create_version(&remote)?;
        info!("created version {}/{}", self.config.model, self.config.version);
        Ok(remote)
    }
}

fn to_args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn push_flags(args: &mut Vec<String>, flags: &[(&str, &str)]) {
    for (flag, value) in flags {
        args.push(flag.to_string());
        args.push(value.to_string());
    }
}
