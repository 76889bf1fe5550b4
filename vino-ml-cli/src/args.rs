use std::path::PathBuf;

use anyhow::{bail, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    pub config: Option<PathBuf>,
    /// Log deployment commands instead of running them.
    pub dry_run: bool,
    /// Compare the exported artifacts in-process instead of querying the
    /// deployed versions.
    pub local: bool,
}

pub fn help_text() -> &'static str {
    "Usage: vino-ml [config.toml] [--dry-run] [--local]\n\
     \n\
     Train the dense and linear wine quality models, export and deploy them,\n\
     then compare their predictions on the test split.\n\
     \n\
     Options:\n\
     \x20 --dry-run   log gcloud/gsutil commands without running them\n\
     \x20 --local     skip deployment and compare the exported artifacts locally\n\
     \x20 -h, --help  show this message\n\
     \n\
     Set RUST_LOG (default: info) to control log output."
}

/// `Ok(None)` means help was requested.
pub fn parse_args(args: Vec<String>) -> Result<Option<Args>> {
    let mut parsed = Args::default();
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--dry-run" => parsed.dry_run = true,
            "--local" => parsed.local = true,
            flag if flag.starts_with('-') => bail!("unknown option {flag}\n\n{}", help_text()),
            path => {
                if parsed.config.is_some() {
                    bail!("only one config file may be given, got another: {path}");
                }
                parsed.config = Some(PathBuf::from(path));
            }
        }
    }
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        assert_eq!(parse_args(vec![]).unwrap(), Some(Args::default()));
    }

    #[test]
    fn test_flags_and_config() {
        let parsed = parse_args(args(&["--local", "run.toml", "--dry-run"]))
            .unwrap()
            .unwrap();
        assert!(parsed.local && parsed.dry_run);
        assert_eq!(parsed.config, Some(PathBuf::from("run.toml")));
    }

    #[test]
    fn test_help_and_errors() {
        assert_eq!(parse_args(args(&["--help"])).unwrap(), None);
        assert!(parse_args(args(&["--verbose"])).is_err());
        assert!(parse_args(args(&["a.toml", "b.toml"])).is_err());
    }
}
