use std::process::Command;

use log::{debug, info};

use crate::error::{ServingError, ServingResult};

/// Captured result of one external command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        CommandOutput {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }

    /// Turn a non-zero exit into `CommandFailed`.
    pub fn check(self, program: &str) -> ServingResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ServingError::CommandFailed {
                program: program.to_string(),
                status: self.status,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs external programs. The deployer and remote predictor only talk to
/// the outside world through this.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> ServingResult<CommandOutput>;
}

/// Blocking `std::process::Command` runner.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> ServingResult<CommandOutput> {
        debug!("running {} {}", program, args.join(" "));
        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Logs each command line and reports success without running anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run(&self, program: &str, args: &[String]) -> ServingResult<CommandOutput> {
        info!("[dry-run] {} {}", program, args.join(" "));
        Ok(CommandOutput::success(""))
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[String]) -> ServingResult<CommandOutput> {
        (**self).run(program, args)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    /// Records every call and replays queued outputs (success by default).
    #[derive(Default)]
    pub struct RecordingRunner {
        pub calls: RefCell<Vec<(String, Vec<String>)>>,
        pub replies: RefCell<VecDeque<CommandOutput>>,
    }

    impl RecordingRunner {
        pub fn replying(replies: Vec<CommandOutput>) -> Self {
            RecordingRunner {
                calls: RefCell::new(Vec::new()),
                replies: RefCell::new(replies.into()),
            }
        }

        pub fn command_lines(&self) -> Vec<String> {
            self.calls
                .borrow()
                .iter()
                .map(|(p, a)| format!("{} {}", p, a.join(" ")))
                .collect()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, program: &str, args: &[String]) -> ServingResult<CommandOutput> {
            self.calls
                .borrow_mut()
                .push((program.to_string(), args.to_vec()));
            Ok(self
                .replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| CommandOutput::success("")))
        }
    }
}
