//! External CLI invocation
//!
//! All backend interaction goes through the [`CommandRunner`] trait so that
//! discovery, log fetching and exec can be driven by scripted output in tests.
//! Invocations block until the child exits; no timeout is applied here.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Errors raised while invoking an external binary
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Empty command line")]
    EmptyCommand,

    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with status {code}: {stderr}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },
}

/// Captured output of a successful invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Stdout followed by stderr, as an operator would see it in a terminal
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() || self.stdout.ends_with('\n') {
            format!("{}{}", self.stdout, self.stderr)
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Render an argument vector for logs and error messages
pub fn display_command(argv: &[String]) -> String {
    argv.join(" ")
}

/// Runs external commands on behalf of the core
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `argv` (program first) with captured output; non-zero exit is an error
    async fn run(&self, argv: &[String]) -> Result<CommandOutput, ExecError>;

    /// Run `argv` attached to the caller's terminal and return its exit code
    async fn run_interactive(&self, argv: &[String]) -> Result<i32, ExecError>;
}

/// [`CommandRunner`] backed by real child processes
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, argv: &[String]) -> Result<CommandOutput, ExecError> {
        let (program, args) = argv.split_first().ok_or(ExecError::EmptyCommand)?;
        let command = display_command(argv);
        tracing::debug!("Executing: {}", command);

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ExecError::Spawn {
                command: command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            tracing::warn!("`{}` exited with status {}", command, code);
            return Err(ExecError::NonZeroExit {
                command,
                code,
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }

    async fn run_interactive(&self, argv: &[String]) -> Result<i32, ExecError> {
        let (program, args) = argv.split_first().ok_or(ExecError::EmptyCommand)?;
        let command = display_command(argv);
        tracing::debug!("Executing interactively: {}", command);

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| ExecError::Spawn { command, source })?;

        Ok(status.code().unwrap_or(-1))
    }
}
