//! External program invocation
//!
//! Each call spawns a fresh process with piped stdout/stderr. The child is
//! killed if the future driving it is dropped or the optional timeout fires.

use std::ffi::OsStr;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use kitadoc_common::config::ToolConfig;
use kitadoc_common::time::secs_to_duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ToolError {
    /// Program could not be started (not installed, not executable)
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the child failed
    #[error("I/O error talking to {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

/// Captured result of a finished process
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run to completion; `extra_args` follow the configured arguments
    ///
    /// When `input` is given it is written to stdin, which is then closed.
    pub async fn run<I, S>(&self, extra_args: I, input: Option<Vec<u8>>) -> Result<ToolOutput, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .args(extra_args)
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(program = %self.program, args = ?self.args, "Spawning tool");
        let mut child = command.spawn().map_err(|source| ToolError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        // Feed stdin concurrently so a chatty child cannot block on a full stdout pipe
        let writer = match (input, child.stdin.take()) {
            (Some(bytes), Some(mut stdin)) => Some(tokio::spawn(async move {
                stdin.write_all(&bytes).await?;
                stdin.shutdown().await
            })),
            _ => None,
        };

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| ToolError::TimedOut {
                    program: self.program.clone(),
                    timeout: limit,
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|source| self.io_error(source))?;

        // A child may exit without draining stdin; its exit status decides the outcome
        if let Some(writer) = writer {
            match writer.await {
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!(program = %self.program, "Tool closed stdin early");
                }
                Ok(result) => result.map_err(|source| self.io_error(source))?,
                Err(e) => {
                    return Err(self.io_error(std::io::Error::new(std::io::ErrorKind::Other, e)));
                }
            }
        }

        let output = ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(
            program = %self.program,
            status = %output.status,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "Tool exited"
        );
        Ok(output)
    }

    fn io_error(&self, source: std::io::Error) -> ToolError {
        ToolError::Io {
            program: self.program.clone(),
            source,
        }
    }
}

impl From<&ToolConfig> for ToolCommand {
    fn from(config: &ToolConfig) -> Self {
        ToolCommand::new(config.program.clone(), config.args.clone())
            .with_timeout(config.timeout_secs.map(secs_to_duration))
    }
}
