//! Shell executor
//!
//! Runs operator-approved command lines and captures their combined output.
//! Approval gating happens upstream in the orchestrator; sandboxing policy
//! is outside this component.

use crate::error::{Result, TillerError};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Captured result of one command execution
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Combined stdout and stderr
    pub output: String,
    /// Process exit code; `None` when terminated by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Human-readable exit description for reasons and event notes
    pub fn exit_description(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Contract for executing an approved command line
#[async_trait]
pub trait ShellExecutor: Send + Sync {
    /// Run the command to completion.
    ///
    /// A non-zero exit is an `Ok` outcome carrying the code; `Err` is
    /// reserved for spawn failures and deadline expiry.
    async fn run(&self, command: &str) -> Result<CommandOutput>;
}

/// Executes commands through the system shell with a deadline
pub struct SystemShell {
    timeout: Duration,
}

impl SystemShell {
    /// Shell with the default 60 second deadline
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemShell {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShellExecutor for SystemShell {
    async fn run(&self, command: &str) -> Result<CommandOutput> {
        let mut cmd = if cfg!(unix) {
            let mut c = Command::new("sh");
            c.arg("-c").arg(command);
            c
        } else {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(command);
            c
        };
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(%command, "executing approved command");

        let child = cmd
            .spawn()
            .map_err(|e| TillerError::Shell(format!("failed to spawn command: {}", e)))?;
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result
                .map_err(|e| TillerError::Shell(format!("failed waiting for command: {}", e)))?,
            Err(_) => {
                return Err(TillerError::Shell(format!(
                    "command timed out after {}s",
                    self.timeout.as_secs()
                ))
                .into());
            }
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(CommandOutput {
            output: combined,
            exit_code: output.status.code(),
        })
    }
}
