//! Model driver
//!
//! The orchestrator talks to the LLM through a single `send` contract. The
//! shipped implementation shells out to an agent CLI that emits
//! line-delimited JSON events; the reply is the last completed agent
//! message and the session id is the most recent `thread_id` seen.

use crate::error::{Result, TillerError};
use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Result of one model invocation
#[derive(Debug, Clone)]
pub struct ModelReply {
    /// Extracted agent reply text
    pub reply: String,
    /// Raw combined stdout+stderr of the driver
    pub raw_output: String,
    /// Session id to thread into the next call
    pub session_id: String,
    /// Wall-clock duration of the call
    pub duration_ms: i64,
}

/// Contract between the orchestrator and the model
///
/// `session_id` may be empty on the first call; the driver assigns one and
/// returns it, and the orchestrator threads it back into every subsequent
/// call.
#[async_trait]
pub trait ModelDriver: Send + Sync {
    async fn send(&self, session_id: &str, prompt: &str) -> Result<ModelReply>;
}

/// Subprocess driver for an agent CLI
pub struct CliDriver {
    binary: String,
    timeout: Duration,
}

impl CliDriver {
    /// Driver for the default `codex` binary with a 60 second deadline
    pub fn new() -> Self {
        Self::with_binary("codex")
    }

    /// Driver for a specific binary on `PATH`
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Override the per-call deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for CliDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelDriver for CliDriver {
    async fn send(&self, session_id: &str, prompt: &str) -> Result<ModelReply> {
        let mut args: Vec<&str> = vec!["exec", "--json", "--skip-git-repo-check"];
        if !session_id.is_empty() {
            args.push("resume");
            args.push(session_id);
        }
        args.push(prompt);

        let mut cmd = Command::new(&self.binary);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(binary = %self.binary, session = %session_id, "invoking model driver");

        let start = Instant::now();
        let child = cmd.spawn().map_err(|e| {
            TillerError::Model(format!("failed to spawn {}: {}", self.binary, e))
        })?;
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result
                .map_err(|e| TillerError::Model(format!("failed waiting for driver: {}", e)))?,
            Err(_) => {
                return Err(TillerError::Model(format!(
                    "driver timed out after {}s",
                    self.timeout.as_secs()
                ))
                .into());
            }
        };
        let duration_ms = start.elapsed().as_millis() as i64;

        let mut raw = String::from_utf8_lossy(&output.stdout).to_string();
        raw.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(TillerError::Model(format!(
                "driver exited with {}, output: {}",
                output.status, raw
            ))
            .into());
        }

        let (thread_id, reply) = parse_stream(&raw)?;
        let new_session = if thread_id.is_empty() {
            session_id.to_string()
        } else {
            thread_id
        };
        if new_session.is_empty() {
            return Err(TillerError::Model("missing session id in driver output".to_string()).into());
        }

        Ok(ModelReply {
            reply,
            raw_output: raw,
            session_id: new_session,
            duration_ms,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct StreamEvent {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    thread_id: String,
    #[serde(default)]
    item: StreamItem,
}

#[derive(Debug, Default, Deserialize)]
struct StreamItem {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Extract `(thread_id, reply)` from line-delimited JSON driver output.
///
/// Lines that are not valid JSON are skipped. The reply is the text of the
/// last `item.completed` event carrying an `agent_message`; a run with no
/// agent message is a hard error.
fn parse_stream(raw: &str) -> Result<(String, String)> {
    let mut thread_id = String::new();
    let mut reply = String::new();
    for line in raw.lines() {
        let Ok(event) = serde_json::from_str::<StreamEvent>(line) else {
            continue;
        };
        if !event.thread_id.is_empty() {
            thread_id = event.thread_id;
        }
        if event.kind == "item.completed"
            && event.item.kind == "agent_message"
            && !event.item.text.is_empty()
        {
            reply = event.item.text;
        }
    }
    if reply.is_empty() {
        return Err(TillerError::Model("no agent reply found in driver output".to_string()).into());
    }
    Ok((thread_id, reply))
}
