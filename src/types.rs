//! Core data model for tiller conversations
//!
//! A [`Conversation`] is the root record for one orchestrated session: the
//! user prompt, the current plan and its steps, the append-only ledgers of
//! model calls and artifacts, and the state-machine position. All types are
//! plain values (no back-references); children are addressed by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a conversation
///
/// `Unset` (serialized as `""`) is the state of a chat-only conversation
/// created by the free-chat send path; it never enters the execution loop.
/// `Aborted` exists in the wire vocabulary but currently has no producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConversationState {
    #[default]
    #[serde(rename = "")]
    Unset,
    #[serde(rename = "awaiting_plan_approval")]
    AwaitingPlanApproval,
    #[serde(rename = "executing")]
    Executing,
    #[serde(rename = "awaiting_step_approval")]
    AwaitingStepApproval,
    #[serde(rename = "awaiting_command")]
    AwaitingCommand,
    #[serde(rename = "awaiting_info")]
    AwaitingInfo,
    #[serde(rename = "replanning")]
    Replanning,
    #[serde(rename = "verifying")]
    Verifying,
    #[serde(rename = "blocked")]
    Blocked,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "aborted")]
    Aborted,
}

impl ConversationState {
    /// Wire name of the state, as used in JSON and user-facing messages
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::Unset => "",
            ConversationState::AwaitingPlanApproval => "awaiting_plan_approval",
            ConversationState::Executing => "executing",
            ConversationState::AwaitingStepApproval => "awaiting_step_approval",
            ConversationState::AwaitingCommand => "awaiting_command",
            ConversationState::AwaitingInfo => "awaiting_info",
            ConversationState::Replanning => "replanning",
            ConversationState::Verifying => "verifying",
            ConversationState::Blocked => "blocked",
            ConversationState::Completed => "completed",
            ConversationState::Aborted => "aborted",
        }
    }

    /// True for states that `resume` may move back to `executing`
    pub fn is_resumable(&self) -> bool {
        matches!(
            self,
            ConversationState::Blocked
                | ConversationState::AwaitingInfo
                | ConversationState::AwaitingStepApproval
                | ConversationState::AwaitingCommand
                | ConversationState::Replanning
        )
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution status of a single plan step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Done,
    Blocked,
    Failed,
}

/// One atomic line of a plan
///
/// A step is executed by at most one model call plus at most one shell
/// command. While a step waits behind a gate, exactly one of
/// `pending_command`, `pending_info`, `pending_dependency` is non-empty.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Step {
    /// `step-<n>`, 1-based insertion order within the current plan version
    pub id: String,
    /// Verbatim text of the plan line
    pub title: String,
    pub status: StepStatus,
    /// Reserved: parks the step in `awaiting_step_approval` before first
    /// execution. No input grammar currently sets it.
    #[serde(default)]
    pub requires_approval: bool,
    /// Shell command awaiting operator approval
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pending_command: String,
    /// Missing information the operator must supply
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pending_info: String,
    /// Dependency that must be installed or prepared
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pending_dependency: String,
    /// Audit trail: model replies, `EXEC: <cmd>` markers, command outputs
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Step {
    /// New pending step at 1-based position `n` with the given title
    pub fn new(n: usize, title: impl Into<String>) -> Self {
        Self {
            id: format!("step-{}", n),
            title: title.into(),
            status: StepStatus::Pending,
            requires_approval: false,
            logs: Vec::new(),
            ..Default::default()
        }
    }

    /// True when any gate field is set
    pub fn has_pending(&self) -> bool {
        !self.pending_command.is_empty()
            || !self.pending_info.is_empty()
            || !self.pending_dependency.is_empty()
    }
}

/// A single chat turn (free-chat path only)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// `user` or `assistant`
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Record of one model invocation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelCall {
    /// Full prompt sent to the driver
    pub prompt: String,
    /// Raw driver output before reply extraction
    pub raw_output: String,
    /// Extracted agent reply
    pub reply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub duration_ms: i64,
    /// Session id returned by the driver for this call
    pub session_id: String,
}

/// A captured side-output, currently one per shell command execution
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Artifact {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    /// The command line that produced the content
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// The root record for one orchestrated session
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Conversation {
    /// Opaque id assigned by the model driver on first reply
    pub session_id: String,
    /// Original user prompt, trimmed
    pub prompt: String,
    pub state: ConversationState,
    /// Starts at 1, incremented on each replan
    pub plan_version: u32,
    /// Raw plan reply from the most recent planning call
    pub plan_text: String,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    /// What the conversation is waiting for; empty while executing
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub awaiting_reason: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Chat turns; populated only by the free-chat send path
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Append-only ledger of every model invocation
    #[serde(default)]
    pub model_calls: Vec<ModelCall>,
    /// Append-only ledger of command outputs
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub completed_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// One conversation requiring operator attention
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InboxItem {
    pub session_id: String,
    pub state: ConversationState,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub awaiting_reason: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub step_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub step_title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pending_command: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pending_info: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pending_dependency: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub completed_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}
