//! tiller - agent orchestration server library
//!
//! This library drives an external LLM CLI through a disciplined
//! plan → approve → execute → verify → replan loop, with human approval
//! gates on plans and shell commands and a live observability event
//! stream.
//!
//! # Architecture
//!
//! - `service`: the conversation state machine and supervisory loop
//! - `parser`: plan and directive extraction from model replies
//! - `model`: model driver contract and the CLI subprocess implementation
//! - `shell`: approved-command execution
//! - `store`: concurrency-safe conversation repository
//! - `obs`: observability event broker with bounded fan-out
//! - `prompts`: named prompt templates
//! - `server`: JSON API and SSE routers
//! - `config`: flags and environment configuration
//! - `error`: error types and result alias

pub mod config;
pub mod error;
pub mod model;
pub mod obs;
pub mod parser;
pub mod prompts;
pub mod server;
pub mod service;
pub mod shell;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, TillerError};
pub use model::{CliDriver, ModelDriver, ModelReply};
pub use obs::{Broker, Event, EventKind};
pub use parser::{parse_plan, Directive};
pub use prompts::PromptSet;
pub use service::Service;
pub use shell::{ShellExecutor, SystemShell};
pub use store::{ConversationStore, MemoryStore};
pub use types::{Conversation, ConversationState, InboxItem, ModelCall, Step, StepStatus};
