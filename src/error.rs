//! Error types for tiller
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for tiller operations
///
/// This enum encompasses all possible errors that can occur while driving
/// a conversation: request validation, store lookups, state-machine
/// preconditions, model-driver calls, shell execution, and template
/// rendering.
#[derive(Error, Debug)]
pub enum TillerError {
    /// Request validation errors (empty prompt, missing id, unknown step)
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown conversation session
    #[error("conversation {0} not found")]
    NotFound(String),

    /// Operation not valid in the conversation's current state
    #[error("conversation state error: {0}")]
    State(String),

    /// Model driver errors (subprocess failure, unparseable output, timeout)
    #[error("model error: {0}")]
    Model(String),

    /// Shell execution errors (spawn failure, timeout)
    #[error("shell error: {0}")]
    Shell(String),

    /// Prompt template errors (missing file at load, render failure)
    #[error("prompt template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Conversation store errors
    #[error("storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for tiller operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
