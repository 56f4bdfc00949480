//! Conversation store
//!
//! An abstract key/value repository of conversation records keyed by
//! session id. The only implementation is in-memory; the contract is that a
//! value returned by `get` shares no mutable substructure with the stored
//! record, so callers can mutate freely and persist with an explicit save.

use crate::error::{Result, TillerError};
use crate::types::Conversation;
use std::collections::HashMap;
use std::sync::RwLock;

/// Repository contract for conversation records
///
/// Implementations must be safe for concurrent readers and writers.
pub trait ConversationStore: Send + Sync {
    /// Persist a snapshot of the conversation; rejects an empty session id
    fn save(&self, conv: &Conversation) -> Result<()>;

    /// Fetch a deep copy of the conversation
    ///
    /// # Errors
    ///
    /// Returns `TillerError::NotFound` for an unknown session id.
    fn get(&self, session_id: &str) -> Result<Conversation>;

    /// All stored session ids, in unspecified order
    fn list_ids(&self) -> Result<Vec<String>>;

    /// Remove a conversation; removing an unknown id is not an error
    fn delete(&self, session_id: &str) -> Result<()>;
}

/// Thread-safe in-memory store
///
/// Saves and reads both clone the record, so mutations on either side of
/// the boundary never alias stored state.
#[derive(Default)]
pub struct MemoryStore {
    convs: RwLock<HashMap<String, Conversation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for MemoryStore {
    fn save(&self, conv: &Conversation) -> Result<()> {
        if conv.session_id.is_empty() {
            return Err(TillerError::Validation(
                "conversation missing session id".to_string(),
            )
            .into());
        }
        let mut convs = self.convs.write().unwrap();
        convs.insert(conv.session_id.clone(), conv.clone());
        Ok(())
    }

    fn get(&self, session_id: &str) -> Result<Conversation> {
        let convs = self.convs.read().unwrap();
        convs
            .get(session_id)
            .cloned()
            .ok_or_else(|| TillerError::NotFound(session_id.to_string()).into())
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        let convs = self.convs.read().unwrap();
        Ok(convs.keys().cloned().collect())
    }

    fn delete(&self, session_id: &str) -> Result<()> {
        let mut convs = self.convs.write().unwrap();
        convs.remove(session_id);
        Ok(())
    }
}
