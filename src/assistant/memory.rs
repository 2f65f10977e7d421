//! Per-session conversation memory
//!
//! Process-wide accumulator of the ordered turns of each chat session,
//! injected into the orchestrator rather than held as module state. Lifetime
//! is the process lifetime: memory starts empty after a restart and can
//! therefore lag behind the persisted message log (known gap, also present
//! across multi-process deployments).

use crate::chat::MessageRole;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One conversational turn
#[derive(Debug, Clone)]
pub struct Turn {
    /// Who produced the turn
    pub role: MessageRole,
    /// Turn text
    pub content: String,
}

/// Session-keyed conversation memory store
///
/// Cloneable handle over shared state; get-or-create semantics on append.
/// Concurrent turns on the same session are not mutually excluded and may
/// interleave.
#[derive(Debug, Clone, Default)]
pub struct SessionMemory {
    sessions: Arc<RwLock<HashMap<String, Vec<Turn>>>>,
}

impl SessionMemory {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn to a session, creating its entry if needed
    pub async fn append(&self, session_id: &str, role: MessageRole, content: &str) {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_default()
            .push(Turn {
                role,
                content: content.to_string(),
            });
    }

    /// Snapshot of a session's turns in order (empty if never written)
    pub async fn history(&self, session_id: &str) -> Vec<Turn> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned().unwrap_or_default()
    }

    /// Drop a session's memory entry
    pub async fn forget(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
    }

    /// Number of sessions currently held
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session has memory yet
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_creates_session() {
        let memory = SessionMemory::new();
        assert!(memory.is_empty().await);

        memory.append("s1", MessageRole::User, "hello").await;
        assert_eq!(memory.len().await, 1);

        let history = memory.history("s1").await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "hello");
        assert_eq!(history[0].role, MessageRole::User);
    }

    #[tokio::test]
    async fn test_turn_order_preserved() {
        let memory = SessionMemory::new();
        memory.append("s1", MessageRole::User, "question").await;
        memory.append("s1", MessageRole::Assistant, "answer").await;

        let history = memory.history("s1").await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, MessageRole::User);
        assert_eq!(history[1].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn test_sessions_isolated() {
        let memory = SessionMemory::new();
        memory.append("s1", MessageRole::User, "one").await;
        memory.append("s2", MessageRole::User, "two").await;

        assert_eq!(memory.history("s1").await.len(), 1);
        assert_eq!(memory.history("s2").await.len(), 1);
        assert!(memory.history("s3").await.is_empty());
    }

    #[tokio::test]
    async fn test_forget() {
        let memory = SessionMemory::new();
        memory.append("s1", MessageRole::User, "hello").await;
        memory.forget("s1").await;
        assert!(memory.history("s1").await.is_empty());
    }
}
