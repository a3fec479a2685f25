//! Per-session conversation log
//!
//! Completed exchanges are retained keyed by an opaque session identifier.
//! Append-order preservation is the only invariant. The store is a trait so
//! the web boundary receives it as an explicit dependency rather than
//! reaching for process-global state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// One completed exchange in a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub user_input: String,
    pub agent_response: String,
    pub route_history: Vec<String>,
    pub timestamp: String,
}

/// Conversation history keyed by session identifier
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append an exchange to a session, creating the session if needed
    async fn append(&self, session_id: &str, entry: ConversationEntry);

    /// A session's exchanges in append order; empty for unknown sessions
    async fn history(&self, session_id: &str) -> Vec<ConversationEntry>;

    /// Empty a session's log; the session stays registered
    async fn clear(&self, session_id: &str);

    /// Number of sessions ever seen
    async fn session_count(&self) -> usize;

    /// Number of retained exchanges across all sessions
    async fn message_count(&self) -> usize;
}

/// In-memory store, owned by the server process for its lifetime
#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    sessions: RwLock<HashMap<String, Vec<ConversationEntry>>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn append(&self, session_id: &str, entry: ConversationEntry) {
        let mut sessions = self.sessions.write().await;
        sessions.entry(session_id.to_string()).or_default().push(entry);
    }

    async fn history(&self, session_id: &str) -> Vec<ConversationEntry> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned().unwrap_or_default()
    }

    async fn clear(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(entries) = sessions.get_mut(session_id) {
            entries.clear();
        }
    }

    async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn message_count(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .map(|entries| entries.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str) -> ConversationEntry {
        ConversationEntry {
            user_input: text.to_string(),
            agent_response: format!("re: {text}"),
            route_history: vec!["router -> fallback".to_string()],
            timestamp: "2024-05-01T12:34:56Z".to_string(),
        }
    }

    #[tokio::test]
    async fn test_append_preserves_order() {
        let store = MemoryConversationStore::new();

        store.append("s1", entry("first")).await;
        store.append("s1", entry("second")).await;

        let history = store.history("s1").await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].user_input, "first");
        assert_eq!(history[1].user_input, "second");
    }

    #[tokio::test]
    async fn test_unknown_session_has_empty_history() {
        let store = MemoryConversationStore::new();
        assert!(store.history("nope").await.is_empty());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = MemoryConversationStore::new();

        store.append("s1", entry("one")).await;
        store.append("s2", entry("two")).await;

        assert_eq!(store.history("s1").await.len(), 1);
        assert_eq!(store.history("s2").await.len(), 1);
        assert_eq!(store.session_count().await, 2);
        assert_eq!(store.message_count().await, 2);
    }

    #[tokio::test]
    async fn test_clear_empties_but_keeps_session() {
        let store = MemoryConversationStore::new();

        store.append("s1", entry("one")).await;
        store.clear("s1").await;

        assert!(store.history("s1").await.is_empty());
        assert_eq!(store.session_count().await, 1);
        assert_eq!(store.message_count().await, 0);
    }

    #[tokio::test]
    async fn test_clear_unknown_session_is_a_noop() {
        let store = MemoryConversationStore::new();
        store.clear("nope").await;
        assert_eq!(store.session_count().await, 0);
    }
}
