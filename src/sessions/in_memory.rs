//! In-memory session store implementation.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::traits::{SessionStore, Turn};

/// An in-memory session store backed by a mutex-protected hash map.
pub struct InMemorySessionStore {
    logs: Mutex<HashMap<String, Vec<Turn>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            logs: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn append(&self, session_id: &str, turn: Turn) -> Result<()> {
        let mut logs = self.logs.lock();
        logs.entry(session_id.to_string()).or_default().push(turn);
        Ok(())
    }

    async fn turns(&self, session_id: &str, limit: Option<usize>) -> Result<Vec<Turn>> {
        let logs = self.logs.lock();
        let entries = match logs.get(session_id) {
            Some(entries) => entries.clone(),
            None => return Ok(Vec::new()),
        };

        match limit {
            Some(n) => {
                let start = entries.len().saturating_sub(n);
                Ok(entries[start..].to_vec())
            }
            None => Ok(entries),
        }
    }

    async fn clear(&self, session_id: &str) -> Result<()> {
        let mut logs = self.logs.lock();
        logs.remove(session_id);
        Ok(())
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Category;

    #[tokio::test]
    async fn append_and_retrieve_preserves_order() {
        let store = InMemorySessionStore::new();

        for i in 0..5 {
            store
                .append("s1", Turn::user(format!("message {i}"), Category::FaqGeneral))
                .await
                .unwrap();
        }

        let all = store.turns("s1", None).await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].content, "message 0");
        assert_eq!(all[4].content, "message 4");
    }

    #[tokio::test]
    async fn limit_returns_most_recent_turns() {
        let store = InMemorySessionStore::new();
        for i in 0..5 {
            store
                .append("s1", Turn::user(format!("message {i}"), Category::General))
                .await
                .unwrap();
        }

        let last_two = store.turns("s1", Some(2)).await.unwrap();
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].content, "message 3");
        assert_eq!(last_two[1].content, "message 4");
    }

    #[tokio::test]
    async fn unknown_session_yields_empty_log() {
        let store = InMemorySessionStore::new();
        assert!(store.turns("nope", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = InMemorySessionStore::new();
        store
            .append("s1", Turn::user("one", Category::Payment))
            .await
            .unwrap();
        store
            .append("s2", Turn::user("two", Category::Order))
            .await
            .unwrap();

        assert_eq!(store.turns("s1", None).await.unwrap().len(), 1);
        assert_eq!(store.turns("s2", None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clear_removes_log() {
        let store = InMemorySessionStore::new();
        store
            .append("s1", Turn::user("hello", Category::FaqGeneral))
            .await
            .unwrap();
        store.clear("s1").await.unwrap();
        assert!(store.turns("s1", None).await.unwrap().is_empty());
    }
}
