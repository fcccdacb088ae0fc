//! Session storage traits and types for conversation turn logs.

use crate::routing::Category;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in a conversation, tagged with the category that handled it.
///
/// Turns are immutable after creation and a session's sequence is
/// append-only; insertion order is the replay/export order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub category: Category,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>, category: Category) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            category,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>, category: Category) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            category,
            timestamp: Utc::now(),
        }
    }
}

/// Storage for per-session conversation turn logs.
///
/// Each session owns its sequence exclusively; implementations only need to
/// serialize appends within a session, not across sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Append one turn to the session's log, creating the session on first
    /// use.
    async fn append(&self, session_id: &str, turn: Turn) -> Result<()>;

    /// Turns for a session in insertion order. With a limit, the most
    /// recent `n` turns. Unknown sessions yield an empty log.
    async fn turns(&self, session_id: &str, limit: Option<usize>) -> Result<Vec<Turn>>;

    /// Drop a session's log entirely.
    async fn clear(&self, session_id: &str) -> Result<()>;

    /// The name of this session store implementation.
    fn name(&self) -> &str;
}
