//! Persistent store traits for accounts and saved transcripts.

use crate::sessions::Turn;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of an account registration attempt. A taken username is a
/// defined outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created(i64),
    Duplicate,
}

/// A saved chat's listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSummary {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Persistent storage for accounts and chat transcripts.
///
/// Transcripts are stored as structured JSON turn lists and deserialized
/// structurally on load; stored text is never interpreted as anything but
/// data.
#[async_trait]
pub trait Store: Send + Sync {
    /// Create an account. Taken usernames yield [`Registration::Duplicate`].
    async fn register_account(&self, username: &str, secret: &str) -> Result<Registration>;

    /// Check credentials; `None` means invalid. Unknown user and wrong
    /// secret are deliberately indistinguishable.
    async fn authenticate(&self, username: &str, secret: &str) -> Result<Option<i64>>;

    /// Save a transcript under a title; returns the chat id.
    async fn persist_transcript(&self, account: i64, title: &str, turns: &[Turn]) -> Result<i64>;

    /// List an account's saved chats, newest first.
    async fn load_transcripts(&self, account: i64) -> Result<Vec<ChatSummary>>;

    /// Load one saved chat's turns in their original order.
    async fn load_transcript(&self, chat_id: i64) -> Result<Vec<Turn>>;

    /// The name of this store implementation.
    fn name(&self) -> &str;
}
