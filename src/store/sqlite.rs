//! SQLite-backed store implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::Connection;
use sha2::{Digest, Sha256};
use std::path::Path;

use super::traits::{ChatSummary, Registration, Store};
use crate::sessions::Turn;
use crate::threads::ThreadAllocator;

const DB_FILE: &str = "deskbot.db";

/// Store backed by a single SQLite database file. All access goes through
/// one mutex-protected connection, which also serializes thread-id
/// allocation.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database under the workspace directory.
    pub fn new(workspace_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(workspace_dir).with_context(|| {
            format!(
                "Failed to create workspace directory: {}",
                workspace_dir.display()
            )
        })?;
        let path = workspace_dir.join(DB_FILE);
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 username TEXT NOT NULL UNIQUE,
                 secret_digest TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS chats (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 user_id INTEGER NOT NULL,
                 title TEXT NOT NULL,
                 turns TEXT NOT NULL,
                 created_at TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS session_thread (
                 session_id TEXT NOT NULL,
                 route TEXT NOT NULL,
                 thread_id INTEGER NOT NULL,
                 PRIMARY KEY (session_id, route)
             );",
        )
        .context("Failed to initialize database schema")?;
        Ok(())
    }
}

/// Hex SHA-256 of a credential. Secrets are never stored in clear.
fn credential_digest(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

#[async_trait]
impl Store for SqliteStore {
    async fn register_account(&self, username: &str, secret: &str) -> Result<Registration> {
        let conn = self.conn.lock();
        let inserted = conn.execute(
            "INSERT INTO users (username, secret_digest) VALUES (?1, ?2)",
            (username, credential_digest(secret)),
        );

        match inserted {
            Ok(_) => Ok(Registration::Created(conn.last_insert_rowid())),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Ok(Registration::Duplicate)
            }
            Err(e) => Err(e).context("Failed to register account"),
        }
    }

    async fn authenticate(&self, username: &str, secret: &str) -> Result<Option<i64>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id FROM users WHERE username = ?1 AND secret_digest = ?2",
        )?;
        let id = stmt
            .query_row((username, credential_digest(secret)), |row| row.get(0))
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })
            .context("Failed to authenticate")?;
        Ok(id)
    }

    async fn persist_transcript(&self, account: i64, title: &str, turns: &[Turn]) -> Result<i64> {
        let payload = serde_json::to_string(turns).context("Failed to serialize transcript")?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO chats (user_id, title, turns, created_at) VALUES (?1, ?2, ?3, ?4)",
            (account, title, payload, Utc::now().to_rfc3339()),
        )
        .context("Failed to save transcript")?;
        Ok(conn.last_insert_rowid())
    }

    async fn load_transcripts(&self, account: i64) -> Result<Vec<ChatSummary>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, title, created_at FROM chats
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([account], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (id, title, created_at) = row?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .with_context(|| format!("Invalid timestamp on chat {id}"))?
                .with_timezone(&Utc);
            summaries.push(ChatSummary {
                id,
                title,
                created_at,
            });
        }
        Ok(summaries)
    }

    async fn load_transcript(&self, chat_id: i64) -> Result<Vec<Turn>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT turns FROM chats WHERE id = ?1")?;
        let payload: String = stmt
            .query_row([chat_id], |row| row.get(0))
            .with_context(|| format!("No saved chat with id {chat_id}"))?;

        // Structured deserialization only; a malformed row is an error,
        // never data to re-interpret.
        serde_json::from_str(&payload)
            .with_context(|| format!("Stored transcript {chat_id} is not a valid turn list"))
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

#[async_trait]
impl ThreadAllocator for SqliteStore {
    async fn allocate(&self, session_id: &str, route: &str) -> Result<i64> {
        // The connection lock makes read-max/insert one critical section.
        let conn = self.conn.lock();

        let existing: Option<i64> = conn
            .query_row(
                "SELECT thread_id FROM session_thread WHERE session_id = ?1 AND route = ?2",
                (session_id, route),
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        if let Some(id) = existing {
            return Ok(id);
        }

        let next: i64 = conn.query_row(
            "SELECT COALESCE(MAX(thread_id), 0) + 1 FROM session_thread",
            [],
            |row| row.get(0),
        )?;
        conn.execute(
            "INSERT INTO session_thread (session_id, route, thread_id) VALUES (?1, ?2, ?3)",
            (session_id, route, next),
        )
        .context("Failed to record thread id")?;
        Ok(next)
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Category;
    use tempfile::TempDir;

    fn open(tmp: &TempDir) -> SqliteStore {
        SqliteStore::new(tmp.path()).unwrap()
    }

    #[tokio::test]
    async fn register_then_duplicate() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);

        let first = store.register_account("ada", "s3cret").await.unwrap();
        assert!(matches!(first, Registration::Created(_)));

        let second = store.register_account("ada", "other").await.unwrap();
        assert_eq!(second, Registration::Duplicate);
    }

    #[tokio::test]
    async fn authenticate_accepts_only_matching_secret() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);
        let Registration::Created(id) = store.register_account("ada", "s3cret").await.unwrap()
        else {
            panic!("registration failed");
        };

        assert_eq!(store.authenticate("ada", "s3cret").await.unwrap(), Some(id));
        assert_eq!(store.authenticate("ada", "wrong").await.unwrap(), None);
        assert_eq!(store.authenticate("ghost", "s3cret").await.unwrap(), None);
    }

    #[tokio::test]
    async fn secrets_are_not_stored_in_clear() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);
        store.register_account("ada", "s3cret").await.unwrap();

        let conn = store.conn.lock();
        let digest: String = conn
            .query_row("SELECT secret_digest FROM users WHERE username = 'ada'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_ne!(digest, "s3cret");
        assert_eq!(digest.len(), 64);
    }

    #[tokio::test]
    async fn transcript_round_trip_preserves_order_and_categories() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);
        let Registration::Created(account) =
            store.register_account("ada", "pw").await.unwrap()
        else {
            panic!("registration failed");
        };

        let turns = vec![
            Turn::user("track my order", Category::Order),
            Turn::assistant("here's how", Category::Order),
            Turn::user("thanks!", Category::FaqGeneral),
        ];
        let chat_id = store
            .persist_transcript(account, "Chat 2026-08-06", &turns)
            .await
            .unwrap();

        let loaded = store.load_transcript(chat_id).await.unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].content, "track my order");
        assert_eq!(loaded[0].category, Category::Order);
        assert_eq!(loaded[2].content, "thanks!");
        assert_eq!(loaded[2].category, Category::FaqGeneral);
    }

    #[tokio::test]
    async fn transcripts_list_newest_first() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);
        let Registration::Created(account) =
            store.register_account("ada", "pw").await.unwrap()
        else {
            panic!("registration failed");
        };

        let first = store
            .persist_transcript(account, "first", &[])
            .await
            .unwrap();
        let second = store
            .persist_transcript(account, "second", &[])
            .await
            .unwrap();

        let summaries = store.load_transcripts(account).await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, second);
        assert_eq!(summaries[1].id, first);
    }

    #[tokio::test]
    async fn malformed_stored_transcript_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);
        let Registration::Created(account) =
            store.register_account("ada", "pw").await.unwrap()
        else {
            panic!("registration failed");
        };
        let chat_id = store
            .persist_transcript(account, "chat", &[])
            .await
            .unwrap();

        {
            let conn = store.conn.lock();
            conn.execute(
                "UPDATE chats SET turns = '[{\"role\": \"exec\"}]' WHERE id = ?1",
                [chat_id],
            )
            .unwrap();
        }

        assert!(store.load_transcript(chat_id).await.is_err());
    }

    #[tokio::test]
    async fn allocator_reference_sequence() {
        let tmp = TempDir::new().unwrap();
        let store = open(&tmp);

        assert_eq!(store.allocate("s1", "payment").await.unwrap(), 1);
        assert_eq!(store.allocate("s1", "payment").await.unwrap(), 1);
        assert_eq!(store.allocate("s1", "order").await.unwrap(), 2);
        assert_eq!(store.allocate("s2", "payment").await.unwrap(), 3);
        assert_eq!(store.allocate("s1", "order").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn allocator_ids_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let store = open(&tmp);
            assert_eq!(store.allocate("s1", "payment").await.unwrap(), 1);
            assert_eq!(store.allocate("s1", "order").await.unwrap(), 2);
        }

        let reopened = open(&tmp);
        // Existing pair keeps its id; a new pair continues the counter.
        assert_eq!(reopened.allocate("s1", "order").await.unwrap(), 2);
        assert_eq!(reopened.allocate("s2", "order").await.unwrap(), 3);
    }
}
