//! Persistent store: accounts, saved transcripts, and the session↔thread
//! table.

pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteStore;
pub use traits::{ChatSummary, Registration, Store};

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Factory: open the store under the workspace directory.
///
/// Returns the concrete type so callers can use it both as a [`Store`] and
/// as a [`crate::threads::ThreadAllocator`].
pub fn create_store(workspace_dir: &Path) -> Result<Arc<SqliteStore>> {
    Ok(Arc::new(SqliteStore::new(workspace_dir)?))
}

// ── CLI handlers ──

fn prompt_secret(prompt: String, confirm: bool) -> Result<String> {
    use anyhow::Context;

    let mut password = dialoguer::Password::new().with_prompt(prompt);
    if confirm {
        password = password.with_confirmation("Confirm secret", "Secrets do not match");
    }
    password.interact().context("Failed to read secret")
}

/// Handle `deskbot account <subcommand>` CLI commands.
pub async fn handle_account_command(
    command: crate::AccountCommands,
    config: &crate::config::Config,
) -> Result<()> {
    let store = create_store(&config.workspace_dir)?;
    match command {
        crate::AccountCommands::Register { username } => {
            let secret = prompt_secret(format!("Secret for {username}"), true)?;
            match store.register_account(&username, &secret).await? {
                Registration::Created(_) => {
                    println!("Registration successful! Please log in.");
                }
                Registration::Duplicate => {
                    eprintln!("Username already exists");
                }
            }
        }
        crate::AccountCommands::Login { username } => {
            let secret = prompt_secret(format!("Secret for {username}"), false)?;
            match store.authenticate(&username, &secret).await? {
                Some(account) => println!("Login successful! (account {account})"),
                None => eprintln!("Invalid credentials"),
            }
        }
    }
    Ok(())
}

/// Handle `deskbot transcript <subcommand>` CLI commands.
pub async fn handle_transcript_command(
    command: crate::TranscriptCommands,
    config: &crate::config::Config,
) -> Result<()> {
    let store = create_store(&config.workspace_dir)?;
    match command {
        crate::TranscriptCommands::List { username } => {
            let secret = prompt_secret(format!("Secret for {username}"), false)?;
            let Some(account) = store.authenticate(&username, &secret).await? else {
                eprintln!("Invalid credentials");
                return Ok(());
            };
            let chats = store.load_transcripts(account).await?;
            if chats.is_empty() {
                println!("No saved chats.");
                return Ok(());
            }
            for chat in &chats {
                println!(
                    "{:>6}  {}  {}",
                    chat.id,
                    chat.created_at.format("%Y-%m-%d %H:%M:%S"),
                    chat.title
                );
            }
        }
        crate::TranscriptCommands::Show { chat_id } => {
            let turns = store.load_transcript(chat_id).await?;
            for turn in &turns {
                println!(
                    "{}",
                    crate::chat::format_turn(turn.role, turn.category, &turn.content)
                );
            }
        }
    }
    Ok(())
}
