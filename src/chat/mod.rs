//! Interactive chat loop and single-shot message handling.

use anyhow::{bail, Context, Result};
use console::style;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::config::Config;
use crate::dispatch::{DefaultDispatcher, Dispatcher};
use crate::knowledge::KnowledgeBase;
use crate::routing::Category;
use crate::sessions::{InMemorySessionStore, Role, SessionStore};
use crate::store::{create_store, SqliteStore, Store};
use crate::threads::ThreadAllocator;

/// CLI-facing options for one chat invocation.
#[derive(Debug, Default)]
pub struct ChatOptions {
    /// Single message mode (don't enter interactive mode).
    pub message: Option<String>,
    /// Explicit category hint, bypassing classification.
    pub category: Option<String>,
    /// Session id; a fresh one is generated when absent.
    pub session: Option<String>,
    /// Log in as this account and save the transcript on exit.
    pub user: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
}

/// Load knowledge tables: the configured override file, the workspace
/// `knowledge.toml` if present, or the builtin tables.
pub async fn load_knowledge(config: &Config) -> Result<KnowledgeBase> {
    let path = match &config.knowledge_file {
        Some(file) => {
            let p = std::path::PathBuf::from(file);
            if p.is_relative() {
                config.workspace_dir.join(p)
            } else {
                p
            }
        }
        None => config.workspace_dir.join("knowledge.toml"),
    };

    if path.exists() {
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read knowledge file: {}", path.display()))?;
        tracing::info!(path = %path.display(), "Knowledge tables loaded");
        KnowledgeBase::from_toml_str(&content)
    } else {
        Ok(KnowledgeBase::builtin())
    }
}

/// Run a chat session against the configured router.
pub async fn run(mut config: Config, options: ChatOptions) -> Result<()> {
    if let Some(provider) = &options.provider {
        config.default_provider = Some(provider.clone());
    }
    if let Some(model) = &options.model {
        config.default_model = Some(model.clone());
    }
    if let Some(temperature) = options.temperature {
        config.default_temperature = temperature;
    }

    let hint = match &options.category {
        Some(raw) => match Category::parse(raw) {
            Some(category) => Some(category),
            None => bail!(
                "Unknown category: {raw}. Expected payment, order, faq, faq_specific, general, or search."
            ),
        },
        None => None,
    };

    let knowledge = load_knowledge(&config).await?;
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let dispatcher = DefaultDispatcher::from_config(&config, knowledge, Arc::clone(&sessions))?;
    let store = create_store(&config.workspace_dir)?;

    let account = match &options.user {
        Some(username) => Some(login(&store, username).await?),
        None => None,
    };

    let session_id = options
        .session
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    match &options.message {
        Some(message) => {
            answer_one(&dispatcher, &store, &session_id, message, hint).await?;
        }
        None => {
            interactive_loop(&dispatcher, &store, &session_id, hint).await?;
        }
    }

    if let Some(account) = account {
        save_transcript(&store, &sessions, account, &session_id).await?;
    }
    Ok(())
}

async fn login(store: &Arc<SqliteStore>, username: &str) -> Result<i64> {
    let secret = dialoguer::Password::new()
        .with_prompt(format!("Secret for {username}"))
        .interact()
        .context("Failed to read secret")?;
    match store.authenticate(username, &secret).await? {
        Some(account) => {
            println!("{}", style("Login successful!").green());
            Ok(account)
        }
        None => bail!("Invalid credentials"),
    }
}

async fn answer_one(
    dispatcher: &DefaultDispatcher,
    store: &Arc<SqliteStore>,
    session_id: &str,
    message: &str,
    hint: Option<Category>,
) -> Result<()> {
    let outcome = dispatcher.dispatch(session_id, message, hint).await?;
    let thread_id = store
        .allocate(session_id, outcome.category.as_str())
        .await?;

    println!("{}", outcome.reply);
    println!(
        "{}",
        style(format!(
            "Handled by: {} (thread {thread_id})",
            outcome.category.label()
        ))
        .dim()
    );
    Ok(())
}

async fn interactive_loop(
    dispatcher: &DefaultDispatcher,
    store: &Arc<SqliteStore>,
    session_id: &str,
    hint: Option<Category>,
) -> Result<()> {
    println!(
        "{} Type a message, or {} to leave.",
        style("deskbot ready.").cyan().bold(),
        style("/quit").yellow()
    );

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"you> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/quit" || input == "/exit" {
            break;
        }

        let outcome = dispatcher.dispatch(session_id, input, hint).await?;
        let thread_id = store
            .allocate(session_id, outcome.category.as_str())
            .await?;

        println!("{} {}", style("deskbot>").cyan(), outcome.reply);
        println!(
            "{}",
            style(format!(
                "  handled by {} (thread {thread_id})",
                outcome.category.label()
            ))
            .dim()
        );
    }
    Ok(())
}

async fn save_transcript(
    store: &Arc<SqliteStore>,
    sessions: &Arc<dyn SessionStore>,
    account: i64,
    session_id: &str,
) -> Result<()> {
    let turns = sessions.turns(session_id, None).await?;
    if turns.is_empty() {
        return Ok(());
    }
    let title = format!("Chat {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"));
    let chat_id = store.persist_transcript(account, &title, &turns).await?;
    println!(
        "{}",
        style(format!("Chat saved! ({title}, id {chat_id})")).green()
    );
    Ok(())
}

/// Render one stored turn for transcript replay.
pub fn format_turn(role: Role, category: Category, content: &str) -> String {
    let speaker = match role {
        Role::User => "you",
        Role::Assistant => "deskbot",
    };
    format!("[{}] {speaker}: {content}", category.as_str())
}
