#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::uninlined_format_args
)]

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use deskbot::chat::{self, ChatOptions};
use deskbot::config::Config;
use deskbot::store;
use deskbot::tabular;
use deskbot::threads::ThreadAllocator;
use deskbot::{AccountCommands, SheetCommands, TranscriptCommands};

fn parse_temperature(s: &str) -> std::result::Result<f64, String> {
    let t: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if !(0.0..=2.0).contains(&t) {
        return Err("temperature must be between 0.0 and 2.0".to_string());
    }
    Ok(t)
}

/// deskbot - deterministic help-desk dialogue router.
#[derive(Parser, Debug)]
#[command(name = "deskbot")]
#[command(version)]
#[command(about = "Keyword intent routing with knowledge-table answers.", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with the router
    #[command(long_about = "\
Chat with the router.

Starts an interactive session against the configured classifier and \
knowledge tables. Use --message for single-shot queries without \
entering interactive mode, and --category to bypass classification.

Examples:
  deskbot chat                                   # interactive session
  deskbot chat -m \"track my order\"               # single message
  deskbot chat -m \"what can you do?\" --category general
  deskbot chat --user ada                        # save transcript on exit")]
    Chat {
        /// Single message mode (don't enter interactive mode)
        #[arg(short, long)]
        message: Option<String>,

        /// Explicit category (payment, order, faq, faq_specific, general, search)
        #[arg(short, long)]
        category: Option<String>,

        /// Session id (defaults to a fresh one)
        #[arg(long)]
        session: Option<String>,

        /// Log in as this account and save the transcript on exit
        #[arg(short, long)]
        user: Option<String>,

        /// Generation provider to use
        #[arg(short, long)]
        provider: Option<String>,

        /// Model to use
        #[arg(long)]
        model: Option<String>,

        /// Temperature (0.0-2.0)
        #[arg(short, long, value_parser = parse_temperature)]
        temperature: Option<f64>,
    },

    /// Manage accounts
    Account {
        #[command(subcommand)]
        account_command: AccountCommands,
    },

    /// List and replay saved transcripts
    Transcript {
        #[command(subcommand)]
        transcript_command: TranscriptCommands,
    },

    /// Look up (allocating if new) the thread id for a session/route pair
    Thread {
        /// Session id
        session_id: String,
        /// Route name (e.g. payment, order)
        route: String,
    },

    /// Post-process tabular files
    Sheet {
        #[command(subcommand)]
        sheet_command: SheetCommands,
    },

    /// Show resolved configuration and workspace paths
    Status,

    /// Configuration helpers
    Config {
        #[command(subcommand)]
        config_command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the JSON schema for config.toml
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(config_dir) = &cli.config_dir {
        if config_dir.trim().is_empty() {
            bail!("--config-dir cannot be empty");
        }
        std::env::set_var("DESKBOT_CONFIG_DIR", config_dir);
    }

    // Initialize logging - respects RUST_LOG env var, defaults to INFO
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = Config::load_or_init().await?;

    match cli.command {
        Commands::Chat {
            message,
            category,
            session,
            user,
            provider,
            model,
            temperature,
        } => {
            chat::run(
                config,
                ChatOptions {
                    message,
                    category,
                    session,
                    user,
                    provider,
                    model,
                    temperature,
                },
            )
            .await
        }

        Commands::Account { account_command } => {
            store::handle_account_command(account_command, &config).await
        }

        Commands::Transcript { transcript_command } => {
            store::handle_transcript_command(transcript_command, &config).await
        }

        Commands::Thread { session_id, route } => {
            let db = store::create_store(&config.workspace_dir)?;
            let thread_id = db.allocate(&session_id, &route).await?;
            println!("{thread_id}");
            Ok(())
        }

        Commands::Sheet { sheet_command } => tabular::handle_sheet_command(sheet_command),

        Commands::Status => {
            println!("deskbot Status");
            println!();
            println!("Version:     {}", env!("CARGO_PKG_VERSION"));
            println!("Workspace:   {}", config.workspace_dir.display());
            println!("Config:      {}", config.config_path.display());
            println!();
            println!(
                "Provider:    {}",
                config.default_provider.as_deref().unwrap_or("openai")
            );
            println!(
                "Model:       {}",
                config.default_model.as_deref().unwrap_or("(default)")
            );
            println!("Temperature: {}", config.default_temperature);
            println!();
            println!("Routing:");
            println!("  Fallback route:    {}", config.routing.fallback);
            println!(
                "  Payment keywords:  {}",
                config.routing.payment_keywords.join(", ")
            );
            println!(
                "  Order keywords:    {}",
                config.routing.order_keywords.join(", ")
            );
            println!(
                "  Search keywords:   {}",
                config.routing.search_keywords.join(", ")
            );
            println!(
                "  FAQ keywords:      {}",
                config.routing.faq_keywords.join(", ")
            );
            println!(
                "  FAQ specific:      {}",
                config.routing.faq_specific_keywords.join(", ")
            );
            println!();
            println!(
                "History window:      {} turns",
                config.session.max_history_messages
            );
            println!(
                "Knowledge file:      {}",
                config.knowledge_file.as_deref().unwrap_or("(builtin)")
            );
            Ok(())
        }

        Commands::Config { config_command } => match config_command {
            ConfigCommands::Schema => {
                let schema = schemars::schema_for!(Config);
                println!(
                    "{}",
                    serde_json::to_string_pretty(&schema).expect("failed to serialize JSON Schema")
                );
                Ok(())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_has_no_flag_conflicts() {
        Cli::command().debug_assert();
    }

    #[test]
    fn chat_single_message_parses() {
        let cli = Cli::try_parse_from(["deskbot", "chat", "-m", "track my order"]).unwrap();
        match cli.command {
            Commands::Chat { message, .. } => {
                assert_eq!(message.as_deref(), Some("track my order"));
            }
            other => panic!("expected chat command, got {other:?}"),
        }
    }

    #[test]
    fn sheet_process_parses_repeated_columns() {
        let cli = Cli::try_parse_from([
            "deskbot", "sheet", "process", "in.csv", "-o", "out.csv", "-c", "Amount", "-c", "E",
            "-t", "double", "-t", "reverse",
        ])
        .unwrap();
        match cli.command {
            Commands::Sheet {
                sheet_command:
                    SheetCommands::Process {
                        columns,
                        transforms,
                        ..
                    },
            } => {
                assert_eq!(columns, vec!["Amount", "E"]);
                assert_eq!(transforms, vec!["double", "reverse"]);
            }
            other => panic!("expected sheet process command, got {other:?}"),
        }
    }

    #[test]
    fn thread_command_parses() {
        let cli = Cli::try_parse_from(["deskbot", "thread", "s1", "payment"]).unwrap();
        match cli.command {
            Commands::Thread { session_id, route } => {
                assert_eq!(session_id, "s1");
                assert_eq!(route, "payment");
            }
            other => panic!("expected thread command, got {other:?}"),
        }
    }

    #[test]
    fn temperature_parser_bounds() {
        assert!(parse_temperature("0.7").is_ok());
        assert!(parse_temperature("2.5").is_err());
        assert!(parse_temperature("abc").is_err());
    }
}
