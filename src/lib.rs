#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::assigning_clones,
    clippy::bool_to_int_with_if,
    clippy::cast_possible_wrap,
    clippy::doc_markdown,
    clippy::field_reassign_with_default,
    clippy::float_cmp,
    clippy::implicit_clone,
    clippy::items_after_statements,
    clippy::map_unwrap_or,
    clippy::manual_let_else,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::needless_pass_by_value,
    clippy::redundant_closure_for_method_calls,
    clippy::return_self_not_must_use,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::struct_field_names,
    clippy::too_many_lines,
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::unnecessary_wraps
)]

use clap::Subcommand;
use std::path::PathBuf;

pub mod chat;
pub mod config;
pub mod dispatch;
pub mod knowledge;
pub mod providers;
pub mod routing;
pub mod sessions;
pub mod store;
pub mod tabular;
pub mod threads;

pub use config::Config;

/// Account management subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum AccountCommands {
    /// Register a new account (prompts for the secret)
    Register {
        /// Username to create
        username: String,
    },
    /// Verify credentials (prompts for the secret)
    Login {
        /// Username to log in as
        username: String,
    },
}

/// Saved-transcript subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptCommands {
    /// List an account's saved chats, newest first
    List {
        /// Account owning the chats (prompts for the secret)
        username: String,
    },
    /// Replay one saved chat as a conversation log
    Show {
        /// Chat id as printed by `transcript list`
        chat_id: i64,
    },
}

/// Sheet post-processing subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SheetCommands {
    /// Insert processed copies of columns and write the result as CSV
    #[command(long_about = "\
Insert processed copies of columns and write the result as CSV.

Each --column takes a 1-based index, a header name, or a spreadsheet \
letter; headers win over letters when both would resolve. New columns \
land immediately right of their sources and carry the source formatting.

Examples:
  deskbot sheet process in.csv -o out.csv -c Amount -t double
  deskbot sheet process in.xlsx -o out.csv -c 3 -c Amount -c E \\
      -t uppercase -t double -t reverse --rename Upper3")]
    Process {
        /// Input file (.csv, .xlsx, .xls, .ods)
        input: PathBuf,
        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
        /// Column to process: 1-based index, header name, or letter (repeatable)
        #[arg(short = 'c', long = "column", required = true)]
        columns: Vec<String>,
        /// Transform per column: uppercase, double, reverse. One value
        /// applies to every column.
        #[arg(short = 't', long = "transform", required = true)]
        transforms: Vec<String>,
        /// Custom name for the n-th new column (repeatable, positional match)
        #[arg(long = "rename")]
        renames: Vec<String>,
        /// Wrap text in the new columns
        #[arg(long)]
        word_wrap: bool,
        /// Estimate row heights for wrapped text
        #[arg(long)]
        auto_row_height: bool,
    },
}
