//! Command-line request boundary for the quote board.
//!
//! # Responsibility
//! - Map subcommands onto `QuoteBoard` operations.
//! - Print results as JSON on stdout and failures with a status hint on stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use quotevote_core::{
    error_chain, init_logging, BoardConfig, BoardError, NewQuote, QuoteBoard, QuoteId, VoterIdentity,
};
use serde_json::json;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "quotevote")]
#[command(author, version, about = "Submit, rank and vote on quotes", long_about = None)]
struct Args {
    /// SQLite database file (defaults to QUOTEVOTE_DB_PATH, else in-memory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Directory for rolling log files (defaults to QUOTEVOTE_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a new quote
    Submit {
        text: String,
        #[arg(long)]
        author: Option<String>,
        /// Tag to attach; repeat for several, order is kept
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// List quotes ranked by votes
    List {
        #[arg(long)]
        page: Option<String>,
        #[arg(long)]
        page_size: Option<String>,
    },
    /// Cast one vote for a quote
    Vote {
        id: QuoteId,
        /// Source address of the voter; omitted means `unknown`
        #[arg(long)]
        from: Option<IpAddr>,
    },
    /// Show a single quote
    Show { id: QuoteId },
    /// Remove a quote and all of its ballots
    Remove { id: QuoteId },
    /// Compare cached tallies with recorded ballots
    Audit,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<BoardError>() {
                Some(board_err) => {
                    let kind = board_err.kind();
                    eprintln!(
                        "error[{}] {}: {}",
                        kind.status(),
                        kind.code(),
                        error_chain(board_err)
                    );
                }
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = BoardConfig::from_env().context("invalid QUOTEVOTE_* environment")?;
    if let Some(db) = args.db {
        config.db_path = Some(db);
    }
    if let Some(dir) = args.log_dir {
        config.log_dir = Some(dir);
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    if let Some(dir) = config.log_dir.as_ref() {
        init_logging(&config.log_level, dir).context("failed to initialize logging")?;
    }

    let board = QuoteBoard::open(&config)?;
    info!("event=cli_command module=cli status=start command={}", command_name(&args.command));

    let output = match args.command {
        Command::Submit { text, author, tags } => {
            let mut request = NewQuote::new(text).with_tags(tags);
            request.author = author;
            serde_json::to_value(board.submit_quote(&request)?)?
        }
        Command::List { page, page_size } => {
            let page = board.list_quotes_from_query(page.as_deref(), page_size.as_deref())?;
            json!({ "items": page.items, "total": page.total })
        }
        Command::Vote { id, from } => {
            let voter = VoterIdentity::from_peer(from);
            serde_json::to_value(board.cast_vote(id, &voter)?)?
        }
        Command::Show { id } => serde_json::to_value(board.get_quote(id)?)?,
        Command::Remove { id } => serde_json::to_value(board.remove_quote(id)?)?,
        Command::Audit => {
            let mismatches = board.audit_tallies()?;
            json!({ "consistent": mismatches.is_empty(), "mismatches": mismatches })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Submit { .. } => "submit",
        Command::List { .. } => "list",
        Command::Vote { .. } => "vote",
        Command::Show { .. } => "show",
        Command::Remove { .. } => "remove",
        Command::Audit => "audit",
    }
}

#[cfg(test)]
mod tests {
    use super::{Args, Command};
    use clap::Parser;

    #[test]
    fn submit_collects_repeated_tags_in_order() {
        let args = Args::parse_from([
            "quotevote", "submit", "Less is more", "--tag", "design", "--tag", "art",
        ]);
        match args.command {
            Command::Submit { text, tags, author } => {
                assert_eq!(text, "Less is more");
                assert_eq!(tags, vec!["design", "art"]);
                assert!(author.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn list_passes_raw_pagination_strings() {
        let args = Args::parse_from(["quotevote", "--db", "/tmp/q.db", "list", "--page", "x"]);
        assert!(args.db.is_some());
        match args.command {
            Command::List { page, page_size } => {
                assert_eq!(page.as_deref(), Some("x"));
                assert!(page_size.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn vote_parses_source_address() {
        let args = Args::parse_from(["quotevote", "vote", "3", "--from", "10.0.0.8"]);
        match args.command {
            Command::Vote { id, from } => {
                assert_eq!(id, 3);
                assert_eq!(from.map(|ip| ip.to_string()).as_deref(), Some("10.0.0.8"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
