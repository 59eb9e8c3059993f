//! jot: notes as local markdown files, mirrored onto a remote issue
//! tracker.
//!
//! The tracker is the durable backing store: `push` applies local state
//! to it, `pull` replaces local state with it. Everything else is glue
//! around the reconciliation passes in sync-core.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "jot")]
#[command(about = "File-backed notes mirrored onto a GitHub issue tracker")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a notes directory and config in the current directory
    Init,
    /// Link a remote repository
    Link {
        /// Repository owner (user or organization)
        owner: String,
        /// Repository name
        repo: String,
    },
    /// Store the access token for the linked repository
    Token {
        /// Token value
        token: String,
    },
    /// Create a new note
    Create {
        /// Note title
        #[arg(short, long)]
        title: String,
        /// Note body
        #[arg(short, long, default_value = "")]
        body: String,
    },
    /// Delete a note, keeping a timestamped copy in the archive
    Delete {
        /// Note id
        id: u64,
    },
    /// Apply local state to the remote tracker
    Push,
    /// Replace local state with the remote tracker's
    Pull,
    /// List notes
    List {
        /// List remote issues instead of local notes
        #[arg(short, long)]
        remote: bool,
        /// List local notes (the default)
        #[arg(short, long)]
        local: bool,
        /// Only open notes
        #[arg(short, long)]
        open: bool,
        /// Only closed notes
        #[arg(short, long)]
        closed: bool,
        /// Substring filter over title and body
        #[arg(short, long)]
        query: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respects RUST_LOG, defaults to info (or debug with --verbose)
    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Init => commands::init().await,
        Command::Link { owner, repo } => commands::link(&owner, &repo),
        Command::Token { token } => commands::token(&token),
        Command::Create { title, body } => commands::create(&title, &body).await,
        Command::Delete { id } => commands::delete(id).await,
        Command::Push => commands::push().await,
        Command::Pull => commands::pull().await,
        Command::List {
            remote,
            local,
            open,
            closed,
            query,
        } => commands::list(remote, local, open, closed, query.as_deref()).await,
    }
}
