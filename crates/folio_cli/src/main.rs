//! Folio CLI
//!
//! Command-line access to a local Folio resume store.
//!
//! # Commands
//!
//! - `list` - List stored resumes
//! - `show` - Display one resume
//! - `create`, `rename`, `duplicate`, `delete` - Edit the store
//! - `status` - Display store and sync status
//! - `queue` - Display or clear the pending sync queue

mod commands;

use clap::{Parser, Subcommand};
use commands::{CliError, OutputFormat};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Folio resume store tools.
#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long, env = "FOLIO_PATH")]
    path: Option<PathBuf>,

    /// Principal to act as; edits to synced resumes are queued
    #[arg(global = true, long, env = "FOLIO_PRINCIPAL")]
    principal: Option<String>,

    /// Output format
    #[arg(global = true, short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored resumes
    List,

    /// Display one resume
    Show {
        /// Resume id
        id: String,
    },

    /// Create an empty resume
    Create {
        /// Title of the new resume
        title: String,
    },

    /// Rename a resume
    Rename {
        /// Resume id
        id: String,
        /// New title
        title: String,
    },

    /// Copy a resume under a new id
    Duplicate {
        /// Resume id
        id: String,
    },

    /// Delete a resume
    Delete {
        /// Resume id
        id: String,
    },

    /// Display store and sync status
    Status,

    /// Display the pending sync queue
    Queue {
        /// Discard every pending entry
        #[arg(long)]
        clear: bool,
    },

    /// Show version information
    Version,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let classified = folio_core::classify(e.as_ref());
            tracing::debug!(error = %classified.full_error, "command failed");
            eprintln!("error: {}", classified.user_message);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Commands::Version = cli.command {
        println!("Folio CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("Folio Core v{}", folio_core::VERSION);
        return Ok(());
    }

    let path = cli.path.ok_or("Store path required (--path or FOLIO_PATH)")?;
    let session = commands::open(&path, cli.principal.as_deref())?;
    let format = cli.format;

    let outcome: Result<(), CliError> = match cli.command {
        Commands::List => commands::resumes::list(&session, format).await,
        Commands::Show { id } => commands::resumes::show(&session, &id, format).await,
        Commands::Create { title } => commands::resumes::create(&session, &title, format).await,
        Commands::Rename { id, title } => {
            commands::resumes::rename(&session, &id, &title, format).await
        }
        Commands::Duplicate { id } => commands::resumes::duplicate(&session, &id, format).await,
        Commands::Delete { id } => commands::resumes::delete(&session, &id).await,
        Commands::Status => commands::status::run(&session, &path, format),
        Commands::Queue { clear: true } => {
            commands::queue::clear(&session);
            Ok(())
        }
        Commands::Queue { clear: false } => commands::queue::show(&session, format),
        Commands::Version => Ok(()),
    };
    outcome?;
    Ok(())
}
