//! CLI command implementations.

pub mod queue;
pub mod resumes;
pub mod status;

use clap::ValueEnum;
use folio_core::{CallerIdentity, Config};
use folio_storage::{FileMedium, StorageError};
use folio_sync_engine::{Disconnected, Presence, Reconciler, SyncConfig, SyncError};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// A reconciler over a store directory, with no remote behind it.
pub type Session = Reconciler<Disconnected, FileMedium>;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The store directory could not be opened.
    #[error("failed to open store: {0}")]
    Open(#[from] StorageError),

    /// A reconciler operation failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// No resume with this id is stored.
    #[error("resume not found: {0}")]
    NotFound(String),

    /// Output could not be encoded.
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Opens the store at `path`.
///
/// The session is always offline. With a principal the caller counts as
/// signed in, so edits to synced resumes are queued for a later drain.
/// Without one, edits stay local and nothing is queued.
pub fn open(path: &Path, principal: Option<&str>) -> CliResult<Session> {
    let medium = FileMedium::open(path)?;
    let session = Reconciler::open(SyncConfig::default(), Disconnected, medium, Config::default());
    session.set_presence(Presence {
        online: false,
        identity: principal.map(CallerIdentity::new),
    });
    tracing::debug!(path = %path.display(), signed_in = principal.is_some(), "opened store");
    Ok(session)
}

/// Prints `value` as pretty JSON.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
