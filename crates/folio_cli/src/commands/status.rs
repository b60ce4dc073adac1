//! Status command implementation.

use super::{print_json, CliResult, OutputFormat, Session};
use folio_core::now_millis;
use serde::Serialize;
use std::path::Path;

/// Store and sync status.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// Store directory.
    pub path: String,
    /// Stored resumes.
    pub resumes: usize,
    /// Resumes with no remote counterpart.
    pub local_only: usize,
    /// Queued operations.
    pub pending: usize,
    /// Last completed drain, epoch milliseconds.
    pub last_sync: Option<i64>,
    /// Badge label.
    pub label: String,
    /// Whether a principal was given.
    pub signed_in: bool,
    /// Whether the durable medium accepts writes.
    pub storage_available: bool,
}

/// Collects the status report.
pub fn collect(session: &Session, path: &Path) -> StatusReport {
    let status = session.status();
    let resumes = session.store().get_all();
    StatusReport {
        path: path.display().to_string(),
        resumes: resumes.len(),
        local_only: resumes.iter().filter(|r| r.origin.is_local_only()).count(),
        pending: status.pending,
        last_sync: status.last_sync,
        label: status.label().to_string(),
        signed_in: status.authenticated,
        storage_available: status.storage.available,
    }
}

/// Runs the status command.
pub fn run(session: &Session, path: &Path, format: OutputFormat) -> CliResult<()> {
    let report = collect(session, path);
    if format == OutputFormat::Json {
        return print_json(&report);
    }

    let status = session.status();
    println!("Folio Store Status");
    println!("==================");
    println!();
    println!("Path: {}", report.path);
    println!();
    println!("Resumes:");
    println!("  Total:      {}", report.resumes);
    println!("  Local only: {}", report.local_only);
    println!();
    println!("Sync:");
    println!("  State:      {}", report.label);
    println!("  Signed in:  {}", if report.signed_in { "yes" } else { "no" });
    println!("  Pending:    {}", report.pending);
    println!("  Last sync:  {}", status.format_last_sync(now_millis()));
    if !report.storage_available {
        println!();
        println!("Warning: {}", folio_core::STORAGE_FAULT_GUIDANCE);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::session;

    #[tokio::test]
    async fn counts_local_only_and_pending() {
        let (dir, session) = session(Some("alice"));
        session.create("A").await.unwrap();
        session.create("B").await.unwrap();

        let report = collect(&session, dir.path());
        assert_eq!(report.resumes, 2);
        assert_eq!(report.local_only, 2);
        assert_eq!(report.pending, 2);
        assert_eq!(report.label, "Offline");
        assert!(report.signed_in);
        assert!(report.storage_available);
    }
}
