//! Queue commands.

use super::{print_json, CliResult, OutputFormat, Session};
use folio_core::{now_millis, time_ago};

/// Prints the pending sync queue in replay order.
pub fn show(session: &Session, format: OutputFormat) -> CliResult<()> {
    let entries = session.queue().drain_candidates();

    match format {
        OutputFormat::Json => print_json(&entries),
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("Sync queue is empty.");
                return Ok(());
            }
            let now = now_millis();
            for (index, entry) in entries.iter().enumerate() {
                println!(
                    "{index:>4}  {:<10} {:<36} {}",
                    entry.op.kind(),
                    entry.resume_id.as_str(),
                    time_ago(Some(entry.timestamp), now)
                );
            }
            Ok(())
        }
    }
}

/// Discards every pending entry.
pub fn clear(session: &Session) {
    let discarded = session.queue().len();
    session.queue().clear();
    tracing::info!(discarded, "sync queue cleared");
    println!("Discarded {discarded} queued operation(s)");
}
