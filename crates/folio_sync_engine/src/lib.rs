//! # Folio Sync Engine
//!
//! Reconciliation between the local resume store and the remote store.
//!
//! This crate provides:
//! - The remote gateway contract plus in-memory and disconnected gateways
//! - Presence (connectivity and identity) handling
//! - The reconciler: local-first writes, queued retries, merged reads
//! - Queue draining with partial-failure reporting
//!
//! ## Key Invariants
//!
//! - A local write that succeeds is never reported as failed because of
//!   the remote store
//! - Queued operations are replayed in enqueue order
//! - A drain removes exactly the entries it settled
//! - At most one drain is in flight

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod gateway;
mod presence;
mod reconciler;
mod state;

pub use config::SyncConfig;
pub use error::{GatewayError, GatewayResult, SyncError, SyncResult};
pub use gateway::{Disconnected, GatewayCall, MemoryGateway, RemoteGateway};
pub use presence::Presence;
pub use reconciler::Reconciler;
pub use state::{DrainReport, DrainState, SyncStats, SyncStatus};
