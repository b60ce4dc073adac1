//! # Folio Core
//!
//! Local-first persistence for the Folio resume builder.
//!
//! This crate provides:
//! - The resume data model and the remote wire blob
//! - A durable local store that degrades to memory when storage fails
//! - The sync operation queue with change notification
//! - User-facing error classification
//!
//! ## Key Invariants
//!
//! - A local write that returns `Ok` is visible to every later read
//! - Queue order is replay order; entries are removed only by index
//! - `updated_at >= created_at` for every resume read from any source

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod classify;
mod config;
mod durable;
mod error;
pub mod migration;
mod model;
mod notify;
mod queue;
mod store;
mod time;
pub mod wire;

pub use classify::{classify, is_storage_fault, Classified, STORAGE_FAULT_GUIDANCE};
pub use config::{Config, CURRENT_SCHEMA_VERSION};
pub use durable::{Durable, PROBE_KEY};
pub use error::{CoreError, CoreResult, ErrorCategory};
pub use model::{
    new_item_id, Achievement, CallerIdentity, Certification, ColorTheme, Education, Experience,
    Font, Formatting, Hobby, Language, Origin, PersonalInfo, PhotoShape, Project, Resume,
    ResumeContent, ResumeId, SectionType, Skill, SkillLevel, Template,
};
pub use notify::{ChangeNotifier, SubscriptionId};
pub use queue::{PendingOp, QueueEntry, SyncOp, SyncQueue};
pub use store::{LocalStore, StorageStatus};
pub use time::{now_millis, time_ago};
pub use wire::{decode_remote, encode_blob, RemoteResume, WireBlob};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Opens a local store and its sync queue over one shared medium.
pub fn open<M: folio_storage::StorageMedium>(medium: M, config: Config) -> (LocalStore<M>, SyncQueue<M>) {
    let durable = std::sync::Arc::new(Durable::new(medium, config));
    let queue = SyncQueue::new(std::sync::Arc::clone(&durable));
    (LocalStore::with_durable(durable), queue)
}
