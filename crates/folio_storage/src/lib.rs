//! # Folio Storage
//!
//! Storage media for Folio.
//!
//! This crate provides the lowest-level storage abstraction for Folio.
//! A medium is an **opaque key/value byte store** - it does not interpret
//! the values it holds.
//!
//! ## Design Principles
//!
//! - Media are simple synchronous stores (get, set, remove)
//! - No knowledge of resumes, sync queues, or schema versions
//! - Must be `Send + Sync` so one medium can back several stores
//! - `folio_core` owns all interpretation of stored bytes
//!
//! ## Available Media
//!
//! - [`InMemoryMedium`] - For testing and process-lifetime storage
//! - [`FileMedium`] - For persistent storage in a directory
//!
//! ## Example
//!
//! ```rust
//! use folio_storage::{InMemoryMedium, StorageMedium};
//!
//! let medium = InMemoryMedium::new();
//! medium.set("resumes", b"[]").unwrap();
//! assert_eq!(medium.get("resumes").unwrap().unwrap(), b"[]");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod medium;
mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileMedium;
pub use medium::{validate_key, StorageMedium};
pub use memory::InMemoryMedium;
