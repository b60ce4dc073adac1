//! # Folio Testkit
//!
//! Test utilities for Folio.
//!
//! This crate provides:
//! - Temporary file-backed media and stores
//! - A medium with scripted faults (failed probe, failed writes, quota)
//! - Property-based generators for resumes using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_testkit::prelude::*;
//!
//! #[test]
//! fn survives_reopen() {
//!     let dir = TestDir::new();
//!     let id = dir.store().create("CV").unwrap().id;
//!     assert!(dir.store().get(&id).is_some());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
