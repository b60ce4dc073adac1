//! User-facing error classification.
//!
//! Turns any error into a short message fit for a toast while keeping the
//! full rendering for logs. Classification never changes how an error was
//! handled.

use crate::error::CoreError;
use folio_storage::StorageError;
use std::error::Error;

/// Remediation shown when the durable medium cannot be used.
pub const STORAGE_FAULT_GUIDANCE: &str = "Local storage is unavailable. This may be due to private browsing mode, storage quota exceeded, or browser restrictions. Please try: (1) disabling private/incognito mode, (2) freeing up browser storage space, or (3) logging in to sync your resumes to the cloud.";

/// Known remote-side phrases and their rewrites. `None` keeps the message.
const VOCABULARY: &[(&str, Option<&str>)] = &[
    (
        "Unauthorized",
        Some("You need to be logged in to perform this action"),
    ),
    ("already exists", Some("A resume with this ID already exists")),
    ("not found", Some("Resume not found")),
    (
        "Cannot sync",
        Some("Unable to sync while offline. Changes will sync when you reconnect."),
    ),
    ("partially completed", None),
];

/// A classified error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    /// Message to show the user.
    pub user_message: String,
    /// The error with its whole source chain, for logs.
    pub full_error: String,
}

/// Classifies `error`.
///
/// The first vocabulary phrase found anywhere in the source chain decides
/// the message; unrecognized errors keep their own message.
pub fn classify(error: &(dyn Error + 'static)) -> Classified {
    let top = error.to_string();
    let chain: Vec<String> = chain(error).map(ToString::to_string).collect();

    let user_message = VOCABULARY
        .iter()
        .find(|(phrase, _)| chain.iter().any(|m| m.contains(phrase)))
        .map_or_else(
            || top.clone(),
            |(_, rewrite)| rewrite.map_or_else(|| top.clone(), str::to_string),
        );

    Classified {
        user_message,
        full_error: chain.join(": "),
    }
}

/// Returns true if `error` means the durable medium is full or unusable.
///
/// Matches a storage fault anywhere in the source chain, or the words
/// "storage", "quota" or "private" in any message.
pub fn is_storage_fault(error: &(dyn Error + 'static)) -> bool {
    chain(error).any(|e| {
        if let Some(storage) = e.downcast_ref::<StorageError>() {
            if storage.is_capacity_fault() {
                return true;
            }
        }
        if let Some(CoreError::NotDurable { .. }) = e.downcast_ref::<CoreError>() {
            return true;
        }

        let message = e.to_string().to_lowercase();
        ["storage", "quota", "private"]
            .iter()
            .any(|signal| message.contains(signal))
    })
}

fn chain<'a>(error: &'a (dyn Error + 'static)) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    std::iter::successors(Some(error), |&e| e.source())
}
