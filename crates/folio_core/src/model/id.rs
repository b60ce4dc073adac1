//! Resume and caller identifiers.

use crate::time::now_millis;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Identifier of a resume.
///
/// Two namespaces share this type:
/// - ids minted on the device, `<prefix><millis>_<9 base36 chars>`
/// - ids assigned by the remote store
///
/// Ids are immutable once assigned and never reused.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeId(String);

impl ResumeId {
    /// Creates an id from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a new device-local id.
    ///
    /// Uniqueness relies on the millisecond timestamp plus 9 random base36
    /// characters; collisions are negligible but not impossible.
    #[must_use]
    pub fn mint_local(prefix: &str) -> Self {
        Self(format!("{prefix}{}_{}", now_millis(), random_base36(9)))
    }

    /// Returns true if this id was minted on a device with the given prefix.
    #[must_use]
    pub fn is_locally_minted(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ResumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResumeId({})", self.0)
    }
}

impl fmt::Display for ResumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResumeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ResumeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ResumeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Where a locally stored resume stands relative to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Origin {
    /// Never created remotely; visible only from the local store.
    #[default]
    LocalOnly,
    /// Has a remote counterpart under the same id.
    Remote,
}

impl Origin {
    /// Returns true for resumes without a remote counterpart.
    #[must_use]
    pub fn is_local_only(self) -> bool {
        matches!(self, Origin::LocalOnly)
    }
}

/// Opaque identity of the signed-in caller.
///
/// Only its presence matters to the local store; the remote store uses it
/// to scope every call.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    /// Creates a caller identity from its principal text.
    #[must_use]
    pub fn new(principal: impl Into<String>) -> Self {
        Self(principal.into())
    }

    /// Returns the principal text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallerIdentity({})", self.0)
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generates an id for an item inside a resume section.
#[must_use]
pub fn new_item_id() -> String {
    format!("{}_{}", now_millis(), random_base36(7))
}

fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_local_is_unique() {
        let id1 = ResumeId::mint_local("local_");
        let id2 = ResumeId::mint_local("local_");
        assert_ne!(id1, id2);
    }

    #[test]
    fn mint_local_shape() {
        let id = ResumeId::mint_local("local_");
        assert!(id.is_locally_minted("local_"));

        let rest = id.as_str().strip_prefix("local_").unwrap();
        let (millis, suffix) = rest.split_once('_').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 9);
        assert!(suffix.bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn remote_ids_are_not_local() {
        let id = ResumeId::from("resume-42");
        assert!(!id.is_locally_minted("local_"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ResumeId::from("local_1_abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"local_1_abc\"");
        assert_eq!(
            serde_json::to_string(&Origin::LocalOnly).unwrap(),
            "\"localOnly\""
        );
    }

    #[test]
    fn item_ids_are_unique() {
        assert_ne!(new_item_id(), new_item_id());
    }
}
