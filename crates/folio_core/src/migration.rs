//! Schema version marker.
//!
//! A version marker sits next to the stored resumes and is consulted on
//! every durable read. There is only one schema so far, so a mismatch runs
//! a migration that just rewrites the marker; future layouts hook in here.

use crate::config::Config;
use folio_storage::{StorageMedium, StorageResult};

/// Outcome of a schema check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaCheck {
    /// The marker matched the expected version.
    Current,
    /// The marker was missing or different and has been rewritten.
    Migrated {
        /// Version found before migrating, if any.
        from: Option<String>,
    },
}

/// Checks the schema marker and migrates if it does not match.
///
/// # Errors
///
/// Returns an error if the marker cannot be read or rewritten.
pub fn ensure_current<M: StorageMedium + ?Sized>(
    medium: &M,
    config: &Config,
) -> StorageResult<SchemaCheck> {
    let key = config.version_key();
    let found = medium
        .get(&key)?
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());

    if found.as_deref() == Some(config.schema_version.as_str()) {
        return Ok(SchemaCheck::Current);
    }

    migrate(medium, config, found.as_deref())?;
    Ok(SchemaCheck::Migrated { from: found })
}

fn migrate<M: StorageMedium + ?Sized>(
    medium: &M,
    config: &Config,
    from: Option<&str>,
) -> StorageResult<()> {
    tracing::info!(
        from = from.unwrap_or("<none>"),
        to = %config.schema_version,
        "migrating local storage schema"
    );
    medium.set(&config.version_key(), config.schema_version.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_storage::InMemoryMedium;

    #[test]
    fn fresh_medium_is_migrated_once() {
        let medium = InMemoryMedium::new();
        let config = Config::default();

        assert_eq!(
            ensure_current(&medium, &config).unwrap(),
            SchemaCheck::Migrated { from: None }
        );
        assert_eq!(ensure_current(&medium, &config).unwrap(), SchemaCheck::Current);
        assert_eq!(
            medium.get(&config.version_key()).unwrap().unwrap(),
            b"1.0"
        );
    }

    #[test]
    fn mismatched_version_is_rewritten() {
        let config = Config::default();
        let medium = InMemoryMedium::with_entries([(config.version_key(), b"0.9".to_vec())]);

        let check = ensure_current(&medium, &config).unwrap();
        assert_eq!(
            check,
            SchemaCheck::Migrated {
                from: Some("0.9".to_string())
            }
        );
    }

    #[test]
    fn migration_keeps_stored_resumes() {
        let config = Config::default();
        let medium = InMemoryMedium::with_entries([(config.resumes_key(), b"[]".to_vec())]);

        ensure_current(&medium, &config).unwrap();
        assert_eq!(medium.get(&config.resumes_key()).unwrap().unwrap(), b"[]");
    }
}
