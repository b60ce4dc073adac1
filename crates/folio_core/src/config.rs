//! Local store configuration.

/// Schema version written next to the stored resumes.
pub const CURRENT_SCHEMA_VERSION: &str = "1.0";

/// Configuration for the local store and sync queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prefix for every key written to the medium.
    pub namespace: String,

    /// Prefix marking ids minted on this device.
    pub local_id_prefix: String,

    /// Suffix appended to the title of a duplicated resume.
    pub copy_suffix: String,

    /// Schema version expected in the version marker.
    pub schema_version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: "resumeBuilder".to_string(),
            local_id_prefix: "local_".to_string(),
            copy_suffix: " (Copy)".to_string(),
            schema_version: CURRENT_SCHEMA_VERSION.to_string(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the key namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Sets the prefix for locally minted ids.
    #[must_use]
    pub fn local_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.local_id_prefix = prefix.into();
        self
    }

    /// Sets the suffix for duplicated titles.
    #[must_use]
    pub fn copy_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.copy_suffix = suffix.into();
        self
    }

    /// Sets the expected schema version.
    #[must_use]
    pub fn schema_version(mut self, version: impl Into<String>) -> Self {
        self.schema_version = version.into();
        self
    }

    /// Key holding the serialized resumes.
    #[must_use]
    pub fn resumes_key(&self) -> String {
        format!("{}_resumes", self.namespace)
    }

    /// Key holding the schema version marker.
    #[must_use]
    pub fn version_key(&self) -> String {
        format!("{}_version", self.namespace)
    }

    /// Key holding the serialized sync queue.
    #[must_use]
    pub fn queue_key(&self) -> String {
        format!("{}_syncQueue", self.namespace)
    }

    /// Key holding the last successful drain time.
    #[must_use]
    pub fn last_sync_key(&self) -> String {
        format!("{}_lastSync", self.namespace)
    }
}
