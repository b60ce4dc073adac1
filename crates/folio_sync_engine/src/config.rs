//! Configuration for the reconciler.

/// Configuration for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Drain the queue when presence becomes online and signed in.
    pub drain_on_reconnect: bool,
    /// Create local-only resumes remotely when presence becomes ready.
    pub publish_local_only_on_reconnect: bool,
}

impl SyncConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether reconnecting triggers a drain.
    pub fn with_drain_on_reconnect(mut self, enabled: bool) -> Self {
        self.drain_on_reconnect = enabled;
        self
    }

    /// Sets whether reconnecting publishes local-only resumes.
    pub fn with_publish_local_only_on_reconnect(mut self, enabled: bool) -> Self {
        self.publish_local_only_on_reconnect = enabled;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            drain_on_reconnect: true,
            publish_local_only_on_reconnect: false,
        }
    }
}
