//! Probed durable medium and fallback-backed cells.
//!
//! [`Durable`] wraps a [`StorageMedium`] with a once-per-instance
//! availability probe. A [`DurableCell`] is one JSON value stored under one
//! key, mirrored in memory so that a failed or impossible durable write
//! still leaves the latest value readable for the rest of the process.

use crate::config::Config;
use crate::error::CoreResult;
use crate::migration;
use folio_storage::StorageMedium;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

/// Key used by the availability probe.
pub const PROBE_KEY: &str = "__storage_test__";

/// A storage medium plus its cached availability.
///
/// The probe runs at most once per instance; a medium that failed the probe
/// is never written again by this instance.
#[derive(Debug)]
pub struct Durable<M> {
    medium: M,
    config: Config,
    available: OnceLock<bool>,
}

impl<M: StorageMedium> Durable<M> {
    /// Wraps a medium. The probe runs lazily on first use.
    pub fn new(medium: M, config: Config) -> Self {
        Self {
            medium,
            config,
            available: OnceLock::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the underlying medium.
    pub fn medium(&self) -> &M {
        &self.medium
    }

    /// Returns true if the medium passed its probe.
    pub fn is_available(&self) -> bool {
        *self.available.get_or_init(|| self.probe())
    }

    fn probe(&self) -> bool {
        let result = self
            .medium
            .set(PROBE_KEY, b"test")
            .and_then(|()| self.medium.remove(PROBE_KEY));

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "durable storage is not available, using in-memory fallback");
                false
            }
        }
    }

    /// Reads and decodes the value under `key`.
    ///
    /// Consults the schema marker first.
    pub(crate) fn read<T: DeserializeOwned>(&self, key: &str) -> CoreResult<Option<T>> {
        if let Err(e) = migration::ensure_current(&self.medium, &self.config) {
            tracing::warn!(error = %e, "could not check storage schema version");
        }

        match self.medium.get(key)? {
            Some(bytes) if !bytes.is_empty() => Ok(Some(serde_json::from_slice(&bytes)?)),
            _ => Ok(None),
        }
    }

    /// Encodes and writes `value` under `key`.
    pub(crate) fn write<T: Serialize>(&self, key: &str, value: &T) -> CoreResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.medium.set(key, &bytes)?;
        Ok(())
    }

    /// Removes `key`.
    pub(crate) fn remove(&self, key: &str) -> CoreResult<()> {
        self.medium.remove(key)?;
        Ok(())
    }
}

/// One JSON value under one key, with an in-memory mirror.
///
/// Reads come from the medium while it is healthy. Once a durable write has
/// failed, the mirror holds state the medium lacks, so reads come from the
/// mirror until a later write succeeds again.
#[derive(Debug)]
pub(crate) struct DurableCell<T> {
    key: String,
    memory: Mutex<Option<T>>,
    degraded: AtomicBool,
}

impl<T> DurableCell<T>
where
    T: Serialize + DeserializeOwned + Clone + Default,
{
    pub(crate) fn new(key: String) -> Self {
        Self {
            key,
            memory: Mutex::new(None),
            degraded: AtomicBool::new(false),
        }
    }

    /// Returns true if the mirror holds state the medium does not.
    pub(crate) fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    /// Returns the current value.
    pub(crate) fn get<M: StorageMedium>(&self, durable: &Durable<M>) -> T {
        let memory = self.memory.lock();
        self.load(durable, &memory)
    }

    /// Read-modify-write under the cell's lock.
    ///
    /// The mirror is always updated; the returned error reports only the
    /// durable write.
    pub(crate) fn update<M, R>(
        &self,
        durable: &Durable<M>,
        f: impl FnOnce(&mut T) -> R,
    ) -> (R, CoreResult<()>)
    where
        M: StorageMedium,
    {
        let mut memory = self.memory.lock();
        let mut value = self.load(durable, &memory);
        let out = f(&mut value);

        let written = if durable.is_available() {
            let result = durable.write(&self.key, &value);
            self.degraded.store(result.is_err(), Ordering::SeqCst);
            result
        } else {
            Ok(())
        };

        *memory = Some(value);
        (out, written)
    }

    /// Drops the durable value and resets the mirror to the default.
    pub(crate) fn reset<M: StorageMedium>(&self, durable: &Durable<M>) -> CoreResult<()> {
        let mut memory = self.memory.lock();
        *memory = Some(T::default());

        if !durable.is_available() {
            return Ok(());
        }
        let result = durable.remove(&self.key);
        self.degraded.store(result.is_err(), Ordering::SeqCst);
        result
    }

    fn load<M: StorageMedium>(&self, durable: &Durable<M>, memory: &Option<T>) -> T {
        if !durable.is_available() || self.is_degraded() {
            return memory.clone().unwrap_or_default();
        }

        match durable.read(&self.key) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                tracing::error!(key = %self.key, error = %e, "failed to read local storage, using in-memory copy");
                memory.clone().unwrap_or_default()
            }
        }
    }
}
