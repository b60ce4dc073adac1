//! Test fixtures and store helpers.
//!
//! Provides temporary file-backed media and a medium whose failures can be
//! scripted, for exercising the degrade-to-memory paths.

use folio_core::{Config, LocalStore, Resume, ResumeId, SyncQueue};
use folio_storage::{FileMedium, InMemoryMedium, StorageError, StorageMedium, StorageResult};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// A temporary directory holding a file medium, removed on drop.
pub struct TestDir {
    temp_dir: TempDir,
}

impl TestDir {
    /// Creates a new empty directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Opens a fresh medium over the directory, as a new process would.
    pub fn medium(&self) -> FileMedium {
        FileMedium::open(self.path()).expect("Failed to open file medium")
    }

    /// Opens a store over the directory.
    pub fn store(&self) -> LocalStore<FileMedium> {
        LocalStore::open(self.medium(), Config::default())
    }

    /// Opens a store and queue over the directory.
    pub fn open(&self) -> (LocalStore<FileMedium>, SyncQueue<FileMedium>) {
        folio_core::open(self.medium(), Config::default())
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs a test against a store in a temporary directory.
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&LocalStore<FileMedium>) -> R,
{
    let dir = TestDir::new();
    f(&dir.store())
}

/// An in-memory medium with scripted failures.
///
/// - [`FaultyMedium::unavailable`] fails every write, so the availability
///   probe fails, as in private browsing mode.
/// - [`FaultyMedium::break_writes`] passes the probe but fails every later
///   write until [`FaultyMedium::heal`].
#[derive(Debug, Default)]
pub struct FaultyMedium {
    inner: InMemoryMedium,
    refuse_probe: AtomicBool,
    refuse_writes: AtomicBool,
    writes: AtomicU64,
}

impl FaultyMedium {
    /// A medium that behaves normally until told otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    /// A medium on which no write ever succeeds.
    pub fn unavailable() -> Self {
        let medium = Self::default();
        medium.refuse_probe.store(true, Ordering::SeqCst);
        medium.refuse_writes.store(true, Ordering::SeqCst);
        medium
    }

    /// Fails every write except the availability probe.
    pub fn break_writes(&self) {
        self.refuse_writes.store(true, Ordering::SeqCst);
    }

    /// Lets writes through again.
    pub fn heal(&self) {
        self.refuse_probe.store(false, Ordering::SeqCst);
        self.refuse_writes.store(false, Ordering::SeqCst);
    }

    /// Returns the number of writes that reached the inner medium.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Returns the stored value for `key`, bypassing faults.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.get(key).ok().flatten()
    }

    fn check(&self, key: &str) -> StorageResult<()> {
        let refused = if key == folio_core::PROBE_KEY {
            self.refuse_probe.load(Ordering::SeqCst)
        } else {
            self.refuse_writes.load(Ordering::SeqCst)
        };
        if refused {
            return Err(StorageError::QuotaExceeded {
                needed: 1,
                quota: 0,
            });
        }
        Ok(())
    }
}

impl StorageMedium for FaultyMedium {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.check(key)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.check(key)?;
        self.inner.remove(key)
    }
}

/// Opens a store and queue over a shared faulty medium.
pub fn faulty_store(
    medium: &Arc<FaultyMedium>,
) -> (LocalStore<Arc<FaultyMedium>>, SyncQueue<Arc<FaultyMedium>>) {
    folio_core::open(Arc::clone(medium), Config::default())
}

/// Sample data.
pub mod scenarios {
    use super::*;
    use folio_core::{Experience, Skill, SkillLevel};

    /// A resume with a few filled-in sections.
    pub fn sample_resume(id: &str, title: &str) -> Resume {
        let mut resume = Resume::new(ResumeId::from(id), title, 1_700_000_000_000);
        resume.content.personal_info.full_name = "Ada Lovelace".to_string();
        resume.content.personal_info.email = "ada@example.com".to_string();
        resume.content.summary = "Analyst of engines.".to_string();
        resume.content.experience.push(Experience {
            id: "1700000000000_exp0001".to_string(),
            company: "Analytical Engines Ltd".to_string(),
            position: "Programmer".to_string(),
            start_date: "1842-01".to_string(),
            current: true,
            ..Experience::default()
        });
        resume.content.skills.push(Skill {
            id: "1700000000000_skl0001".to_string(),
            name: "Mathematics".to_string(),
            level: SkillLevel::Expert,
        });
        resume
    }

    /// A store holding `count` local resumes titled `CV 0..count`.
    pub fn populated_store(count: usize) -> LocalStore<InMemoryMedium> {
        let store = LocalStore::open(InMemoryMedium::new(), Config::default());
        for i in 0..count {
            store
                .create(&format!("CV {i}"))
                .expect("Failed to create resume");
        }
        store
    }
}
