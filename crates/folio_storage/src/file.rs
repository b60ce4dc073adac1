//! Directory-backed storage medium for persistent storage.

use crate::error::{StorageError, StorageResult};
use crate::medium::{validate_key, StorageMedium};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Advisory lock taken around every write.
const LOCK_FILE: &str = ".lock";

/// A directory-backed key/value medium.
///
/// Each key is stored as one file directly under the root directory.
/// Data survives process restarts.
///
/// ```text
/// <root>/
/// ├─ .lock                    # Advisory write lock
/// ├─ resumeBuilder_resumes    # One file per key
/// └─ resumeBuilder_version
/// ```
///
/// # Durability
///
/// Writes go to a hidden temporary file which is synced and then renamed
/// over the key's file, so a reader never observes a torn value.
///
/// # Concurrency
///
/// Writers in the same process are serialized by an internal mutex; writers
/// in other processes are serialized by an advisory `fs2` lock on `.lock`.
/// Read-modify-write sequences spanning several calls are not guarded.
///
/// # Example
///
/// ```no_run
/// use folio_storage::{FileMedium, StorageMedium};
/// use std::path::Path;
///
/// let medium = FileMedium::open(Path::new("folio-data")).unwrap();
/// medium.set("greeting", b"hello").unwrap();
/// ```
#[derive(Debug)]
pub struct FileMedium {
    root: PathBuf,
    lock_file: Mutex<File>,
    quota: Option<u64>,
}

impl FileMedium {
    /// Opens or creates a medium rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, is not a
    /// directory, or its lock file cannot be opened.
    pub fn open(root: &Path) -> StorageResult<Self> {
        if !root.exists() {
            fs::create_dir_all(root)?;
        }

        if !root.is_dir() {
            return Err(StorageError::Unavailable(format!(
                "not a directory: {}",
                root.display()
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(root.join(LOCK_FILE))?;

        Ok(Self {
            root: root.to_path_buf(),
            lock_file: Mutex::new(lock_file),
            quota: None,
        })
    }

    /// Limits the total number of value bytes the medium may hold.
    #[must_use]
    pub fn with_quota(mut self, quota: u64) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the total size of all stored values, in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn used_bytes(&self) -> StorageResult<u64> {
        let mut total = 0;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            total += entry.metadata()?.len();
        }
        Ok(total)
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.root.join(format!(".{key}.tmp"))
    }

    fn check_quota(&self, key: &str, incoming: u64) -> StorageResult<()> {
        let Some(quota) = self.quota else {
            return Ok(());
        };

        let existing = match fs::metadata(self.value_path(key)) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };
        let needed = self.used_bytes()? - existing + incoming;

        if needed > quota {
            return Err(StorageError::QuotaExceeded { needed, quota });
        }
        Ok(())
    }

    fn write_atomically(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let temp_path = self.temp_path(key);

        let mut file = File::create(&temp_path)?;
        file.write_all(value)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, self.value_path(key))?;
        self.sync_directory()
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> StorageResult<()> {
        File::open(&self.root)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> StorageResult<()> {
        Ok(())
    }
}

impl StorageMedium for FileMedium {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_key(key)?;

        let mut file = match File::open(self.value_path(key)) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        validate_key(key)?;

        let lock_file = self.lock_file.lock();
        lock_file.lock_exclusive()?;

        let result = self
            .check_quota(key, value.len() as u64)
            .and_then(|()| self.write_atomically(key, value));

        if result.is_err() {
            let _ = fs::remove_file(self.temp_path(key));
        }
        if let Err(e) = FileExt::unlock(&*lock_file) {
            tracing::warn!(error = %e, root = %self.root.display(), "failed to release medium lock");
        }
        result
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;

        let lock_file = self.lock_file.lock();
        lock_file.lock_exclusive()?;

        let result = match fs::remove_file(self.value_path(key)) {
            Ok(()) => self.sync_directory(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        };

        if let Err(e) = FileExt::unlock(&*lock_file) {
            tracing::warn!(error = %e, root = %self.root.display(), "failed to release medium lock");
        }
        result
    }
}
