//! Durable local store.
//!
//! The local store keeps every resume in a single serialized sequence under
//! one key. Every operation reads the whole set, mutates it, and writes the
//! whole set back while holding the set's lock.
//!
//! # Degraded operation
//!
//! Availability is probed once per [`Durable`] instance. When the probe
//! fails, every operation runs against an in-memory table that lives as long
//! as the store. When a durable write fails later on, the table still holds
//! the change and the call returns [`CoreError::NotDurable`].

use crate::config::Config;
use crate::durable::{Durable, DurableCell};
use crate::error::{CoreError, CoreResult};
use crate::model::{Origin, Resume, ResumeId};
use crate::time::now_millis;
use folio_storage::StorageMedium;
use std::sync::Arc;

/// Availability of the durable medium, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStatus {
    /// The medium passed its probe.
    pub available: bool,
    /// Some state currently lives only in memory.
    pub using_memory: bool,
}

/// The durable local resume store.
pub struct LocalStore<M> {
    durable: Arc<Durable<M>>,
    table: DurableCell<Vec<Resume>>,
}

impl<M: StorageMedium> LocalStore<M> {
    /// Opens a store over `medium`.
    pub fn open(medium: M, config: Config) -> Self {
        Self::with_durable(Arc::new(Durable::new(medium, config)))
    }

    /// Opens a store over an already probed medium.
    ///
    /// Share the same [`Durable`] with the [`crate::SyncQueue`] so that the
    /// probe runs once for both.
    pub fn with_durable(durable: Arc<Durable<M>>) -> Self {
        let key = durable.config().resumes_key();
        Self {
            durable,
            table: DurableCell::new(key),
        }
    }

    /// Returns the shared durable medium.
    pub fn durable(&self) -> &Arc<Durable<M>> {
        &self.durable
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        self.durable.config()
    }

    /// Returns every stored resume, in insertion order.
    pub fn get_all(&self) -> Vec<Resume> {
        let mut resumes = self.table.get(&self.durable);
        self.settle(&mut resumes);
        resumes
    }

    /// Returns the resume with `id`, if any.
    pub fn get(&self, id: &ResumeId) -> Option<Resume> {
        self.get_all().into_iter().find(|r| &r.id == id)
    }

    /// Writes `resume`, replacing any stored resume with the same id.
    ///
    /// `updated_at` is stamped with the current time; the stored origin of
    /// an existing resume is kept. Returns the saved copy.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotDurable`] if the durable write failed. The
    /// change is still visible to later reads in this process.
    pub fn put(&self, mut resume: Resume) -> CoreResult<Resume> {
        let now = now_millis();
        self.mutate(|resumes| {
            resume.normalize_timestamps(now);
            resume.updated_at = now.max(resume.created_at);

            match resumes.iter_mut().find(|r| r.id == resume.id) {
                Some(stored) => {
                    resume.origin = stored.origin;
                    *stored = resume.clone();
                }
                None => {
                    if !resume.id.is_locally_minted(&self.config().local_id_prefix) {
                        resume.origin = Origin::Remote;
                    }
                    resumes.push(resume.clone());
                }
            }
            resume
        })
    }

    /// Deletes the resume with `id`. Returns false if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotDurable`] if the durable write failed.
    pub fn delete(&self, id: &ResumeId) -> CoreResult<bool> {
        self.mutate(|resumes| {
            let before = resumes.len();
            resumes.retain(|r| &r.id != id);
            resumes.len() != before
        })
    }

    /// Creates an empty resume with a fresh local id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] for a blank title, or
    /// [`CoreError::NotDurable`] if the durable write failed.
    pub fn create(&self, title: &str) -> CoreResult<Resume> {
        let title = checked_title(title)?;
        let resume = Resume::new(
            ResumeId::mint_local(&self.config().local_id_prefix),
            title,
            now_millis(),
        );

        self.mutate(|resumes| {
            resumes.push(resume.clone());
            resume
        })
    }

    /// Copies the resume with `id` under a fresh local id.
    ///
    /// The copy keeps content and formatting, gets the copy suffix on its
    /// title and fresh timestamps. Returns `None` if `id` does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotDurable`] if the durable write failed.
    pub fn duplicate(&self, id: &ResumeId) -> CoreResult<Option<Resume>> {
        let now = now_millis();
        let config = self.config();

        self.mutate(|resumes| {
            let source = resumes.iter().find(|r| &r.id == id)?;
            let copy = Resume {
                id: ResumeId::mint_local(&config.local_id_prefix),
                title: format!("{}{}", source.title, config.copy_suffix),
                content: source.content.clone(),
                formatting: source.formatting.clone(),
                created_at: now,
                updated_at: now,
                origin: Origin::LocalOnly,
            };
            resumes.push(copy.clone());
            Some(copy)
        })
    }

    /// Renames the resume with `id`. Returns the renamed copy.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if `id` does not exist,
    /// [`CoreError::InvalidInput`] for a blank title, or
    /// [`CoreError::NotDurable`] if the durable write failed.
    pub fn rename(&self, id: &ResumeId, title: &str) -> CoreResult<Resume> {
        let title = checked_title(title)?;
        let now = now_millis();

        self.mutate(|resumes| {
            let stored = resumes.iter_mut().find(|r| &r.id == id)?;
            stored.title = title;
            stored.updated_at = now.max(stored.created_at);
            Some(stored.clone())
        })?
        .ok_or_else(|| CoreError::NotFound(id.clone()))
    }

    /// Retags the origin of `id` without touching its timestamps.
    ///
    /// Returns false if `id` does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotDurable`] if the durable write failed.
    pub fn set_origin(&self, id: &ResumeId, origin: Origin) -> CoreResult<bool> {
        self.mutate(|resumes| match resumes.iter_mut().find(|r| &r.id == id) {
            Some(stored) => {
                stored.origin = origin;
                true
            }
            None => false,
        })
    }

    /// Returns true if `id` has no remote counterpart.
    ///
    /// Unknown ids are judged by their prefix.
    pub fn is_local_only(&self, id: &ResumeId) -> bool {
        match self.get(id) {
            Some(resume) => resume.origin.is_local_only(),
            None => id.is_locally_minted(&self.config().local_id_prefix),
        }
    }

    /// Reports whether writes currently reach the durable medium.
    pub fn status(&self) -> StorageStatus {
        let available = self.durable.is_available();
        StorageStatus {
            available,
            using_memory: !available || self.table.is_degraded(),
        }
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Vec<Resume>) -> R) -> CoreResult<R> {
        let (out, written) = self.table.update(&self.durable, |resumes| {
            self.settle(resumes);
            f(resumes)
        });

        match written {
            Ok(()) => Ok(out),
            Err(CoreError::Storage(source)) => {
                tracing::error!(error = %source, "failed to save to local storage, change kept in memory");
                Err(CoreError::NotDurable { source })
            }
            Err(e) => Err(e),
        }
    }

    /// Restores the envelope invariants of loaded resumes.
    fn settle(&self, resumes: &mut [Resume]) {
        let now = now_millis();
        let prefix = &self.config().local_id_prefix;
        for resume in resumes {
            if !resume.id.is_locally_minted(prefix) {
                resume.origin = Origin::Remote;
            }
            resume.normalize_timestamps(now);
        }
    }
}

fn checked_title(title: &str) -> CoreResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CoreError::invalid_input("title must not be empty"));
    }
    Ok(title.to_string())
}
