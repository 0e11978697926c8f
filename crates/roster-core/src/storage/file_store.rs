//! Snapshot-file record store.
//!
//! Holds a [`MemoryStore`] and rewrites the whole snapshot after every
//! successful mutation (write to a sibling temp file, then rename).

use super::{MemoryStore, PersonStore};
use crate::error::RegistryError;
use crate::formats::{decode_snapshot, encode_snapshot};
use crate::person::{NationalId, NewPerson, Person, PersonId};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl FileStore {
    /// Load `path` if it exists, otherwise start empty (nothing is written
    /// until the first change or an explicit [`FileStore::flush`]).
    pub fn open(path: &Path) -> Result<Self, RegistryError> {
        let inner = if path.exists() {
            let bytes = fs::read(path)?;
            MemoryStore::from_snapshot(decode_snapshot(&bytes)?)?
        } else {
            MemoryStore::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current contents to disk.
    pub fn flush(&self) -> Result<(), RegistryError> {
        let bytes = encode_snapshot(&self.inner.snapshot())?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply a mutation to a scratch copy; commit and flush only on success.
    fn mutate<T>(
        &mut self,
        op: impl FnOnce(&mut MemoryStore) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let mut next = self.inner.clone();
        let out = op(&mut next)?;
        let previous = std::mem::replace(&mut self.inner, next);
        if let Err(e) = self.flush() {
            self.inner = previous;
            return Err(e);
        }
        Ok(out)
    }
}

impl PersonStore for FileStore {
    fn insert(&mut self, person: NewPerson, now: DateTime<Utc>) -> Result<Person, RegistryError> {
        self.mutate(|store| store.insert(person, now))
    }

    fn get(&self, id: PersonId) -> Result<Option<Person>, RegistryError> {
        self.inner.get(id)
    }

    fn find_by_national_id(
        &self,
        national_id: &NationalId,
    ) -> Result<Option<Person>, RegistryError> {
        self.inner.find_by_national_id(national_id)
    }

    fn replace(&mut self, person: Person) -> Result<Person, RegistryError> {
        self.mutate(|store| store.replace(person))
    }

    fn remove(&mut self, id: PersonId) -> Result<Person, RegistryError> {
        self.mutate(|store| store.remove(id))
    }

    fn scan(&self) -> Result<Vec<Person>, RegistryError> {
        self.inner.scan()
    }

    fn len(&self) -> Result<usize, RegistryError> {
        self.inner.len()
    }
}
