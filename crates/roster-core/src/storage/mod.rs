//! # Storage Module
//!
//! Backends for the person record set.
//!
//! - [`MemoryStore`]: `BTreeMap`-backed, the reference implementation
//! - [`FileStore`]: a `MemoryStore` persisted as a snapshot file on every write
//! - [`RedbStore`]: redb embedded database (ACID, copy-on-write B-trees)
//!
//! All backends enforce national ID uniqueness themselves.

mod file_store;
mod memory;
mod redb_store;

pub use file_store::FileStore;
pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::error::RegistryError;
use crate::person::{NationalId, NewPerson, Person, PersonId};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// =============================================================================
// PERSONSTORE TRAIT
// =============================================================================

/// The record store consumed by the registry.
///
/// Writes are single operations: the last committed write wins, there is no
/// versioning.
pub trait PersonStore: Send + Sync {
    /// Assign an id and store a new record. Both timestamps are set to `now`.
    ///
    /// Fails with `DuplicateId` if the national ID is taken.
    fn insert(&mut self, person: NewPerson, now: DateTime<Utc>) -> Result<Person, RegistryError>;

    /// Lookup by storage id.
    fn get(&self, id: PersonId) -> Result<Option<Person>, RegistryError>;

    /// Lookup by national ID.
    fn find_by_national_id(
        &self,
        national_id: &NationalId,
    ) -> Result<Option<Person>, RegistryError>;

    /// Overwrite an existing record (matched by `person.id`).
    ///
    /// Fails with `NotFound` for unknown ids and `DuplicateId` if the new
    /// national ID belongs to another record.
    fn replace(&mut self, person: Person) -> Result<Person, RegistryError>;

    /// Delete a record and return it. Irreversible.
    fn remove(&mut self, id: PersonId) -> Result<Person, RegistryError>;

    /// Every record, ordered by given name, family name, id.
    fn scan(&self) -> Result<Vec<Person>, RegistryError>;

    /// Number of stored records.
    fn len(&self) -> Result<usize, RegistryError>;

    fn is_empty(&self) -> Result<bool, RegistryError> {
        Ok(self.len()? == 0)
    }
}

// =============================================================================
// BACKEND SELECTION
// =============================================================================

/// Persistent backend kinds selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Snapshot file (postcard + header), rewritten on every change.
    File,
    /// redb database.
    Redb,
}

impl Backend {
    /// Open (or create) a store of this kind at `path`.
    pub fn open(self, path: &Path) -> Result<Box<dyn PersonStore>, RegistryError> {
        Ok(match self {
            Self::File => Box::new(FileStore::open(path)?),
            Self::Redb => Box::new(RedbStore::open(path)?),
        })
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Redb => "redb",
        }
    }
}

impl FromStr for Backend {
    type Err = RegistryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "file" => Ok(Self::File),
            "redb" => Ok(Self::Redb),
            other => Err(RegistryError::storage(format!(
                "unknown backend '{other}': expected file or redb"
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SHARED CONTRACT TESTS
// =============================================================================


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names() {
        assert_eq!("file".parse::<Backend>().ok(), Some(Backend::File));
        assert_eq!("redb".parse::<Backend>().ok(), Some(Backend::Redb));
        assert!("sqlite".parse::<Backend>().is_err());
        assert_eq!(Backend::Redb.to_string(), "redb");
    }
}
