//! redb-backed record store.
//!
//! Tables:
//! - `people`: id -> postcard-encoded [`Person`]
//! - `national_ids`: national ID digits -> id (uniqueness index)
//! - `meta`: `next_id` counter
//!
//! Every mutation runs in one write transaction; an early return drops the
//! transaction uncommitted.

use super::PersonStore;
use crate::error::RegistryError;
use crate::person::{NationalId, NewPerson, Person, PersonId, by_name};
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::path::Path;

const PEOPLE: TableDefinition<u64, &[u8]> = TableDefinition::new("people");
const NATIONAL_IDS: TableDefinition<&str, u64> = TableDefinition::new("national_ids");
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_ID: &str = "next_id";

pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

fn decode(bytes: &[u8]) -> Result<Person, RegistryError> {
    postcard::from_bytes(bytes).map_err(RegistryError::from)
}

impl RedbStore {
    /// Open or create the database at `path` and make sure all tables exist.
    pub fn open(path: &Path) -> Result<Self, RegistryError> {
        let db = Database::create(path)?;
        let txn = db.begin_write()?;
        {
            txn.open_table(PEOPLE)?;
            txn.open_table(NATIONAL_IDS)?;
            txn.open_table(META)?;
        }
        txn.commit()?;
        Ok(Self { db })
    }
}

impl PersonStore for RedbStore {
    fn insert(&mut self, person: NewPerson, now: DateTime<Utc>) -> Result<Person, RegistryError> {
        let txn = self.db.begin_write()?;
        let person = {
            let mut index = txn.open_table(NATIONAL_IDS)?;
            if index.get(person.national_id.as_str())?.is_some() {
                return Err(RegistryError::duplicate_id(person.national_id.formatted()));
            }

            let mut meta = txn.open_table(META)?;
            let id = meta.get(NEXT_ID)?.map(|guard| guard.value()).unwrap_or(1);
            meta.insert(NEXT_ID, id + 1)?;

            let person = Person::from_new(PersonId(id), person, now);
            let bytes = postcard::to_allocvec(&person)?;
            let mut people = txn.open_table(PEOPLE)?;
            people.insert(id, bytes.as_slice())?;
            index.insert(person.national_id.as_str(), id)?;
            person
        };
        txn.commit()?;
        Ok(person)
    }

    fn get(&self, id: PersonId) -> Result<Option<Person>, RegistryError> {
        let txn = self.db.begin_read()?;
        let people = txn.open_table(PEOPLE)?;
        match people.get(id.0)? {
            Some(guard) => decode(guard.value()).map(Some),
            None => Ok(None),
        }
    }

    fn find_by_national_id(
        &self,
        national_id: &NationalId,
    ) -> Result<Option<Person>, RegistryError> {
        let txn = self.db.begin_read()?;
        let index = txn.open_table(NATIONAL_IDS)?;
        let Some(id) = index.get(national_id.as_str())?.map(|guard| guard.value()) else {
            return Ok(None);
        };
        let people = txn.open_table(PEOPLE)?;
        match people.get(id)? {
            Some(guard) => decode(guard.value()).map(Some),
            None => Ok(None),
        }
    }

    fn replace(&mut self, person: Person) -> Result<Person, RegistryError> {
        let txn = self.db.begin_write()?;
        {
            let mut people = txn.open_table(PEOPLE)?;
            let previous = match people.get(person.id.0)? {
                Some(guard) => decode(guard.value())?,
                None => return Err(RegistryError::not_found(person.id)),
            };

            if previous.national_id != person.national_id {
                let mut index = txn.open_table(NATIONAL_IDS)?;
                if index.get(person.national_id.as_str())?.is_some() {
                    return Err(RegistryError::duplicate_id(person.national_id.formatted()));
                }
                index.remove(previous.national_id.as_str())?;
                index.insert(person.national_id.as_str(), person.id.0)?;
            }

            let bytes = postcard::to_allocvec(&person)?;
            people.insert(person.id.0, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(person)
    }

    fn remove(&mut self, id: PersonId) -> Result<Person, RegistryError> {
        let txn = self.db.begin_write()?;
        let person = {
            let mut people = txn.open_table(PEOPLE)?;
            let person = match people.get(id.0)? {
                Some(guard) => decode(guard.value())?,
                None => return Err(RegistryError::not_found(id)),
            };
            people.remove(id.0)?;
            let mut index = txn.open_table(NATIONAL_IDS)?;
            index.remove(person.national_id.as_str())?;
            person
        };
        txn.commit()?;
        Ok(person)
    }

    fn scan(&self) -> Result<Vec<Person>, RegistryError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(PEOPLE)?;
        let mut people = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            people.push(decode(value.value())?);
        }
        people.sort_by(by_name);
        Ok(people)
    }

    fn len(&self) -> Result<usize, RegistryError> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(PEOPLE)?;
        Ok(table.len()? as usize)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::contract;
    use tempfile::TempDir;

    #[test]
    fn redb_store_contract() {
        let mut dirs: Vec<TempDir> = Vec::new();
        contract::run_all(|| {
            let dir = tempfile::tempdir().unwrap();
            let store = RedbStore::open(&dir.path().join("roster.redb")).unwrap();
            dirs.push(dir);
            Box::new(store) as Box<dyn PersonStore>
        });
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.redb");

        let ana = {
            let mut store = RedbStore::open(&path).unwrap();
            store
                .insert(contract::new_person("ana", "11111111111"), contract::now())
                .unwrap()
        };

        let mut store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get(ana.id).unwrap(), Some(ana.clone()));

        let next = store
            .insert(contract::new_person("bia", "22222222222"), contract::now())
            .unwrap();
        assert!(next.id > ana.id);
    }

    #[test]
    fn duplicate_insert_does_not_advance_counter() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RedbStore::open(&dir.path().join("roster.redb")).unwrap();
        let first = store
            .insert(contract::new_person("ana", "11111111111"), contract::now())
            .unwrap();
        assert!(store
            .insert(contract::new_person("bia", "11111111111"), contract::now())
            .is_err());
        let second = store
            .insert(contract::new_person("cris", "22222222222"), contract::now())
            .unwrap();
        assert_eq!(second.id.0, first.id.0 + 1);
    }
}
