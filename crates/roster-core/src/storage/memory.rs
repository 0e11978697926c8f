//! In-memory record store.
//!
//! Uses `BTreeMap` for deterministic iteration. Doubles as the payload of the
//! snapshot file format.

use super::PersonStore;
use crate::error::RegistryError;
use crate::formats::Snapshot;
use crate::person::{NationalId, NewPerson, Person, PersonId, by_name};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct MemoryStore {
    /// Record storage: PersonId -> Person
    people: BTreeMap<PersonId, Person>,

    /// Uniqueness index: national ID digits -> PersonId
    national_ids: BTreeMap<NationalId, PersonId>,

    /// Next id to hand out. Ids are never reused.
    next_id: u64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            people: BTreeMap::new(),
            national_ids: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a snapshot, re-checking uniqueness.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, RegistryError> {
        let mut store = Self::new();
        for person in snapshot.people {
            if store.national_ids.contains_key(&person.national_id) {
                return Err(RegistryError::Snapshot(format!(
                    "national ID {} appears twice",
                    person.national_id
                )));
            }
            store.next_id = store.next_id.max(person.id.0 + 1);
            store.national_ids.insert(person.national_id.clone(), person.id);
            store.people.insert(person.id, person);
        }
        store.next_id = store.next_id.max(snapshot.next_id);
        Ok(store)
    }

    /// Capture the current contents, in id order.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            next_id: self.next_id,
            people: self.people.values().cloned().collect(),
        }
    }

    fn owner_of(&self, national_id: &NationalId) -> Option<PersonId> {
        self.national_ids.get(national_id).copied()
    }
}

impl PersonStore for MemoryStore {
    fn insert(&mut self, person: NewPerson, now: DateTime<Utc>) -> Result<Person, RegistryError> {
        if self.owner_of(&person.national_id).is_some() {
            return Err(RegistryError::duplicate_id(person.national_id.formatted()));
        }
        let id = PersonId(self.next_id);
        self.next_id += 1;

        let person = Person::from_new(id, person, now);
        self.national_ids.insert(person.national_id.clone(), id);
        self.people.insert(id, person.clone());
        Ok(person)
    }

    fn get(&self, id: PersonId) -> Result<Option<Person>, RegistryError> {
        Ok(self.people.get(&id).cloned())
    }

    fn find_by_national_id(
        &self,
        national_id: &NationalId,
    ) -> Result<Option<Person>, RegistryError> {
        Ok(self
            .owner_of(national_id)
            .and_then(|id| self.people.get(&id))
            .cloned())
    }

    fn replace(&mut self, person: Person) -> Result<Person, RegistryError> {
        let previous = self
            .people
            .get(&person.id)
            .map(|p| p.national_id.clone())
            .ok_or_else(|| RegistryError::not_found(person.id))?;

        if previous != person.national_id {
            if self.owner_of(&person.national_id).is_some() {
                return Err(RegistryError::duplicate_id(person.national_id.formatted()));
            }
            self.national_ids.remove(&previous);
            self.national_ids.insert(person.national_id.clone(), person.id);
        }
        self.people.insert(person.id, person.clone());
        Ok(person)
    }

    fn remove(&mut self, id: PersonId) -> Result<Person, RegistryError> {
        let person = self
            .people
            .remove(&id)
            .ok_or_else(|| RegistryError::not_found(id))?;
        self.national_ids.remove(&person.national_id);
        Ok(person)
    }

    fn scan(&self) -> Result<Vec<Person>, RegistryError> {
        let mut people: Vec<Person> = self.people.values().cloned().collect();
        people.sort_by(by_name);
        Ok(people)
    }

    fn len(&self) -> Result<usize, RegistryError> {
        Ok(self.people.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::contract;

    #[test]
    fn memory_store_contract() {
        contract::run_all(|| Box::new(MemoryStore::new()) as Box<dyn PersonStore>);
    }

    #[test]
    fn snapshot_round_trip_keeps_ids() {
        let mut store = MemoryStore::new();
        let a = store
            .insert(contract::new_person("ana", "11111111111"), contract::now())
            .unwrap();
        let b = store
            .insert(contract::new_person("bia", "22222222222"), contract::now())
            .unwrap();
        store.remove(a.id).unwrap();

        let restored = MemoryStore::from_snapshot(store.snapshot()).unwrap();
        assert_eq!(restored.len().unwrap(), 1);
        assert_eq!(restored.get(b.id).unwrap(), Some(b));

        let mut restored = restored;
        let c = restored
            .insert(contract::new_person("cris", "33333333333"), contract::now())
            .unwrap();
        assert_eq!(c.id, PersonId(3));
    }

    #[test]
    fn snapshot_with_duplicate_ids_is_rejected() {
        let mut store = MemoryStore::new();
        let a = store
            .insert(contract::new_person("ana", "11111111111"), contract::now())
            .unwrap();
        let mut snapshot = store.snapshot();
        let mut twin = a.clone();
        twin.id = PersonId(9);
        snapshot.people.push(twin);

        assert!(matches!(
            MemoryStore::from_snapshot(snapshot),
            Err(RegistryError::Snapshot(_))
        ));
    }

    #[test]
    fn replace_keeping_own_national_id() {
        let mut store = MemoryStore::new();
        let mut ana = store
            .insert(contract::new_person("ana", "11111111111"), contract::now())
            .unwrap();
        ana.given_name = "Ana Maria".into();
        store.replace(ana.clone()).unwrap();
        assert_eq!(store.get(ana.id).unwrap(), Some(ana));
    }
}
