//! # Registry
//!
//! Service facade over a [`PersonStore`]: validated creation, one update
//! operation per field, deletion, and every filter, aggregate and export of
//! the stored set.
//!
//! The registry never reads the clock. Mutations take `now` (timestamps) and
//! derivations take `today` (ages, cutoffs).

use crate::derive::MeanAge;
use crate::error::{FieldErrors, RegistryError, ValidationError};
use crate::export::{self, ExportFile, ExportFormat};
use crate::person::{NationalId, Person, PersonId, Sex};
use crate::query;
use crate::seed;
use crate::stats::Statistics;
use crate::storage::{Backend, MemoryStore, PersonStore};
use crate::validate::{self, PersonForm};
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

// =============================================================================
// EDITABLE FIELDS
// =============================================================================

/// A single editable attribute of a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonField {
    GivenName,
    FamilyName,
    BirthDate,
    Sex,
    NationalId,
}

impl PersonField {
    pub const ALL: [PersonField; 5] = [
        PersonField::GivenName,
        PersonField::FamilyName,
        PersonField::BirthDate,
        PersonField::Sex,
        PersonField::NationalId,
    ];

    /// Field key used in validation feedback.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::GivenName => "given_name",
            Self::FamilyName => "family_name",
            Self::BirthDate => "birth_date",
            Self::Sex => "sex",
            Self::NationalId => "national_id",
        }
    }
}

impl FromStr for PersonField {
    type Err = RegistryError;

    /// Accepts `given_name` and `given-name` spellings.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key = raw.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|field| field.key() == key)
            .ok_or_else(|| {
                FieldErrors::single(
                    "field",
                    &ValidationError::UnknownField {
                        raw: raw.to_string(),
                    },
                )
                .into()
            })
    }
}

impl fmt::Display for PersonField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

fn owned(people: Vec<&Person>) -> Vec<Person> {
    people.into_iter().cloned().collect()
}

pub struct Registry {
    store: Box<dyn PersonStore>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").finish_non_exhaustive()
    }
}

impl Registry {
    pub fn new(store: Box<dyn PersonStore>) -> Self {
        Self { store }
    }

    /// A registry backed by a fresh [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Open a persistent registry.
    pub fn open(backend: Backend, path: &Path) -> Result<Self, RegistryError> {
        Ok(Self::new(backend.open(path)?))
    }

    pub fn count(&self) -> Result<usize, RegistryError> {
        self.store.len()
    }

    // -------------------------------------------------------------------------
    // CRUD
    // -------------------------------------------------------------------------

    /// Validate a full form and store the result.
    pub fn create(
        &mut self,
        form: &PersonForm,
        now: DateTime<Utc>,
    ) -> Result<Person, RegistryError> {
        let person = form.validate()?;
        self.store.insert(person, now)
    }

    /// Direct lookup. Unknown ids are an error, never a default.
    pub fn get(&self, id: PersonId) -> Result<Person, RegistryError> {
        self.store
            .get(id)?
            .ok_or_else(|| RegistryError::not_found(id))
    }

    /// Lookup by raw national ID input (punctuation allowed).
    pub fn find_by_national_id(&self, raw: &str) -> Result<Option<Person>, RegistryError> {
        let national_id =
            NationalId::parse(raw).map_err(|e| FieldErrors::single("national_id", &e))?;
        self.store.find_by_national_id(&national_id)
    }

    /// Irreversibly remove a record, returning it.
    pub fn delete(&mut self, id: PersonId) -> Result<Person, RegistryError> {
        self.store.remove(id)
    }

    fn edit<T>(
        &mut self,
        id: PersonId,
        field: PersonField,
        value: Result<T, ValidationError>,
        now: DateTime<Utc>,
        apply: impl FnOnce(&mut Person, T),
    ) -> Result<Person, RegistryError> {
        let mut person = self.get(id)?;
        let value = value.map_err(|e| FieldErrors::single(field.key(), &e))?;
        apply(&mut person, value);
        person.updated_at = now;
        self.store.replace(person)
    }

    pub fn update_given_name(
        &mut self,
        id: PersonId,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<Person, RegistryError> {
        self.edit(id, PersonField::GivenName, validate::validate_name(raw), now, |p, v| {
            p.given_name = v;
        })
    }

    pub fn update_family_name(
        &mut self,
        id: PersonId,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<Person, RegistryError> {
        self.edit(id, PersonField::FamilyName, validate::validate_name(raw), now, |p, v| {
            p.family_name = v;
        })
    }

    pub fn update_birth_date(
        &mut self,
        id: PersonId,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<Person, RegistryError> {
        self.edit(id, PersonField::BirthDate, validate::parse_date(raw), now, |p, v| {
            p.birth_date = v;
        })
    }

    pub fn update_sex(
        &mut self,
        id: PersonId,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<Person, RegistryError> {
        self.edit(id, PersonField::Sex, validate::parse_sex(raw), now, |p, v| {
            p.sex = v;
        })
    }

    /// Uniqueness is re-checked by the store, excluding the record itself.
    pub fn update_national_id(
        &mut self,
        id: PersonId,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<Person, RegistryError> {
        self.edit(id, PersonField::NationalId, NationalId::parse(raw), now, |p, v| {
            p.national_id = v;
        })
    }

    /// Dispatch to the single-field update for `field`.
    pub fn update_field(
        &mut self,
        id: PersonId,
        field: PersonField,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<Person, RegistryError> {
        match field {
            PersonField::GivenName => self.update_given_name(id, raw, now),
            PersonField::FamilyName => self.update_family_name(id, raw, now),
            PersonField::BirthDate => self.update_birth_date(id, raw, now),
            PersonField::Sex => self.update_sex(id, raw, now),
            PersonField::NationalId => self.update_national_id(id, raw, now),
        }
    }

    // -------------------------------------------------------------------------
    // FILTERS
    // -------------------------------------------------------------------------

    /// Every record, name-ordered.
    pub fn list(&self) -> Result<Vec<Person>, RegistryError> {
        self.store.scan()
    }

    pub fn search(&self, query: &str) -> Result<Vec<Person>, RegistryError> {
        let people = self.store.scan()?;
        Ok(owned(query::search(&people, query)))
    }

    pub fn by_sex(&self, sex: Sex) -> Result<Vec<Person>, RegistryError> {
        let people = self.store.scan()?;
        Ok(owned(query::by_sex(&people, sex)))
    }

    pub fn oldest(&self) -> Result<Option<Person>, RegistryError> {
        let people = self.store.scan()?;
        Ok(query::oldest(&people).cloned())
    }

    pub fn youngest(&self) -> Result<Option<Person>, RegistryError> {
        let people = self.store.scan()?;
        Ok(query::youngest(&people).cloned())
    }

    pub fn minors(&self, today: NaiveDate) -> Result<Vec<Person>, RegistryError> {
        let people = self.store.scan()?;
        Ok(owned(query::minors(&people, today)))
    }

    pub fn adults(&self, today: NaiveDate) -> Result<Vec<Person>, RegistryError> {
        let people = self.store.scan()?;
        Ok(owned(query::adults(&people, today)))
    }

    pub fn above_average(&self, today: NaiveDate) -> Result<Vec<Person>, RegistryError> {
        let people = self.store.scan()?;
        Ok(owned(query::above_average(&people, today)))
    }

    /// `month` must be in 1..=12.
    pub fn by_birth_month(&self, month: u32) -> Result<Vec<Person>, RegistryError> {
        if !(1..=12).contains(&month) {
            return Err(FieldErrors::single(
                "month",
                &ValidationError::InvalidMonth {
                    raw: month.to_string(),
                },
            )
            .into());
        }
        let people = self.store.scan()?;
        Ok(owned(query::by_birth_month(&people, month)))
    }

    // -------------------------------------------------------------------------
    // AGGREGATES & EXPORT
    // -------------------------------------------------------------------------

    pub fn average_age(&self, today: NaiveDate) -> Result<MeanAge, RegistryError> {
        let people = self.store.scan()?;
        Ok(crate::derive::mean_age(&people, today))
    }

    pub fn statistics(&self, today: NaiveDate) -> Result<Statistics, RegistryError> {
        let people = self.store.scan()?;
        Ok(Statistics::compute(&people, today))
    }

    pub fn export(
        &self,
        format: ExportFormat,
        today: NaiveDate,
    ) -> Result<ExportFile, RegistryError> {
        let people = self.store.scan()?;
        export::export(&people, format, today)
    }

    /// Insert the demo data set, skipping national IDs already present.
    /// Returns how many records were created.
    pub fn seed(&mut self, now: DateTime<Utc>) -> Result<usize, RegistryError> {
        let mut created = 0;
        for form in seed::seed_forms() {
            let person = form.validate()?;
            if self.store.find_by_national_id(&person.national_id)?.is_some() {
                continue;
            }
            self.store.insert(person, now)?;
            created += 1;
        }
        Ok(created)
    }
}

// =============================================================================
// TESTS
// =============================================================================
