//! # Person Entity
//!
//! The single record type held by the registry, and its value types.
//!
//! Invariants upheld by construction:
//! - `national_id` is exactly 11 ASCII digits (see [`NationalId`])
//! - names are non-empty and already title-cased (enforced by `validate`)
//! - `birth_date` is a real calendar date

use crate::derive::{self, AgeBracket};
use crate::error::ValidationError;
use crate::validate;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Storage identifier of a person record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub u64);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// National ID number: exactly 11 digits, stored without punctuation.
///
/// Only the digit count is checked, never a checksum.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NationalId(String);

impl NationalId {
    /// Normalize and validate raw input (punctuation is allowed).
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        validate::validate_id(raw).map(Self)
    }

    /// The bare 11-digit string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display form, `NNN.NNN.NNN-NN`.
    #[must_use]
    pub fn formatted(&self) -> String {
        derive::format_id(&self.0)
    }
}

impl TryFrom<String> for NationalId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NationalId> for String {
    fn from(id: NationalId) -> Self {
        id.0
    }
}

impl fmt::Display for NationalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

// =============================================================================
// SEX
// =============================================================================

/// Sex of a registered person, stored as a one-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    /// Every variant, in display order.
    pub const ALL: [Sex; 2] = [Sex::Male, Sex::Female];

    /// One-letter storage code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }

    /// Long-form label used in listings and exports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl FromStr for Sex {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "M" => Ok(Self::Male),
            "F" => Ok(Self::Female),
            _ => Err(ValidationError::InvalidSex {
                raw: raw.to_string(),
            }),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// Validated fields of a person that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
    pub given_name: String,
    pub family_name: String,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    pub national_id: NationalId,
}

/// A stored person record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub given_name: String,
    pub family_name: String,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    pub national_id: NationalId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Person {
    /// Materialize a new record; both timestamps are set to `now`.
    #[must_use]
    pub fn from_new(id: PersonId, new: NewPerson, now: DateTime<Utc>) -> Self {
        Self {
            id,
            given_name: new.given_name,
            family_name: new.family_name,
            birth_date: new.birth_date,
            sex: new.sex,
            national_id: new.national_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Age in completed years on `today`.
    #[must_use]
    pub fn age(&self, today: NaiveDate) -> i32 {
        derive::compute_age(Some(self.birth_date), today)
    }

    #[must_use]
    pub fn age_bracket(&self, today: NaiveDate) -> AgeBracket {
        derive::age_bracket(self.age(today))
    }

    /// Birth month, 1..=12.
    #[must_use]
    pub fn birth_month(&self) -> u32 {
        self.birth_date.month()
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.given_name, self.family_name, self.national_id
        )
    }
}

/// Default listing order: given name, then family name, then id.
#[must_use]
pub fn by_name(a: &Person, b: &Person) -> Ordering {
    a.given_name
        .cmp(&b.given_name)
        .then_with(|| a.family_name.cmp(&b.family_name))
        .then_with(|| a.id.cmp(&b.id))
}

// =============================================================================
// TESTS
// =============================================================================
