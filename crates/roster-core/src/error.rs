//! # Errors
//!
//! Two layers of failure:
//!
//! - [`ValidationError`]: a single raw input field could not be turned into
//!   a valid entity value. Always recovered close to the input and reported
//!   back per field through [`FieldErrors`].
//! - [`RegistryError`]: an operation against the stored record set failed.

use crate::PersonId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// FIELD VALIDATION
// =============================================================================

/// A raw input value was rejected by the validation layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The national ID did not normalize to exactly 11 digits.
    #[error("national ID must contain exactly 11 digits, found {digits}")]
    InvalidId { digits: usize },

    /// A name field was blank after trimming.
    #[error("name cannot be empty")]
    EmptyName,

    /// The date matched neither `dd/mm/yyyy` nor `yyyy-mm-dd`.
    #[error("invalid date '{raw}': expected dd/mm/yyyy or yyyy-mm-dd")]
    InvalidDate { raw: String },

    /// The sex code was not one of `M` / `F`.
    #[error("invalid sex '{raw}': expected M or F")]
    InvalidSex { raw: String },

    /// The month was not an integer in 1..=12.
    #[error("invalid month '{raw}': expected a number from 1 to 12")]
    InvalidMonth { raw: String },

    /// The name did not match any editable field.
    #[error("unknown field '{raw}'")]
    UnknownField { raw: String },
}

/// Per-field validation feedback, keyed by field name.
///
/// Ordered by field name so rendered feedback is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feedback for exactly one field.
    #[must_use]
    pub fn single(field: &'static str, error: &ValidationError) -> Self {
        let mut errors = Self::new();
        errors.push(field, error);
        errors
    }

    /// Record a failure for `field`. A later failure for the same field wins.
    pub fn push(&mut self, field: &'static str, error: &ValidationError) {
        self.0.insert(field, error.to_string());
    }

    /// Unwrap a field result, recording its error and yielding `None` on failure.
    pub fn check<T>(
        &mut self,
        field: &'static str,
        result: Result<T, ValidationError>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.push(field, &error);
                None
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The message recorded for `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid input")?;
        for (i, (field, message)) in self.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{field}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

// =============================================================================
// REGISTRY OPERATIONS
// =============================================================================

/// Failure of an operation against the record store.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// One or more input fields were rejected.
    #[error(transparent)]
    Invalid(#[from] FieldErrors),

    /// Another record already holds this national ID.
    #[error("national ID {national_id} is already registered")]
    DuplicateId { national_id: String },

    /// No record exists with this identifier.
    #[error("person {id} not found")]
    NotFound { id: PersonId },

    /// An export was requested while the registry holds no records.
    #[error("there are no records to export")]
    EmptyExport,

    /// The backing database failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// A snapshot file was unreadable or had the wrong header.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// Encoding a record or an export payload failed.
    #[error("encoding error: {0}")]
    Encode(String),
}

impl RegistryError {
    pub fn duplicate_id(national_id: impl Into<String>) -> Self {
        Self::DuplicateId {
            national_id: national_id.into(),
        }
    }

    pub fn not_found(id: PersonId) -> Self {
        Self::NotFound { id }
    }

    pub fn storage(message: impl fmt::Display) -> Self {
        Self::Storage(message.to_string())
    }

    pub fn encode(message: impl fmt::Display) -> Self {
        Self::Encode(message.to_string())
    }
}

macro_rules! storage_error_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for RegistryError {
                fn from(error: $source) -> Self {
                    Self::storage(error)
                }
            }
        )*
    };
}

storage_error_from!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
    std::io::Error,
);

impl From<postcard::Error> for RegistryError {
    fn from(error: postcard::Error) -> Self {
        Self::encode(error)
    }
}

// =============================================================================
// TESTS
// =============================================================================
