//! # Validation & Normalization
//!
//! Turns raw user input into entity field values, or rejects it.
//!
//! Each function handles exactly one field so that single-field edits can
//! re-validate only what they touch. [`PersonForm`] runs all of them and
//! collects every failure at once.

use crate::error::{FieldErrors, ValidationError};
use crate::person::{NationalId, NewPerson, Sex};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of digits in a national ID.
pub const NATIONAL_ID_DIGITS: usize = 11;

/// Accepted birth date layouts, tried in this order.
pub const DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];

/// Strip every non-digit character. Never fails.
#[must_use]
pub fn normalize_id(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Normalize, then require exactly 11 digits.
pub fn validate_id(raw: &str) -> Result<String, ValidationError> {
    let digits = normalize_id(raw);
    if digits.len() != NATIONAL_ID_DIGITS {
        return Err(ValidationError::InvalidId {
            digits: digits.len(),
        });
    }
    Ok(digits)
}

/// Trim, reject blanks, and title-case the rest.
pub fn validate_name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(title_case(trimmed))
}

/// Uppercase the first letter of each whitespace-separated word and lowercase
/// the rest. Whitespace is kept as written.
#[must_use]
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word_start = true;
    for c in text.chars() {
        if c.is_whitespace() {
            word_start = true;
            out.push(c);
        } else if word_start {
            word_start = false;
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Parse `dd/mm/yyyy`, falling back to `yyyy-mm-dd`.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| ValidationError::InvalidDate {
            raw: raw.to_string(),
        })
}

pub fn parse_sex(raw: &str) -> Result<Sex, ValidationError> {
    raw.parse()
}

/// Parse a calendar month number, 1..=12.
pub fn parse_month(raw: &str) -> Result<u32, ValidationError> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|month| (1..=12).contains(month))
        .ok_or_else(|| ValidationError::InvalidMonth {
            raw: raw.to_string(),
        })
}

// =============================================================================
// FORM
// =============================================================================

/// Raw create-form input, exactly as submitted.
///
/// Missing fields deserialize as empty strings and fail validation like any
/// other blank input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonForm {
    pub given_name: String,
    pub family_name: String,
    pub birth_date: String,
    pub sex: String,
    pub national_id: String,
}

impl PersonForm {
    pub fn new(
        given_name: impl Into<String>,
        family_name: impl Into<String>,
        birth_date: impl Into<String>,
        sex: impl Into<String>,
        national_id: impl Into<String>,
    ) -> Self {
        Self {
            given_name: given_name.into(),
            family_name: family_name.into(),
            birth_date: birth_date.into(),
            sex: sex.into(),
            national_id: national_id.into(),
        }
    }

    /// Validate every field, reporting all failures together.
    pub fn validate(&self) -> Result<NewPerson, FieldErrors> {
        let mut errors = FieldErrors::new();
        let given_name = errors.check("given_name", validate_name(&self.given_name));
        let family_name = errors.check("family_name", validate_name(&self.family_name));
        let birth_date = errors.check("birth_date", parse_date(&self.birth_date));
        let sex = errors.check("sex", parse_sex(&self.sex));
        let national_id = errors.check("national_id", NationalId::parse(&self.national_id));

        match (given_name, family_name, birth_date, sex, national_id) {
            (
                Some(given_name),
                Some(family_name),
                Some(birth_date),
                Some(sex),
                Some(national_id),
            ) => Ok(NewPerson {
                given_name,
                family_name,
                birth_date,
                sex,
                national_id,
            }),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
