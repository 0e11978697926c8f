//! # Query / Filter Layer
//!
//! Read-only views over a full record set. Results are ordered by given name
//! then family name unless a filter defines its own sort key.

use crate::derive::{adult_cutoff, mean_age};
use crate::person::{Person, Sex, by_name};
use crate::validate::{NATIONAL_ID_DIGITS, normalize_id};
use chrono::NaiveDate;
use std::cmp::Reverse;

fn sorted_by_name<'a>(people: impl Iterator<Item = &'a Person>) -> Vec<&'a Person> {
    let mut out: Vec<&Person> = people.collect();
    out.sort_by(|a, b| by_name(a, b));
    out
}

/// Every record, in default order.
pub fn all(people: &[Person]) -> Vec<&Person> {
    sorted_by_name(people.iter())
}

/// Exact match on sex.
pub fn by_sex(people: &[Person], sex: Sex) -> Vec<&Person> {
    sorted_by_name(people.iter().filter(|p| p.sex == sex))
}

/// Free-text search.
///
/// A query that normalizes to exactly 11 digits matches by national ID only.
/// Anything else matches records whose given or family name contains the
/// query, ignoring case. A blank query returns everything.
pub fn search<'a>(people: &'a [Person], query: &str) -> Vec<&'a Person> {
    let query = query.trim();
    if query.is_empty() {
        return all(people);
    }

    let digits = normalize_id(query);
    if digits.len() == NATIONAL_ID_DIGITS {
        return sorted_by_name(people.iter().filter(|p| p.national_id.as_str() == digits));
    }

    let needle = query.to_lowercase();
    sorted_by_name(people.iter().filter(|p| {
        p.given_name.to_lowercase().contains(&needle)
            || p.family_name.to_lowercase().contains(&needle)
    }))
}

/// Earliest birth date. Ties go to the first record in storage order.
pub fn oldest(people: &[Person]) -> Option<&Person> {
    people.iter().min_by_key(|p| p.birth_date)
}

/// Latest birth date. Ties go to the first record in storage order.
pub fn youngest(people: &[Person]) -> Option<&Person> {
    people.iter().min_by_key(|p| Reverse(p.birth_date))
}

/// Born strictly after the 18-year cutoff.
pub fn minors(people: &[Person], today: NaiveDate) -> Vec<&Person> {
    let cutoff = adult_cutoff(today);
    sorted_by_name(people.iter().filter(|p| p.birth_date > cutoff))
}

/// Born on or before the 18-year cutoff.
pub fn adults(people: &[Person], today: NaiveDate) -> Vec<&Person> {
    let cutoff = adult_cutoff(today);
    sorted_by_name(people.iter().filter(|p| p.birth_date <= cutoff))
}

/// Strictly older than the mean age, oldest first, ties by given name.
pub fn above_average(people: &[Person], today: NaiveDate) -> Vec<&Person> {
    let mean = mean_age(people, today);
    let mut out: Vec<(i32, &Person)> = people
        .iter()
        .map(|p| (p.age(today), p))
        .filter(|(age, _)| mean.is_below(*age))
        .collect();
    out.sort_by(|(age_a, a), (age_b, b)| {
        age_b
            .cmp(age_a)
            .then_with(|| a.given_name.cmp(&b.given_name))
    });
    out.into_iter().map(|(_, p)| p).collect()
}

/// Born in `month` (1..=12). Out-of-range months match nothing.
pub fn by_birth_month(people: &[Person], month: u32) -> Vec<&Person> {
    sorted_by_name(people.iter().filter(|p| p.birth_month() == month))
}

// =============================================================================
// TESTS
// =============================================================================
