//! # Derivation Engine
//!
//! Pure functions computing values that are never stored: age, display ID,
//! age bracket, date cutoffs and the mean age.
//!
//! "Today" is always an argument. Ages are integers; the mean age is kept in
//! integer tenths ([`MeanAge`]) and only turned into a float at the edge.

use crate::person::Person;
use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::fmt;

/// Age at which a person stops being a minor.
pub const ADULT_AGE: i32 = 18;

/// Completed years between `birth` and `today`.
///
/// Returns 0 when there is no birth date.
#[must_use]
pub fn compute_age(birth: Option<NaiveDate>, today: NaiveDate) -> i32 {
    let Some(birth) = birth else {
        return 0;
    };
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Left-pad to 11 digits and group as `NNN.NNN.NNN-NN`.
#[must_use]
pub fn format_id(digits: &str) -> String {
    let padded: Vec<char> = format!("{digits:0>11}").chars().collect();
    let part = |from: usize, to: usize| -> String { padded[from..to].iter().collect() };
    format!("{}.{}.{}-{}", part(0, 3), part(3, 6), part(6, 9), part(9, 11))
}

/// The same month and day `years` earlier.
///
/// Feb 29 lands on Feb 28 when the target year is not a leap year.
#[must_use]
pub fn years_ago(from: NaiveDate, years: i32) -> NaiveDate {
    let year = from.year() - years;
    from.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))
        .unwrap_or(NaiveDate::MIN)
}

/// Birth date threshold separating minors from adults on `today`.
///
/// Born strictly after the cutoff: minor. On or before: adult.
#[must_use]
pub fn adult_cutoff(today: NaiveDate) -> NaiveDate {
    years_ago(today, ADULT_AGE)
}

// =============================================================================
// AGE BRACKETS
// =============================================================================

/// Fixed, non-overlapping age buckets used for histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgeBracket {
    /// 0-17
    Minor,
    /// 18-29
    YoungAdult,
    /// 30-49
    Adult,
    /// 50+
    Senior,
}

impl AgeBracket {
    /// Every bracket, youngest first.
    pub const ALL: [AgeBracket; 4] = [
        AgeBracket::Minor,
        AgeBracket::YoungAdult,
        AgeBracket::Adult,
        AgeBracket::Senior,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Minor => "0-17",
            Self::YoungAdult => "18-29",
            Self::Adult => "30-49",
            Self::Senior => "50+",
        }
    }

    /// Position in [`AgeBracket::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for AgeBracket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Bucket an age. Negative ages (future birth dates) count as `0-17`.
#[must_use]
pub fn age_bracket(age: i32) -> AgeBracket {
    match age {
        i32::MIN..=17 => AgeBracket::Minor,
        18..=29 => AgeBracket::YoungAdult,
        30..=49 => AgeBracket::Adult,
        _ => AgeBracket::Senior,
    }
}

// =============================================================================
// MEAN AGE
// =============================================================================

/// Mean age rounded to one decimal place, held as integer tenths.
///
/// The mean is taken in `f64` and rounded from the exact binary value it
/// holds, ties to even. `41.45` is stored slightly above the tie and rounds
/// up; `0.35` is stored slightly below and rounds down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeanAge {
    tenths: i64,
}

#[allow(clippy::float_arithmetic)]
fn float_mean(sum: i64, count: i64) -> f64 {
    sum as f64 / count as f64
}

/// `mean` to one decimal, as integer tenths.
fn round_to_tenths(mean: f64) -> i64 {
    // float formatting rounds the exact binary value, ties to even
    format!("{mean:.1}").replace('.', "").parse().unwrap_or_default()
}

impl MeanAge {
    /// Mean of the given ages; zero for an empty input.
    pub fn of(ages: impl IntoIterator<Item = i32>) -> Self {
        let (sum, count) = ages
            .into_iter()
            .fold((0_i64, 0_i64), |(sum, count), age| {
                (sum + i64::from(age), count + 1)
            });
        if count == 0 {
            return Self::default();
        }
        Self {
            tenths: round_to_tenths(float_mean(sum, count)),
        }
    }

    #[must_use]
    pub const fn from_tenths(tenths: i64) -> Self {
        Self { tenths }
    }

    #[must_use]
    pub const fn tenths(self) -> i64 {
        self.tenths
    }

    /// Strict comparison against a whole-year age.
    #[must_use]
    pub fn is_below(self, age: i32) -> bool {
        i64::from(age) * 10 > self.tenths
    }

    #[must_use]
    #[allow(clippy::float_arithmetic)]
    pub fn as_f64(self) -> f64 {
        self.tenths as f64 / 10.0
    }
}

impl fmt::Display for MeanAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.tenths < 0 { "-" } else { "" };
        let abs = self.tenths.unsigned_abs();
        write!(f, "{sign}{}.{}", abs / 10, abs % 10)
    }
}

impl Serialize for MeanAge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

/// Mean age of `records` on `today`.
pub fn mean_age<'a>(records: impl IntoIterator<Item = &'a Person>, today: NaiveDate) -> MeanAge {
    MeanAge::of(records.into_iter().map(|p| p.age(today)))
}

/// Mean age of `records` on `today`, rounded to one decimal; `0.0` when empty.
pub fn average_age<'a>(records: impl IntoIterator<Item = &'a Person>, today: NaiveDate) -> f64 {
    mean_age(records, today).as_f64()
}

// =============================================================================
// TESTS
// =============================================================================
