//! # Aggregation Layer
//!
//! Counts and histograms over a record set. Every histogram is exhaustive:
//! all buckets are present and the counts sum to the total.

use crate::derive::{AgeBracket, MeanAge, adult_cutoff, mean_age};
use crate::person::{Person, Sex};
use crate::query;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// English month names, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SexCounts {
    pub male: usize,
    pub female: usize,
}

impl SexCounts {
    #[must_use]
    pub fn get(&self, sex: Sex) -> usize {
        match sex {
            Sex::Male => self.male,
            Sex::Female => self.female,
        }
    }
}

/// Minor / adult split and the cutoff date it was computed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MajorityCounts {
    pub minors: usize,
    pub adults: usize,
    pub cutoff: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BracketCount {
    pub bracket: AgeBracket,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub month: u32,
    pub name: &'static str,
    pub count: usize,
}

pub fn count_by_sex(people: &[Person]) -> SexCounts {
    people.iter().fold(SexCounts::default(), |mut counts, p| {
        match p.sex {
            Sex::Male => counts.male += 1,
            Sex::Female => counts.female += 1,
        }
        counts
    })
}

pub fn majority_counts(people: &[Person], today: NaiveDate) -> MajorityCounts {
    let cutoff = adult_cutoff(today);
    let minors = people.iter().filter(|p| p.birth_date > cutoff).count();
    MajorityCounts {
        minors,
        adults: people.len() - minors,
        cutoff,
    }
}

/// Four buckets, youngest first.
pub fn age_histogram(people: &[Person], today: NaiveDate) -> Vec<BracketCount> {
    let mut counts = [0_usize; 4];
    for person in people {
        counts[person.age_bracket(today).index()] += 1;
    }
    AgeBracket::ALL
        .iter()
        .map(|&bracket| BracketCount {
            bracket,
            count: counts[bracket.index()],
        })
        .collect()
}

/// Twelve buckets indexed by month number, zero-filled.
pub fn month_histogram(people: &[Person]) -> Vec<MonthCount> {
    let mut counts = [0_usize; 12];
    for person in people {
        counts[person.birth_date.month0() as usize] += 1;
    }
    MONTH_NAMES
        .iter()
        .zip(counts)
        .zip(1_u32..)
        .map(|((&name, count), month)| MonthCount { month, name, count })
        .collect()
}

// =============================================================================
// SUMMARY
// =============================================================================

/// Every aggregate in one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub by_sex: SexCounts,
    pub mean_age: MeanAge,
    pub majority: MajorityCounts,
    pub age_brackets: Vec<BracketCount>,
    pub oldest: Option<Person>,
    pub youngest: Option<Person>,
    pub birth_months: Vec<MonthCount>,
}

impl Statistics {
    pub fn compute(people: &[Person], today: NaiveDate) -> Self {
        Self {
            total: people.len(),
            by_sex: count_by_sex(people),
            mean_age: mean_age(people, today),
            majority: majority_counts(people, today),
            age_brackets: age_histogram(people, today),
            oldest: query::oldest(people).cloned(),
            youngest: query::youngest(people).cloned(),
            birth_months: month_histogram(people),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
