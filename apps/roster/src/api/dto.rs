//! Request and response bodies for the HTTP API.

use chrono::{DateTime, NaiveDate, Utc};
use roster_core::{MeanAge, Person, Sex};
use serde::{Deserialize, Serialize};

/// A person as returned by the API, with derived fields filled in for `today`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonDto {
    pub id: u64,
    pub given_name: String,
    pub family_name: String,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    pub sex_label: String,
    pub national_id: String,
    pub national_id_formatted: String,
    pub age: i32,
    pub age_bracket: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PersonDto {
    pub fn new(person: &Person, today: NaiveDate) -> Self {
        Self {
            id: person.id.0,
            given_name: person.given_name.clone(),
            family_name: person.family_name.clone(),
            full_name: person.full_name(),
            birth_date: person.birth_date,
            sex: person.sex,
            sex_label: person.sex.label().to_string(),
            national_id: person.national_id.as_str().to_string(),
            national_id_formatted: person.national_id.formatted(),
            age: person.age(today),
            age_bracket: person.age_bracket(today).label().to_string(),
            created_at: person.created_at,
            updated_at: person.updated_at,
        }
    }

    pub fn list(people: &[Person], today: NaiveDate) -> Vec<Self> {
        people.iter().map(|person| Self::new(person, today)).collect()
    }
}

/// Body of every single-field update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub value: String,
}

/// `GET /people?q=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

/// People split around the 18-year cutoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutoffList {
    pub cutoff: NaiveDate,
    pub people: Vec<PersonDto>,
}

/// People strictly older than the mean age.
#[derive(Debug, Clone, Serialize)]
pub struct AboveAverageList {
    pub average_age: MeanAge,
    pub people: Vec<PersonDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub people: usize,
}
