//! # Export Layer
//!
//! Serializes the record set into a download payload.
//!
//! Every format shares one canonical row projection ([`ExportRow`]), ordered
//! by given name then family name. An empty record set is refused with
//! [`RegistryError::EmptyExport`] instead of producing an empty file.

use crate::error::RegistryError;
use crate::person::Person;
use crate::query;
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Column names, in output order.
pub const EXPORT_COLUMNS: [&str; 6] = [
    "given_name",
    "family_name",
    "birth_date",
    "sex",
    "national_id",
    "age",
];

/// Field separator of the delimited text export.
pub const CSV_DELIMITER: u8 = b';';

/// Name of the single worksheet in the spreadsheet export.
pub const SHEET_NAME: &str = "People";

/// Text layout of `birth_date` in every export.
pub const EXPORT_DATE_FORMAT: &str = "%d/%m/%Y";

// =============================================================================
// ROW PROJECTION
// =============================================================================

/// One exported record. Field order matches [`EXPORT_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    pub given_name: String,
    pub family_name: String,
    /// `dd/mm/yyyy`
    pub birth_date: String,
    /// Long-form label.
    pub sex: String,
    /// Zero-padded 11 digits, no punctuation.
    pub national_id: String,
    /// Age at export time.
    pub age: i32,
}

impl ExportRow {
    #[must_use]
    pub fn project(person: &Person, today: NaiveDate) -> Self {
        Self {
            given_name: person.given_name.clone(),
            family_name: person.family_name.clone(),
            birth_date: person.birth_date.format(EXPORT_DATE_FORMAT).to_string(),
            sex: person.sex.label().to_string(),
            national_id: format!("{:0>11}", person.national_id.as_str()),
            age: person.age(today),
        }
    }
}

/// Canonical rows for `people`, name-ordered.
pub fn rows(people: &[Person], today: NaiveDate) -> Vec<ExportRow> {
    query::all(people)
        .into_iter()
        .map(|p| ExportRow::project(p, today))
        .collect()
}

// =============================================================================
// FORMATS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown export format '{0}': expected csv, json or xlsx")]
pub struct UnknownExportFormat(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Csv,
    Json,
    Xlsx,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Csv, ExportFormat::Json, ExportFormat::Xlsx];

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Xlsx => "xlsx",
        }
    }

    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json; charset=utf-8",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }

    /// Suggested download name.
    #[must_use]
    pub const fn filename(self) -> &'static str {
        match self {
            Self::Csv => "pessoas.csv",
            Self::Json => "pessoas.json",
            Self::Xlsx => "pessoas.xlsx",
        }
    }

    pub fn encode(self, rows: &[ExportRow]) -> Result<Vec<u8>, RegistryError> {
        match self {
            Self::Csv => encode_csv(rows),
            Self::Json => encode_json(rows),
            Self::Xlsx => encode_xlsx(rows),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = UnknownExportFormat;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "xlsx" => Ok(Self::Xlsx),
            _ => Err(UnknownExportFormat(raw.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Encoded payload handed to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    #[must_use]
    pub fn filename(&self) -> &'static str {
        self.format.filename()
    }

    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Project and encode `people`. Fails on an empty set.
pub fn export(
    people: &[Person],
    format: ExportFormat,
    today: NaiveDate,
) -> Result<ExportFile, RegistryError> {
    if people.is_empty() {
        return Err(RegistryError::EmptyExport);
    }
    let rows = rows(people, today);
    let bytes = format.encode(&rows)?;
    Ok(ExportFile { format, bytes })
}

// =============================================================================
// ENCODERS
// =============================================================================

/// `;`-separated, header row first, one record per line.
pub fn encode_csv(rows: &[ExportRow]) -> Result<Vec<u8>, RegistryError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(CSV_DELIMITER)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).map_err(RegistryError::encode)?;
    }
    writer
        .into_inner()
        .map_err(|e| RegistryError::encode(e.error()))
}

/// Array of objects, 2-space indent, non-ASCII kept literal.
pub fn encode_json(rows: &[ExportRow]) -> Result<Vec<u8>, RegistryError> {
    serde_json::to_vec_pretty(rows).map_err(RegistryError::encode)
}

/// Single worksheet: bold header row, then one row per record.
pub fn encode_xlsx(rows: &[ExportRow]) -> Result<Vec<u8>, RegistryError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME).map_err(RegistryError::encode)?;
        for (col, name) in EXPORT_COLUMNS.iter().enumerate() {
            sheet
                .write_string_with_format(0, col as u16, *name, &header)
                .map_err(RegistryError::encode)?;
        }
        for (i, row) in rows.iter().enumerate() {
            let r = i as u32 + 1;
            let text = [
                &row.given_name,
                &row.family_name,
                &row.birth_date,
                &row.sex,
                &row.national_id,
            ];
            for (col, value) in text.iter().enumerate() {
                sheet
                    .write_string(r, col as u16, value.as_str())
                    .map_err(RegistryError::encode)?;
            }
            sheet
                .write_number(r, 5, f64::from(row.age))
                .map_err(RegistryError::encode)?;
        }
    }
    workbook.save_to_buffer().map_err(RegistryError::encode)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::query::tests::{fixture, person};
    use calamine::{Data, Reader, Xlsx};
    use std::io::Cursor;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn projection_formats_fields() {
        let p = person(1, "ana", "silva", "03/09/1999", "F", "165.596.877-75");
        let row = ExportRow::project(&p, today());
        assert_eq!(row.given_name, "Ana");
        assert_eq!(row.birth_date, "03/09/1999");
        assert_eq!(row.sex, "Female");
        assert_eq!(row.national_id, "16559687775");
        assert_eq!(row.age, 25);
    }

    #[test]
    fn rows_are_name_ordered() {
        let rows = rows(&fixture(), today());
        let names: Vec<&str> = rows.iter().map(|r| r.given_name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Arthur", "Gabriel", "Júlia", "Sérgio"]);
    }

    #[test]
    fn empty_export_is_refused() {
        for format in ExportFormat::ALL {
            let result = export(&[], format, today());
            assert!(matches!(result, Err(RegistryError::EmptyExport)));
        }
    }

    #[test]
    fn format_metadata() {
        assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert!("pdf".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Json.filename(), "pessoas.json");
        assert_eq!(ExportFormat::Xlsx.filename(), "pessoas.xlsx");
        assert!(ExportFormat::Csv.mime_type().starts_with("text/csv"));
    }

    #[test]
    fn csv_layout() {
        let file = export(&fixture(), ExportFormat::Csv, today()).unwrap();
        let text = String::from_utf8(file.bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("given_name;family_name;birth_date;sex;national_id;age")
        );
        assert_eq!(
            lines.next(),
            Some("Ana;Silva;03/09/1999;Female;11111111111;25")
        );
        assert_eq!(text.lines().count(), 6);
    }

    #[test]
    fn csv_round_trip() {
        let people = fixture();
        let expected = rows(&people, today());
        let file = export(&people, ExportFormat::Csv, today()).unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(CSV_DELIMITER)
            .from_reader(file.bytes.as_slice());
        let parsed: Vec<ExportRow> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn json_round_trip_keeps_non_ascii() {
        let people = fixture();
        let expected = rows(&people, today());
        let file = export(&people, ExportFormat::Json, today()).unwrap();

        let text = String::from_utf8(file.bytes.clone()).unwrap();
        assert!(text.contains("Sérgio"));
        assert!(!text.contains("\\u"));
        assert!(text.contains("\n  {"));

        let parsed: Vec<ExportRow> = serde_json::from_slice(&file.bytes).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn json_keys_follow_column_order() {
        let file = export(&fixture(), ExportFormat::Json, today()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&file.bytes).unwrap();
        let first = value[0].as_object().unwrap();
        let keys: Vec<&str> = first.keys().map(String::as_str).collect();
        assert_eq!(keys, EXPORT_COLUMNS.to_vec());
    }

    #[test]
    fn xlsx_round_trip() {
        let people = fixture();
        let expected = rows(&people, today());
        let file = export(&people, ExportFormat::Xlsx, today()).unwrap();

        let mut workbook: Xlsx<_> =
            calamine::open_workbook_from_rs(Cursor::new(file.bytes)).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        let mut rows = range.rows();

        let header: Vec<String> = rows.next().unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(header, EXPORT_COLUMNS.to_vec());

        let parsed: Vec<ExportRow> = rows
            .map(|cells| {
                let text = |i: usize| match &cells[i] {
                    Data::String(s) => s.clone(),
                    other => panic!("expected text cell, got {other:?}"),
                };
                let age = match &cells[5] {
                    Data::Float(f) => *f as i32,
                    Data::Int(i) => *i as i32,
                    other => panic!("expected numeric age, got {other:?}"),
                };
                ExportRow {
                    given_name: text(0),
                    family_name: text(1),
                    birth_date: text(2),
                    sex: text(3),
                    national_id: text(4),
                    age,
                }
            })
            .collect();
        assert_eq!(parsed, expected);
    }
}
