//! Patient records and their tabular schema.
//!
//! The table is meant to be opened in a spreadsheet application, so the
//! header names are part of the file format:
//!
//! ```text
//! identity,name,age,address,phone,notes,image_path,insert_date,update_date,view_at
//! ```
//!
//! The extended schema inserts `gender,bloodType` after `age`. Decoding is
//! schema-agnostic: cells are looked up by header name, and a column the file
//! does not have takes the field's default (empty text, phone `0`, no
//! timestamp). A phone cell that is not a number also takes the default, so
//! one hand-typed `+20 100 123` does not cost the rest of the table. Only the
//! identity column is mandatory; older files spell it `idintity`, which is
//! accepted on read and never written.

use crate::codec::Row;
use crate::error::{ClinicError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const IDENTITY: &str = "identity";
pub const LEGACY_IDENTITY: &str = "idintity";
pub const NAME: &str = "name";
pub const AGE: &str = "age";
pub const GENDER: &str = "gender";
pub const BLOOD_TYPE: &str = "bloodType";
pub const ADDRESS: &str = "address";
pub const PHONE: &str = "phone";
pub const NOTES: &str = "notes";
pub const IMAGE_PATH: &str = "image_path";
pub const INSERT_DATE: &str = "insert_date";
pub const UPDATE_DATE: &str = "update_date";
pub const VIEW_AT: &str = "view_at";

const STANDARD_COLUMNS: [&str; 10] = [
    IDENTITY,
    NAME,
    AGE,
    ADDRESS,
    PHONE,
    NOTES,
    IMAGE_PATH,
    INSERT_DATE,
    UPDATE_DATE,
    VIEW_AT,
];

const EXTENDED_COLUMNS: [&str; 12] = [
    IDENTITY,
    NAME,
    AGE,
    GENDER,
    BLOOD_TYPE,
    ADDRESS,
    PHONE,
    NOTES,
    IMAGE_PATH,
    INSERT_DATE,
    UPDATE_DATE,
    VIEW_AT,
];

/// Which column layout the patient table is written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatientSchema {
    #[default]
    Standard,
    Extended,
}

impl PatientSchema {
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            PatientSchema::Standard => &STANDARD_COLUMNS,
            PatientSchema::Extended => &EXTENDED_COLUMNS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub identity: String,
    pub name: String,
    pub age: String,
    /// Only persisted under [`PatientSchema::Extended`].
    pub gender: String,
    /// Only persisted under [`PatientSchema::Extended`].
    pub blood_type: String,
    pub address: String,
    /// `0` means no phone number was recorded.
    pub phone: u64,
    pub notes: String,
    /// Path of the copied image asset, see [`crate::store::assets`].
    pub image_path: String,
    pub inserted_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Reserved; no store operation sets it.
    pub viewed_at: Option<DateTime<Utc>>,
}

impl Patient {
    pub fn new(identity: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Required-field check applied before any store mutation.
    pub fn validate(&self) -> Result<()> {
        if self.identity.trim().is_empty() {
            return Err(ClinicError::Validation(
                "patient identity is required".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(ClinicError::Validation(
                "patient name is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Phone as text, empty when unset.
    pub fn phone_text(&self) -> String {
        if self.phone == 0 {
            String::new()
        } else {
            self.phone.to_string()
        }
    }

    /// Build a patient from a decoded table row.
    pub fn from_row(row: &Row) -> Result<Self> {
        let text = |column: &str| row.get(column).cloned().unwrap_or_default();
        let identity = row
            .get(IDENTITY)
            .or_else(|| row.get(LEGACY_IDENTITY))
            .cloned()
            .unwrap_or_default();
        let phone = phone_or_unset(
            &identity,
            row.get(PHONE).map(String::as_str).unwrap_or(""),
        );

        Ok(Self {
            identity,
            name: text(NAME),
            age: text(AGE),
            gender: text(GENDER),
            blood_type: text(BLOOD_TYPE),
            address: text(ADDRESS),
            phone,
            notes: text(NOTES),
            image_path: text(IMAGE_PATH),
            inserted_at: parse_timestamp(INSERT_DATE, row.get(INSERT_DATE))?,
            updated_at: parse_timestamp(UPDATE_DATE, row.get(UPDATE_DATE))?,
            viewed_at: parse_timestamp(VIEW_AT, row.get(VIEW_AT))?,
        })
    }

    /// Render as a table row. Carries every known column; the encoder keeps
    /// only those in the active schema.
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        let mut put = |column: &str, value: String| {
            row.insert(column.to_string(), value);
        };
        put(IDENTITY, self.identity.clone());
        put(NAME, self.name.clone());
        put(AGE, self.age.clone());
        put(GENDER, self.gender.clone());
        put(BLOOD_TYPE, self.blood_type.clone());
        put(ADDRESS, self.address.clone());
        put(PHONE, self.phone_text());
        put(NOTES, self.notes.clone());
        put(IMAGE_PATH, self.image_path.clone());
        put(INSERT_DATE, format_timestamp(self.inserted_at));
        put(UPDATE_DATE, format_timestamp(self.updated_at));
        put(VIEW_AT, format_timestamp(self.viewed_at));
        row
    }
}

/// Phone cell as a number. `None` for anything that is not a
/// non-negative integer in range; the caller decides the fallback.
fn parse_phone(cell: &str) -> Option<u64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Some(0);
    }
    if let Ok(phone) = cell.parse::<u64>() {
        return Some(phone);
    }
    // Spreadsheet applications sometimes store integers as "555.0".
    match cell.parse::<f64>() {
        Ok(value)
            if value.is_finite()
                && value >= 0.0
                && value.fract() == 0.0
                && value < u64::MAX as f64 =>
        {
            Some(value as u64)
        }
        _ => None,
    }
}

/// A phone cell that is not a number becomes unset rather than failing the
/// whole table.
fn phone_or_unset(identity: &str, cell: &str) -> u64 {
    parse_phone(cell).unwrap_or_else(|| {
        tracing::warn!(identity, cell, "Unreadable phone cell, leaving phone unset");
        0
    })
}

fn parse_timestamp(column: &str, cell: Option<&String>) -> Result<Option<DateTime<Utc>>> {
    let cell = match cell.map(|c| c.trim()) {
        None | Some("") => return Ok(None),
        Some(cell) => cell,
    };
    DateTime::parse_from_rfc3339(cell)
        .map(|ts| Some(ts.with_timezone(&Utc)))
        .map_err(|e| {
            ClinicError::Format(format!(
                "{} cell '{}' is not an RFC 3339 timestamp: {}",
                column, cell, e
            ))
        })
}

fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}
