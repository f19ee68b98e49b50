//! Patient record store.
//!
//! Patients live in a CSV table (see [`crate::model::patient`] for the
//! columns). The store keeps the decoded rows as its mirror and rewrites the
//! whole table after every mutation.
//!
//! ## Lifecycle
//!
//! ```text
//! new() ── load() ──► Loaded ──┬─ save(Insert | Edit) ─┐
//!                      ▲       └─ delete()            ─┤
//!                      └──────── load() (reload) ◄─────┘
//! ```
//!
//! `load` never fails because of the file itself: a missing, unreadable or
//! malformed table is replaced by a header-only one (the broken file is
//! quarantined first, see [`crate::store`]).
//!
//! ## Rules
//!
//! - `identity` and `name` are required; checked before anything changes.
//! - Insert rejects an identity that is already present.
//! - Insert stamps `inserted_at` and clears `updated_at`; edit stamps
//!   `updated_at` and keeps the stored `inserted_at`.
//! - Edit replaces the first record with the same identity; editing an
//!   identity that is not stored is [`ClinicError::NotFound`].
//! - Deleting an absent identity is not an error.
//! - A table loaded with `gender`/`bloodType` columns keeps them on every
//!   rewrite, whatever schema the store was opened with.

use super::backend::StorageBackend;
use super::{persist_bytes, quarantine, read_outcome, BootstrapReason, LoadOutcome};
use crate::codec::{decode_tabular, encode_tabular, Row};
use crate::error::{ClinicError, Result};
use crate::model::patient::{BLOOD_TYPE, GENDER, IDENTITY, LEGACY_IDENTITY};
use crate::model::{stamp, Patient, PatientSchema};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Add a new record; the identity must not exist yet.
    Insert,
    /// Replace the stored record with the same identity.
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Name,
    Identity,
    Phone,
    Address,
}

/// Decode a patient table. Requires an identity column (either spelling).
pub fn decode_patients(bytes: &[u8]) -> Result<Vec<Patient>> {
    decode_patient_table(bytes).map(|(patients, _)| patients)
}

/// Like [`decode_patients`], also reporting the schema the header carries:
/// `Extended` when either extended column is present.
pub fn decode_patient_table(bytes: &[u8]) -> Result<(Vec<Patient>, PatientSchema)> {
    let table = decode_tabular(bytes)?;
    if !table.has_column(IDENTITY) && !table.has_column(LEGACY_IDENTITY) {
        return Err(ClinicError::Format(format!(
            "patient table has no '{}' column",
            IDENTITY
        )));
    }
    let schema = if table.has_column(GENDER) || table.has_column(BLOOD_TYPE) {
        PatientSchema::Extended
    } else {
        PatientSchema::Standard
    };
    let patients = table
        .rows
        .iter()
        .map(Patient::from_row)
        .collect::<Result<Vec<_>>>()?;
    Ok((patients, schema))
}

/// Encode patients under `schema`. Always writes the header row.
pub fn encode_patients(patients: &[Patient], schema: PatientSchema) -> Result<Vec<u8>> {
    let rows: Vec<Row> = patients.iter().map(Patient::to_row).collect();
    encode_tabular(&rows, schema.columns())
}

pub struct PatientStore<B: StorageBackend> {
    backend: B,
    path: PathBuf,
    /// Schema the store was opened with.
    configured: PatientSchema,
    /// Schema written on persist; widened to `Extended` by a loaded file.
    schema: PatientSchema,
    patients: Vec<Patient>,
    loaded: bool,
}

impl<B: StorageBackend> PatientStore<B> {
    pub fn new(backend: B, path: impl Into<PathBuf>, schema: PatientSchema) -> Self {
        Self {
            backend,
            path: path.into(),
            configured: schema,
            schema,
            patients: Vec::new(),
            loaded: false,
        }
    }

    pub fn open(backend: B, path: impl Into<PathBuf>, schema: PatientSchema) -> Result<Self> {
        let mut store = Self::new(backend, path, schema);
        store.load()?;
        Ok(store)
    }

    pub fn try_load(&self) -> LoadOutcome<(Vec<Patient>, PatientSchema)> {
        read_outcome(&self.backend, &self.path, decode_patient_table)
    }

    /// Write a header-only table and start from an empty mirror.
    pub fn bootstrap(&mut self, reason: &BootstrapReason) -> Result<()> {
        tracing::info!(
            path = %self.backend.location(&self.path).display(),
            "Creating empty patient table: {reason}"
        );
        quarantine(&self.backend, &self.path, reason);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.backend.ensure_dir(parent)?;
        }
        self.patients.clear();
        self.schema = self.configured;
        self.loaded = true;
        self.persist()
    }

    pub fn load(&mut self) -> Result<()> {
        match self.try_load() {
            LoadOutcome::Loaded((patients, file_schema)) => {
                self.patients = patients;
                self.schema = match (self.configured, file_schema) {
                    (PatientSchema::Standard, PatientSchema::Standard) => PatientSchema::Standard,
                    _ => PatientSchema::Extended,
                };
                self.loaded = true;
                Ok(())
            }
            LoadOutcome::NeedsBootstrap(reason) => self.bootstrap(&reason),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn list(&self) -> &[Patient] {
        &self.patients
    }

    pub fn get(&self, identity: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.identity == identity)
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    /// Insert or edit a record, then rewrite the table. Returns the record as
    /// stored (with its timestamps).
    pub fn save(&mut self, mut patient: Patient, mode: SaveMode) -> Result<Patient> {
        patient.validate()?;

        match mode {
            SaveMode::Insert => {
                if self.get(&patient.identity).is_some() {
                    return Err(ClinicError::DuplicateIdentity(patient.identity));
                }
                patient.inserted_at = Some(stamp());
                patient.updated_at = None;
                self.patients.push(patient.clone());
            }
            SaveMode::Edit => {
                let pos = self
                    .patients
                    .iter()
                    .position(|p| p.identity == patient.identity)
                    .ok_or_else(|| {
                        ClinicError::NotFound(format!("patient '{}'", patient.identity))
                    })?;
                let existing = &self.patients[pos];
                patient.inserted_at = existing.inserted_at.or(patient.inserted_at);
                patient.viewed_at = existing.viewed_at;
                patient.updated_at = Some(stamp());
                self.patients[pos] = patient.clone();
            }
        }

        self.persist()?;
        Ok(patient)
    }

    /// Remove the record with `identity`. Returns whether one was removed;
    /// the table is only rewritten when something changed.
    pub fn delete(&mut self, identity: &str) -> Result<bool> {
        let Some(pos) = self.patients.iter().position(|p| p.identity == identity) else {
            return Ok(false);
        };
        self.patients.remove(pos);
        self.persist()?;
        Ok(true)
    }

    /// Case-insensitive match on name, identity or phone. An empty term
    /// returns every record. Order is storage order.
    pub fn search(&self, term: &str) -> Vec<&Patient> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.patients.iter().collect();
        }
        self.patients
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.identity.to_lowercase().contains(&needle)
                    || p.phone_text().contains(&needle)
            })
            .collect()
    }

    /// Like [`search`](Self::search), restricted to one field.
    pub fn search_by(&self, term: &str, field: SearchField) -> Vec<&Patient> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.patients.iter().collect();
        }
        self.patients
            .iter()
            .filter(|p| {
                let haystack = match field {
                    SearchField::Name => p.name.to_lowercase(),
                    SearchField::Identity => p.identity.to_lowercase(),
                    SearchField::Phone => p.phone_text(),
                    SearchField::Address => p.address.to_lowercase(),
                };
                haystack.contains(&needle)
            })
            .collect()
    }

    /// Rewrite the whole table from the mirror.
    pub fn persist(&self) -> Result<()> {
        let bytes = encode_patients(&self.patients, self.schema)?;
        persist_bytes(&self.backend, &self.path, &bytes)
    }

    /// The schema the table is written with.
    pub fn schema(&self) -> PatientSchema {
        self.schema
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}
