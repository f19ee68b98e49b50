//! Report artifact store.
//!
//! Generated reports are plain files in one directory, named
//! `<prefix>_<patientIdentity>_<epochMillis>.<html|pdf>`. There is no mirror:
//! every call goes to the directory, which is the only source of truth.
//! Files with other extensions may sit in the same directory; they are never
//! listed.

use super::backend::StorageBackend;
use crate::error::{ClinicError, Result};
use crate::model::report::is_plain_file_name;
use crate::model::{ArtifactName, ReportFormat};
use chrono::Utc;
use std::path::{Path, PathBuf};

pub const DEFAULT_PREFIX: &str = "report";

pub struct ReportStore<B: StorageBackend> {
    backend: B,
    dir: PathBuf,
    prefix: String,
}

impl<B: StorageBackend> ReportStore<B> {
    pub fn new(backend: B, dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            dir: dir.into(),
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    fn artifact_path(&self, file_name: &str) -> Result<PathBuf> {
        if !is_plain_file_name(file_name) {
            return Err(ClinicError::Validation(format!(
                "'{}' is not a report file name",
                file_name
            )));
        }
        Ok(self.dir.join(file_name))
    }

    /// Write a new artifact and return its file name. The millisecond stamp
    /// is bumped while the name is taken, so two reports for one patient in
    /// the same millisecond do not collide.
    pub fn create(&self, patient_identity: &str, content: &[u8], format: ReportFormat) -> Result<String> {
        self.backend.ensure_dir(&self.dir)?;

        let mut name = ArtifactName::new(
            &self.prefix,
            patient_identity,
            Utc::now().timestamp_millis(),
            format,
        );
        while self.backend.exists(&self.dir.join(name.file_name())) {
            name.created_millis += 1;
        }

        let file_name = name.file_name();
        self.backend
            .write_atomic(&self.dir.join(&file_name), content)?;
        tracing::info!(file = %file_name, "Created report artifact");
        Ok(file_name)
    }

    /// Recognized artifacts, newest-looking name first.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .backend
            .list_files(&self.dir)?
            .into_iter()
            .filter(|name| ReportFormat::of_file_name(name).is_some())
            .collect();
        names.sort_by(|a, b| b.cmp(a));
        Ok(names)
    }

    /// Artifacts generated for one patient, newest first.
    pub fn list_for_patient(&self, patient_identity: &str) -> Result<Vec<String>> {
        let wanted = crate::model::report::sanitize_identity(patient_identity);
        let mut named: Vec<(ArtifactName, String)> = self
            .list()?
            .into_iter()
            .filter_map(|file| ArtifactName::parse(&self.prefix, &file).map(|n| (n, file)))
            .filter(|(n, _)| n.patient_identity == wanted)
            .collect();
        named.sort_by(|(a, _), (b, _)| b.created_millis.cmp(&a.created_millis));
        Ok(named.into_iter().map(|(_, file)| file).collect())
    }

    pub fn read(&self, file_name: &str) -> Result<Vec<u8>> {
        let path = self.artifact_path(file_name)?;
        self.backend
            .read(&path)?
            .ok_or_else(|| ClinicError::NotFound(format!("report '{}'", file_name)))
    }

    pub fn read_to_string(&self, file_name: &str) -> Result<String> {
        let bytes = self.read(file_name)?;
        String::from_utf8(bytes).map_err(|e| {
            ClinicError::Format(format!("report '{}' is not UTF-8 text: {}", file_name, e))
        })
    }

    /// Remove an artifact. Returns whether it existed.
    pub fn delete(&self, file_name: &str) -> Result<bool> {
        let path = self.artifact_path(file_name)?;
        self.backend.remove(&path)
    }

    /// Where the artifact lives, for handing to an external viewer.
    pub fn location(&self, file_name: &str) -> Result<PathBuf> {
        Ok(self.backend.location(&self.artifact_path(file_name)?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
