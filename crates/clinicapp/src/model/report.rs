//! Report artifact naming.
//!
//! A generated report is a single file named
//! `<prefix>_<patientIdentity>_<epochMillis>.<html|pdf>`. The name is the
//! artifact's only identity, so it must round-trip through [`ArtifactName`].
//! Identities may themselves contain underscores; the timestamp is always the
//! last `_`-separated segment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder used when a report is generated for a patient without identity.
pub const UNKNOWN_IDENTITY: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Html,
    Pdf,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Html => "html",
            ReportFormat::Pdf => "pdf",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "html" => Some(ReportFormat::Html),
            "pdf" => Some(ReportFormat::Pdf),
            _ => None,
        }
    }

    /// Format implied by a file name's extension, if it is a recognized one.
    pub fn of_file_name(name: &str) -> Option<Self> {
        name.rsplit_once('.')
            .and_then(|(stem, ext)| (!stem.is_empty()).then_some(ext))
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName {
    pub prefix: String,
    pub patient_identity: String,
    pub created_millis: i64,
    pub format: ReportFormat,
}

impl ArtifactName {
    /// Builds a name, sanitizing the identity for use in a file name.
    pub fn new(prefix: &str, patient_identity: &str, created_millis: i64, format: ReportFormat) -> Self {
        Self {
            prefix: prefix.to_string(),
            patient_identity: sanitize_identity(patient_identity),
            created_millis,
            format,
        }
    }

    pub fn parse(prefix: &str, file_name: &str) -> Option<Self> {
        let (stem, ext) = file_name.rsplit_once('.')?;
        let format = ReportFormat::from_extension(ext)?;
        let rest = stem.strip_prefix(prefix)?.strip_prefix('_')?;
        let (identity, millis) = rest.rsplit_once('_')?;
        if identity.is_empty() {
            return None;
        }
        let created_millis = millis.parse::<i64>().ok()?;
        Some(Self {
            prefix: prefix.to_string(),
            patient_identity: identity.to_string(),
            created_millis,
            format,
        })
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.{}",
            self.prefix,
            self.patient_identity,
            self.created_millis,
            self.format.extension()
        )
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.created_millis)
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Make an identity safe to embed in a file name.
pub fn sanitize_identity(identity: &str) -> String {
    let trimmed = identity.trim();
    if trimmed.is_empty() {
        return UNKNOWN_IDENTITY.to_string();
    }
    trimmed
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '.' => '-',
            c if c.is_control() || c.is_whitespace() => '-',
            c => c,
        })
        .collect()
}

/// True when `name` names a file directly inside a directory: no separators,
/// no parent references, not empty.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}
