//! # Storage Layer
//!
//! Each store turns one backing file (or directory) into an in-memory
//! collection with a CRUD contract. All of them share one lifecycle:
//!
//! ```text
//! read-or-initialize  ->  mutate the mirror  ->  persist the whole mirror
//! ```
//!
//! ## Stores
//!
//! - [`collection::CollectionStore`]: named collections of arbitrary JSON
//!   records with auto-assigned integer ids, all in one document file.
//! - [`patients::PatientStore`]: patient records in a CSV table with a fixed
//!   header. Enforces identity uniqueness and stamps timestamps.
//! - [`templates::TemplateStore`]: diagnosis templates in a JSON list,
//!   seeded with a default set on first run.
//! - [`reports::ReportStore`]: generated report files in a directory. No
//!   mirror; the directory is the source of truth.
//! - [`assets::AssetStore`]: copies patient images into the data root.
//!
//! ## Loading: Two Outcomes
//!
//! Loading never fails because of what is (or is not) on disk. A store's
//! `try_load` returns a [`LoadOutcome`]: either the decoded data, or
//! `NeedsBootstrap` with the [`BootstrapReason`]. `bootstrap` is a separate
//! operation that writes the initial state (empty table, default templates,
//! empty document). `load` simply runs one and then, if needed, the other.
//!
//! A file that exists but cannot be read or decoded is renamed to
//! `<file>.corrupt-<epochMillis>` before bootstrap writes over its path, so
//! the bytes remain available for manual recovery.
//!
//! ## Persistence
//!
//! Every mutation re-encodes the entire mirror and hands it to
//! [`backend::StorageBackend::write_atomic`], which writes a temp file and
//! renames it over the target. A failed write leaves the previous file intact
//! and surfaces as [`ClinicError::Persistence`]; the mirror keeps the change.
//!
//! ## Concurrency
//!
//! Single process, single writer. Stores take `&mut self` for mutations and
//! hold no locks; two store instances over the same file will overwrite each
//! other's changes.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: production filesystem backend.
//! - [`mem_backend::MemBackend`]: for testing logic without filesystem I/O.

use crate::error::{ClinicError, Result};
use backend::StorageBackend;
use chrono::Utc;
use std::fmt;
use std::path::{Path, PathBuf};

pub mod assets;
pub mod backend;
pub mod collection;
pub mod fs_backend;
pub mod mem_backend;
pub mod patients;
pub mod reports;
pub mod templates;

/// Why a store could not use what is on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapReason {
    /// No backing file yet. The normal first-run case.
    Missing,
    /// The file exists but reading it failed.
    Unreadable(String),
    /// The file was read but does not decode.
    Malformed(String),
}

impl fmt::Display for BootstrapReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapReason::Missing => f.write_str("backing file is missing"),
            BootstrapReason::Unreadable(e) => write!(f, "backing file is unreadable: {}", e),
            BootstrapReason::Malformed(e) => write!(f, "backing file is malformed: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<T> {
    Loaded(T),
    NeedsBootstrap(BootstrapReason),
}

/// Read and decode `path`, folding every failure into `NeedsBootstrap`.
pub(crate) fn read_outcome<B, T, F>(backend: &B, path: &Path, decode: F) -> LoadOutcome<T>
where
    B: StorageBackend,
    F: FnOnce(&[u8]) -> Result<T>,
{
    let bytes = match backend.read(path) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return LoadOutcome::NeedsBootstrap(BootstrapReason::Missing),
        Err(e) => return LoadOutcome::NeedsBootstrap(BootstrapReason::Unreadable(e.to_string())),
    };
    match decode(&bytes) {
        Ok(data) => LoadOutcome::Loaded(data),
        Err(ClinicError::Format(msg)) => {
            LoadOutcome::NeedsBootstrap(BootstrapReason::Malformed(msg))
        }
        Err(e) => LoadOutcome::NeedsBootstrap(BootstrapReason::Malformed(e.to_string())),
    }
}

/// Move an existing-but-bad backing file out of the way. Best effort:
/// bootstrap goes ahead even if the rename fails.
pub(crate) fn quarantine<B: StorageBackend>(backend: &B, path: &Path, reason: &BootstrapReason) {
    if *reason == BootstrapReason::Missing || !backend.exists(path) {
        return;
    }
    let aside = corrupt_path(path);
    match backend.rename(path, &aside) {
        Ok(()) => tracing::warn!(
            path = %backend.location(path).display(),
            moved_to = %backend.location(&aside).display(),
            "Quarantined unusable backing file: {reason}"
        ),
        Err(e) => tracing::warn!(
            path = %backend.location(path).display(),
            "Could not quarantine unusable backing file ({reason}): {e}"
        ),
    }
}

fn corrupt_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}.corrupt-{}", name, Utc::now().timestamp_millis()))
}

/// Whole-file persist of an already encoded mirror.
pub(crate) fn persist_bytes<B: StorageBackend>(backend: &B, path: &Path, bytes: &[u8]) -> Result<()> {
    backend.write_atomic(path, bytes)?;
    tracing::debug!(
        path = %backend.location(path).display(),
        bytes = bytes.len(),
        "Persisted"
    );
    Ok(())
}
