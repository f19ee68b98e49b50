//! # Data Root and Context
//!
//! Every store path is relative to one data root directory. The root is
//! resolved during [`initialize`]:
//!
//! 1. If `data_override` is provided → use it directly.
//! 2. If `CLINIC_DATA_DIR` is set → use it (primarily for testing).
//! 3. Otherwise → the OS-appropriate data directory (via the `directories`
//!    crate).
//!
//! [`initialize`] then loads [`ClinicConfig`] from the root and opens every
//! store over a shared [`FsBackend`]. Opening runs each store's load, so a
//! fresh root comes out of `initialize` with a header-only patient table, the
//! default templates and an empty collection document.
//!
//! ## Layout (defaults)
//!
//! ```text
//! <root>/
//! ├── clinic.toml                     # Optional configuration
//! ├── data/
//! │   ├── patients.csv                # Patient table
//! │   └── diagnosis_templates.json    # Diagnosis templates
//! ├── storage/
//! │   └── app.json                    # Generic collections
//! ├── images/                         # Copied patient images
//! └── reports/                        # report_<identity>_<millis>.<html|pdf>
//! ```

use crate::config::ClinicConfig;
use crate::error::{ClinicError, Result};
use crate::store::assets::AssetStore;
use crate::store::collection::CollectionStore;
use crate::store::fs_backend::FsBackend;
use crate::store::patients::PatientStore;
use crate::store::reports::ReportStore;
use crate::store::templates::TemplateStore;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "CLINIC_DATA_DIR";

pub struct ClinicContext {
    pub root: PathBuf,
    pub config: ClinicConfig,
    pub patients: PatientStore<FsBackend>,
    pub templates: TemplateStore<FsBackend>,
    pub collections: CollectionStore<FsBackend>,
    pub reports: ReportStore<FsBackend>,
    pub assets: AssetStore<FsBackend>,
}

/// Determine the data root. See the module docs for the order.
pub fn resolve_data_root(data_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = data_override {
        return Ok(path);
    }
    if let Some(path) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    ProjectDirs::from("org", "clinicapp", "clinicapp")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| ClinicError::Config("could not determine a data directory".to_string()))
}

/// Resolve the root, load config and open every store.
pub fn initialize(data_override: Option<PathBuf>) -> Result<ClinicContext> {
    let root = resolve_data_root(data_override)?;
    let config = ClinicConfig::load(&root);
    open_with_config(&root, config)
}

/// Open every store under `root` with an explicit config.
pub fn open_with_config(root: &Path, config: ClinicConfig) -> Result<ClinicContext> {
    let backend = FsBackend::new(root.to_path_buf());

    let patients = PatientStore::open(
        backend.clone(),
        config.patients_file.clone(),
        config.patient_schema(),
    )?;
    let templates = TemplateStore::open(backend.clone(), config.templates_file.clone())?;
    let collections = CollectionStore::open(backend.clone(), config.collections_file.clone())?;
    let reports = ReportStore::new(backend.clone(), config.reports_dir.clone())
        .with_prefix(&config.report_prefix);
    let assets = AssetStore::new(backend, config.images_dir.clone());

    tracing::info!(root = %root.display(), "Opened clinic stores");

    Ok(ClinicContext {
        root: root.to_path_buf(),
        config,
        patients,
        templates,
        collections,
        reports,
        assets,
    })
}
