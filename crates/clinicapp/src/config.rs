//! # Configuration
//!
//! Store locations are managed by [`confique`], which layers environment
//! variables over an optional `clinic.toml` in the data root, over compiled
//! defaults.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `CLINIC_PATIENTS_FILE`, `CLINIC_REPORTS_DIR`, etc.
//! 2. **Config file**: `<data root>/clinic.toml`.
//! 3. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `patients_file` | `data/patients.csv` | Patient table |
//! | `templates_file` | `data/diagnosis_templates.json` | Diagnosis templates |
//! | `collections_file` | `storage/app.json` | Generic collection document |
//! | `reports_dir` | `reports` | Generated report artifacts |
//! | `images_dir` | `images` | Copied patient images |
//! | `report_prefix` | `report` | First segment of report file names |
//! | `extended_schema` | `false` | Write `gender` and `bloodType` columns |
//!
//! Every path is relative to the data root (see [`crate::init`]).

use crate::model::PatientSchema;
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "clinic.toml";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClinicConfig {
    #[config(env = "CLINIC_PATIENTS_FILE", default = "data/patients.csv")]
    pub patients_file: PathBuf,

    #[config(
        env = "CLINIC_TEMPLATES_FILE",
        default = "data/diagnosis_templates.json"
    )]
    pub templates_file: PathBuf,

    #[config(env = "CLINIC_COLLECTIONS_FILE", default = "storage/app.json")]
    pub collections_file: PathBuf,

    #[config(env = "CLINIC_REPORTS_DIR", default = "reports")]
    pub reports_dir: PathBuf,

    #[config(env = "CLINIC_IMAGES_DIR", default = "images")]
    pub images_dir: PathBuf,

    #[config(default = "report")]
    pub report_prefix: String,

    /// Adds `gender` and `bloodType` after `age` in the patient table.
    #[config(env = "CLINIC_EXTENDED_SCHEMA", default = false)]
    pub extended_schema: bool,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            patients_file: PathBuf::from("data/patients.csv"),
            templates_file: PathBuf::from("data/diagnosis_templates.json"),
            collections_file: PathBuf::from("storage/app.json"),
            reports_dir: PathBuf::from("reports"),
            images_dir: PathBuf::from("images"),
            report_prefix: "report".to_string(),
            extended_schema: false,
        }
    }
}

impl ClinicConfig {
    /// Load from the environment and `<root>/clinic.toml`, falling back to
    /// defaults (with a warning) if either is invalid.
    pub fn load(root: &Path) -> Self {
        let file = root.join(CONFIG_FILE_NAME);
        match ClinicConfig::builder().env().file(&file).load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    file = %file.display(),
                    "Invalid configuration, using defaults: {e}"
                );
                ClinicConfig::default()
            }
        }
    }

    pub fn patient_schema(&self) -> PatientSchema {
        if self.extended_schema {
            PatientSchema::Extended
        } else {
            PatientSchema::Standard
        }
    }
}
