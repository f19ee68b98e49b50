//! # Domain Model
//!
//! Plain data types for the three kinds of record the stores hold:
//!
//! - [`Patient`]: one row of the patient table, keyed by a caller-meaningful
//!   `identity` string.
//! - [`DiagnosisTemplate`]: a named snippet of diagnosis text, keyed by a
//!   numeric id the caller picks (usually a millisecond timestamp).
//! - [`ArtifactName`]: the structured form of a generated report file name.
//!
//! ## Timestamps
//!
//! Stored timestamps carry millisecond precision. [`stamp`] is the single
//! source of "now" for the stores, truncated so that a value written to disk
//! decodes back to exactly the same instant.

use chrono::{DateTime, SubsecRound, Utc};

pub mod patient;
pub mod report;
pub mod template;

pub use patient::{Patient, PatientSchema};
pub use report::{ArtifactName, ReportFormat};
pub use template::{CategoryFilter, DiagnosisTemplate, ALL_CATEGORIES};

/// Current time at millisecond precision.
pub fn stamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
