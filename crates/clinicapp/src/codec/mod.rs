//! # Codec Layer
//!
//! Stateless conversions between raw bytes and the two on-disk shapes:
//!
//! - [`tabular`]: a spreadsheet-like CSV file with a mandatory header row.
//!   Human-editable; used for patient records.
//! - [`document`]: pretty-printed JSON. Used for templates and the generic
//!   collection store.
//!
//! Both decoders report any structural problem as [`ClinicError::Format`].
//! Stores treat that exactly like a missing file and bootstrap.
//!
//! [`ClinicError::Format`]: crate::error::ClinicError::Format

pub mod document;
pub mod tabular;

pub use document::{decode_document, encode_document};
pub use tabular::{decode_tabular, encode_tabular, Row, Table};
