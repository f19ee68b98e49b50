//! # clinicapp Architecture
//!
//! clinicapp is the **record store** behind a desktop clinic record keeper. It
//! turns a handful of in-process collections into durable state in a local
//! data directory, and exposes them through plain CRUD methods. Screens,
//! forms and report rendering live in the UI that embeds this crate.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Context (init.rs)                                          │
//! │  - Resolves the data root, loads config, opens every store  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Stores (store/)                                            │
//! │  - Patients, templates, collections: mirror + whole rewrite │
//! │  - Reports, assets: directory-backed, no mirror             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Codecs (codec/) and StorageBackend (store/backend.rs)      │
//! │  - CSV table / JSON document <-> bytes                      │
//! │  - FsBackend (production), MemBackend (testing)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: Recover on Read, Surface on Write
//!
//! - A missing, unreadable or malformed backing file is never an error. The
//!   store bootstraps a fresh one (quarantining the bad file first).
//! - A caller mistake (missing field, duplicate identity) is returned before
//!   anything changes.
//! - A failed write is returned as [`error::ClinicError::Persistence`]. The
//!   previous file is untouched and the mirror keeps the change.
//!
//! The crate logs through `tracing` and never installs a subscriber.
//!
//! ## Module Overview
//!
//! - [`store`]: the stores and the storage backends
//! - [`codec`]: tabular and document encodings
//! - [`model`]: `Patient`, `DiagnosisTemplate`, report artifact names
//! - [`config`]: file locations and schema choice
//! - [`init`]: data root resolution and the [`init::ClinicContext`]
//! - [`error`]: error types

pub mod codec;
pub mod config;
pub mod error;
pub mod init;
pub mod model;
pub mod store;

pub use error::{ClinicError, Result};
