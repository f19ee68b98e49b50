use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClinicError {
    /// Backing content did not decode. Load paths recover from this by
    /// bootstrapping; it only reaches callers from the raw codec functions.
    #[error("Format error: {0}")]
    Format(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate identity: {0}")]
    DuplicateIdentity(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A write against the backing store failed. The in-memory mirror still
    /// holds the attempted change; calling `persist()` again retries the write.
    #[error("Failed to persist {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encode(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl ClinicError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ClinicError::Persistence {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClinicError>;
