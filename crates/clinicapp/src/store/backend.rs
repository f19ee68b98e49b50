use crate::error::Result;
use std::path::{Path, PathBuf};

/// Abstract interface for raw storage I/O.
///
/// This trait handles the "how" of storage (filesystem vs memory), while the
/// stores handle the "what" (schemas, identity rules, bootstrap). Every path
/// is relative to the backend's root.
pub trait StorageBackend {
    /// Read a whole file.
    /// Returns Ok(None) if the file does not exist.
    /// Returns Err only on actual I/O errors (permissions, disk failure).
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>>;

    /// Replace a whole file, creating parent directories as needed.
    /// MUST be atomic (write to tmp then rename): on failure the previous
    /// content stays intact.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Remove a file. Returns whether a file was there to remove.
    fn remove(&self, path: &Path) -> Result<bool>;

    /// Move a file aside, replacing anything at `to`.
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    fn ensure_dir(&self, dir: &Path) -> Result<()>;

    /// Names of the regular files directly inside `dir`.
    /// A missing directory lists as empty.
    fn list_files(&self, dir: &Path) -> Result<Vec<String>>;

    /// The path a caller would use to open the file outside the store.
    /// For FsBackend this is the real path; for MemBackend a virtual one.
    fn location(&self, path: &Path) -> PathBuf;

    /// Whether the backend can persist at all. Stores that support an
    /// in-memory fallback check this before bootstrapping.
    fn is_available(&self) -> bool;
}
