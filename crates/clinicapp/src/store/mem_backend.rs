use super::backend::StorageBackend;
use crate::error::{ClinicError, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// In-memory storage backend for testing.
///
/// Uses `RefCell` for interior mutability since the stores are
/// single-writer. This lets the `StorageBackend` trait take `&self`
/// for every method.
pub struct MemBackend {
    files: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: RefCell<HashSet<PathBuf>>,
    simulate_write_error: RefCell<bool>,
    available: RefCell<bool>,
}

impl Default for MemBackend {
    fn default() -> Self {
        Self {
            files: RefCell::new(BTreeMap::new()),
            dirs: RefCell::new(HashSet::new()),
            simulate_write_error: RefCell::new(false),
            available: RefCell::new(true),
        }
    }
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Pretend the host filesystem is (un)available.
    pub fn set_available(&self, available: bool) {
        *self.available.borrow_mut() = available;
    }

    /// Test helper: raw bytes of a file, if present.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.borrow().get(path.as_ref()).cloned()
    }

    /// Test helper: every stored path.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.borrow().keys().cloned().collect()
    }

    fn check_writable(&self, path: &Path) -> Result<()> {
        if *self.simulate_write_error.borrow() || !*self.available.borrow() {
            return Err(ClinicError::persistence(
                self.location(path),
                io::Error::other("Simulated write error"),
            ));
        }
        Ok(())
    }

    fn register_parents(&self, path: &Path) {
        let mut dirs = self.dirs.borrow_mut();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }
}

impl StorageBackend for MemBackend {
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        Ok(self.files.borrow().get(path).cloned())
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.check_writable(path)?;
        self.register_parents(path);
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path) || self.dirs.borrow().contains(path)
    }

    fn remove(&self, path: &Path) -> Result<bool> {
        self.check_writable(path)?;
        Ok(self.files.borrow_mut().remove(path).is_some())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.check_writable(to)?;
        let bytes = self.files.borrow_mut().remove(from).ok_or_else(|| {
            ClinicError::persistence(
                self.location(from),
                io::Error::new(io::ErrorKind::NotFound, "no such file"),
            )
        })?;
        self.register_parents(to);
        self.files.borrow_mut().insert(to.to_path_buf(), bytes);
        Ok(())
    }

    fn ensure_dir(&self, dir: &Path) -> Result<()> {
        self.check_writable(dir)?;
        self.register_parents(dir);
        self.dirs.borrow_mut().insert(dir.to_path_buf());
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<String>> {
        Ok(self
            .files
            .borrow()
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .filter_map(|path| path.file_name().and_then(|n| n.to_str()))
            .map(str::to_string)
            .collect())
    }

    fn location(&self, path: &Path) -> PathBuf {
        PathBuf::from(format!("memory://{}", path.display()))
    }

    fn is_available(&self) -> bool {
        *self.available.borrow()
    }
}
