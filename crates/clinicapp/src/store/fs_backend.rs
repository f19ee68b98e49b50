use super::backend::StorageBackend;
use crate::error::{ClinicError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Filesystem backend rooted at the application's data directory.
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    fn ensure_parent(&self, full: &Path) -> Result<()> {
        if let Some(parent) = full.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| ClinicError::persistence(parent, e))?;
            }
        }
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(self.full(path)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ClinicError::Io(e)),
        }
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let target = self.full(path);
        self.ensure_parent(&target)?;

        let file_name = target
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("data");
        let tmp = target.with_file_name(format!(".{}-{}.tmp", file_name, Uuid::new_v4()));

        // Atomic Write
        if let Err(e) = fs::write(&tmp, bytes) {
            let _ = fs::remove_file(&tmp);
            return Err(ClinicError::persistence(&target, e));
        }
        if let Err(e) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(ClinicError::persistence(&target, e));
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.full(path).exists()
    }

    fn remove(&self, path: &Path) -> Result<bool> {
        let target = self.full(path);
        match fs::remove_file(&target) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ClinicError::persistence(target, e)),
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let to = self.full(to);
        self.ensure_parent(&to)?;
        fs::rename(self.full(from), &to).map_err(|e| ClinicError::persistence(to, e))
    }

    fn ensure_dir(&self, dir: &Path) -> Result<()> {
        let full = self.full(dir);
        if !full.exists() {
            fs::create_dir_all(&full).map_err(|e| ClinicError::persistence(full, e))?;
        }
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<String>> {
        let entries = match fs::read_dir(self.full(dir)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ClinicError::Io(e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn location(&self, path: &Path) -> PathBuf {
        self.full(path)
    }

    fn is_available(&self) -> bool {
        self.root.is_dir() || fs::create_dir_all(&self.root).is_ok()
    }
}
