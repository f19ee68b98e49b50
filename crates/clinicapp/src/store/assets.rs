use super::backend::StorageBackend;
use crate::error::{ClinicError, Result};
use chrono::Utc;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Copies patient images into the data root so records never point at a
/// file the user might move or delete. The returned location is what goes
/// into `Patient::image_path`.
pub struct AssetStore<B: StorageBackend> {
    backend: B,
    dir: PathBuf,
}

fn image_extension(source: &Path) -> Result<String> {
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(ClinicError::Validation(format!(
            "'{}' is not a jpg, jpeg or png image",
            source.display()
        )))
    }
}

impl<B: StorageBackend> AssetStore<B> {
    pub fn new(backend: B, dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            dir: dir.into(),
        }
    }

    /// Copy an image file from anywhere on disk into the images directory.
    pub fn import_image(&self, source: &Path) -> Result<PathBuf> {
        let ext = image_extension(source)?;
        let bytes = fs::read(source).map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                ClinicError::NotFound(format!("image '{}'", source.display()))
            }
            _ => ClinicError::Io(e),
        })?;
        self.import_bytes(&bytes, &ext)
    }

    /// Store already-loaded image bytes under a fresh name.
    pub fn import_bytes(&self, bytes: &[u8], ext: &str) -> Result<PathBuf> {
        let token = Uuid::new_v4().simple().to_string();
        let file_name = format!(
            "patient_{}_{}.{}",
            Utc::now().timestamp_millis(),
            &token[..8],
            ext
        );
        let path = self.dir.join(file_name);
        self.backend.write_atomic(&path, bytes)?;
        Ok(self.backend.location(&path))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::MemBackend;

    #[test]
    fn import_copies_into_images_dir() {
        let source_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("scan.JPG");
        fs::write(&source, b"jpeg bytes").unwrap();

        let store = AssetStore::new(MemBackend::new(), "images");
        let stored = store.import_image(&source).unwrap();

        let name = stored.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("patient_"));
        assert!(name.ends_with(".jpg"));

        let paths = store.backend().paths();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].parent().unwrap(), Path::new("images"));
        assert_eq!(store.backend().file(&paths[0]).unwrap(), b"jpeg bytes");
        // The source file stays in place.
        assert!(source.exists());
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let store = AssetStore::new(MemBackend::new(), "images");
        let result = store.import_image(Path::new("/tmp/report.pdf"));
        assert!(matches!(result, Err(ClinicError::Validation(_))));
    }

    #[test]
    fn missing_source_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(MemBackend::new(), "images");
        let result = store.import_image(&dir.path().join("gone.png"));
        assert!(matches!(result, Err(ClinicError::NotFound(_))));
    }

    #[test]
    fn imports_get_distinct_names() {
        let store = AssetStore::new(MemBackend::new(), "images");
        let a = store.import_bytes(b"a", "png").unwrap();
        let b = store.import_bytes(b"b", "png").unwrap();
        assert_ne!(a, b);
    }
}
