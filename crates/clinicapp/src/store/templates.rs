use super::backend::StorageBackend;
use super::{persist_bytes, quarantine, read_outcome, BootstrapReason, LoadOutcome};
use crate::codec::{decode_document, encode_document};
use crate::error::{ClinicError, Result};
use crate::model::template::default_templates;
use crate::model::{CategoryFilter, DiagnosisTemplate};
use std::path::{Path, PathBuf};

/// Diagnosis templates kept as one JSON list. First run seeds the built-in
/// defaults; after that the list belongs entirely to the caller.
pub struct TemplateStore<B: StorageBackend> {
    backend: B,
    path: PathBuf,
    templates: Vec<DiagnosisTemplate>,
}

impl<B: StorageBackend> TemplateStore<B> {
    pub fn new(backend: B, path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            path: path.into(),
            templates: Vec::new(),
        }
    }

    pub fn open(backend: B, path: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self::new(backend, path);
        store.load()?;
        Ok(store)
    }

    pub fn try_load(&self) -> LoadOutcome<Vec<DiagnosisTemplate>> {
        read_outcome(&self.backend, &self.path, decode_document)
    }

    /// Seed the default templates and write them.
    pub fn bootstrap(&mut self, reason: &BootstrapReason) -> Result<()> {
        tracing::info!(
            path = %self.backend.location(&self.path).display(),
            "Seeding default diagnosis templates: {reason}"
        );
        quarantine(&self.backend, &self.path, reason);
        self.templates = default_templates();
        self.persist()
    }

    pub fn load(&mut self) -> Result<()> {
        match self.try_load() {
            LoadOutcome::Loaded(templates) => {
                self.templates = templates;
                Ok(())
            }
            LoadOutcome::NeedsBootstrap(reason) => self.bootstrap(&reason),
        }
    }

    pub fn list(&self) -> &[DiagnosisTemplate] {
        &self.templates
    }

    pub fn get(&self, id: i64) -> Option<&DiagnosisTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn add(&mut self, template: DiagnosisTemplate) -> Result<()> {
        if self.get(template.id).is_some() {
            return Err(ClinicError::DuplicateIdentity(format!(
                "template id {}",
                template.id
            )));
        }
        self.templates.push(template);
        self.persist()
    }

    /// Replace the template with the same id. Returns false (and writes
    /// nothing) if there is none.
    pub fn update(&mut self, template: DiagnosisTemplate) -> Result<bool> {
        let Some(slot) = self.templates.iter_mut().find(|t| t.id == template.id) else {
            return Ok(false);
        };
        *slot = template;
        self.persist()?;
        Ok(true)
    }

    pub fn delete(&mut self, id: i64) -> Result<bool> {
        let before = self.templates.len();
        self.templates.retain(|t| t.id != id);
        if self.templates.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Templates containing `search` in name, content or category, AND in
    /// the wanted category. Storage order.
    pub fn filter(&self, search: &str, category: &CategoryFilter) -> Vec<&DiagnosisTemplate> {
        self.templates
            .iter()
            .filter(|t| t.contains_text(search) && category.admits(&t.category))
            .collect()
    }

    /// Distinct categories, in order of first appearance.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for template in &self.templates {
            if !seen.contains(&template.category.as_str()) {
                seen.push(&template.category);
            }
        }
        seen
    }

    pub fn persist(&self) -> Result<()> {
        let bytes = encode_document(&self.templates)?;
        persist_bytes(&self.backend, &self.path, &bytes)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}
