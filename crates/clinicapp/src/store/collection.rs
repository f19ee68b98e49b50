//! Generic multi-collection document store.
//!
//! One JSON document maps collection names to arrays of records:
//!
//! ```json
//! {
//!   "visits": [ { "id": 1, "patient": "A1" }, { "id": 2, "patient": "B2" } ],
//!   "invoices": []
//! }
//! ```
//!
//! Records are free-form JSON objects. The only field the store interprets is
//! `id`, an integer unique within its collection. A record added without one
//! gets `max(existing ids) + 1`, starting at 1. Collections spring into
//! existence the first time they are named.
//!
//! If the backend reports it cannot persist at all, the store runs
//! memory-only: every operation works on the mirror and nothing is written.
//! [`CollectionStore::is_durable`] tells callers which mode they are in.

use super::backend::StorageBackend;
use super::{persist_bytes, quarantine, read_outcome, BootstrapReason, LoadOutcome};
use crate::codec::{decode_document, encode_document};
use crate::error::{ClinicError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const ID_FIELD: &str = "id";

pub type Record = Map<String, Value>;
pub type Collections = BTreeMap<String, Vec<Record>>;

pub struct CollectionStore<B: StorageBackend> {
    backend: B,
    path: PathBuf,
    collections: Collections,
    durable: bool,
}

fn record_id(record: &Record) -> Option<i64> {
    record.get(ID_FIELD).and_then(Value::as_i64)
}

fn has_id(record: &Record) -> bool {
    !matches!(record.get(ID_FIELD), None | Some(Value::Null))
}

impl<B: StorageBackend> CollectionStore<B> {
    /// Creates an unloaded store. Call [`load`](Self::load) before use, or
    /// use [`open`](Self::open).
    pub fn new(backend: B, path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            path: path.into(),
            collections: Collections::new(),
            durable: false,
        }
    }

    pub fn open(backend: B, path: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self::new(backend, path);
        store.load()?;
        Ok(store)
    }

    pub fn try_load(&self) -> LoadOutcome<Collections> {
        read_outcome(&self.backend, &self.path, decode_document)
    }

    /// Replace the mirror with an empty document and write it.
    pub fn bootstrap(&mut self, reason: &BootstrapReason) -> Result<()> {
        tracing::info!(
            path = %self.backend.location(&self.path).display(),
            "Initializing empty collection store: {reason}"
        );
        quarantine(&self.backend, &self.path, reason);
        self.collections = Collections::new();
        self.persist()
    }

    pub fn load(&mut self) -> Result<()> {
        if !self.backend.is_available() {
            tracing::warn!(
                path = %self.backend.location(&self.path).display(),
                "Storage unavailable, collection store is memory-only"
            );
            self.durable = false;
            self.collections = Collections::new();
            return Ok(());
        }

        self.durable = true;
        match self.try_load() {
            LoadOutcome::Loaded(collections) => {
                self.collections = collections;
                Ok(())
            }
            LoadOutcome::NeedsBootstrap(reason) => self.bootstrap(&reason),
        }
    }

    /// False when the store is running memory-only.
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    /// The live records of a collection, in insertion order. Naming an unseen
    /// collection creates it empty (it is written on the next mutation).
    pub fn list(&mut self, collection: &str) -> &[Record] {
        self.collections.entry(collection.to_string()).or_default()
    }

    pub fn get(&self, collection: &str, id: i64) -> Option<&Record> {
        self.collections
            .get(collection)?
            .iter()
            .find(|r| record_id(r) == Some(id))
    }

    pub fn collection_names(&self) -> Vec<&str> {
        self.collections.keys().map(String::as_str).collect()
    }

    /// Append a record, assigning `max + 1` when it carries no id.
    pub fn add(&mut self, collection: &str, mut record: Record) -> Result<Record> {
        let records = self.collections.entry(collection.to_string()).or_default();

        if has_id(&record) {
            if let Some(id) = record_id(&record) {
                if records.iter().any(|r| record_id(r) == Some(id)) {
                    return Err(ClinicError::DuplicateIdentity(format!(
                        "{} id {}",
                        collection, id
                    )));
                }
            }
        } else {
            let next = records
                .iter()
                .filter_map(record_id)
                .max()
                .unwrap_or(0)
                .checked_add(1)
                .ok_or_else(|| {
                    ClinicError::Validation(format!(
                        "{} has no id left after {}",
                        collection,
                        i64::MAX
                    ))
                })?;
            record.insert(ID_FIELD.to_string(), Value::from(next));
        }

        records.push(record.clone());
        self.persist()?;
        Ok(record)
    }

    /// Merge `changes` into the record with `id`. The id itself is never
    /// replaced. Returns `None` (and writes nothing) when there is no match.
    pub fn update(&mut self, collection: &str, id: i64, changes: Record) -> Result<Option<Record>> {
        let Some(record) = self
            .collections
            .get_mut(collection)
            .and_then(|records| records.iter_mut().find(|r| record_id(r) == Some(id)))
        else {
            return Ok(None);
        };

        for (key, value) in changes {
            if key != ID_FIELD {
                record.insert(key, value);
            }
        }
        let updated = record.clone();
        self.persist()?;
        Ok(Some(updated))
    }

    /// Remove the record with `id`. Returns whether anything was removed.
    pub fn delete(&mut self, collection: &str, id: i64) -> Result<bool> {
        let Some(records) = self.collections.get_mut(collection) else {
            return Ok(false);
        };
        let Some(pos) = records.iter().position(|r| record_id(r) == Some(id)) else {
            return Ok(false);
        };
        records.remove(pos);
        self.persist()?;
        Ok(true)
    }

    /// Write the whole mirror. A no-op in memory-only mode.
    pub fn persist(&self) -> Result<()> {
        if !self.durable {
            tracing::debug!("Collection store is memory-only, skipping persist");
            return Ok(());
        }
        let bytes = encode_document(&self.collections)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::MemBackend;
    use serde_json::json;

    const PATH: &str = "storage/app.json";

    fn make_store() -> CollectionStore<MemBackend> {
        CollectionStore::open(MemBackend::new(), PATH).unwrap()
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn ids(store: &mut CollectionStore<MemBackend>, collection: &str) -> Vec<i64> {
        store
            .list(collection)
            .iter()
            .filter_map(record_id)
            .collect()
    }

    #[test]
    fn load_bootstraps_empty_document() {
        let store = make_store();
        assert!(store.is_durable());
        assert_eq!(store.backend().file(PATH).unwrap(), b"{}\n");
    }

    #[test]
    fn corrupt_document_is_quarantined_and_reset() {
        let backend = MemBackend::new();
        backend
            .write_atomic(Path::new(PATH), b"not json")
            .unwrap();

        let store = CollectionStore::open(backend, PATH).unwrap();
        assert!(store.collection_names().is_empty());
        assert_eq!(store.backend().file(PATH).unwrap(), b"{}\n");
        assert_eq!(store.backend().paths().len(), 2);
    }

    #[test]
    fn ids_are_assigned_max_plus_one() {
        let mut store = make_store();
        for _ in 0..3 {
            store.add("visits", Record::new()).unwrap();
        }
        assert_eq!(ids(&mut store, "visits"), vec![1, 2, 3]);

        assert!(store.delete("visits", 2).unwrap());
        let added = store.add("visits", Record::new()).unwrap();
        assert_eq!(added[ID_FIELD], json!(4));
        assert_eq!(ids(&mut store, "visits"), vec![1, 3, 4]);
    }

    #[test]
    fn null_id_counts_as_unset() {
        let mut store = make_store();
        let added = store.add("visits", record(json!({"id": null}))).unwrap();
        assert_eq!(added[ID_FIELD], json!(1));
    }

    #[test]
    fn supplied_id_is_kept_and_must_be_unique() {
        let mut store = make_store();
        store.add("visits", record(json!({"id": 10}))).unwrap();
        let next = store.add("visits", Record::new()).unwrap();
        assert_eq!(next[ID_FIELD], json!(11));

        let dup = store.add("visits", record(json!({"id": 10})));
        assert!(matches!(dup, Err(ClinicError::DuplicateIdentity(_))));
        assert_eq!(store.list("visits").len(), 2);
    }

    #[test]
    fn exhausted_id_space_is_rejected() {
        let mut store = make_store();
        store
            .add("visits", record(json!({"id": i64::MAX})))
            .unwrap();

        let result = store.add("visits", Record::new());
        assert!(matches!(result, Err(ClinicError::Validation(_))));
        assert_eq!(store.list("visits").len(), 1);

        // A supplied id still works.
        store.add("visits", record(json!({"id": 1}))).unwrap();
    }

    #[test]
    fn collections_are_independent() {
        let mut store = make_store();
        store.add("visits", Record::new()).unwrap();
        store.add("visits", Record::new()).unwrap();
        let invoice = store.add("invoices", Record::new()).unwrap();
        assert_eq!(invoice[ID_FIELD], json!(1));
    }

    #[test]
    fn list_creates_collection_without_writing() {
        let mut store = make_store();
        assert!(store.list("unseen").is_empty());
        assert_eq!(store.collection_names(), vec!["unseen"]);
        assert_eq!(store.backend().file(PATH).unwrap(), b"{}\n");
    }

    #[test]
    fn update_merges_but_keeps_id() {
        let mut store = make_store();
        store
            .add("visits", record(json!({"patient": "A1", "note": "first"})))
            .unwrap();

        let updated = store
            .update("visits", 1, record(json!({"id": 99, "note": "second"})))
            .unwrap()
            .unwrap();
        assert_eq!(updated[ID_FIELD], json!(1));
        assert_eq!(updated["note"], json!("second"));
        assert_eq!(updated["patient"], json!("A1"));
        assert!(store.get("visits", 99).is_none());
    }

    #[test]
    fn update_missing_returns_none() {
        let mut store = make_store();
        assert!(store.update("visits", 5, Record::new()).unwrap().is_none());
        assert!(store.update("nothing", 5, Record::new()).unwrap().is_none());
    }

    #[test]
    fn delete_missing_returns_false() {
        let mut store = make_store();
        store.add("visits", Record::new()).unwrap();
        assert!(!store.delete("visits", 7).unwrap());
        assert!(!store.delete("nothing", 1).unwrap());
        assert_eq!(store.list("visits").len(), 1);
    }

    #[test]
    fn mutations_survive_reload() {
        let mut store = make_store();
        store
            .add("visits", record(json!({"patient": "A1"})))
            .unwrap();
        store.add("visits", Record::new()).unwrap();
        store.delete("visits", 2).unwrap();

        let mut reopened = CollectionStore::open(store.into_backend(), PATH).unwrap();
        let visits = reopened.list("visits");
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0]["patient"], json!("A1"));
    }

    #[test]
    fn unavailable_storage_runs_in_memory() {
        let backend = MemBackend::new();
        backend.set_available(false);

        let mut store = CollectionStore::open(backend, PATH).unwrap();
        assert!(!store.is_durable());

        let added = store.add("visits", Record::new()).unwrap();
        assert_eq!(added[ID_FIELD], json!(1));
        assert_eq!(store.list("visits").len(), 1);
        assert!(store.backend().paths().is_empty());
    }

    #[test]
    fn failed_write_keeps_change_in_mirror() {
        let mut store = make_store();
        store.backend().set_simulate_write_error(true);

        let result = store.add("visits", Record::new());
        assert!(matches!(result, Err(ClinicError::Persistence { .. })));
        assert_eq!(store.list("visits").len(), 1);
        assert_eq!(store.backend().file(PATH).unwrap(), b"{}\n");

        store.backend().set_simulate_write_error(false);
        store.persist().unwrap();
        let reopened = CollectionStore::open(store.into_backend(), PATH).unwrap();
        assert!(reopened.get("visits", 1).is_some());
    }
}
