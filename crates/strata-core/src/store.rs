//! Entity store: the persistence seam every record goes through.
//!
//! [`EntityStore`] mirrors the managed backend's per-collection contract
//! (`create`, `update`, `delete`, `filter`) plus `get` and `list`.
//! [`FileStore`] keeps one YAML document per record under `.strata/`;
//! [`MemoryStore`] keeps everything in a mutex-guarded map.

use crate::error::{Result, StrataError};
use crate::io;
use crate::paths;
use crate::types::Collection;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A typed record living in one named collection.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const COLLECTION: Collection;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn created_at(&self) -> DateTime<Utc>;
}

/// Fresh opaque record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Conjunction of `field == value` clauses evaluated against the serialized
/// record. A field absent from the record compares equal to `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn matches_value(&self, record: &Value) -> bool {
        self.clauses.iter().all(|(field, expected)| {
            let actual = record.get(field).unwrap_or(&Value::Null);
            actual == expected
        })
    }

    pub fn matches<R: Serialize>(&self, record: &R) -> Result<bool> {
        if self.is_empty() {
            return Ok(true);
        }
        let value = serde_json::to_value(record)?;
        Ok(self.matches_value(&value))
    }
}

// ---------------------------------------------------------------------------
// EntityStore
// ---------------------------------------------------------------------------

pub trait EntityStore {
    /// Persist a new record. An empty id is replaced with a fresh one.
    fn create<R: Record>(&self, record: R) -> Result<R>;

    /// Replace an existing record with the same id.
    fn update<R: Record>(&self, record: &R) -> Result<R>;

    fn delete(&self, collection: Collection, id: &str) -> Result<()>;

    fn get<R: Record>(&self, id: &str) -> Result<R>;

    /// All records of a collection, oldest first.
    fn list<R: Record>(&self) -> Result<Vec<R>>;

    fn filter<R: Record>(&self, filter: &Filter) -> Result<Vec<R>> {
        let mut out = Vec::new();
        for record in self.list::<R>()? {
            if filter.matches(&record)? {
                out.push(record);
            }
        }
        Ok(out)
    }
}

fn sort_oldest_first<R: Record>(records: &mut [R]) {
    records.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.id().cmp(b.id()))
    });
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// YAML-on-disk store rooted at a project directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open an initialized project; fails if `.strata/` is missing.
    pub fn open(root: &Path) -> Result<Self> {
        if !paths::strata_dir(root).is_dir() {
            return Err(StrataError::NotInitialized);
        }
        Ok(Self::new(root))
    }

    fn write<R: Record>(&self, record: &R) -> Result<()> {
        let path = paths::record_path(&self.root, R::COLLECTION, record.id());
        io::write_yaml(&path, record)
    }
}

impl EntityStore for FileStore {
    fn create<R: Record>(&self, mut record: R) -> Result<R> {
        if record.id().is_empty() {
            record.set_id(new_id());
        }
        paths::validate_id(record.id())?;
        let path = paths::record_path(&self.root, R::COLLECTION, record.id());
        if path.exists() {
            return Err(StrataError::RecordExists {
                collection: R::COLLECTION,
                id: record.id().to_string(),
            });
        }
        self.write(&record)?;
        Ok(record)
    }

    fn update<R: Record>(&self, record: &R) -> Result<R> {
        paths::validate_id(record.id())?;
        let path = paths::record_path(&self.root, R::COLLECTION, record.id());
        if !path.exists() {
            return Err(StrataError::not_found(R::COLLECTION, record.id()));
        }
        self.write(record)?;
        Ok(record.clone())
    }

    fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        paths::validate_id(id)?;
        let path = paths::record_path(&self.root, collection, id);
        if !path.exists() {
            return Err(StrataError::not_found(collection, id));
        }
        std::fs::remove_file(&path)?;
        Ok(())
    }

    fn get<R: Record>(&self, id: &str) -> Result<R> {
        paths::validate_id(id)?;
        let path = paths::record_path(&self.root, R::COLLECTION, id);
        if !path.exists() {
            return Err(StrataError::not_found(R::COLLECTION, id));
        }
        io::read_yaml(&path)
    }

    fn list<R: Record>(&self) -> Result<Vec<R>> {
        let dir = paths::collection_dir(&self.root, R::COLLECTION);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            records.push(io::read_yaml::<R>(&path)?);
        }
        sort_oldest_first(&mut records);
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store. Records are held in their JSON form so one map serves
/// every collection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<Collection, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held in `collection`.
    pub fn count(&self, collection: Collection) -> usize {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.get(&collection).map_or(0, BTreeMap::len)
    }
}

impl EntityStore for MemoryStore {
    fn create<R: Record>(&self, mut record: R) -> Result<R> {
        if record.id().is_empty() {
            record.set_id(new_id());
        }
        let value = serde_json::to_value(&record)?;
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let collection = records.entry(R::COLLECTION).or_default();
        if collection.contains_key(record.id()) {
            return Err(StrataError::RecordExists {
                collection: R::COLLECTION,
                id: record.id().to_string(),
            });
        }
        collection.insert(record.id().to_string(), value);
        Ok(record)
    }

    fn update<R: Record>(&self, record: &R) -> Result<R> {
        let value = serde_json::to_value(record)?;
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        match records
            .get_mut(&R::COLLECTION)
            .and_then(|c| c.get_mut(record.id()))
        {
            Some(slot) => {
                *slot = value;
                Ok(record.clone())
            }
            None => Err(StrataError::not_found(R::COLLECTION, record.id())),
        }
    }

    fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records
            .get_mut(&collection)
            .and_then(|c| c.remove(id))
            .map(|_| ())
            .ok_or_else(|| StrataError::not_found(collection, id))
    }

    fn get<R: Record>(&self, id: &str) -> Result<R> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let value = records
            .get(&R::COLLECTION)
            .and_then(|c| c.get(id))
            .ok_or_else(|| StrataError::not_found(R::COLLECTION, id))?;
        Ok(serde_json::from_value(value.clone())?)
    }

    fn list<R: Record>(&self) -> Result<Vec<R>> {
        let values: Vec<Value> = {
            let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
            records
                .get(&R::COLLECTION)
                .map(|c| c.values().cloned().collect())
                .unwrap_or_default()
        };
        let mut out = values
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<R>, _>>()?;
        sort_oldest_first(&mut out);
        Ok(out)
    }

    fn filter<R: Record>(&self, filter: &Filter) -> Result<Vec<R>> {
        let values: Vec<Value> = {
            let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
            records
                .get(&R::COLLECTION)
                .map(|c| {
                    c.values()
                        .filter(|v| filter.matches_value(v))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };
        let mut out = values
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<R>, _>>()?;
        sort_oldest_first(&mut out);
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// FlakyStore (tests)
// ---------------------------------------------------------------------------

/// Memory store whose schedule collection can be made to fail on writes
/// (`create`, `update`, `delete`) or reads (`get`, `list`, `filter`).
/// Every other collection behaves normally.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_writes: bool,
    pub fail_reads: bool,
}

#[cfg(test)]
impl FlakyStore {
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    fn check(&self, collection: Collection, failing: bool) -> Result<()> {
        if failing && collection == Collection::MaintenanceSchedule {
            return Err(StrataError::Io(std::io::Error::other("backend offline")));
        }
        Ok(())
    }
}

#[cfg(test)]
impl EntityStore for FlakyStore {
    fn create<R: Record>(&self, record: R) -> Result<R> {
        self.check(R::COLLECTION, self.fail_writes)?;
        self.inner.create(record)
    }

    fn update<R: Record>(&self, record: &R) -> Result<R> {
        self.check(R::COLLECTION, self.fail_writes)?;
        self.inner.update(record)
    }

    fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        self.check(collection, self.fail_writes)?;
        self.inner.delete(collection, id)
    }

    fn get<R: Record>(&self, id: &str) -> Result<R> {
        self.check(R::COLLECTION, self.fail_reads)?;
        self.inner.get(id)
    }

    fn list<R: Record>(&self) -> Result<Vec<R>> {
        self.check(R::COLLECTION, self.fail_reads)?;
        self.inner.list()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::MaintenanceSchedule;
    use crate::types::ScheduleRecurrence;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn schedule(subject: &str, work_order_id: Option<&str>) -> MaintenanceSchedule {
        let mut s = MaintenanceSchedule::new(
            "bldg-1",
            subject,
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            ScheduleRecurrence::Monthly,
        );
        s.work_order_id = work_order_id.map(str::to_string);
        s
    }

    fn exercise_store<S: EntityStore>(store: &S) {
        let created = store
            .create(schedule("Lift service", Some("wo-1")))
            .unwrap();
        assert!(!created.id.is_empty());
        store.create(schedule("Gutter clean", None)).unwrap();

        let linked: Vec<MaintenanceSchedule> = store
            .filter(&Filter::new().eq("work_order_id", "wo-1"))
            .unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].subject, "Lift service");

        let mut edited = linked[0].clone();
        edited.subject = "Lift service (annual)".to_string();
        store.update(&edited).unwrap();
        let reloaded: MaintenanceSchedule = store.get(&edited.id).unwrap();
        assert_eq!(reloaded.subject, "Lift service (annual)");

        store
            .delete(Collection::MaintenanceSchedule, &edited.id)
            .unwrap();
        let err = store
            .delete(Collection::MaintenanceSchedule, &edited.id)
            .unwrap_err();
        assert!(err.is_not_found());

        let remaining: Vec<MaintenanceSchedule> = store.list().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].subject, "Gutter clean");
    }

    #[test]
    fn memory_store_crud() {
        exercise_store(&MemoryStore::new());
    }

    #[test]
    fn file_store_crud() {
        let dir = TempDir::new().unwrap();
        exercise_store(&FileStore::new(dir.path()));
    }

    #[test]
    fn file_store_open_requires_init() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            FileStore::open(dir.path()),
            Err(StrataError::NotInitialized)
        ));
        std::fs::create_dir_all(dir.path().join(".strata")).unwrap();
        assert!(FileStore::open(dir.path()).is_ok());
    }

    #[test]
    fn create_rejects_duplicate_id() {
        let store = MemoryStore::new();
        let mut s = schedule("Pool", None);
        s.id = "fixed".to_string();
        store.create(s.clone()).unwrap();
        assert!(matches!(
            store.create(s),
            Err(StrataError::RecordExists { .. })
        ));
    }

    #[test]
    fn update_missing_record_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let mut s = schedule("Pool", None);
        s.id = "ghost".to_string();
        assert!(store.update(&s).unwrap_err().is_not_found());
    }

    #[test]
    fn filter_treats_absent_field_as_null() {
        let store = MemoryStore::new();
        store.create(schedule("Manual", None)).unwrap();
        store.create(schedule("Generated", Some("wo-9"))).unwrap();

        let manual: Vec<MaintenanceSchedule> = store
            .filter(&Filter::new().eq("work_order_id", Value::Null))
            .unwrap();
        assert_eq!(manual.len(), 1);
        assert_eq!(manual[0].subject, "Manual");
    }
}
