//! File-based emissions repository implementation
//!
//! Reporting records, their activities and calculation results live in a
//! single JSON document. Every mutation rewrites the document through a
//! temporary file and a rename, so a crash never leaves a half-written store.
//!
//! Several processes may share one store. Access is serialized with an OS
//! lock on a sidecar lock file, and the document is re-read from disk under
//! that lock before every read and every mutation.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use fd_lock::RwLock as FileLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ghg_domain::model::{ActivityRecord, CalculationResult, ReportingPeriod, ReportingRecord};
use ghg_domain::repository::{
    ActivityRepository, CalculationResultRepository, ReportingRecordRepository,
};
use ghg_types::{Error, RecordId, Result};

const STORE_FILE: &str = "emissions.json";
const LOCK_FILE: &str = "emissions.lock";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    records: BTreeMap<RecordId, ReportingRecord>,
    #[serde(default)]
    activities: BTreeMap<RecordId, Vec<ActivityRecord>>,
    #[serde(default)]
    results: BTreeMap<RecordId, CalculationResult>,
    #[serde(default)]
    last_record_id: RecordId,
    #[serde(default)]
    last_activity_id: RecordId,
}

impl StoreDocument {
    fn load(store_path: &Path) -> Result<Self> {
        if !store_path.exists() {
            return Ok(Self::default());
        }
        let file = File::open(store_path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    fn push_activity(
        &mut self,
        reporting_record_id: RecordId,
        mut activity: ActivityRecord,
    ) -> ActivityRecord {
        self.last_activity_id += 1;
        activity.set_id(self.last_activity_id);
        self.activities
            .entry(reporting_record_id)
            .or_default()
            .push(activity.clone());
        activity
    }
}

/// File-based implementation of the emissions repository traits
pub struct FileEmissionsRepository {
    store_path: PathBuf,
    lock_path: PathBuf,
    document: Mutex<StoreDocument>,
}

impl FileEmissionsRepository {
    /// Create or load a repository rooted at `store_dir`
    pub fn open(store_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&store_dir)?;
        let repo = Self {
            store_path: store_dir.join(STORE_FILE),
            lock_path: store_dir.join(LOCK_FILE),
            document: Mutex::new(StoreDocument::default()),
        };

        let records = repo.read(|document| document.records.len())?;
        debug!(
            path = %repo.store_path.display(),
            records,
            "opened emissions store"
        );
        Ok(repo)
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    fn lock(&self) -> MutexGuard<'_, StoreDocument> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_file(&self) -> Result<FileLock<File>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)?;
        Ok(FileLock::new(file))
    }

    /// Write the document next to the store and move it into place
    fn persist(&self, document: &StoreDocument) -> Result<()> {
        let tmp_path = self.store_path.with_extension("json.tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, document)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, &self.store_path)?;
        Ok(())
    }

    /// Refresh from disk under a shared lock and read from the document
    fn read<T>(&self, read: impl FnOnce(&StoreDocument) -> T) -> Result<T> {
        let mut document = self.lock();
        let file_lock = self.lock_file()?;
        let _shared = file_lock.read()?;
        *document = StoreDocument::load(&self.store_path)?;
        Ok(read(&document))
    }

    /// Refresh from disk under an exclusive lock, apply `mutate` and persist
    ///
    /// On a failed write the in-memory state is restored.
    fn mutate<T>(&self, mutate: impl FnOnce(&mut StoreDocument) -> Result<T>) -> Result<T> {
        let mut document = self.lock();
        let mut file_lock = self.lock_file()?;
        let _exclusive = file_lock.write()?;
        *document = StoreDocument::load(&self.store_path)?;

        let snapshot = document.clone();
        let value = match mutate(&mut document) {
            Ok(value) => value,
            Err(e) => {
                *document = snapshot;
                return Err(e);
            }
        };
        if let Err(e) = self.persist(&document) {
            *document = snapshot;
            return Err(e);
        }
        Ok(value)
    }
}

impl ReportingRecordRepository for FileEmissionsRepository {
    fn get_reporting_record(&self, id: RecordId) -> Result<Option<ReportingRecord>> {
        self.read(|document| document.records.get(&id).cloned())
    }

    fn list_reporting_records(&self, organization_id: &str) -> Result<Vec<ReportingRecord>> {
        self.read(|document| {
            document
                .records
                .values()
                .filter(|r| r.organization_id == organization_id)
                .cloned()
                .collect()
        })
    }

    fn insert_reporting_record(
        &self,
        organization_id: &str,
        period: ReportingPeriod,
        label: Option<String>,
    ) -> Result<ReportingRecord> {
        self.mutate(|document| {
            document.last_record_id += 1;
            let record = ReportingRecord {
                id: document.last_record_id,
                organization_id: organization_id.to_string(),
                period,
                label,
            };
            document.records.insert(record.id, record.clone());
            Ok(record)
        })
    }
}

impl ActivityRepository for FileEmissionsRepository {
    fn list_activity_records(&self, reporting_record_id: RecordId) -> Result<Vec<ActivityRecord>> {
        self.read(|document| {
            document
                .activities
                .get(&reporting_record_id)
                .cloned()
                .unwrap_or_default()
        })
    }

    fn add_activity(
        &self,
        reporting_record_id: RecordId,
        activity: ActivityRecord,
    ) -> Result<ActivityRecord> {
        self.mutate(|document| {
            if !document.records.contains_key(&reporting_record_id) {
                return Err(Error::RecordNotFound(reporting_record_id));
            }
            Ok(document.push_activity(reporting_record_id, activity))
        })
    }

    fn add_activities(
        &self,
        reporting_record_id: RecordId,
        activities: Vec<ActivityRecord>,
    ) -> Result<Vec<ActivityRecord>> {
        self.mutate(|document| {
            if !document.records.contains_key(&reporting_record_id) {
                return Err(Error::RecordNotFound(reporting_record_id));
            }
            Ok(activities
                .into_iter()
                .map(|activity| document.push_activity(reporting_record_id, activity))
                .collect())
        })
    }
}

impl CalculationResultRepository for FileEmissionsRepository {
    fn get_calculation_result(
        &self,
        reporting_record_id: RecordId,
    ) -> Result<Option<CalculationResult>> {
        self.read(|document| document.results.get(&reporting_record_id).cloned())
    }

    fn upsert_calculation_result(
        &self,
        reporting_record_id: RecordId,
        result: &CalculationResult,
    ) -> Result<()> {
        self.mutate(|document| {
            if !document.records.contains_key(&reporting_record_id) {
                return Err(Error::RecordNotFound(reporting_record_id));
            }
            document.results.insert(reporting_record_id, result.clone());
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ghg_domain::model::FuelEntry;
    use ghg_types::Category;
    use tempfile::tempdir;

    fn period() -> ReportingPeriod {
        ReportingPeriod::new(
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        )
        .unwrap()
    }

    fn diesel(quantity: f64) -> ActivityRecord {
        ActivityRecord::Fuel(FuelEntry {
            id: 0,
            fuel_type: "diesel".to_string(),
            quantity,
            unit: "l".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
        })
    }

    fn result(record_id: RecordId, total: f64) -> CalculationResult {
        let mut breakdown: BTreeMap<Category, f64> =
            Category::ALL.iter().map(|c| (*c, 0.0)).collect();
        breakdown.insert(Category::Fuel, total);
        CalculationResult {
            reporting_record_id: record_id,
            total_co2e: total,
            total_scope1_co2e: total,
            total_scope2_co2e: 0.0,
            total_scope3_co2e: 0.0,
            breakdown_by_category: breakdown,
            records_aggregated: 1,
        }
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = tempdir().unwrap();
        let record_id = {
            let repo = FileEmissionsRepository::open(dir.path().to_path_buf()).unwrap();
            let record = repo
                .insert_reporting_record("org-1", period(), Some("January".to_string()))
                .unwrap();
            repo.add_activity(record.id, diesel(100.0)).unwrap();
            repo.upsert_calculation_result(record.id, &result(record.id, 268.0))
                .unwrap();
            record.id
        };

        let repo = FileEmissionsRepository::open(dir.path().to_path_buf()).unwrap();
        let record = repo.get_reporting_record(record_id).unwrap().unwrap();
        assert_eq!(record.label.as_deref(), Some("January"));
        assert_eq!(repo.list_activity_records(record_id).unwrap().len(), 1);
        let stored = repo.get_calculation_result(record_id).unwrap().unwrap();
        assert_eq!(stored.total_co2e, 268.0);
        assert_eq!(stored.breakdown_by_category.len(), 5);
    }

    #[test]
    fn test_ids_continue_after_reopen() {
        let dir = tempdir().unwrap();
        {
            let repo = FileEmissionsRepository::open(dir.path().to_path_buf()).unwrap();
            let record = repo.insert_reporting_record("org-1", period(), None).unwrap();
            repo.add_activity(record.id, diesel(1.0)).unwrap();
        }
        let repo = FileEmissionsRepository::open(dir.path().to_path_buf()).unwrap();
        let record = repo.insert_reporting_record("org-1", period(), None).unwrap();
        assert_eq!(record.id, 2);
        let activity = repo.add_activity(record.id, diesel(2.0)).unwrap();
        assert_eq!(activity.id(), 2);
    }

    #[test]
    fn test_upsert_replaces_previous_result() {
        let dir = tempdir().unwrap();
        let repo = FileEmissionsRepository::open(dir.path().to_path_buf()).unwrap();
        let record = repo.insert_reporting_record("org-1", period(), None).unwrap();
        repo.upsert_calculation_result(record.id, &result(record.id, 1.0))
            .unwrap();
        repo.upsert_calculation_result(record.id, &result(record.id, 2.0))
            .unwrap();
        let stored = repo.get_calculation_result(record.id).unwrap().unwrap();
        assert_eq!(stored.total_co2e, 2.0);
    }

    #[test]
    fn test_unknown_record_is_rejected() {
        let dir = tempdir().unwrap();
        let repo = FileEmissionsRepository::open(dir.path().to_path_buf()).unwrap();
        assert!(matches!(
            repo.add_activity(9, diesel(1.0)),
            Err(Error::RecordNotFound(9))
        ));
        assert!(matches!(
            repo.upsert_calculation_result(9, &result(9, 1.0)),
            Err(Error::RecordNotFound(9))
        ));
        assert!(!repo.store_path().exists());
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let dir = tempdir().unwrap();
        let repo = FileEmissionsRepository::open(dir.path().to_path_buf()).unwrap();
        let record = repo.insert_reporting_record("org-1", period(), None).unwrap();
        repo.upsert_calculation_result(record.id, &result(record.id, 1.0))
            .unwrap();

        // A directory in place of the temp file makes the next write fail
        fs::create_dir(repo.store_path().with_extension("json.tmp")).unwrap();
        assert!(repo
            .upsert_calculation_result(record.id, &result(record.id, 5.0))
            .is_err());

        let stored = repo.get_calculation_result(record.id).unwrap().unwrap();
        assert_eq!(stored.total_co2e, 1.0);
    }

    #[test]
    fn test_two_handles_keep_each_others_writes() {
        let dir = tempdir().unwrap();
        let first = FileEmissionsRepository::open(dir.path().to_path_buf()).unwrap();
        let second = FileEmissionsRepository::open(dir.path().to_path_buf()).unwrap();

        let a = first.insert_reporting_record("org-1", period(), None).unwrap();
        let b = second.insert_reporting_record("org-1", period(), None).unwrap();
        assert_ne!(a.id, b.id);

        first
            .upsert_calculation_result(a.id, &result(a.id, 10.0))
            .unwrap();
        second
            .upsert_calculation_result(b.id, &result(b.id, 20.0))
            .unwrap();
        assert_eq!(second.get_calculation_result(a.id).unwrap().unwrap().total_co2e, 10.0);

        let reopened = FileEmissionsRepository::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.get_calculation_result(a.id).unwrap().unwrap().total_co2e, 10.0);
        assert_eq!(reopened.get_calculation_result(b.id).unwrap().unwrap().total_co2e, 20.0);
    }

    #[test]
    fn test_concurrent_handles_from_threads() {
        let dir = tempdir().unwrap();
        let setup = FileEmissionsRepository::open(dir.path().to_path_buf()).unwrap();
        let ids: Vec<RecordId> = (0..4)
            .map(|_| setup.insert_reporting_record("org-1", period(), None).unwrap().id)
            .collect();

        std::thread::scope(|scope| {
            for &id in &ids {
                let path = dir.path().to_path_buf();
                scope.spawn(move || {
                    let repo = FileEmissionsRepository::open(path).unwrap();
                    repo.add_activity(id, diesel(1.0)).unwrap();
                    repo.upsert_calculation_result(id, &result(id, id as f64))
                        .unwrap();
                });
            }
        });

        for &id in &ids {
            assert_eq!(setup.list_activity_records(id).unwrap().len(), 1);
            assert_eq!(setup.get_calculation_result(id).unwrap().unwrap().total_co2e, id as f64);
        }
    }

    #[test]
    fn test_batch_insert_is_all_or_nothing() {
        let dir = tempdir().unwrap();
        let repo = FileEmissionsRepository::open(dir.path().to_path_buf()).unwrap();
        let record = repo.insert_reporting_record("org-1", period(), None).unwrap();

        let stored = repo
            .add_activities(record.id, vec![diesel(1.0), diesel(2.0), diesel(3.0)])
            .unwrap();
        let ids: Vec<RecordId> = stored.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        fs::create_dir(repo.store_path().with_extension("json.tmp")).unwrap();
        assert!(repo
            .add_activities(record.id, vec![diesel(4.0), diesel(5.0)])
            .is_err());
        fs::remove_dir(repo.store_path().with_extension("json.tmp")).unwrap();
        assert_eq!(repo.list_activity_records(record.id).unwrap().len(), 3);
    }

    #[test]
    fn test_list_filters_by_organization() {
        let dir = tempdir().unwrap();
        let repo = FileEmissionsRepository::open(dir.path().to_path_buf()).unwrap();
        repo.insert_reporting_record("org-1", period(), None).unwrap();
        repo.insert_reporting_record("org-2", period(), None).unwrap();
        repo.insert_reporting_record("org-1", period(), None).unwrap();
        assert_eq!(repo.list_reporting_records("org-1").unwrap().len(), 2);
        assert!(repo.list_reporting_records("org-3").unwrap().is_empty());
    }
}
