//! In-memory implementation of the repository traits
//!
//! Used by tests and dry runs. Not persisted anywhere.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use ghg_types::{Error, RecordId};

use super::{ActivityRepository, CalculationResultRepository, ReportingRecordRepository};
use crate::model::{ActivityRecord, CalculationResult, ReportingPeriod, ReportingRecord};

#[derive(Debug, Default)]
struct MemoryState {
    records: BTreeMap<RecordId, ReportingRecord>,
    activities: BTreeMap<RecordId, Vec<ActivityRecord>>,
    results: BTreeMap<RecordId, CalculationResult>,
    last_record_id: RecordId,
    last_activity_id: RecordId,
}

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: RwLock<MemoryState>,
    upserts: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful result upserts so far
    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }
}

impl ReportingRecordRepository for InMemoryRepository {
    fn get_reporting_record(&self, id: RecordId) -> Result<Option<ReportingRecord>, Error> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.records.get(&id).cloned())
    }

    fn list_reporting_records(
        &self,
        organization_id: &str,
    ) -> Result<Vec<ReportingRecord>, Error> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state
            .records
            .values()
            .filter(|r| r.organization_id == organization_id)
            .cloned()
            .collect())
    }

    fn insert_reporting_record(
        &self,
        organization_id: &str,
        period: ReportingPeriod,
        label: Option<String>,
    ) -> Result<ReportingRecord, Error> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.last_record_id += 1;
        let record = ReportingRecord {
            id: state.last_record_id,
            organization_id: organization_id.to_string(),
            period,
            label,
        };
        state.records.insert(record.id, record.clone());
        Ok(record)
    }
}

impl ActivityRepository for InMemoryRepository {
    fn list_activity_records(
        &self,
        reporting_record_id: RecordId,
    ) -> Result<Vec<ActivityRecord>, Error> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state
            .activities
            .get(&reporting_record_id)
            .cloned()
            .unwrap_or_default())
    }

    fn add_activity(
        &self,
        reporting_record_id: RecordId,
        mut activity: ActivityRecord,
    ) -> Result<ActivityRecord, Error> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.records.contains_key(&reporting_record_id) {
            return Err(Error::RecordNotFound(reporting_record_id));
        }
        state.last_activity_id += 1;
        activity.set_id(state.last_activity_id);
        state
            .activities
            .entry(reporting_record_id)
            .or_default()
            .push(activity.clone());
        Ok(activity)
    }

    fn add_activities(
        &self,
        reporting_record_id: RecordId,
        activities: Vec<ActivityRecord>,
    ) -> Result<Vec<ActivityRecord>, Error> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.records.contains_key(&reporting_record_id) {
            return Err(Error::RecordNotFound(reporting_record_id));
        }
        let mut stored = Vec::with_capacity(activities.len());
        for mut activity in activities {
            state.last_activity_id += 1;
            activity.set_id(state.last_activity_id);
            state
                .activities
                .entry(reporting_record_id)
                .or_default()
                .push(activity.clone());
            stored.push(activity);
        }
        Ok(stored)
    }
}

impl CalculationResultRepository for InMemoryRepository {
    fn get_calculation_result(
        &self,
        reporting_record_id: RecordId,
    ) -> Result<Option<CalculationResult>, Error> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.results.get(&reporting_record_id).cloned())
    }

    fn upsert_calculation_result(
        &self,
        reporting_record_id: RecordId,
        result: &CalculationResult,
    ) -> Result<(), Error> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state.records.contains_key(&reporting_record_id) {
            return Err(Error::RecordNotFound(reporting_record_id));
        }
        state.results.insert(reporting_record_id, result.clone());
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
