//! Repository trait definitions for data persistence

mod in_memory;

pub use in_memory::InMemoryRepository;

use crate::model::{ActivityRecord, CalculationResult, ReportingPeriod, ReportingRecord};
use ghg_types::{Error, RecordId};

/// Repository for reporting records
pub trait ReportingRecordRepository {
    /// Find a reporting record by id
    fn get_reporting_record(&self, id: RecordId) -> Result<Option<ReportingRecord>, Error>;

    /// All reporting records of an organization, in no particular order
    fn list_reporting_records(&self, organization_id: &str)
        -> Result<Vec<ReportingRecord>, Error>;

    /// Create a reporting record and assign its id
    fn insert_reporting_record(
        &self,
        organization_id: &str,
        period: ReportingPeriod,
        label: Option<String>,
    ) -> Result<ReportingRecord, Error>;
}

/// Repository for activity records attached to a reporting record
pub trait ActivityRepository {
    /// All activity records of a reporting record
    fn list_activity_records(&self, reporting_record_id: RecordId)
        -> Result<Vec<ActivityRecord>, Error>;

    /// Attach an activity record, assigning its id
    ///
    /// Fails with `RecordNotFound` when the reporting record does not exist.
    /// The stored calculation result is left as is; callers recompute.
    fn add_activity(
        &self,
        reporting_record_id: RecordId,
        activity: ActivityRecord,
    ) -> Result<ActivityRecord, Error>;

    /// Attach a batch of activity records in one write
    ///
    /// Either every record is stored, in order with ascending ids, or none is.
    fn add_activities(
        &self,
        reporting_record_id: RecordId,
        activities: Vec<ActivityRecord>,
    ) -> Result<Vec<ActivityRecord>, Error>;
}

/// Repository for calculation results (at most one per reporting record)
pub trait CalculationResultRepository {
    fn get_calculation_result(
        &self,
        reporting_record_id: RecordId,
    ) -> Result<Option<CalculationResult>, Error>;

    /// Replace the stored result atomically
    fn upsert_calculation_result(
        &self,
        reporting_record_id: RecordId,
        result: &CalculationResult,
    ) -> Result<(), Error>;
}

/// Everything the calculation engine needs from the store
pub trait EmissionsRepository:
    ReportingRecordRepository + ActivityRepository + CalculationResultRepository + Send + Sync
{
}

impl<T> EmissionsRepository for T where
    T: ReportingRecordRepository + ActivityRepository + CalculationResultRepository + Send + Sync
{
}
