//! Activity collection for a reporting record

use tracing::{debug, warn};

use ghg_types::Result;

use crate::model::{ActivityRecord, ReportingRecord, ScopeSelection};
use crate::repository::ActivityRepository;

/// Activities of one reporting record, split by scope policy
#[derive(Debug, Clone, Default)]
pub struct CollectedActivities {
    /// Ordered by ascending activity id
    pub included: Vec<ActivityRecord>,
    /// Activities whose scope is not collected for the organization
    pub skipped: Vec<ActivityRecord>,
}

/// Load every activity attached to `record` in a stable order
///
/// Sorting by id keeps floating-point summation reproducible across runs.
pub fn collect_activities<R>(
    repository: &R,
    record: &ReportingRecord,
    scopes: &ScopeSelection,
) -> Result<CollectedActivities>
where
    R: ActivityRepository + ?Sized,
{
    let mut activities = repository.list_activity_records(record.id)?;
    activities.sort_by_key(|a| a.id());

    let (included, skipped): (Vec<_>, Vec<_>) = activities
        .into_iter()
        .partition(|a| scopes.includes(a.scope()));

    for activity in &included {
        if !record.period.contains(activity.date()) {
            warn!(
                reporting_record_id = record.id,
                activity_id = activity.id(),
                date = %activity.date(),
                period = %record.period,
                "activity dated outside its reporting period"
            );
        }
    }

    if !skipped.is_empty() {
        debug!(
            reporting_record_id = record.id,
            skipped = skipped.len(),
            "activities outside the collected scopes"
        );
    }

    Ok(CollectedActivities { included, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElectricityEntry, FuelEntry, ReportingPeriod};
    use crate::repository::{InMemoryRepository, ReportingRecordRepository};
    use chrono::NaiveDate;
    use ghg_types::Scope;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn setup() -> (InMemoryRepository, ReportingRecord) {
        let repo = InMemoryRepository::new();
        let record = repo
            .insert_reporting_record(
                "org-1",
                ReportingPeriod::new(date(1, 1), date(2, 1)).unwrap(),
                None,
            )
            .unwrap();
        repo.add_activity(
            record.id,
            ActivityRecord::Electricity(ElectricityEntry {
                id: 0,
                grid: "grid".to_string(),
                consumption: 100.0,
                unit: "kwh".to_string(),
                billing_start: date(1, 1),
                billing_end: date(1, 31),
            }),
        )
        .unwrap();
        repo.add_activity(
            record.id,
            ActivityRecord::Fuel(FuelEntry {
                id: 0,
                fuel_type: "diesel".to_string(),
                quantity: 10.0,
                unit: "l".to_string(),
                date: date(1, 20),
            }),
        )
        .unwrap();
        (repo, record)
    }

    #[test]
    fn test_collects_in_id_order() {
        let (repo, record) = setup();
        let collected = collect_activities(&repo, &record, &ScopeSelection::all()).unwrap();
        let ids: Vec<_> = collected.included.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(collected.skipped.is_empty());
    }

    #[test]
    fn test_scope_policy_skips() {
        let (repo, record) = setup();
        let collected =
            collect_activities(&repo, &record, &ScopeSelection::only(&[Scope::Scope1])).unwrap();
        assert_eq!(collected.included.len(), 1);
        assert_eq!(collected.skipped.len(), 1);
        assert_eq!(collected.skipped[0].scope(), Scope::Scope2);
    }
}
