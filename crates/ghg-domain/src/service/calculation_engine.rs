//! Calculation Engine - converts activity records into a per-period result
//!
//! Workflow of `calculate`:
//! 1. Fetch the reporting record
//! 2. Claim the record's serialization lock
//! 3. Collect activities (stable id order, scope policy applied)
//! 4. Normalize, look up the factor and derive a contribution per activity
//! 5. Collect per-record failures as warnings
//! 6. Aggregate into scope totals and a category breakdown
//! 7. Round once, at persistence
//! 8. Upsert the result

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use ghg_types::{round_co2e, Category, Error, RecordId, Result, Scope};

use super::activity_collector::collect_activities;
use super::factor_registry::EmissionFactorRegistry;
use super::record_locks::RecordLocks;
use super::unit_normalizer::normalize;
use crate::model::{
    ActivityRecord, CalculationOptions, CalculationOutcome, CalculationResult, Contribution,
    RecordWarning,
};
use crate::repository::EmissionsRepository;

/// Derive the CO2e contribution of one activity record
///
/// Only record-level errors (`InvalidQuantity`, `UnsupportedUnit`,
/// `FactorNotFound`) are returned.
pub fn contribution_for(
    activity: &ActivityRecord,
    registry: &EmissionFactorRegistry,
) -> Result<Contribution> {
    let category = activity.category();
    let subtype = activity.subtype();

    if let ActivityRecord::Refrigerant(entry) = activity {
        // purchased mass is not emitted, but it still has to be a valid figure
        normalize(category, subtype, entry.quantity_purchased, &entry.unit)?;
    }

    let normalized = normalize(category, subtype, activity.emitting_quantity(), activity.unit())?;
    let factor = registry.lookup(category, subtype, normalized.unit)?;

    Ok(Contribution {
        activity_id: activity.id(),
        scope: activity.scope(),
        category,
        subtype: subtype.to_string(),
        canonical_quantity: normalized.quantity,
        canonical_unit: normalized.unit,
        co2e: factor.apply(normalized.quantity),
    })
}

/// Sum contributions into a result and round it for persistence
///
/// Sums run in slice order on unrounded values. Each category is rounded
/// once, scope totals are built from the rounded categories and the grand
/// total from the rounded scopes, so the persisted figures reconcile exactly.
pub fn aggregate(reporting_record_id: RecordId, contributions: &[Contribution]) -> CalculationResult {
    let mut breakdown: BTreeMap<Category, f64> =
        Category::ALL.iter().map(|c| (*c, 0.0)).collect();
    for contribution in contributions {
        *breakdown.entry(contribution.category).or_insert(0.0) += contribution.co2e;
    }
    for value in breakdown.values_mut() {
        *value = round_co2e(*value);
    }

    let scope_total = |scope: Scope| {
        round_co2e(
            breakdown
                .iter()
                .filter(|(category, _)| category.scope() == scope)
                .map(|(_, value)| value)
                .sum(),
        )
    };
    let scope1 = scope_total(Scope::Scope1);
    let scope2 = scope_total(Scope::Scope2);
    let scope3 = scope_total(Scope::Scope3);

    CalculationResult {
        reporting_record_id,
        total_co2e: round_co2e(scope1 + scope2 + scope3),
        total_scope1_co2e: scope1,
        total_scope2_co2e: scope2,
        total_scope3_co2e: scope3,
        breakdown_by_category: breakdown,
        records_aggregated: contributions.len(),
    }
}

/// Calculation engine bound to a repository and a factor registry
pub struct CalculationEngine<R: ?Sized> {
    repository: Arc<R>,
    registry: Arc<EmissionFactorRegistry>,
    locks: Arc<RecordLocks>,
}

impl<R: ?Sized> Clone for CalculationEngine<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            registry: Arc::clone(&self.registry),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<R> CalculationEngine<R>
where
    R: EmissionsRepository + ?Sized,
{
    pub fn new(repository: Arc<R>, registry: Arc<EmissionFactorRegistry>) -> Self {
        Self {
            repository,
            registry,
            locks: Arc::new(RecordLocks::new()),
        }
    }

    /// Share a lock table with other engines over the same store
    pub fn with_locks(mut self, locks: Arc<RecordLocks>) -> Self {
        self.locks = locks;
        self
    }

    pub fn registry(&self) -> &EmissionFactorRegistry {
        &self.registry
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Recompute and persist the result of one reporting record
    ///
    /// Fatal errors (`RecordNotFound`, `CalculationFailed`, repository
    /// failures) abort before any write, leaving the previous result intact.
    #[instrument(skip(self, options), fields(force = options.force))]
    pub fn calculate(
        &self,
        reporting_record_id: RecordId,
        options: &CalculationOptions,
    ) -> Result<CalculationOutcome> {
        let started = Instant::now();

        let record = self
            .repository
            .get_reporting_record(reporting_record_id)?
            .ok_or(Error::RecordNotFound(reporting_record_id))?;

        let _guard = self.locks.acquire(reporting_record_id);

        let previous = self.repository.get_calculation_result(reporting_record_id)?;
        if previous.is_some() {
            debug!(
                force = options.force,
                "existing result found; recomputing from current activity data"
            );
        }

        let collected = collect_activities(&*self.repository, &record, &options.scopes)?;

        let mut contributions = Vec::with_capacity(collected.included.len());
        let mut warnings = Vec::new();
        for activity in &collected.included {
            match contribution_for(activity, &self.registry) {
                Ok(contribution) => contributions.push(contribution),
                Err(err) => match RecordWarning::from_error(activity, &err) {
                    Some(warning) => {
                        warn!(
                            activity_id = warning.activity_id,
                            category = %warning.category,
                            reason = %warning.reason,
                            "activity record excluded from totals"
                        );
                        warnings.push(warning);
                    }
                    None => return Err(err),
                },
            }
        }

        if !collected.included.is_empty() && contributions.is_empty() {
            return Err(Error::CalculationFailed {
                record_id: reporting_record_id,
                failed: warnings.len(),
            });
        }

        let result = aggregate(reporting_record_id, &contributions);
        self.repository
            .upsert_calculation_result(reporting_record_id, &result)?;

        info!(
            total_co2e = result.total_co2e,
            aggregated = contributions.len(),
            warnings = warnings.len(),
            skipped = collected.skipped.len(),
            replaced = previous.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "calculation stored"
        );

        Ok(CalculationOutcome {
            result,
            contributions,
            warnings,
            skipped: collected.skipped.len(),
            replaced_previous: previous.is_some(),
            forced: options.force,
        })
    }
}
