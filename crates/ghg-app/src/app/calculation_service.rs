//! Calculation Service - recompute a reporting record's emissions
//!
//! This service resolves the organization's scope policy before handing
//! off to the calculation engine:
//! 1. Look up the reporting record
//! 2. Pick the scopes (explicit occupancy override, else the organization's)
//! 3. Run the engine, which persists the new result

use std::sync::Arc;

use tracing::debug;

use ghg_domain::model::{CalculationOptions, CalculationOutcome, ScopeSelection};
use ghg_domain::repository::EmissionsRepository;
use ghg_domain::service::{CalculationEngine, EmissionFactorRegistry};
use ghg_types::{Error, RecordId, Result};

use crate::config::Config;

/// Options for a calculation request
#[derive(Debug, Clone, Default)]
pub struct CalculateRequest {
    /// Recompute even when a result is already stored
    pub force: bool,

    /// Occupancy type override (e.g. "residential")
    pub occupancy: Option<String>,
}

impl CalculateRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_occupancy(mut self, occupancy: String) -> Self {
        self.occupancy = Some(occupancy);
        self
    }
}

pub struct CalculationService<R: ?Sized> {
    engine: CalculationEngine<R>,
    config: Arc<Config>,
}

impl<R: ?Sized> Clone for CalculationService<R> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R> CalculationService<R>
where
    R: EmissionsRepository + ?Sized,
{
    pub fn new(repository: Arc<R>, registry: Arc<EmissionFactorRegistry>, config: Config) -> Self {
        Self {
            engine: CalculationEngine::new(repository, registry),
            config: Arc::new(config),
        }
    }

    pub fn engine(&self) -> &CalculationEngine<R> {
        &self.engine
    }

    /// Scopes collected for a reporting record's organization
    pub fn scopes_for(&self, organization_id: &str, occupancy: Option<&str>) -> Result<ScopeSelection> {
        match occupancy {
            Some(occupancy) => self.config.require_occupancy(occupancy),
            None => Ok(self.config.scopes_for_organization(organization_id)),
        }
    }

    /// Recompute and store the result of one reporting record
    pub fn calculate(&self, reporting_record_id: RecordId, request: &CalculateRequest) -> Result<CalculationOutcome> {
        let record = self
            .engine
            .repository()
            .get_reporting_record(reporting_record_id)?
            .ok_or(Error::RecordNotFound(reporting_record_id))?;

        let scopes = self.scopes_for(&record.organization_id, request.occupancy.as_deref())?;
        debug!(
            reporting_record_id,
            organization_id = %record.organization_id,
            ?scopes,
            "scope policy resolved"
        );

        let options = CalculationOptions::new()
            .with_force(request.force)
            .with_scopes(scopes);
        self.engine.calculate(reporting_record_id, &options)
    }

    /// Ids of every reporting record of an organization, ascending
    pub fn record_ids(&self, organization_id: &str) -> Result<Vec<RecordId>> {
        let mut ids: Vec<RecordId> = self
            .engine
            .repository()
            .list_reporting_records(organization_id)?
            .into_iter()
            .map(|r| r.id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
