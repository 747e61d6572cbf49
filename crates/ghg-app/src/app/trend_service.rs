//! Trend Service - organization-level emissions trends
//!
//! Resolves an organization to its calculated reporting records, orders them
//! by period start and hands the series to the trend analyzer.

use std::sync::Arc;

use chrono::{Datelike, Local, Months, NaiveDate};
use tracing::debug;

use ghg_domain::model::{PeriodResult, TrendReport};
use ghg_domain::repository::EmissionsRepository;
use ghg_domain::service::analyze_trends;
use ghg_types::{Error, Result};

pub struct TrendService<R: ?Sized> {
    repository: Arc<R>,
}

/// First day of the oldest month covered by `months_back` months up to `today`
///
/// The current month counts as the first of them.
pub fn window_start(today: NaiveDate, months_back: u32) -> Option<NaiveDate> {
    let month_start = today.with_day(1)?;
    month_start.checked_sub_months(Months::new(months_back.saturating_sub(1)))
}

impl<R> TrendService<R>
where
    R: EmissionsRepository + ?Sized,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Calculated periods of an organization starting within `since..=until`,
    /// ascending by period start
    pub fn period_results(
        &self,
        organization_id: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<PeriodResult>> {
        let mut records = self.repository.list_reporting_records(organization_id)?;
        records.retain(|r| (since..=until).contains(&r.period.start));
        records.sort_by_key(|r| (r.period.start, r.id));

        let mut results = Vec::with_capacity(records.len());
        for record in records {
            match self.repository.get_calculation_result(record.id)? {
                Some(result) => results.push(PeriodResult {
                    period_start: record.period.start,
                    result,
                }),
                None => debug!(reporting_record_id = record.id, "no stored result; left out of trends"),
            }
        }
        Ok(results)
    }

    /// Trends over the last `months_back` months, counted from today
    pub fn trends(&self, organization_id: &str, months_back: u32) -> Result<TrendReport> {
        self.trends_as_of(organization_id, months_back, Local::now().date_naive())
    }

    pub fn trends_as_of(&self, organization_id: &str, months_back: u32, today: NaiveDate) -> Result<TrendReport> {
        if months_back == 0 {
            return Err(Error::EmptySeries);
        }
        let since = window_start(today, months_back).unwrap_or(NaiveDate::MIN);
        // periods that have not started yet are not part of the last N months
        let results = self.period_results(organization_id, since, today)?;
        debug!(
            organization_id,
            months_back,
            since = %since,
            until = %today,
            points = results.len(),
            "trend series resolved"
        );
        analyze_trends(&results, None)
    }
}
