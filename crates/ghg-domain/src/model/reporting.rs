//! Reporting record and period definitions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ghg_types::{Error, RecordId, Result};

/// Half-open reporting window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportingPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end <= start {
            return Err(Error::InvalidPeriod(format!(
                "end {} must be after start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Number of days covered by the period
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl std::fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

/// One organization's reporting period
///
/// The period is fixed once a calculation has been stored against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportingRecord {
    pub id: RecordId,
    pub organization_id: String,
    pub period: ReportingPeriod,
    #[serde(default)]
    pub label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_is_half_open() {
        let period = ReportingPeriod::new(date(2026, 1, 1), date(2026, 2, 1)).unwrap();
        assert!(period.contains(date(2026, 1, 1)));
        assert!(period.contains(date(2026, 1, 31)));
        assert!(!period.contains(date(2026, 2, 1)));
        assert_eq!(period.days(), 31);
    }

    #[test]
    fn test_empty_or_inverted_period_rejected() {
        assert!(matches!(
            ReportingPeriod::new(date(2026, 1, 1), date(2026, 1, 1)),
            Err(Error::InvalidPeriod(_))
        ));
        assert!(ReportingPeriod::new(date(2026, 3, 1), date(2026, 2, 1)).is_err());
    }
}
