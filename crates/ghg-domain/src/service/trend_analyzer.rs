//! Trend analysis over a sequence of stored results

use ghg_types::{round_co2e, Error, Result};

use crate::model::{PeriodResult, TrendPoint, TrendReport, TrendStatistics};

/// Points averaged by the moving average
pub const MOVING_AVERAGE_POINTS: usize = 3;

/// Lazy view of the trend series, in input order
///
/// Cloning restarts the iteration from the clone's position.
#[derive(Debug, Clone)]
pub struct TrendSeries<'a> {
    inner: std::slice::Iter<'a, PeriodResult>,
}

impl Iterator for TrendSeries<'_> {
    type Item = TrendPoint;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(TrendPoint::from)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for TrendSeries<'_> {}

/// Series over `results`; the caller supplies them ordered by period start
pub fn series(results: &[PeriodResult]) -> TrendSeries<'_> {
    TrendSeries {
        inner: results.iter(),
    }
}

/// Trailing mean of the last three totals, `None` for the first two points
pub fn moving_average(totals: &[f64]) -> Vec<Option<f64>> {
    (0..totals.len())
        .map(|i| {
            if i + 1 < MOVING_AVERAGE_POINTS {
                return None;
            }
            let window = &totals[i + 1 - MOVING_AVERAGE_POINTS..=i];
            Some(round_co2e(
                window.iter().sum::<f64>() / MOVING_AVERAGE_POINTS as f64,
            ))
        })
        .collect()
}

pub fn statistics(totals: &[f64]) -> Result<TrendStatistics> {
    if totals.is_empty() {
        return Err(Error::EmptySeries);
    }
    let min = totals.iter().copied().fold(f64::INFINITY, f64::min);
    let max = totals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let average = totals.iter().sum::<f64>() / totals.len() as f64;
    Ok(TrendStatistics {
        min: round_co2e(min),
        max: round_co2e(max),
        average: round_co2e(average),
        data_points: totals.len(),
    })
}

/// Build the trend report
///
/// `window_months` keeps only the trailing N entries (one per monthly
/// period); `None` keeps everything. Fails with `EmptySeries` when nothing
/// is left to analyze.
pub fn analyze_trends(results: &[PeriodResult], window_months: Option<usize>) -> Result<TrendReport> {
    let start = window_months
        .map(|n| results.len().saturating_sub(n))
        .unwrap_or(0);
    let windowed = &results[start..];

    let totals: Vec<f64> = windowed.iter().map(|p| p.result.total_co2e).collect();
    let statistics = statistics(&totals)?;

    Ok(TrendReport {
        series: series(windowed).collect(),
        moving_average: moving_average(&totals),
        statistics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CalculationResult;
    use chrono::NaiveDate;
    use ghg_types::Category;
    use std::collections::BTreeMap;

    fn point(month: u32, total: f64) -> PeriodResult {
        let mut breakdown: BTreeMap<Category, f64> =
            Category::ALL.iter().map(|c| (*c, 0.0)).collect();
        breakdown.insert(Category::Electricity, total);
        PeriodResult {
            period_start: NaiveDate::from_ymd_opt(2026, month, 1).unwrap(),
            result: CalculationResult {
                reporting_record_id: u64::from(month),
                total_co2e: total,
                total_scope1_co2e: 0.0,
                total_scope2_co2e: total,
                total_scope3_co2e: 0.0,
                breakdown_by_category: breakdown,
                records_aggregated: 1,
            },
        }
    }

    #[test]
    fn test_moving_average_needs_three_points() {
        assert_eq!(
            moving_average(&[10.0, 20.0, 30.0, 40.0]),
            vec![None, None, Some(20.0), Some(30.0)]
        );
        assert_eq!(moving_average(&[10.0, 20.0]), vec![None, None]);
        assert!(moving_average(&[]).is_empty());
    }

    #[test]
    fn test_moving_average_is_rounded() {
        let avg = moving_average(&[1.0, 1.0, 1.00001]);
        assert_eq!(avg[2], Some(1.0));
    }

    #[test]
    fn test_statistics() {
        let stats = statistics(&[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 30.0);
        assert_eq!(stats.average, 20.0);
        assert_eq!(stats.data_points, 3);
    }

    #[test]
    fn test_empty_series_fails() {
        assert!(matches!(analyze_trends(&[], None), Err(Error::EmptySeries)));
        assert!(matches!(statistics(&[]), Err(Error::EmptySeries)));
        let results = vec![point(1, 10.0)];
        assert!(matches!(
            analyze_trends(&results, Some(0)),
            Err(Error::EmptySeries)
        ));
    }

    #[test]
    fn test_report_keeps_input_order() {
        let results = vec![
            point(1, 10.0),
            point(2, 20.0),
            point(3, 30.0),
            point(4, 40.0),
        ];
        let report = analyze_trends(&results, None).unwrap();
        let months: Vec<_> = report.series.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(months, vec!["2026-01", "2026-02", "2026-03", "2026-04"]);
        assert_eq!(report.series[0].date.to_string(), "2026-01-01");
        assert_eq!(report.series[3].scope2, 40.0);
        assert_eq!(report.moving_average, vec![None, None, Some(20.0), Some(30.0)]);
        assert_eq!(report.statistics.data_points, 4);
        assert_eq!(report.statistics.average, 25.0);
    }

    #[test]
    fn test_window_keeps_trailing_points() {
        let results: Vec<_> = (1..=6).map(|m| point(m, f64::from(m) * 10.0)).collect();
        let report = analyze_trends(&results, Some(3)).unwrap();
        assert_eq!(report.series.len(), 3);
        assert_eq!(report.series[0].month, "2026-04");
        assert_eq!(report.statistics.min, 40.0);
        assert_eq!(report.moving_average, vec![None, None, Some(50.0)]);

        let all = analyze_trends(&results, Some(24)).unwrap();
        assert_eq!(all.series.len(), 6);
    }

    #[test]
    fn test_series_is_restartable() {
        let results = vec![point(1, 10.0), point(2, 20.0)];
        let series = series(&results);
        assert_eq!(series.len(), 2);
        let first_pass: Vec<_> = series.clone().map(|p| p.total_co2e).collect();
        let second_pass: Vec<_> = series.map(|p| p.total_co2e).collect();
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn test_analyzer_does_not_sort() {
        let results = vec![point(3, 30.0), point(1, 10.0)];
        let report = analyze_trends(&results, None).unwrap();
        assert_eq!(report.series[0].month, "2026-03");
    }
}
