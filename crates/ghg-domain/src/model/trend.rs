//! Trend analysis types

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use ghg_types::Category;

use super::CalculationResult;

/// A persisted result paired with its period start
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodResult {
    pub period_start: NaiveDate,
    pub result: CalculationResult,
}

/// One point of the emissions time series
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: NaiveDate,
    /// ISO year-month, e.g. `2026-03`
    pub month: String,
    pub total_co2e: f64,
    pub scope1: f64,
    pub scope2: f64,
    pub scope3: f64,
    pub breakdown: BTreeMap<Category, f64>,
}

impl From<&PeriodResult> for TrendPoint {
    fn from(point: &PeriodResult) -> Self {
        Self {
            date: point.period_start,
            month: point.period_start.format("%Y-%m").to_string(),
            total_co2e: point.result.total_co2e,
            scope1: point.result.total_scope1_co2e,
            scope2: point.result.total_scope2_co2e,
            scope3: point.result.total_scope3_co2e,
            breakdown: point.result.breakdown_by_category.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendStatistics {
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub data_points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub series: Vec<TrendPoint>,
    /// `None` until three points are available
    pub moving_average: Vec<Option<f64>>,
    pub statistics: TrendStatistics,
}
