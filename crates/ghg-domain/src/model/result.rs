//! Calculation result types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ghg_types::{approx_eq, Category, Error, RecordId, Scope, Unit};

use super::ActivityRecord;

/// Persisted emissions total for one reporting record
///
/// All figures are kg CO2e rounded to four decimals, half to even.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub reporting_record_id: RecordId,
    pub total_co2e: f64,
    pub total_scope1_co2e: f64,
    pub total_scope2_co2e: f64,
    pub total_scope3_co2e: f64,
    /// Every category is present; categories without activity hold 0
    pub breakdown_by_category: BTreeMap<Category, f64>,
    /// Activity records that contributed to the totals
    #[serde(default)]
    pub records_aggregated: usize,
}

impl CalculationResult {
    pub fn scope_total(&self, scope: Scope) -> f64 {
        match scope {
            Scope::Scope1 => self.total_scope1_co2e,
            Scope::Scope2 => self.total_scope2_co2e,
            Scope::Scope3 => self.total_scope3_co2e,
        }
    }

    pub fn category_total(&self, category: Category) -> f64 {
        self.breakdown_by_category
            .get(&category)
            .copied()
            .unwrap_or(0.0)
    }

    /// Scope totals and category breakdown both add up to the grand total
    pub fn is_consistent(&self) -> bool {
        let scopes = self.total_scope1_co2e + self.total_scope2_co2e + self.total_scope3_co2e;
        let categories: f64 = self.breakdown_by_category.values().sum();
        approx_eq(scopes, self.total_co2e) && approx_eq(categories, self.total_co2e)
    }
}

/// CO2e derived from a single activity record; never persisted on its own
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub activity_id: RecordId,
    pub scope: Scope,
    pub category: Category,
    pub subtype: String,
    pub canonical_quantity: f64,
    pub canonical_unit: Unit,
    pub co2e: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    InvalidQuantity,
    UnsupportedUnit,
    FactorNotFound,
}

/// Activity record excluded from the totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordWarning {
    pub activity_id: RecordId,
    pub category: Category,
    pub kind: WarningKind,
    pub reason: String,
}

impl RecordWarning {
    /// Build a warning from a record-level error; `None` for fatal errors
    pub fn from_error(activity: &ActivityRecord, error: &Error) -> Option<Self> {
        let kind = match error {
            Error::InvalidQuantity(_) => WarningKind::InvalidQuantity,
            Error::UnsupportedUnit { .. } => WarningKind::UnsupportedUnit,
            Error::FactorNotFound { .. } => WarningKind::FactorNotFound,
            _ => return None,
        };
        Some(Self {
            activity_id: activity.id(),
            category: activity.category(),
            kind,
            reason: error.to_string(),
        })
    }
}

/// What a `calculate` call returns
#[derive(Debug, Clone, Serialize)]
pub struct CalculationOutcome {
    /// The row that was upserted
    pub result: CalculationResult,
    /// Unrounded per-activity contributions, ordered by activity id
    pub contributions: Vec<Contribution>,
    pub warnings: Vec<RecordWarning>,
    /// Activities left out because their scope is not collected
    pub skipped: usize,
    /// A previous result existed and was overwritten
    pub replaced_previous: bool,
    pub forced: bool,
}

impl CalculationOutcome {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FuelEntry;
    use chrono::NaiveDate;

    fn sample_result() -> CalculationResult {
        let mut breakdown = BTreeMap::new();
        breakdown.insert(Category::Fuel, 26.8);
        breakdown.insert(Category::Vehicle, 0.0);
        breakdown.insert(Category::Electricity, 70.0);
        breakdown.insert(Category::Refrigerant, 2860.0);
        breakdown.insert(Category::Commuting, 12.5);
        CalculationResult {
            reporting_record_id: 1,
            total_co2e: 2969.3,
            total_scope1_co2e: 2886.8,
            total_scope2_co2e: 70.0,
            total_scope3_co2e: 12.5,
            breakdown_by_category: breakdown,
            records_aggregated: 4,
        }
    }

    #[test]
    fn test_consistency_check() {
        let result = sample_result();
        assert!(result.is_consistent());

        let broken = CalculationResult {
            total_co2e: 3000.0,
            ..result
        };
        assert!(!broken.is_consistent());
    }

    #[test]
    fn test_persisted_field_names() {
        let json = serde_json::to_value(sample_result()).unwrap();
        assert!(json.get("totalCo2e").is_some());
        assert!(json.get("totalScope1Co2e").is_some());
        assert!(json["breakdownByCategory"].get("refrigerant").is_some());
    }

    #[test]
    fn test_warning_from_error() {
        let activity = ActivityRecord::Fuel(FuelEntry {
            id: 9,
            fuel_type: "diesel".to_string(),
            quantity: 1.0,
            unit: "bushel".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
        });
        let err = Error::UnsupportedUnit {
            category: Category::Fuel,
            unit: "bushel".to_string(),
        };
        let warning = RecordWarning::from_error(&activity, &err).unwrap();
        assert_eq!(warning.activity_id, 9);
        assert_eq!(warning.kind, WarningKind::UnsupportedUnit);

        assert!(RecordWarning::from_error(&activity, &Error::EmptySeries).is_none());
    }
}
