//! Domain model types

pub mod activity;
pub mod factor;
pub mod options;
pub mod reporting;
pub mod result;
pub mod trend;

pub use activity::{
    ActivityRecord, CommuteSurveyEntry, ElectricityEntry, FuelEntry, RefrigerantEntry,
    VehicleEntry,
};
pub use factor::{EmissionFactor, FactorKind, GasBreakdown};
pub use options::{CalculationOptions, ScopeSelection};
pub use reporting::{ReportingPeriod, ReportingRecord};
pub use result::{CalculationOutcome, CalculationResult, Contribution, RecordWarning, WarningKind};
pub use trend::{PeriodResult, TrendPoint, TrendReport, TrendStatistics};
