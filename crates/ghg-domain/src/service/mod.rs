//! Domain services

pub mod activity_collector;
pub mod calculation_engine;
pub mod factor_registry;
pub mod record_locks;
pub mod trend_analyzer;
pub mod unit_normalizer;

pub use activity_collector::{collect_activities, CollectedActivities};
pub use calculation_engine::{aggregate, contribution_for, CalculationEngine};
pub use factor_registry::EmissionFactorRegistry;
pub use record_locks::{RecordLockGuard, RecordLocks};
pub use trend_analyzer::{analyze_trends, moving_average, series, statistics, TrendSeries};
pub use unit_normalizer::{canonical_unit, normalize, NormalizedQuantity};
