//! Use case services

pub mod calculation_service;
pub mod trend_service;

pub use calculation_service::{CalculateRequest, CalculationService};
pub use trend_service::TrendService;
