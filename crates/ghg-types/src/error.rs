//! Error types for ghg-calc

use thiserror::Error;

use crate::{Category, RecordId, Unit};

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Negative, NaN or infinite activity quantity
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Unsupported unit '{unit}' for {category} activity")]
    UnsupportedUnit { category: Category, unit: String },

    #[error("No emission factor for {category}/{subtype} in {unit}")]
    FactorNotFound {
        category: Category,
        subtype: String,
        unit: Unit,
    },

    #[error("Reporting record not found: {0}")]
    RecordNotFound(RecordId),

    #[error("Calculation failed for reporting record {record_id}: all {failed} activity records were rejected")]
    CalculationFailed { record_id: RecordId, failed: usize },

    #[error("Trend series is empty")]
    EmptySeries,

    #[error("Invalid reporting period: {0}")]
    InvalidPeriod(String),

    #[error("Duplicate emission factor: {0}")]
    DuplicateFactor(String),

    #[error("Invalid emission factor: {0}")]
    InvalidFactor(String),

    #[error("CSV import error: {0}")]
    Csv(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Excel export error: {0}")]
    Excel(String),
}

impl Error {
    /// True for failures scoped to a single activity record.
    ///
    /// These are collected as warnings by the calculation engine instead of
    /// aborting the whole run.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            Error::InvalidQuantity(_) | Error::UnsupportedUnit { .. } | Error::FactorNotFound { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
