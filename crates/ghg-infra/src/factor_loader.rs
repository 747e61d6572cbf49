//! Emission factor table loader from TOML
//!
//! ```toml
//! [[factors]]
//! category = "fuel"
//! subtype = "diesel"
//! unit = "L"
//! co2e = 2.68
//! gases = { co2 = 2.66, ch4 = 0.0001, n2o = 0.02 }
//! source = "IPCC 2006"
//!
//! [[factors]]
//! category = "refrigerant"
//! subtype = "R-134a"
//! unit = "kg"
//! gwp = 1430
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use tracing::debug;

use ghg_domain::model::{EmissionFactor, FactorKind, GasBreakdown};
use ghg_domain::service::EmissionFactorRegistry;
use ghg_types::{Category, ConfigError, Error, Result, Unit};

/// Container for parsing a factor table
#[derive(Debug, Deserialize)]
struct FactorTable {
    #[serde(default)]
    factors: Vec<FactorRow>,
}

#[derive(Debug, Deserialize)]
struct FactorRow {
    #[serde(deserialize_with = "from_label")]
    category: Category,
    subtype: String,
    #[serde(deserialize_with = "from_label")]
    unit: Unit,
    #[serde(default)]
    co2e: Option<f64>,
    #[serde(default)]
    gwp: Option<f64>,
    #[serde(default)]
    gases: Option<GasBreakdown>,
    #[serde(default)]
    source: Option<String>,
}

/// Accept the same free-form labels as the command line
fn from_label<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr<Err = String>,
{
    let label = String::deserialize(deserializer)?;
    label.parse().map_err(serde::de::Error::custom)
}

impl FactorRow {
    fn into_factor(self) -> Result<EmissionFactor> {
        let (kind, value) = match (self.co2e, self.gwp) {
            (Some(co2e), None) => (FactorKind::Co2ePerUnit, co2e),
            (None, Some(gwp)) => (FactorKind::Gwp, gwp),
            _ => {
                return Err(Error::InvalidFactor(format!(
                    "{}/{}: exactly one of co2e or gwp is required",
                    self.category, self.subtype
                )))
            }
        };
        Ok(EmissionFactor {
            category: self.category,
            subtype: self.subtype,
            unit: self.unit,
            kind,
            value,
            gases: self.gases,
            source: self.source,
        })
    }
}

/// Load factor definitions from a TOML file
pub fn load_factors_from_file(path: &Path) -> Result<Vec<EmissionFactor>> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::Config(ConfigError::ParseError(format!(
            "Failed to read factor table {}: {}",
            path.display(),
            e
        )))
    })?;

    load_factors_from_str(&content)
}

/// Load factor definitions from a TOML string
pub fn load_factors_from_str(toml_content: &str) -> Result<Vec<EmissionFactor>> {
    let table: FactorTable = toml::from_str(toml_content).map_err(|e| {
        Error::Config(ConfigError::ParseError(format!(
            "Failed to parse factor table TOML: {}",
            e
        )))
    })?;

    table
        .factors
        .into_iter()
        .map(FactorRow::into_factor)
        .collect()
}

/// Load and validate a registry from a TOML file
pub fn load_registry_from_file(path: &Path) -> Result<EmissionFactorRegistry> {
    let factors = load_factors_from_file(path)?;
    debug!(path = %path.display(), factors = factors.len(), "loaded factor table");
    EmissionFactorRegistry::new(factors)
}

/// Load and validate a registry from a TOML string
pub fn load_registry_from_str(toml_content: &str) -> Result<EmissionFactorRegistry> {
    EmissionFactorRegistry::new(load_factors_from_str(toml_content)?)
}
