//! Emission factor reference data

use serde::{Deserialize, Serialize};

use ghg_types::{Category, Unit};

/// How the factor value is applied to a canonical quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    /// kg CO2e per canonical unit
    Co2ePerUnit,
    /// Global warming potential, applied to kg of leaked gas
    Gwp,
}

/// Per-gas components of a CO2e factor (kg per canonical unit)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasBreakdown {
    pub co2: f64,
    #[serde(default)]
    pub ch4: f64,
    #[serde(default)]
    pub n2o: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionFactor {
    pub category: Category,
    pub subtype: String,
    pub unit: Unit,
    pub kind: FactorKind,
    pub value: f64,
    #[serde(default)]
    pub gases: Option<GasBreakdown>,
    /// Publication the value was taken from
    #[serde(default)]
    pub source: Option<String>,
}

impl EmissionFactor {
    pub fn per_unit(category: Category, subtype: &str, unit: Unit, co2e: f64) -> Self {
        Self {
            category,
            subtype: subtype.to_string(),
            unit,
            kind: FactorKind::Co2ePerUnit,
            value: co2e,
            gases: None,
            source: None,
        }
    }

    pub fn gwp(refrigerant_type: &str, gwp: f64) -> Self {
        Self {
            category: Category::Refrigerant,
            subtype: refrigerant_type.to_string(),
            unit: Unit::Kilogram,
            kind: FactorKind::Gwp,
            value: gwp,
            gases: None,
            source: None,
        }
    }

    pub fn with_gases(mut self, gases: GasBreakdown) -> Self {
        self.gases = Some(gases);
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    /// CO2e mass for a quantity already expressed in `self.unit`
    pub fn apply(&self, canonical_quantity: f64) -> f64 {
        canonical_quantity * self.value
    }
}
