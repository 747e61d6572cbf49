//! Emission factor registry
//!
//! Immutable lookup table built once at startup and shared read-only.
//! Lookups are exact on (category, subtype, unit); subtypes compare after
//! trimming and ASCII-lowercasing.

use std::collections::HashMap;

use tracing::warn;

use ghg_types::{Category, Error, Result, Unit};

use super::unit_normalizer::canonical_unit;
use crate::model::{EmissionFactor, FactorKind, GasBreakdown};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FactorKey {
    category: Category,
    subtype: String,
    unit: Unit,
}

impl FactorKey {
    fn new(category: Category, subtype: &str, unit: Unit) -> Self {
        Self {
            category,
            subtype: normalize_subtype(subtype),
            unit,
        }
    }
}

pub fn normalize_subtype(subtype: &str) -> String {
    subtype.trim().to_ascii_lowercase()
}

#[derive(Debug, Clone, Default)]
pub struct EmissionFactorRegistry {
    factors: HashMap<FactorKey, EmissionFactor>,
}

impl EmissionFactorRegistry {
    /// Build the registry, rejecting duplicate keys and malformed factors
    pub fn new(factors: impl IntoIterator<Item = EmissionFactor>) -> Result<Self> {
        let mut table = HashMap::new();
        for factor in factors {
            validate(&factor)?;
            if factor.unit != canonical_unit(factor.category) {
                warn!(
                    category = %factor.category,
                    subtype = %factor.subtype,
                    unit = %factor.unit,
                    "emission factor is not in the canonical unit and will never match"
                );
            }
            let key = FactorKey::new(factor.category, &factor.subtype, factor.unit);
            if table.contains_key(&key) {
                return Err(Error::DuplicateFactor(format!(
                    "{}/{} in {}",
                    key.category, key.subtype, key.unit
                )));
            }
            table.insert(key, factor);
        }
        Ok(Self { factors: table })
    }

    pub fn lookup(&self, category: Category, subtype: &str, unit: Unit) -> Result<&EmissionFactor> {
        self.factors
            .get(&FactorKey::new(category, subtype, unit))
            .ok_or_else(|| Error::FactorNotFound {
                category,
                subtype: subtype.trim().to_string(),
                unit,
            })
    }

    /// CO2 / CH4 / N2O components, for audit output only
    pub fn gas_breakdown(&self, category: Category, subtype: &str, unit: Unit) -> Option<GasBreakdown> {
        self.lookup(category, subtype, unit).ok().and_then(|f| f.gases)
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// All factors ordered by category, then subtype
    pub fn factors(&self) -> Vec<&EmissionFactor> {
        let mut all: Vec<_> = self.factors.values().collect();
        all.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| normalize_subtype(&a.subtype).cmp(&normalize_subtype(&b.subtype)))
                .then_with(|| a.unit.cmp(&b.unit))
        });
        all
    }

    pub fn factors_for(&self, category: Category) -> Vec<&EmissionFactor> {
        self.factors()
            .into_iter()
            .filter(|f| f.category == category)
            .collect()
    }
}

fn validate(factor: &EmissionFactor) -> Result<()> {
    let label = format!("{}/{}", factor.category, factor.subtype);
    if factor.subtype.trim().is_empty() {
        return Err(Error::InvalidFactor(format!("{}: empty subtype", label)));
    }
    if !factor.value.is_finite() || factor.value < 0.0 {
        return Err(Error::InvalidFactor(format!(
            "{}: value {} must be a non-negative number",
            label, factor.value
        )));
    }
    let is_refrigerant = factor.category == Category::Refrigerant;
    match (factor.kind, is_refrigerant) {
        (FactorKind::Gwp, false) => Err(Error::InvalidFactor(format!(
            "{}: GWP factors apply to refrigerants only",
            label
        ))),
        (FactorKind::Co2ePerUnit, true) => Err(Error::InvalidFactor(format!(
            "{}: refrigerants need a GWP factor",
            label
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> EmissionFactorRegistry {
        EmissionFactorRegistry::new(vec![
            EmissionFactor::per_unit(Category::Fuel, "Diesel", Unit::Liter, 2.68).with_gases(
                GasBreakdown {
                    co2: 2.67,
                    ch4: 0.0004,
                    n2o: 0.0096,
                },
            ),
            EmissionFactor::per_unit(Category::Electricity, "grid", Unit::KilowattHour, 0.7),
            EmissionFactor::gwp("R-134a", 1430.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_exact_lookup_ignores_case_and_padding() {
        let reg = registry();
        let factor = reg.lookup(Category::Fuel, "  DIESEL ", Unit::Liter).unwrap();
        assert_eq!(factor.value, 2.68);
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn test_no_partial_match() {
        let reg = registry();
        assert!(matches!(
            reg.lookup(Category::Fuel, "dies", Unit::Liter),
            Err(Error::FactorNotFound { .. })
        ));
        assert!(reg.lookup(Category::Fuel, "diesel-b5", Unit::Liter).is_err());
    }

    #[test]
    fn test_unit_mismatch_is_not_found() {
        let reg = registry();
        assert!(matches!(
            reg.lookup(Category::Electricity, "grid", Unit::MegawattHour),
            Err(Error::FactorNotFound {
                unit: Unit::MegawattHour,
                ..
            })
        ));
    }

    #[test]
    fn test_category_is_part_of_key() {
        let reg = registry();
        assert!(reg.lookup(Category::Vehicle, "diesel", Unit::Liter).is_err());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let result = EmissionFactorRegistry::new(vec![
            EmissionFactor::per_unit(Category::Fuel, "diesel", Unit::Liter, 2.68),
            EmissionFactor::per_unit(Category::Fuel, "Diesel ", Unit::Liter, 2.70),
        ]);
        assert!(matches!(result, Err(Error::DuplicateFactor(_))));
    }

    #[test]
    fn test_kind_must_match_category() {
        let gwp_for_fuel = EmissionFactor {
            kind: FactorKind::Gwp,
            ..EmissionFactor::per_unit(Category::Fuel, "diesel", Unit::Liter, 2.68)
        };
        assert!(matches!(
            EmissionFactorRegistry::new(vec![gwp_for_fuel]),
            Err(Error::InvalidFactor(_))
        ));
        let per_unit_refrigerant =
            EmissionFactor::per_unit(Category::Refrigerant, "R-22", Unit::Kilogram, 1810.0);
        assert!(EmissionFactorRegistry::new(vec![per_unit_refrigerant]).is_err());
    }

    #[test]
    fn test_negative_value_rejected() {
        let factor = EmissionFactor::per_unit(Category::Fuel, "diesel", Unit::Liter, -1.0);
        assert!(matches!(
            EmissionFactorRegistry::new(vec![factor]),
            Err(Error::InvalidFactor(_))
        ));
    }

    #[test]
    fn test_gas_breakdown() {
        let reg = registry();
        let gases = reg
            .gas_breakdown(Category::Fuel, "diesel", Unit::Liter)
            .unwrap();
        assert_eq!(gases.co2, 2.67);
        assert!(reg
            .gas_breakdown(Category::Electricity, "grid", Unit::KilowattHour)
            .is_none());
        assert!(reg
            .gas_breakdown(Category::Fuel, "petrol", Unit::Liter)
            .is_none());
    }

    #[test]
    fn test_factors_are_sorted() {
        let reg = registry();
        let categories: Vec<_> = reg.factors().iter().map(|f| f.category).collect();
        assert_eq!(
            categories,
            vec![Category::Fuel, Category::Electricity, Category::Refrigerant]
        );
        assert_eq!(reg.factors_for(Category::Refrigerant).len(), 1);
    }
}
