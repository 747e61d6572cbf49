//! Unit normalization for activity quantities
//!
//! Each category has one canonical unit. Quantities are converted with
//! static factors before the emission factor lookup.

use ghg_types::{Category, Dimension, Error, Result, Unit};

const LITERS_PER_US_GALLON: f64 = 3.785_411_784;
const LITERS_PER_IMPERIAL_GALLON: f64 = 4.546_09;
const LITERS_PER_CUBIC_METER: f64 = 1000.0;
const KWH_PER_MWH: f64 = 1000.0;
const KWH_PER_WH: f64 = 0.001;
const KWH_PER_GJ: f64 = 1_000_000.0 / 3600.0;
const KG_PER_GRAM: f64 = 0.001;
const KG_PER_POUND: f64 = 0.453_592_37;
const KG_PER_TONNE: f64 = 1000.0;
const KM_PER_METER: f64 = 0.001;
const KM_PER_MILE: f64 = 1.609_344;

/// Quantity expressed in its category's canonical unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedQuantity {
    pub quantity: f64,
    pub unit: Unit,
}

pub fn canonical_unit(category: Category) -> Unit {
    match category {
        Category::Fuel => Unit::Liter,
        Category::Vehicle | Category::Commuting => Unit::Kilometer,
        Category::Electricity => Unit::KilowattHour,
        Category::Refrigerant => Unit::Kilogram,
    }
}

/// Multiplier from `unit` to the base unit of its dimension (l, kWh, kg, km)
fn to_base(unit: Unit) -> f64 {
    match unit {
        Unit::Liter | Unit::KilowattHour | Unit::Kilogram | Unit::Kilometer => 1.0,
        Unit::UsGallon => LITERS_PER_US_GALLON,
        Unit::ImperialGallon => LITERS_PER_IMPERIAL_GALLON,
        Unit::CubicMeter => LITERS_PER_CUBIC_METER,
        Unit::MegawattHour => KWH_PER_MWH,
        Unit::WattHour => KWH_PER_WH,
        Unit::Gigajoule => KWH_PER_GJ,
        Unit::Gram => KG_PER_GRAM,
        Unit::Pound => KG_PER_POUND,
        Unit::Tonne => KG_PER_TONNE,
        Unit::Meter => KM_PER_METER,
        Unit::Mile => KM_PER_MILE,
    }
}

/// Convert `quantity` in `source_unit` to the canonical unit of `category`
///
/// Fails with `InvalidQuantity` for negative or non-finite quantities and
/// with `UnsupportedUnit` when the label is unknown or measures the wrong
/// dimension for the category.
pub fn normalize(
    category: Category,
    subtype: &str,
    quantity: f64,
    source_unit: &str,
) -> Result<NormalizedQuantity> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(Error::InvalidQuantity(format!(
            "{} {} for {} '{}'",
            quantity,
            source_unit.trim(),
            category,
            subtype
        )));
    }

    let unsupported = || Error::UnsupportedUnit {
        category,
        unit: source_unit.trim().to_string(),
    };

    let unit: Unit = source_unit.parse().map_err(|_| unsupported())?;
    let canonical = canonical_unit(category);
    if unit.dimension() != canonical.dimension() {
        return Err(unsupported());
    }

    Ok(NormalizedQuantity {
        quantity: quantity * to_base(unit) / to_base(canonical),
        unit: canonical,
    })
}

/// Dimension a category's quantities must be measured in
pub fn expected_dimension(category: Category) -> Dimension {
    canonical_unit(category).dimension()
}
