use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Identifier of a reporting record or an activity record
pub type RecordId = u64;

/// GHG Protocol reporting scope
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Direct emissions
    Scope1,
    /// Purchased energy
    Scope2,
    /// Value-chain / indirect
    Scope3,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Scope1, Scope::Scope2, Scope::Scope3];

    pub fn number(&self) -> u8 {
        match self {
            Scope::Scope1 => 1,
            Scope::Scope2 => 2,
            Scope::Scope3 => 3,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scope {}", self.number())
    }
}

/// Activity category
///
/// Every category reports into exactly one scope.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Fuel,
    Vehicle,
    Electricity,
    Refrigerant,
    Commuting,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Fuel,
        Category::Vehicle,
        Category::Electricity,
        Category::Refrigerant,
        Category::Commuting,
    ];

    pub fn scope(&self) -> Scope {
        match self {
            Category::Fuel | Category::Vehicle | Category::Refrigerant => Scope::Scope1,
            Category::Electricity => Scope::Scope2,
            Category::Commuting => Scope::Scope3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fuel => "fuel",
            Category::Vehicle => "vehicle",
            Category::Electricity => "electricity",
            Category::Refrigerant => "refrigerant",
            Category::Commuting => "commuting",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fuel" => Ok(Category::Fuel),
            "vehicle" | "vehicles" => Ok(Category::Vehicle),
            "electricity" | "power" => Ok(Category::Electricity),
            "refrigerant" | "refrigerants" => Ok(Category::Refrigerant),
            "commuting" | "commute" => Ok(Category::Commuting),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

/// Physical dimension of a unit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimension {
    Volume,
    Energy,
    Mass,
    Distance,
}

/// Unit of measure accepted on activity records
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "l", alias = "liter", alias = "litre")]
    Liter,
    #[serde(rename = "gal", alias = "gallon")]
    UsGallon,
    #[serde(rename = "imp_gal")]
    ImperialGallon,
    #[serde(rename = "m3")]
    CubicMeter,
    #[serde(rename = "kwh")]
    KilowattHour,
    #[serde(rename = "mwh")]
    MegawattHour,
    #[serde(rename = "wh")]
    WattHour,
    #[serde(rename = "gj")]
    Gigajoule,
    #[serde(rename = "kg", alias = "kilogram")]
    Kilogram,
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "lb")]
    Pound,
    #[serde(rename = "t", alias = "tonne")]
    Tonne,
    #[serde(rename = "km", alias = "kilometer")]
    Kilometer,
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "mi", alias = "mile")]
    Mile,
}

impl Unit {
    pub fn dimension(&self) -> Dimension {
        match self {
            Unit::Liter | Unit::UsGallon | Unit::ImperialGallon | Unit::CubicMeter => {
                Dimension::Volume
            }
            Unit::KilowattHour | Unit::MegawattHour | Unit::WattHour | Unit::Gigajoule => {
                Dimension::Energy
            }
            Unit::Kilogram | Unit::Gram | Unit::Pound | Unit::Tonne => Dimension::Mass,
            Unit::Kilometer | Unit::Meter | Unit::Mile => Dimension::Distance,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Liter => "l",
            Unit::UsGallon => "gal",
            Unit::ImperialGallon => "imp_gal",
            Unit::CubicMeter => "m3",
            Unit::KilowattHour => "kwh",
            Unit::MegawattHour => "mwh",
            Unit::WattHour => "wh",
            Unit::Gigajoule => "gj",
            Unit::Kilogram => "kg",
            Unit::Gram => "g",
            Unit::Pound => "lb",
            Unit::Tonne => "t",
            Unit::Kilometer => "km",
            Unit::Meter => "m",
            Unit::Mile => "mi",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = String;

    /// Parse a free-form unit label (case-insensitive, common aliases)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['.', ' '], "");
        let unit = match normalized.as_str() {
            "l" | "liter" | "liters" | "litre" | "litres" | "ltr" => Unit::Liter,
            "gal" | "gallon" | "gallons" | "usgal" | "usgallon" | "usgallons" => Unit::UsGallon,
            "imp_gal" | "impgal" | "imperialgallon" | "imperialgallons" | "ukgal" => {
                Unit::ImperialGallon
            }
            "m3" | "m³" | "cubicmeter" | "cubicmeters" | "cubicmetre" | "cbm" => Unit::CubicMeter,
            "kwh" | "kilowatthour" | "kilowatthours" => Unit::KilowattHour,
            "mwh" | "megawatthour" | "megawatthours" => Unit::MegawattHour,
            "wh" | "watthour" | "watthours" => Unit::WattHour,
            "gj" | "gigajoule" | "gigajoules" => Unit::Gigajoule,
            "kg" | "kgs" | "kilogram" | "kilograms" => Unit::Kilogram,
            "g" | "gram" | "grams" => Unit::Gram,
            "lb" | "lbs" | "pound" | "pounds" => Unit::Pound,
            "t" | "tonne" | "tonnes" | "metricton" | "metrictons" => Unit::Tonne,
            "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => Unit::Kilometer,
            "m" | "meter" | "meters" | "metre" | "metres" => Unit::Meter,
            "mi" | "mile" | "miles" => Unit::Mile,
            _ => return Err(format!("unknown unit: {}", s.trim())),
        };
        Ok(unit)
    }
}
