//! Activity record definitions
//!
//! Units are kept as the raw label entered by the user. They are only parsed
//! during normalization so that a bad label fails one record, not the import.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ghg_types::{Category, RecordId, Scope};

/// Stationary fuel combustion (generators, boilers, cooking)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelEntry {
    #[serde(default)]
    pub id: RecordId,
    pub fuel_type: String,
    pub quantity: f64,
    pub unit: String,
    pub date: NaiveDate,
}

/// Company-operated vehicle usage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleEntry {
    #[serde(default)]
    pub id: RecordId,
    pub vehicle_type: String,
    pub distance: f64,
    pub unit: String,
    pub date: NaiveDate,
}

/// Purchased electricity from one bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricityEntry {
    #[serde(default)]
    pub id: RecordId,
    /// Grid or supplier the factor is keyed on
    pub grid: String,
    pub consumption: f64,
    pub unit: String,
    pub billing_start: NaiveDate,
    pub billing_end: NaiveDate,
}

/// Refrigerant purchase / leak record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefrigerantEntry {
    #[serde(default)]
    pub id: RecordId,
    pub refrigerant_type: String,
    pub quantity_purchased: f64,
    /// Leaked mass; `None` means no leak was reported
    #[serde(default)]
    pub quantity_leaked: Option<f64>,
    pub unit: String,
    pub date: NaiveDate,
}

/// Aggregated employee commuting survey line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommuteSurveyEntry {
    #[serde(default)]
    pub id: RecordId,
    pub transport_mode: String,
    pub one_way_distance: f64,
    pub unit: String,
    /// Employees using this mode
    pub commuters: u32,
    /// Commuting days in the period
    pub days: u32,
    #[serde(default = "default_true")]
    pub round_trip: bool,
    pub survey_date: NaiveDate,
}

fn default_true() -> bool {
    true
}

impl CommuteSurveyEntry {
    /// Passenger distance covered by this line, in the entry's own unit
    pub fn passenger_distance(&self) -> f64 {
        let legs = if self.round_trip { 2.0 } else { 1.0 };
        self.one_way_distance * legs * f64::from(self.commuters) * f64::from(self.days)
    }
}

/// Activity record, one variant per category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum ActivityRecord {
    Fuel(FuelEntry),
    Vehicle(VehicleEntry),
    Electricity(ElectricityEntry),
    Refrigerant(RefrigerantEntry),
    Commuting(CommuteSurveyEntry),
}

impl ActivityRecord {
    pub fn id(&self) -> RecordId {
        match self {
            ActivityRecord::Fuel(e) => e.id,
            ActivityRecord::Vehicle(e) => e.id,
            ActivityRecord::Electricity(e) => e.id,
            ActivityRecord::Refrigerant(e) => e.id,
            ActivityRecord::Commuting(e) => e.id,
        }
    }

    pub fn set_id(&mut self, id: RecordId) {
        match self {
            ActivityRecord::Fuel(e) => e.id = id,
            ActivityRecord::Vehicle(e) => e.id = id,
            ActivityRecord::Electricity(e) => e.id = id,
            ActivityRecord::Refrigerant(e) => e.id = id,
            ActivityRecord::Commuting(e) => e.id = id,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            ActivityRecord::Fuel(_) => Category::Fuel,
            ActivityRecord::Vehicle(_) => Category::Vehicle,
            ActivityRecord::Electricity(_) => Category::Electricity,
            ActivityRecord::Refrigerant(_) => Category::Refrigerant,
            ActivityRecord::Commuting(_) => Category::Commuting,
        }
    }

    pub fn scope(&self) -> Scope {
        self.category().scope()
    }

    /// Fuel type, vehicle type, grid, refrigerant type or transport mode
    pub fn subtype(&self) -> &str {
        match self {
            ActivityRecord::Fuel(e) => &e.fuel_type,
            ActivityRecord::Vehicle(e) => &e.vehicle_type,
            ActivityRecord::Electricity(e) => &e.grid,
            ActivityRecord::Refrigerant(e) => &e.refrigerant_type,
            ActivityRecord::Commuting(e) => &e.transport_mode,
        }
    }

    pub fn unit(&self) -> &str {
        match self {
            ActivityRecord::Fuel(e) => &e.unit,
            ActivityRecord::Vehicle(e) => &e.unit,
            ActivityRecord::Electricity(e) => &e.unit,
            ActivityRecord::Refrigerant(e) => &e.unit,
            ActivityRecord::Commuting(e) => &e.unit,
        }
    }

    /// Quantity that drives emissions, before unit normalization
    ///
    /// Refrigerants only emit what leaked; a purchase without a reported
    /// leak counts as zero.
    pub fn emitting_quantity(&self) -> f64 {
        match self {
            ActivityRecord::Fuel(e) => e.quantity,
            ActivityRecord::Vehicle(e) => e.distance,
            ActivityRecord::Electricity(e) => e.consumption,
            ActivityRecord::Refrigerant(e) => e.quantity_leaked.unwrap_or(0.0),
            ActivityRecord::Commuting(e) => e.passenger_distance(),
        }
    }

    /// Date the activity is attributed to (start of the billing window for electricity)
    pub fn date(&self) -> NaiveDate {
        match self {
            ActivityRecord::Fuel(e) => e.date,
            ActivityRecord::Vehicle(e) => e.date,
            ActivityRecord::Electricity(e) => e.billing_start,
            ActivityRecord::Refrigerant(e) => e.date,
            ActivityRecord::Commuting(e) => e.survey_date,
        }
    }
}
