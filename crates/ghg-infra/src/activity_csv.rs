//! CSV importer for activity records
//!
//! Expected header (column order is free, names are case-insensitive):
//! category,subtype,quantity,unit,date,end_date,quantity_leaked,commuters,days,round_trip
//!
//! `end_date` is required for electricity bills, `commuters` and `days` for
//! commuting lines. Files are decoded as UTF-8 unless a BOM says otherwise.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use encoding_rs::UTF_8;
use thiserror::Error;
use tracing::warn;

use ghg_domain::model::{
    ActivityRecord, CommuteSurveyEntry, ElectricityEntry, FuelEntry, RefrigerantEntry,
    VehicleEntry,
};
use ghg_types::{Category, Error};

#[derive(Error, Debug)]
pub enum ActivityCsvError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Unknown category in row {row}: {value}")]
    UnknownCategory { row: usize, value: String },

    #[error("Missing value in row {row}, column {column}")]
    MissingValue { row: usize, column: String },

    #[error("Invalid date format in row {row}: {value}")]
    InvalidDate { row: usize, value: String },

    #[error("Invalid number format in row {row}, column {column}: {value}")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
}

impl From<ActivityCsvError> for Error {
    fn from(e: ActivityCsvError) -> Self {
        match e {
            ActivityCsvError::IoError(io) => Error::Io(io),
            other => Error::Csv(other.to_string()),
        }
    }
}

const REQUIRED_COLUMNS: [&str; 5] = ["category", "subtype", "quantity", "unit", "date"];

/// Column positions resolved from the header row
struct Columns {
    category: usize,
    subtype: usize,
    quantity: usize,
    unit: usize,
    date: usize,
    end_date: Option<usize>,
    quantity_leaked: Option<usize>,
    commuters: Option<usize>,
    days: Option<usize>,
    round_trip: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, ActivityCsvError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        for name in REQUIRED_COLUMNS {
            if find(name).is_none() {
                return Err(ActivityCsvError::MissingColumn(name.to_string()));
            }
        }
        let required = |name: &str| find(name).unwrap_or_default();
        Ok(Self {
            category: required("category"),
            subtype: required("subtype"),
            quantity: required("quantity"),
            unit: required("unit"),
            date: required("date"),
            end_date: find("end_date"),
            quantity_leaked: find("quantity_leaked"),
            commuters: find("commuters"),
            days: find("days"),
            round_trip: find("round_trip"),
        })
    }
}

/// Load activity records from a CSV file
///
/// Returned records carry id 0; the repository assigns ids on insert.
pub fn load_activities<P: AsRef<Path>>(path: P) -> Result<Vec<ActivityRecord>, ActivityCsvError> {
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    // BOM sniffing picks UTF-16 when present, UTF-8 otherwise
    let (decoded, encoding, had_errors) = UTF_8.decode(&bytes);
    if had_errors {
        warn!(
            encoding = encoding.name(),
            "some characters could not be decoded"
        );
    }

    parse_activities(&decoded)
}

/// Parse activity records from CSV text
pub fn parse_activities(text: &str) -> Result<Vec<ActivityRecord>, ActivityCsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = Columns::from_headers(&headers)?;

    let mut activities = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        let row_num = row_idx + 2; // header is row 1
        if record.iter().all(str::is_empty) {
            continue;
        }
        activities.push(parse_record(&record, &columns, row_num)?);
    }

    Ok(activities)
}

fn parse_record(
    record: &csv::StringRecord,
    columns: &Columns,
    row: usize,
) -> Result<ActivityRecord, ActivityCsvError> {
    let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");

    let category_str = field(Some(columns.category));
    let category: Category =
        category_str
            .parse()
            .map_err(|_| ActivityCsvError::UnknownCategory {
                row,
                value: category_str.to_string(),
            })?;

    let subtype = required_field(field(Some(columns.subtype)), row, "subtype")?.to_string();
    let quantity = parse_f64(
        required_field(field(Some(columns.quantity)), row, "quantity")?,
        row,
        "quantity",
    )?;
    let unit = required_field(field(Some(columns.unit)), row, "unit")?.to_string();
    let date = parse_date(required_field(field(Some(columns.date)), row, "date")?, row)?;

    let activity = match category {
        Category::Fuel => ActivityRecord::Fuel(FuelEntry {
            id: 0,
            fuel_type: subtype,
            quantity,
            unit,
            date,
        }),
        Category::Vehicle => ActivityRecord::Vehicle(VehicleEntry {
            id: 0,
            vehicle_type: subtype,
            distance: quantity,
            unit,
            date,
        }),
        Category::Electricity => {
            let end = required_field(field(columns.end_date), row, "end_date")?;
            ActivityRecord::Electricity(ElectricityEntry {
                id: 0,
                grid: subtype,
                consumption: quantity,
                unit,
                billing_start: date,
                billing_end: parse_date(end, row)?,
            })
        }
        Category::Refrigerant => {
            let leaked = field(columns.quantity_leaked);
            let quantity_leaked = if leaked.is_empty() {
                None
            } else {
                Some(parse_f64(leaked, row, "quantity_leaked")?)
            };
            ActivityRecord::Refrigerant(RefrigerantEntry {
                id: 0,
                refrigerant_type: subtype,
                quantity_purchased: quantity,
                quantity_leaked,
                unit,
                date,
            })
        }
        Category::Commuting => {
            let commuters = parse_u32(
                required_field(field(columns.commuters), row, "commuters")?,
                row,
                "commuters",
            )?;
            let days = parse_u32(
                required_field(field(columns.days), row, "days")?,
                row,
                "days",
            )?;
            ActivityRecord::Commuting(CommuteSurveyEntry {
                id: 0,
                transport_mode: subtype,
                one_way_distance: quantity,
                unit,
                commuters,
                days,
                round_trip: parse_flag(field(columns.round_trip)),
                survey_date: date,
            })
        }
    };

    Ok(activity)
}

fn required_field<'a>(
    value: &'a str,
    row: usize,
    column: &str,
) -> Result<&'a str, ActivityCsvError> {
    if value.is_empty() {
        return Err(ActivityCsvError::MissingValue {
            row,
            column: column.to_string(),
        });
    }
    Ok(value)
}

fn parse_date(s: &str, row: usize) -> Result<NaiveDate, ActivityCsvError> {
    let formats = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(ActivityCsvError::InvalidDate {
        row,
        value: s.to_string(),
    })
}

/// Thousands separators are dropped; negative values are kept for the
/// calculation to reject per record
fn parse_f64(s: &str, row: usize, column: &str) -> Result<f64, ActivityCsvError> {
    let cleaned = s.trim().replace(',', "");
    cleaned.parse().map_err(|_| ActivityCsvError::InvalidNumber {
        row,
        column: column.to_string(),
        value: s.to_string(),
    })
}

fn parse_u32(s: &str, row: usize, column: &str) -> Result<u32, ActivityCsvError> {
    let cleaned = s.trim().replace(',', "");
    cleaned.parse().map_err(|_| ActivityCsvError::InvalidNumber {
        row,
        column: column.to_string(),
        value: s.to_string(),
    })
}

/// Round trip unless explicitly marked otherwise
fn parse_flag(s: &str) -> bool {
    !matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "n"
    )
}
