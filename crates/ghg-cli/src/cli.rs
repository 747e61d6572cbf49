//! CLI definition using clap

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ghg_types::{Category, OutputFormat, RecordId};

#[derive(Parser)]
#[command(name = "ghg-calc")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "Greenhouse-gas emissions calculator for organizations")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Store directory override
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Emission factor table (TOML) override
    #[arg(long, global = true)]
    pub factors: Option<PathBuf>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage reporting records
    Record {
        #[command(subcommand)]
        action: RecordAction,
    },

    /// Manage activity data of a reporting record
    Activity {
        #[command(subcommand)]
        action: ActivityAction,
    },

    /// Calculate emissions of one reporting record
    Calculate {
        /// Reporting record id
        id: RecordId,

        /// Recompute even if a result is already stored
        #[arg(long)]
        force: bool,

        /// Occupancy type override (residential, commercial, industrial, lgu, academic)
        #[arg(long)]
        occupancy: Option<String>,

        /// Export the calculation to an Excel file
        #[arg(long, short = 'o')]
        export: Option<PathBuf>,
    },

    /// Recalculate every reporting record of an organization
    CalculateAll {
        /// Organization id
        #[arg(long)]
        org: String,

        /// Number of parallel jobs (0 = CPU count)
        #[arg(long, short = 'j')]
        jobs: Option<usize>,
    },

    /// Show emission trends of an organization
    Trends {
        /// Organization id
        #[arg(long)]
        org: String,

        /// Months to look back. Uses config value if not specified.
        #[arg(long, short = 'm')]
        months: Option<u32>,

        /// Export the trend report to an Excel file
        #[arg(long, short = 'o')]
        export: Option<PathBuf>,
    },

    /// List emission factors
    Factors {
        /// Only show one category
        #[arg(long, short = 'c')]
        category: Option<Category>,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Set default months for trends
        #[arg(long)]
        set_months: Option<u32>,

        /// Set store directory
        #[arg(long)]
        set_store: Option<PathBuf>,

        /// Set emission factor table
        #[arg(long)]
        set_factors: Option<PathBuf>,

        /// Assign an occupancy type to an organization (ORG=TYPE)
        #[arg(long, value_name = "ORG=TYPE")]
        set_occupancy: Option<String>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
pub enum RecordAction {
    /// Create a reporting record
    Add {
        /// Organization id
        #[arg(long)]
        org: String,

        /// First day of the period (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,

        /// Day after the last day of the period. Defaults to one month after start.
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Free-form label (e.g. "January 2026")
        #[arg(long)]
        label: Option<String>,
    },

    /// List reporting records of an organization
    List {
        /// Organization id
        #[arg(long)]
        org: String,
    },
}

#[derive(Subcommand)]
pub enum ActivityAction {
    /// Import activity records from a CSV file
    Import {
        /// Reporting record id
        id: RecordId,

        /// CSV file (category,subtype,quantity,unit,date,...)
        file: PathBuf,
    },

    /// List activity records of a reporting record
    List {
        /// Reporting record id
        id: RecordId,
    },
}
