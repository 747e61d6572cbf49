//! Configuration management for ghg-calc
//!
//! Config stored at: ~/.config/ghg-calc/config.json

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use ghg_domain::model::ScopeSelection;
use ghg_types::{ConfigError, Error, OutputFormat, Result, Scope};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Store directory override
    #[serde(default)]
    pub store_dir: Option<PathBuf>,

    /// TOML emission factor table (bundled table when unset)
    #[serde(default)]
    pub factors_path: Option<PathBuf>,

    /// Default output format (json, table)
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,

    /// Months covered by `trends` when `--months` is not given
    #[serde(default = "default_months_back")]
    pub default_months_back: u32,

    /// Occupancy type -> scopes collected for organizations of that type
    #[serde(default = "default_occupancy_scopes")]
    pub occupancy_scopes: BTreeMap<String, ScopeSelection>,

    /// Organization id -> occupancy type
    #[serde(default)]
    pub organization_occupancy: BTreeMap<String, String>,
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_months_back() -> u32 {
    12
}

fn default_occupancy_scopes() -> BTreeMap<String, ScopeSelection> {
    let direct_and_energy = ScopeSelection::only(&[Scope::Scope1, Scope::Scope2]);
    let mut matrix = BTreeMap::new();
    matrix.insert("residential".to_string(), direct_and_energy);
    for occupancy in ["commercial", "industrial", "lgu", "academic"] {
        matrix.insert(occupancy.to_string(), ScopeSelection::all());
    }
    matrix
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: None,
            factors_path: None,
            output_format: default_output_format(),
            default_months_back: default_months_back(),
            occupancy_scopes: default_occupancy_scopes(),
            organization_occupancy: BTreeMap::new(),
        }
    }
}

fn occupancy_key(occupancy: &str) -> String {
    occupancy.trim().to_ascii_lowercase()
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("ghg-calc");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Get the store directory path
    pub fn store_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.store_dir {
            return Ok(dir.clone());
        }

        let store_dir = dirs::data_dir()
            .ok_or(ConfigError::NotFound)?
            .join("ghg-calc");
        Ok(store_dir)
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveError(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Scopes for an occupancy type, if the matrix knows it
    pub fn scopes_for_occupancy(&self, occupancy: &str) -> Option<ScopeSelection> {
        self.occupancy_scopes.get(&occupancy_key(occupancy)).copied()
    }

    /// Resolve an explicit occupancy override, rejecting unknown types
    pub fn require_occupancy(&self, occupancy: &str) -> Result<ScopeSelection> {
        self.scopes_for_occupancy(occupancy).ok_or_else(|| {
            Error::Config(ConfigError::ParseError(format!(
                "Unknown occupancy type: {} (known: {})",
                occupancy,
                self.occupancy_scopes
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        })
    }

    /// Scopes collected for an organization
    ///
    /// Organizations without an occupancy type collect every scope.
    pub fn scopes_for_organization(&self, organization_id: &str) -> ScopeSelection {
        let Some(occupancy) = self.organization_occupancy.get(organization_id) else {
            return ScopeSelection::all();
        };
        self.scopes_for_occupancy(occupancy).unwrap_or_else(|| {
            warn!(
                organization_id,
                occupancy = %occupancy,
                "occupancy type missing from the scope matrix; collecting all scopes"
            );
            ScopeSelection::all()
        })
    }
}

fn describe_scopes(selection: &ScopeSelection) -> String {
    let scopes: Vec<String> = Scope::ALL
        .iter()
        .filter(|s| selection.includes(**s))
        .map(|s| s.number().to_string())
        .collect();
    if scopes.is_empty() {
        "(none)".to_string()
    } else {
        format!("Scope {}", scopes.join(" + "))
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "GHG Calculator Configuration")?;
        writeln!(f, "============================")?;
        writeln!(f)?;
        writeln!(
            f,
            "Store dir:      {}",
            self.store_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        )?;
        writeln!(
            f,
            "Factor table:   {}",
            self.factors_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(bundled)".to_string())
        )?;
        writeln!(f, "Output format:  {}", self.output_format)?;
        writeln!(f, "Months back:    {}", self.default_months_back)?;

        writeln!(f)?;
        writeln!(f, "Occupancy scopes:")?;
        for (occupancy, selection) in &self.occupancy_scopes {
            writeln!(f, "  {:<14}{}", occupancy, describe_scopes(selection))?;
        }

        if !self.organization_occupancy.is_empty() {
            writeln!(f)?;
            writeln!(f, "Organizations:")?;
            for (organization, occupancy) in &self.organization_occupancy {
                writeln!(f, "  {:<14}{}", organization, occupancy)?;
            }
        }

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:    {}", path.display())?;
        }

        Ok(())
    }
}
