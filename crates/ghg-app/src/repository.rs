//! Repository and reference data adapters

use std::path::PathBuf;

use tracing::info;

use ghg_domain::service::EmissionFactorRegistry;
use ghg_infra::factor_loader::{load_registry_from_file, load_registry_from_str};
use ghg_infra::persistence::FileEmissionsRepository;
use ghg_types::Result;

use crate::config::Config;

/// Factor table shipped with the binary
pub const DEFAULT_FACTORS: &str = include_str!("../data/default_factors.toml");

/// Open file-based emissions repository
pub fn open_repository(config: &Config) -> Result<FileEmissionsRepository> {
    let store_dir = config.store_dir()?;
    FileEmissionsRepository::open(store_dir)
}

/// Open file-based emissions repository at a custom directory
pub fn open_repository_at(store_dir: PathBuf) -> Result<FileEmissionsRepository> {
    FileEmissionsRepository::open(store_dir)
}

/// Load the configured factor table, or the bundled one
pub fn load_registry(config: &Config) -> Result<EmissionFactorRegistry> {
    match config.factors_path {
        Some(ref path) => {
            let registry = load_registry_from_file(path)?;
            info!(path = %path.display(), factors = registry.len(), "factor table loaded");
            Ok(registry)
        }
        None => default_registry(),
    }
}

pub fn default_registry() -> Result<EmissionFactorRegistry> {
    load_registry_from_str(DEFAULT_FACTORS)
}
