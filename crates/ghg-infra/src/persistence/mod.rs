//! Persistence implementations
//!
//! File-based implementation of the domain repository traits.

mod file_emissions_repo;

pub use file_emissions_repo::FileEmissionsRepository;
