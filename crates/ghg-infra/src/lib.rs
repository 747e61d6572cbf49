//! Infrastructure layer - persistence implementations, loaders

pub mod activity_csv;
pub mod factor_loader;
pub mod persistence;
