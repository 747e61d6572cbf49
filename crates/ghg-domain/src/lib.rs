//! Emissions domain: activity model, calculation engine, trend analysis

pub mod model;
pub mod repository;
pub mod service;
