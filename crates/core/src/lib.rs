//! Drought Mortality Simulation Core Library
//!
//! Monthly soil water balance and drought-driven tree mortality for a
//! forest landscape. Each site runs a single-bucket water budget driven by
//! its ecoregion's climate; multi-year aggregates of soil water, temperature
//! and climatic water deficit then drive a per-cohort kill decision from
//! either a CWD threshold rule or a decadal logistic survival regression.
//!
//! ## Yearly sequence
//! - Ten-year climate spin-up seeds soil water, snowpack and histories
//! - Twelve monthly water-balance steps per site (parallel across sites)
//! - Annual roll-over into ten-year rolling histories
//! - Lagged predictors from the trailing window
//! - One seeded draw per cohort decides drought mortality

// Core types and utilities
pub mod core_types;

// Water budget physics
pub mod physics;

// Lagged climate, mortality and spin-up
pub mod drought;

pub mod config;
pub mod error;
pub mod landscape;
pub mod output;
pub mod rng;

// Re-export core types
pub use core_types::{AnnualClimate, ClimateTable, Cohort, DroughtKill, EcoregionTable, MonthlyClimate};
pub use core_types::{ClimateNormals, LaggedPredictors, Site, SoilProperties};
pub use core_types::{SpeciesDroughtParameters, SpeciesId, SpeciesTable};

// Re-export engines and drivers
pub use config::{DroughtParameters, Scenario, ScenarioConfig};
pub use drought::{ClimateSpinup, SpinupSummary};
pub use error::{DroughtError, DroughtResult};
pub use landscape::{DroughtYearReport, Landscape};
pub use output::SpeciesMapNames;
pub use physics::{MonthlyWaterBalance, SoilWaterBalance, WaterLossFactors};
pub use rng::{MortalityRng, UniformSource};
