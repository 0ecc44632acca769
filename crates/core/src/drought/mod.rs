//! Drought stress and mortality
//!
//! - `lagged`: multi-year predictors from the rolling site histories
//! - `mortality`: per-cohort kill decision
//! - `spinup`: warm-up run that seeds site state before the main simulation

pub mod lagged;
pub mod mortality;
pub mod spinup;

pub use lagged::{aggregate, lagged_predictors};
pub use mortality::{evaluate, mortality_probability, MortalityPredictors};
pub use spinup::{ClimateSpinup, SpinupSummary, SPINUP_MONTH_ORDER, SPINUP_YEARS};
