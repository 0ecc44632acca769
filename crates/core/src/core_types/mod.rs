//! Core types and utilities

pub mod climate;
pub mod cohort;
pub mod ecoregion;
pub mod site;
pub mod species;
pub mod units;

pub use climate::{AnnualClimate, MonthlyClimate, MONTHS_PER_YEAR};
pub use cohort::{Cohort, DroughtKill};
pub use ecoregion::{ClimateTable, Ecoregion, EcoregionId, EcoregionTable};
pub use site::{
    ClimateHistory, ClimateNormals, LaggedPredictors, RollingHistory, Site, SoilProperties,
    WaterState, HISTORY_YEARS,
};
pub use species::{Species, SpeciesDroughtParameters, SpeciesId, SpeciesTable};
pub use units::*;
