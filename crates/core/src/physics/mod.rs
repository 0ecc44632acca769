//! Physics modules for the monthly water budget

pub mod slope_aspect;
pub mod water_balance;

pub use slope_aspect::{adjust_pet, slope_aspect_effect};
pub use water_balance::{MonthlyWaterBalance, SoilWaterBalance, WaterLossFactors};
