//! Monthly Soil Water Balance
//!
//! Single-bucket monthly water budget for one site. Each call applies, in a
//! fixed order:
//! 1. Slope/aspect adjustment of PET
//! 2. Rain/snow partition on minimum temperature
//! 3. Temperature-index snowmelt
//! 4. Sublimation from the snowpack
//! 5. Canopy interception and bare-soil evaporation (snow-free months only)
//! 6. Stormflow of water above field capacity
//! 7. Transpiration limited by water above wilting point
//! 8. Baseflow leaching and carry-over cap at field capacity
//!
//! All stocks are in cm of water. Every subtraction is floored at zero; the
//! model treats water as a strictly non-negative stock and never reports
//! underflow.
//!
//! # Scientific References
//! - Parton, W.J. et al. (1993). CENTURY soil water submodel (interception,
//!   bare-soil evaporation, snow sublimation coefficient 0.87)
//! - Bergström, S. (1992). "The HBV model - its structure and applications."
//!   SMHI Reports RH No. 4 (AET as a linear function of relative soil moisture)
//! - Lucash, M. snowmelt regression of melt fraction against maximum temperature

use super::slope_aspect::adjust_pet;
use crate::core_types::climate::{MonthlyClimate, MONTHS_PER_YEAR};
use crate::core_types::site::Site;
use crate::core_types::units::{Millimeters, MM_PER_CM};
use crate::error::{DroughtError, DroughtResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Melt fraction gained per °C of maximum temperature
const SNOWMELT_SLOPE: f64 = 0.05;

/// Melt fraction at 0°C maximum temperature
const SNOWMELT_INTERCEPT: f64 = 0.024;

/// Ratio of liquid water to ice latent heats; cm of snow per cm of PET energy
const SNOW_SUBLIMATION_RATIO: f64 = 0.87;

/// Standing biomass used for interception (g/m²); fixed, not site-specific
const STANDING_BIOMASS: f64 = 800.0;

/// Litter biomass used for interception (g/m²); fixed, not site-specific
const LITTER_BIOMASS: f64 = 400.0;

/// Surface evaporation cannot exceed this share of remaining PET
const MAX_SURFACE_EVAPORATION_PET_FRACTION: f64 = 0.4;

/// Tunable multipliers on interception and bare-soil evaporation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterLossFactors {
    /// Scales canopy interception
    pub interception: f64,
    /// Scales bare-soil evaporation
    pub bare_soil: f64,
}

impl Default for WaterLossFactors {
    fn default() -> Self {
        Self {
            interception: 1.0,
            bare_soil: 1.0,
        }
    }
}

/// Fluxes and stocks produced by one monthly step (cm unless noted)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyWaterBalance {
    /// PET after slope/aspect adjustment
    pub pet: f64,
    /// Precipitation that fell as rain and entered the soil
    pub rain: f64,
    /// Precipitation added to the snowpack
    pub snowfall: f64,
    pub snowmelt: f64,
    /// Liquid-equivalent snow lost to sublimation
    pub snow_evaporation: f64,
    /// Interception plus bare-soil evaporation
    pub soil_evaporation: f64,
    /// Transpiration drawn from soil water above wilting point
    pub transpiration: f64,
    /// Total actual evapotranspiration charged against PET
    pub aet: f64,
    /// (PET - AET) in mm
    pub climatic_water_deficit: f64,
    pub water_movement: f64,
    pub storm_flow: f64,
    /// Leaching plus the carry-over surplus above field capacity
    pub base_flow: f64,
    /// Water above wilting point after inputs and surface evaporation
    pub available_water_max: f64,
    /// Water above wilting point at month end
    pub available_water_min: f64,
    pub plant_available_water: f64,
    pub soil_water_content: f64,
    pub liquid_snowpack: f64,
    pub mean_soil_water: f64,
    /// Plant-available water over PET; zero when PET is zero
    pub available_water_pet_ratio: f64,
}

/// Monthly water budget engine
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SoilWaterBalance {
    factors: WaterLossFactors,
}

impl SoilWaterBalance {
    pub fn new(factors: WaterLossFactors) -> Self {
        Self { factors }
    }

    pub fn factors(&self) -> WaterLossFactors {
        self.factors
    }

    /// Fraction of precipitation intercepted by the canopy and litter
    pub fn canopy_interception(&self) -> f64 {
        (0.0003 * LITTER_BIOMASS + 0.0006 * STANDING_BIOMASS) * self.factors.interception
    }

    /// Fraction of precipitation evaporated from bare soil
    pub fn bare_soil_evaporation(&self) -> f64 {
        0.5 * (-0.002 * LITTER_BIOMASS - 0.004 * STANDING_BIOMASS).exp() * self.factors.bare_soil
    }

    /// Run one month of the water budget for a site.
    ///
    /// `month` is the slot (0-11) the monthly outputs are written to;
    /// `year` is only used for diagnostics.
    ///
    /// # Errors
    /// Returns [`DroughtError::InvalidSoil`] if field capacity does not exceed
    /// the wilting point, and [`DroughtError::Config`] if `month` is not a
    /// valid slot.
    pub fn step(
        &self,
        site: &mut Site,
        climate: &MonthlyClimate,
        month: usize,
        year: i32,
    ) -> DroughtResult<MonthlyWaterBalance> {
        if month >= MONTHS_PER_YEAR {
            return Err(DroughtError::Config(format!(
                "month slot {month} out of range 0..{MONTHS_PER_YEAR}"
            )));
        }

        let soil = site.soil;
        soil.validate(site.row, site.column)?;
        let water_full = *soil.water_full();
        let water_empty = *soil.water_empty();

        let mut soil_water = site.water.soil_water_content;
        let mut snowpack = site.water.liquid_snowpack;
        let mut precipitation = *climate.precipitation;
        let tmax = *climate.max_temperature;
        let tmin = *climate.min_temperature;
        let mut aet = 0.0;

        // 1. Terrain-adjusted PET
        let pet = *adjust_pet(climate.pet, soil.slope, soil.aspect);
        debug!(
            row = site.row,
            column = site.column,
            year,
            month,
            raw_pet = *climate.pet,
            pet,
            "adjusted PET for slope and aspect"
        );

        // 2. Rain or snow on minimum temperature
        let mut snowfall = 0.0;
        if tmin <= 0.0 {
            snowfall = precipitation;
            precipitation = 0.0;
            snowpack += snowfall;
        } else {
            soil_water += precipitation;
        }

        let mut remaining_pet = pet;

        // 3. Snowmelt
        let mut snowmelt = 0.0;
        if snowpack > 0.0 && tmax > 0.0 {
            let melt_fraction = (tmax * SNOWMELT_SLOPE + SNOWMELT_INTERCEPT).clamp(0.0, 1.0);
            snowmelt = (snowpack * melt_fraction).min(snowpack);
            snowpack = (snowpack - snowmelt).max(0.0);
            soil_water += snowmelt;
            debug!(row = site.row, column = site.column, snowmelt, "snow melts");
        }

        // 4. Sublimation, paid for out of PET
        let mut snow_evaporation = 0.0;
        if snowpack > 0.0 {
            snow_evaporation = (pet * SNOW_SUBLIMATION_RATIO).min(snowpack);
            snowpack = (snowpack - snow_evaporation).max(0.0);
            let energy = snow_evaporation / SNOW_SUBLIMATION_RATIO;
            remaining_pet = (remaining_pet - energy).max(0.0);
            aet += energy;
        }

        // 5. Interception and bare-soil evaporation
        let mut soil_evaporation = 0.0;
        if snowpack <= 0.0 {
            let surface_fraction = self.bare_soil_evaporation() + self.canopy_interception();
            soil_evaporation = (surface_fraction * precipitation)
                .min(MAX_SURFACE_EVAPORATION_PET_FRACTION * remaining_pet)
                .min(soil_water)
                .max(0.0);
            soil_water = (soil_water - soil_evaporation).max(0.0);
            aet += soil_evaporation;
            remaining_pet = (remaining_pet - soil_evaporation).max(0.0);
        }

        // 6. Highest water available this month
        let available_water_max = (soil_water - water_empty).max(0.0);
        let water_content_max = soil_water;

        // 7. Stormflow
        let mut water_movement = 0.0;
        let mut storm_flow = 0.0;
        if soil_water > water_full {
            water_movement = (soil_water - water_full).max(0.0);
            storm_flow = water_movement * soil.storm_flow_fraction;
            soil_water = (soil_water - storm_flow).max(0.0);
        }

        // 8. Transpiration
        let above_wilting = soil_water - water_empty;
        let transpiration = if above_wilting >= remaining_pet {
            remaining_pet
        } else {
            (remaining_pet * (above_wilting / (water_full - water_empty)))
                .min(above_wilting)
                .max(0.0)
        };
        soil_water = (soil_water - transpiration).max(0.0);
        aet += transpiration;
        remaining_pet = (remaining_pet - transpiration).max(0.0);

        // 9. Baseflow, then cap carry-over at field capacity
        let remaining_water = (soil_water - water_empty).max(0.0);
        let mut base_flow = (remaining_water * soil.base_flow_fraction).max(0.0);
        soil_water = (soil_water - base_flow).max(0.0);
        let surplus = (soil_water - water_full).max(0.0);
        base_flow += surplus;
        soil_water = (soil_water - surplus).max(0.0);
        let available_water_min = (soil_water - water_empty).max(0.0);

        // 10. Monthly means
        let plant_available_water = (available_water_max + available_water_min) / 2.0;
        let mean_soil_water = (water_content_max + soil_water) / 2.0;
        let available_water_pet_ratio = if pet > 0.0 {
            plant_available_water / pet
        } else {
            0.0
        };

        // 11. Accumulators and state
        let climatic_water_deficit = (pet - aet) * MM_PER_CM;
        site.annual.water_balance += precipitation - aet;
        site.annual.climatic_water_deficit += Millimeters::new(climatic_water_deficit);
        site.annual.potential_evapotranspiration += Millimeters::new(pet * MM_PER_CM);

        site.water.soil_water_content = soil_water;
        site.water.liquid_snowpack = snowpack;
        site.water.plant_available_water = plant_available_water;
        site.water.mean_soil_water_content = mean_soil_water;
        site.water.water_movement = water_movement;
        site.water.storm_flow = storm_flow;
        site.water.base_flow = base_flow;
        site.water.available_water_pet_ratio = available_water_pet_ratio;

        site.monthly.actual_evapotranspiration[month] = aet;
        site.monthly.climatic_water_deficit[month] = climatic_water_deficit;
        site.monthly.soil_water_content[month] = soil_water;
        site.monthly.mean_soil_water_content[month] = mean_soil_water / *soil.depth;
        site.monthly.plant_available_water[month] = plant_available_water;

        debug!(
            row = site.row,
            column = site.column,
            year,
            month,
            aet,
            remaining_pet,
            soil_water,
            snowpack,
            storm_flow,
            base_flow,
            "water balance step complete"
        );

        Ok(MonthlyWaterBalance {
            pet,
            rain: precipitation,
            snowfall,
            snowmelt,
            snow_evaporation,
            soil_evaporation,
            transpiration,
            aet,
            climatic_water_deficit,
            water_movement,
            storm_flow,
            base_flow,
            available_water_max,
            available_water_min,
            plant_available_water,
            soil_water_content: soil_water,
            liquid_snowpack: snowpack,
            mean_soil_water,
            available_water_pet_ratio,
        })
    }
}
