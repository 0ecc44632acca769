//! Scenario configuration
//!
//! A scenario is one TOML document holding the global drought parameters,
//! the species and ecoregion tables, spin-up and main-run climate records,
//! and the list of sites with their soils and initial cohorts.
//! [`ScenarioConfig::build`] checks every cross-reference and returns the
//! immutable tables plus a ready-to-run [`Landscape`].
//!
//! # Example
//! ```toml
//! [parameters]
//! random_seed = 42
//!
//! [[species]]
//! name = "pinupond"
//! cwd_threshold = 450.0
//! mortality_above_threshold = 0.05
//!
//! [[ecoregions]]
//! name = "foothills"
//!
//! [[spinup_climate]]
//! year = 1980
//! ecoregion = "foothills"
//! precipitation = [9.0, 8.0, 7.0, 5.0, 3.0, 1.0, 0.5, 0.5, 1.5, 3.0, 6.0, 8.0]
//! # ...temperature, max_temperature, min_temperature, pet
//!
//! [[sites]]
//! row = 0
//! column = 0
//! ecoregion = "foothills"
//! soil = { depth = 90.0, field_capacity = 0.3, wilting_point = 0.12, storm_flow_fraction = 0.3, base_flow_fraction = 0.1 }
//! cohorts = [{ species = "pinupond", age = 60, leaf_biomass = 350.0, wood_biomass = 5200.0 }]
//! ```

use crate::core_types::climate::{AnnualClimate, MONTHS_PER_YEAR};
use crate::core_types::cohort::Cohort;
use crate::core_types::ecoregion::{ClimateTable, EcoregionTable};
use crate::core_types::site::{ClimateNormals, Site, SoilProperties};
use crate::core_types::species::{SpeciesDroughtParameters, SpeciesTable};
use crate::core_types::units::{Celsius, Centimeters};
use crate::error::{DroughtError, DroughtResult};
use crate::landscape::Landscape;
use crate::output::{SpeciesMapNames, DEFAULT_SPECIES_MAP_NAMES};
use crate::physics::water_balance::WaterLossFactors;
use crate::rng::MortalityRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

const ABSOLUTE_ZERO_C: f64 = -273.15;

fn one() -> f64 {
    1.0
}

fn default_species_map_names() -> String {
    DEFAULT_SPECIES_MAP_NAMES.to_string()
}

fn default_true() -> bool {
    true
}

fn default_begin_growing() -> usize {
    3
}

fn default_end_growing() -> usize {
    8
}

// ============================================================================
// GLOBAL PARAMETERS
// ============================================================================

/// Run-wide drought settings
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroughtParameters {
    /// Multiplier on canopy interception
    #[serde(default = "one")]
    pub water_loss_factor1: f64,
    /// Multiplier on bare-soil evaporation
    #[serde(default = "one")]
    pub water_loss_factor2: f64,
    #[serde(default)]
    pub output_soil_water_available: bool,
    #[serde(default)]
    pub output_climate_water_deficit: bool,
    #[serde(default)]
    pub output_temperature: bool,
    #[serde(default)]
    pub write_species_drought_maps: bool,
    #[serde(default = "default_species_map_names")]
    pub species_map_names: String,
    #[serde(default)]
    pub random_seed: u64,
}

impl Default for DroughtParameters {
    fn default() -> Self {
        Self {
            water_loss_factor1: 1.0,
            water_loss_factor2: 1.0,
            output_soil_water_available: false,
            output_climate_water_deficit: false,
            output_temperature: false,
            write_species_drought_maps: false,
            species_map_names: default_species_map_names(),
            random_seed: 0,
        }
    }
}

impl DroughtParameters {
    pub fn loss_factors(&self) -> WaterLossFactors {
        WaterLossFactors {
            interception: self.water_loss_factor1,
            bare_soil: self.water_loss_factor2,
        }
    }
}

// ============================================================================
// TABLE ENTRIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesConfig {
    pub name: String,
    #[serde(flatten)]
    pub drought: SpeciesDroughtParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcoregionConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// One ecoregion's climate for one calendar year, or for every year from
/// `year` to `through` inclusive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateRecordConfig {
    pub year: i32,
    #[serde(default)]
    pub through: Option<i32>,
    pub ecoregion: String,
    /// Monthly precipitation (cm)
    pub precipitation: [f64; MONTHS_PER_YEAR],
    /// Monthly mean temperature (°C)
    pub temperature: [f64; MONTHS_PER_YEAR],
    pub max_temperature: [f64; MONTHS_PER_YEAR],
    pub min_temperature: [f64; MONTHS_PER_YEAR],
    /// Monthly potential evapotranspiration (cm)
    pub pet: [f64; MONTHS_PER_YEAR],
    #[serde(default = "default_begin_growing")]
    pub begin_growing: usize,
    #[serde(default = "default_end_growing")]
    pub end_growing: usize,
}

impl ClimateRecordConfig {
    /// Calendar years this record applies to
    ///
    /// # Errors
    /// [`DroughtError::Config`] when `through` precedes `year`.
    pub fn years(&self) -> DroughtResult<std::ops::RangeInclusive<i32>> {
        let last = self.through.unwrap_or(self.year);
        if last < self.year {
            return Err(DroughtError::Config(format!(
                "climate for '{}': through {} precedes year {}",
                self.ecoregion, last, self.year
            )));
        }
        Ok(self.year..=last)
    }

    /// Convert to an [`AnnualClimate`], rejecting physically impossible values.
    ///
    /// # Errors
    /// [`DroughtError::Config`] for negative or non-finite water amounts,
    /// temperatures below absolute zero, or growing-season months out of range.
    pub fn to_annual(&self) -> DroughtResult<AnnualClimate> {
        let context = |what: &str| {
            DroughtError::Config(format!(
                "climate for '{}' in {}: {what}",
                self.ecoregion, self.year
            ))
        };

        for (label, values) in [("precipitation", &self.precipitation), ("pet", &self.pet)] {
            if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(context(&format!("{label} must be finite and non-negative")));
            }
        }
        for (label, values) in [
            ("temperature", &self.temperature),
            ("max_temperature", &self.max_temperature),
            ("min_temperature", &self.min_temperature),
        ] {
            if values.iter().any(|v| !v.is_finite() || *v < ABSOLUTE_ZERO_C) {
                return Err(context(&format!("{label} must be finite and above absolute zero")));
            }
        }
        if self.begin_growing >= MONTHS_PER_YEAR || self.end_growing >= MONTHS_PER_YEAR {
            return Err(context("growing season months must be 0-11"));
        }

        Ok(AnnualClimate {
            precipitation: self.precipitation.map(Centimeters::new),
            temperature: self.temperature.map(Celsius::from),
            max_temperature: self.max_temperature.map(Celsius::from),
            min_temperature: self.min_temperature.map(Celsius::from),
            pet: self.pet.map(Centimeters::new),
            begin_growing: self.begin_growing,
            end_growing: self.end_growing,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortConfig {
    pub species: String,
    pub age: u32,
    pub leaf_biomass: f64,
    pub wood_biomass: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub row: u32,
    pub column: u32,
    pub ecoregion: String,
    pub soil: SoilProperties,
    #[serde(default)]
    pub normals: ClimateNormals,
    #[serde(default)]
    pub cohorts: Vec<CohortConfig>,
}

// ============================================================================
// SCENARIO
// ============================================================================

/// Raw scenario document as read from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub parameters: DroughtParameters,
    #[serde(default)]
    pub species: Vec<SpeciesConfig>,
    #[serde(default)]
    pub ecoregions: Vec<EcoregionConfig>,
    #[serde(default)]
    pub spinup_climate: Vec<ClimateRecordConfig>,
    #[serde(default)]
    pub climate: Vec<ClimateRecordConfig>,
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
}

/// Validated tables and landscape, ready to run
#[derive(Debug, Clone)]
pub struct Scenario {
    pub parameters: DroughtParameters,
    pub species: SpeciesTable,
    pub ecoregions: EcoregionTable,
    pub spinup_climate: ClimateTable,
    pub climate: ClimateTable,
    pub landscape: Landscape,
}

impl ScenarioConfig {
    /// # Errors
    /// [`DroughtError::Config`] when the document is not valid TOML for this
    /// schema.
    pub fn from_toml_str(source: &str) -> DroughtResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// # Errors
    /// [`DroughtError::Io`] when the file cannot be read, otherwise as
    /// [`ScenarioConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> DroughtResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), bytes = source.len(), "read scenario file");
        Self::from_toml_str(&source)
    }

    /// Resolve names, validate soils and templates, and build the tables.
    ///
    /// Sites in inactive ecoregions are dropped; they are never simulated.
    ///
    /// # Errors
    /// - [`DroughtError::UnknownSpecies`] / [`DroughtError::UnknownEcoregion`]
    ///   for dangling references
    /// - [`DroughtError::InvalidSoil`] for any site whose field capacity
    ///   does not exceed its wilting point
    /// - template errors for a bad `species_map_names`
    /// - [`DroughtError::Config`] for malformed climate records
    pub fn build(&self) -> DroughtResult<Scenario> {
        SpeciesMapNames::check_template(&self.parameters.species_map_names)?;

        let species = SpeciesTable::new(
            self.species
                .iter()
                .map(|s| (s.name.clone(), s.drought.clone())),
        )?;
        let ecoregions =
            EcoregionTable::new(self.ecoregions.iter().map(|e| (e.name.clone(), e.active)))?;

        let spinup_climate = climate_table(&ecoregions, &self.spinup_climate)?;
        let climate = climate_table(&ecoregions, &self.climate)?;

        let mut sites = Vec::with_capacity(self.sites.len());
        for config in &self.sites {
            let ecoregion = ecoregions.id_of(&config.ecoregion)?;
            if !ecoregions.get(ecoregion).is_some_and(|e| e.active) {
                debug!(
                    row = config.row,
                    column = config.column,
                    ecoregion = %config.ecoregion,
                    "site in inactive ecoregion dropped"
                );
                continue;
            }
            config.soil.validate(config.row, config.column)?;

            let cohorts = config
                .cohorts
                .iter()
                .map(|c| {
                    Ok(Cohort::new(
                        species.id_of(&c.species)?,
                        c.age,
                        c.leaf_biomass,
                        c.wood_biomass,
                    ))
                })
                .collect::<DroughtResult<Vec<_>>>()?;

            sites.push(
                Site::new(config.row, config.column, ecoregion, config.soil, config.normals)
                    .with_cohorts(cohorts),
            );
        }

        info!(
            species = species.len(),
            ecoregions = ecoregions.len(),
            sites = sites.len(),
            spinup_years = spinup_climate.years().count(),
            climate_years = climate.years().count(),
            "scenario loaded"
        );

        Ok(Scenario {
            landscape: Landscape::new(sites, self.parameters.loss_factors()),
            parameters: self.parameters.clone(),
            species,
            ecoregions,
            spinup_climate,
            climate,
        })
    }
}

fn climate_table(
    ecoregions: &EcoregionTable,
    records: &[ClimateRecordConfig],
) -> DroughtResult<ClimateTable> {
    let mut table = ClimateTable::new(ecoregions.len());
    for record in records {
        let id = ecoregions.id_of(&record.ecoregion)?;
        let climate = record.to_annual()?;
        for year in record.years()? {
            table.insert(year, id, climate.clone())?;
        }
    }
    Ok(table)
}

impl Scenario {
    /// Calendar year of the main climate table used for a 1-based simulated year
    pub fn calendar_year(&self, simulated_year: u32) -> Option<i32> {
        let offset = i32::try_from(simulated_year).ok()?.checked_sub(1)?;
        self.climate.min_year()?.checked_add(offset)
    }

    /// Simulated years available in the main climate table
    pub fn available_years(&self) -> u32 {
        match (self.climate.min_year(), self.climate.max_year()) {
            (Some(min), Some(max)) => u32::try_from(max - min + 1).unwrap_or(0),
            _ => 0,
        }
    }

    /// Fresh mortality stream seeded from the parameters
    pub fn rng(&self) -> MortalityRng {
        MortalityRng::from_seed(self.parameters.random_seed)
    }

    /// Per-species map paths for one timestep, in species order
    ///
    /// # Errors
    /// Template errors from [`SpeciesMapNames::replace`].
    pub fn species_map_paths(&self, timestep: u32) -> DroughtResult<Vec<String>> {
        self.species
            .iter()
            .map(|s| SpeciesMapNames::replace(&self.parameters.species_map_names, &s.name, timestep))
            .collect()
    }
}
