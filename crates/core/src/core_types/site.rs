//! Landscape sites and their water-balance state
//!
//! A site is one landscape cell mapped to one ecoregion. Soil properties are
//! constant for the run; everything else is updated monthly by the water
//! balance and yearly by the lagged-climate aggregator.

use super::climate::MONTHS_PER_YEAR;
use super::cohort::Cohort;
use super::ecoregion::EcoregionId;
use super::species::SpeciesId;
use super::units::{Celsius, Centimeters, Degrees, Millimeters};
use crate::error::{DroughtError, DroughtResult};
use serde::{Deserialize, Serialize};

/// Years retained by the rolling climate histories
pub const HISTORY_YEARS: usize = 10;

// ============================================================================
// SOIL
// ============================================================================

/// Soil and terrain properties, constant for the run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilProperties {
    /// Rooting depth (cm)
    pub depth: Centimeters,
    /// Volumetric water content at field capacity (fraction)
    pub field_capacity: f64,
    /// Volumetric water content at permanent wilting point (fraction)
    pub wilting_point: f64,
    /// Fraction of water above field capacity leaving as stormflow each month
    pub storm_flow_fraction: f64,
    /// Fraction of water above wilting point leaving as baseflow each month
    pub base_flow_fraction: f64,
    #[serde(default)]
    pub slope: Degrees,
    /// Aspect clockwise from north; negative means unknown
    #[serde(default)]
    pub aspect: Degrees,
}

impl SoilProperties {
    /// Water held at field capacity (cm)
    #[inline]
    pub fn water_full(&self) -> Centimeters {
        self.depth * self.field_capacity
    }

    /// Water held at wilting point (cm)
    #[inline]
    pub fn water_empty(&self) -> Centimeters {
        self.depth * self.wilting_point
    }

    /// Reject soils whose field capacity does not exceed the wilting point.
    ///
    /// # Errors
    /// Returns [`DroughtError::InvalidSoil`] naming the site's grid location.
    pub fn validate(&self, row: u32, column: u32) -> DroughtResult<()> {
        if *self.water_full() == *self.water_empty() || self.wilting_point >= self.field_capacity
        {
            return Err(DroughtError::InvalidSoil {
                row,
                column,
                field_capacity: self.field_capacity,
                wilting_point: self.wilting_point,
            });
        }
        Ok(())
    }
}

// ============================================================================
// ROLLING HISTORY
// ============================================================================

/// Fixed-capacity ring of annual values; the oldest is evicted on push
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingHistory<const N: usize> {
    values: [f64; N],
    next: usize,
    len: usize,
}

impl<const N: usize> Default for RollingHistory<N> {
    fn default() -> Self {
        Self {
            values: [0.0; N],
            next: 0,
            len: 0,
        }
    }
}

impl<const N: usize> RollingHistory<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        self.values[self.next] = value;
        self.next = (self.next + 1) % N;
        self.len = (self.len + 1).min(N);
    }

    /// Years populated so far, saturating at `N`
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// The most recent `n` values (clamped to `len`), oldest first
    pub fn recent(&self, n: usize) -> Vec<f64> {
        let n = n.min(self.len);
        (0..n)
            .map(|i| {
                let back = n - i;
                self.values[(self.next + N - back) % N]
            })
            .collect()
    }

    /// The most recent value
    pub fn latest(&self) -> Option<f64> {
        (self.len > 0).then(|| self.values[(self.next + N - 1) % N])
    }
}

/// Trailing annual soil water, temperature, and water deficit
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClimateHistory {
    /// Annual mean plant-available water (cm)
    pub soil_water: RollingHistory<HISTORY_YEARS>,
    /// Annual mean temperature (°C)
    pub temperature: RollingHistory<HISTORY_YEARS>,
    /// Annual climatic water deficit (mm)
    pub cwd: RollingHistory<HISTORY_YEARS>,
}

// ============================================================================
// STATE
// ============================================================================

/// Water stocks carried between months
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterState {
    /// End-of-month soil water content (cm)
    pub soil_water_content: f64,
    /// Liquid-equivalent snowpack (cm)
    pub liquid_snowpack: f64,
    /// Plant-available water for the latest month (cm)
    pub plant_available_water: f64,
    /// Mean of the month's highest and end-of-month soil water (cm)
    pub mean_soil_water_content: f64,
    /// Water above field capacity before stormflow (cm)
    pub water_movement: f64,
    /// Latest month's stormflow (cm)
    pub storm_flow: f64,
    /// Latest month's baseflow (cm)
    pub base_flow: f64,
    /// Plant-available water over PET for the latest month, 0 when PET is 0
    pub available_water_pet_ratio: f64,
}

/// Twelve-slot monthly outputs, indexed by month
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeries {
    pub actual_evapotranspiration: [f64; MONTHS_PER_YEAR],
    /// Climatic water deficit (mm)
    pub climatic_water_deficit: [f64; MONTHS_PER_YEAR],
    pub soil_water_content: [f64; MONTHS_PER_YEAR],
    /// Volumetric mean soil water (fraction of soil depth)
    pub mean_soil_water_content: [f64; MONTHS_PER_YEAR],
    pub plant_available_water: [f64; MONTHS_PER_YEAR],
}

/// Accumulators reset at each year boundary
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnualAccumulators {
    /// Precipitation minus AET (cm)
    pub water_balance: f64,
    pub climatic_water_deficit: Millimeters,
    pub potential_evapotranspiration: Millimeters,
}

/// Long-run baselines supplied with the site, read-only here
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClimateNormals {
    /// Normal soil water availability (cm)
    pub swa: f64,
    /// Normal climatic water deficit (mm)
    pub cwd: f64,
    /// Normal annual temperature (°C)
    pub temperature: f64,
}

/// Multi-year predictors, overwritten once per year
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LaggedPredictors {
    /// Mean of the wettest years' soil water (cm)
    pub swa: f64,
    /// Mean of the warmest years' temperature (°C)
    pub temperature: f64,
    /// Mean annual CWD over the window (mm)
    pub cwd: f64,
}

/// One landscape cell
#[derive(Debug, Clone)]
pub struct Site {
    pub row: u32,
    pub column: u32,
    pub ecoregion: EcoregionId,
    pub soil: SoilProperties,
    pub normals: ClimateNormals,
    pub water: WaterState,
    pub monthly: MonthlySeries,
    pub annual: AnnualAccumulators,
    pub history: ClimateHistory,
    pub lagged: LaggedPredictors,
    pub cohorts: Vec<Cohort>,
    /// Cumulative aboveground biomass killed by drought
    pub drought_mortality: f64,
    /// Cumulative drought-killed biomass per species, indexed by `SpeciesId`
    pub species_drought_mortality: Vec<f64>,
}

impl Site {
    pub fn new(
        row: u32,
        column: u32,
        ecoregion: EcoregionId,
        soil: SoilProperties,
        normals: ClimateNormals,
    ) -> Self {
        Self {
            row,
            column,
            ecoregion,
            soil,
            normals,
            water: WaterState::default(),
            monthly: MonthlySeries::default(),
            annual: AnnualAccumulators::default(),
            history: ClimateHistory::default(),
            lagged: LaggedPredictors::default(),
            cohorts: Vec::new(),
            drought_mortality: 0.0,
            species_drought_mortality: Vec::new(),
        }
    }

    pub fn with_cohorts(mut self, cohorts: Vec<Cohort>) -> Self {
        self.cohorts = cohorts;
        self
    }

    /// Sum of leaf and wood biomass over all cohorts
    pub fn actual_site_biomass(&self) -> f64 {
        self.cohorts.iter().map(Cohort::total_biomass).sum()
    }

    /// Lagged soil water minus the site's normal
    #[inline]
    pub fn swa_anomaly(&self) -> f64 {
        self.lagged.swa - self.normals.swa
    }

    pub(crate) fn record_drought_kill(&mut self, species: SpeciesId, biomass: f64) {
        self.drought_mortality += biomass;
        let index = species.index();
        if index >= self.species_drought_mortality.len() {
            self.species_drought_mortality.resize(index + 1, 0.0);
        }
        self.species_drought_mortality[index] += biomass;
    }

    /// Drought-killed biomass recorded for one species
    pub fn species_mortality(&self, species: SpeciesId) -> f64 {
        self.species_drought_mortality
            .get(species.index())
            .copied()
            .unwrap_or(0.0)
    }

    /// Mean plant-available water over the twelve monthly slots (cm)
    pub fn annual_soil_water(&self) -> f64 {
        self.monthly.plant_available_water.iter().sum::<f64>() / MONTHS_PER_YEAR as f64
    }

    /// Push this year's values into the rolling histories and reset the
    /// annual accumulators.
    pub fn close_year(&mut self, annual_temperature: Celsius) {
        self.history.soil_water.push(self.annual_soil_water());
        self.history.temperature.push(*annual_temperature);
        self.history.cwd.push(*self.annual.climatic_water_deficit);
        self.annual = AnnualAccumulators::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loam() -> SoilProperties {
        SoilProperties {
            depth: Centimeters::new(100.0),
            field_capacity: 0.3,
            wilting_point: 0.1,
            storm_flow_fraction: 0.2,
            base_flow_fraction: 0.1,
            slope: Degrees::new(0.0),
            aspect: Degrees::new(0.0),
        }
    }

    #[test]
    fn test_water_full_and_empty() {
        let soil = loam();
        assert!((*soil.water_full() - 30.0).abs() < 1e-12);
        assert!((*soil.water_empty() - 10.0).abs() < 1e-12);
        assert!(soil.validate(0, 0).is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_soil() {
        let mut soil = loam();
        soil.wilting_point = 0.35;
        let err = soil.validate(4, 7).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("row 4"), "{message}");
        assert!(message.contains("column 7"), "{message}");
    }

    #[test]
    fn test_validate_rejects_equal_soil() {
        let mut soil = loam();
        soil.wilting_point = soil.field_capacity;
        assert!(matches!(
            soil.validate(1, 2),
            Err(DroughtError::InvalidSoil { row: 1, column: 2, .. })
        ));
    }

    #[test]
    fn test_rolling_history_evicts_oldest() {
        let mut history = RollingHistory::<3>::new();
        assert!(history.is_empty());
        assert_eq!(history.latest(), None);
        for v in 1..=5 {
            history.push(f64::from(v));
        }
        assert!(history.is_full());
        assert_eq!(history.len(), 3);
        assert_eq!(history.recent(3), vec![3.0, 4.0, 5.0]);
        assert_eq!(history.recent(2), vec![4.0, 5.0]);
        assert_eq!(history.recent(10), vec![3.0, 4.0, 5.0]);
        assert_eq!(history.latest(), Some(5.0));
    }

    #[test]
    fn test_rolling_history_partial() {
        let mut history = RollingHistory::<10>::new();
        history.push(2.0);
        history.push(7.0);
        assert_eq!(history.len(), 2);
        assert!(!history.is_full());
        assert_eq!(history.recent(10), vec![2.0, 7.0]);
    }

    #[test]
    fn test_close_year_pushes_and_resets() {
        let mut site = Site::new(0, 0, EcoregionId(0), loam(), ClimateNormals::default());
        site.monthly.plant_available_water = [6.0; MONTHS_PER_YEAR];
        site.annual.climatic_water_deficit = Millimeters::new(250.0);
        site.annual.water_balance = 12.0;
        site.close_year(Celsius::new(8.5));

        assert_eq!(site.history.soil_water.latest(), Some(6.0));
        assert_eq!(site.history.temperature.latest(), Some(8.5));
        assert_eq!(site.history.cwd.latest(), Some(250.0));
        assert_eq!(site.annual, AnnualAccumulators::default());
    }

    #[test]
    fn test_record_drought_kill_grows_species_vector() {
        let mut site = Site::new(0, 0, EcoregionId(0), loam(), ClimateNormals::default());
        site.record_drought_kill(SpeciesId(2), 40.0);
        site.record_drought_kill(SpeciesId(2), 10.0);
        assert_eq!(site.drought_mortality, 50.0);
        assert_eq!(site.species_mortality(SpeciesId(2)), 50.0);
        assert_eq!(site.species_mortality(SpeciesId(0)), 0.0);
    }
}
