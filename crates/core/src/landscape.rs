//! Landscape driver
//!
//! Owns the simulated sites and sequences the components for each year:
//! twelve monthly water-balance steps, the annual roll-over, the lagged
//! predictors, then drought mortality.
//!
//! Water balance and lagged aggregation touch only the site passed in, so
//! they run in parallel across sites. Mortality runs sequentially,
//! site-major and cohort-minor, so the random draws happen in a fixed order
//! and a seeded run replays exactly.

use crate::core_types::climate::MONTHS_PER_YEAR;
use crate::core_types::ecoregion::{ClimateTable, EcoregionTable};
use crate::core_types::site::{LaggedPredictors, Site};
use crate::core_types::species::{SpeciesId, SpeciesTable};
use crate::drought::{lagged, mortality, ClimateSpinup, SpinupSummary};
use crate::error::{DroughtError, DroughtResult};
use crate::physics::water_balance::{SoilWaterBalance, WaterLossFactors};
use crate::rng::UniformSource;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Drought outcome of one simulated year
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DroughtYearReport {
    /// 1-based simulated year
    pub simulated_year: u32,
    /// Biomass killed this year across all sites
    pub killed_biomass: f64,
    pub cohorts_evaluated: usize,
    pub cohorts_killed: usize,
    /// Biomass killed this year, indexed by `SpeciesId`
    pub species_killed: Vec<f64>,
    /// Landscape means of the lagged predictors used this year
    pub mean_lagged: LaggedPredictors,
}

impl DroughtYearReport {
    /// Killed biomass for one species this year
    pub fn species(&self, id: SpeciesId) -> f64 {
        self.species_killed.get(id.index()).copied().unwrap_or(0.0)
    }
}

/// All simulated sites plus the water-balance engine that steps them
#[derive(Debug, Clone, Default)]
pub struct Landscape {
    sites: Vec<Site>,
    balance: SoilWaterBalance,
}

impl Landscape {
    pub fn new(sites: Vec<Site>, factors: WaterLossFactors) -> Self {
        Self {
            sites,
            balance: SoilWaterBalance::new(factors),
        }
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn sites_mut(&mut self) -> &mut [Site] {
        &mut self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn balance(&self) -> SoilWaterBalance {
        self.balance
    }

    /// Total aboveground biomass over all sites and cohorts
    pub fn total_biomass(&self) -> f64 {
        self.sites.iter().map(Site::actual_site_biomass).sum()
    }

    /// Warm up every site on the spin-up climate table.
    ///
    /// # Errors
    /// See [`ClimateSpinup::run`].
    pub fn spin_up(
        &mut self,
        ecoregions: &EcoregionTable,
        spinup_climate: &ClimateTable,
    ) -> DroughtResult<SpinupSummary> {
        ClimateSpinup::new(ecoregions, spinup_climate, self.balance).run(&mut self.sites)
    }

    /// Run one month of the water balance on every site.
    ///
    /// # Errors
    /// [`DroughtError::MissingClimate`] when a site's ecoregion has no record
    /// for `year`; [`DroughtError::InvalidSoil`] from the water balance.
    pub fn run_month(&mut self, climate: &ClimateTable, year: i32, month: usize) -> DroughtResult<()> {
        let balance = self.balance;
        self.sites.par_iter_mut().try_for_each(|site| {
            let record = climate.require(year, site.ecoregion)?;
            balance.step(site, &record.month(month), month, year)?;
            Ok(())
        })
    }

    /// Push the year's values into every site's rolling histories.
    ///
    /// # Errors
    /// [`DroughtError::MissingClimate`] when a site's ecoregion has no record
    /// for `year`.
    pub fn close_year(&mut self, climate: &ClimateTable, year: i32) -> DroughtResult<()> {
        self.sites.par_iter_mut().try_for_each(|site| {
            let temperature = climate
                .require(year, site.ecoregion)?
                .annual_mean_temperature();
            site.close_year(temperature);
            Ok(())
        })
    }

    /// Recompute lagged predictors on every site.
    pub fn update_lagged(&mut self, simulated_year: u32) {
        self.sites.par_iter_mut().for_each(|site| {
            lagged::aggregate(site, simulated_year);
        });
    }

    /// Landscape means of the current lagged predictors
    pub fn mean_lagged(&self) -> LaggedPredictors {
        if self.sites.is_empty() {
            return LaggedPredictors::default();
        }
        let n = self.sites.len() as f64;
        let mut total = LaggedPredictors::default();
        for site in &self.sites {
            total.swa += site.lagged.swa;
            total.temperature += site.lagged.temperature;
            total.cwd += site.lagged.cwd;
        }
        LaggedPredictors {
            swa: total.swa / n,
            temperature: total.temperature / n,
            cwd: total.cwd / n,
        }
    }

    /// Evaluate drought mortality for every cohort and remove the killed ones.
    ///
    /// One draw is taken per cohort, site-major then cohort-minor. Each
    /// site's biomass predictor is measured before any of this year's kills.
    ///
    /// # Errors
    /// [`DroughtError::UnknownSpecies`] when a cohort's species is not in
    /// `species`; checked before any draw is taken.
    pub fn apply_drought_mortality<R: UniformSource + ?Sized>(
        &mut self,
        simulated_year: u32,
        species: &SpeciesTable,
        rng: &mut R,
    ) -> DroughtResult<DroughtYearReport> {
        for site in &self.sites {
            for cohort in &site.cohorts {
                if species.get(cohort.species).is_none() {
                    return Err(DroughtError::UnknownSpecies(format!(
                        "species index {} at row {}, column {}",
                        cohort.species.index(),
                        site.row,
                        site.column
                    )));
                }
            }
        }

        let mut report = DroughtYearReport {
            simulated_year,
            species_killed: vec![0.0; species.len()],
            mean_lagged: self.mean_lagged(),
            ..Default::default()
        };

        for site in &mut self.sites {
            if site.cohorts.is_empty() {
                continue;
            }
            let site_biomass = site.actual_site_biomass();
            let mut cohorts = std::mem::take(&mut site.cohorts);
            for cohort in &mut cohorts {
                let Some(params) = species.get(cohort.species) else {
                    continue;
                };
                report.cohorts_evaluated += 1;
                if let Some(kill) =
                    mortality::evaluate(cohort, site, &params.drought, site_biomass, rng)
                {
                    cohort.kill();
                    report.cohorts_killed += 1;
                    report.killed_biomass += kill.total();
                    report.species_killed[cohort.species.index()] += kill.total();
                }
            }
            cohorts.retain(|c| !c.is_dead());
            site.cohorts = cohorts;
        }

        Ok(report)
    }

    /// Run one full simulated year.
    ///
    /// `simulated_year` is 1-based; `calendar_year` selects the climate
    /// records.
    ///
    /// # Errors
    /// Propagates errors from each stage.
    pub fn run_year<R: UniformSource + ?Sized>(
        &mut self,
        simulated_year: u32,
        calendar_year: i32,
        climate: &ClimateTable,
        species: &SpeciesTable,
        rng: &mut R,
    ) -> DroughtResult<DroughtYearReport> {
        for month in 0..MONTHS_PER_YEAR {
            self.run_month(climate, calendar_year, month)?;
        }
        self.close_year(climate, calendar_year)?;
        self.update_lagged(simulated_year);
        let report = self.apply_drought_mortality(simulated_year, species, rng)?;

        info!(
            simulated_year,
            calendar_year,
            killed_biomass = report.killed_biomass,
            cohorts_killed = report.cohorts_killed,
            cohorts_evaluated = report.cohorts_evaluated,
            lagged_cwd = report.mean_lagged.cwd,
            "drought year complete"
        );
        Ok(report)
    }
}
