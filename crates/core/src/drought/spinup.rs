//! Climate spin-up
//!
//! Runs the water balance over a ten-year warm-up climate before the scored
//! simulation so snowpack and soil water settle and the rolling histories
//! hold plausible values. Spin-up years start at the earliest key of the
//! spin-up climate table; months run from July round to June.

use crate::core_types::climate::{AnnualClimate, MONTHS_PER_YEAR};
use crate::core_types::ecoregion::{ClimateTable, EcoregionId, EcoregionTable};
use crate::core_types::site::Site;
use crate::error::{DroughtError, DroughtResult};
use crate::physics::water_balance::SoilWaterBalance;
use rayon::prelude::*;
use tracing::{info, warn};

/// Years of synthetic climate run before the main simulation
pub const SPINUP_YEARS: usize = 10;

/// Month slots in spin-up order, starting mid-year
pub const SPINUP_MONTH_ORDER: [usize; MONTHS_PER_YEAR] = [6, 7, 8, 9, 10, 11, 0, 1, 2, 3, 4, 5];

/// One spin-up year: the calendar key requested and the record in effect
/// for each ecoregion (`None` for inactive ecoregions)
#[derive(Debug, Clone)]
pub struct SpinupYear<'a> {
    pub key: i32,
    pub climate: Vec<Option<&'a AnnualClimate>>,
}

/// What a spin-up did, for logging and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpinupSummary {
    pub first_year: i32,
    /// Sites whose ecoregion was active
    pub sites: usize,
    /// Requested years that had no record for some active ecoregion
    pub reused_records: usize,
}

/// Ten-year warm-up driver
#[derive(Debug, Clone, Copy)]
pub struct ClimateSpinup<'a> {
    ecoregions: &'a EcoregionTable,
    climate: &'a ClimateTable,
    balance: SoilWaterBalance,
}

impl<'a> ClimateSpinup<'a> {
    pub fn new(
        ecoregions: &'a EcoregionTable,
        climate: &'a ClimateTable,
        balance: SoilWaterBalance,
    ) -> Self {
        Self {
            ecoregions,
            climate,
            balance,
        }
    }

    /// Resolve which record each active ecoregion uses in every spin-up year.
    ///
    /// Every active ecoregion starts from its record at the table's minimum
    /// key. For offset `k` the record at `min + k` replaces it when present;
    /// a missing record keeps the previous one.
    ///
    /// # Errors
    /// [`DroughtError::EmptySpinupClimate`] when the table has no years, and
    /// [`DroughtError::MissingClimate`] when an active ecoregion has no
    /// record at the minimum key.
    pub fn schedule(&self) -> DroughtResult<(Vec<SpinupYear<'a>>, usize)> {
        let first = self
            .climate
            .min_year()
            .ok_or(DroughtError::EmptySpinupClimate)?;

        let mut current: Vec<Option<&'a AnnualClimate>> = vec![None; self.ecoregions.len()];
        for ecoregion in self.ecoregions.active() {
            current[ecoregion.id.index()] = Some(self.climate.require(first, ecoregion.id)?);
        }

        let mut years = Vec::with_capacity(SPINUP_YEARS);
        let mut reused = 0;
        for k in 0..SPINUP_YEARS {
            let key = first + k as i32;
            let mut missing = false;
            for ecoregion in self.ecoregions.active() {
                match self.climate.get(key, ecoregion.id) {
                    Some(record) => current[ecoregion.id.index()] = Some(record),
                    None => {
                        missing = true;
                        warn!(
                            year = key,
                            ecoregion = %ecoregion.name,
                            "no spin-up climate for year; reusing previous record"
                        );
                    }
                }
            }
            if missing {
                reused += 1;
            }
            years.push(SpinupYear {
                key,
                climate: current.clone(),
            });
        }
        Ok((years, reused))
    }

    /// Run the spin-up for every site in an active ecoregion.
    ///
    /// Sites are independent and run in parallel. Each spin-up year ends
    /// with [`Site::close_year`], so the rolling histories hold ten seeded
    /// years afterwards.
    ///
    /// # Errors
    /// Propagates schedule errors and [`DroughtError::InvalidSoil`] from
    /// the water balance.
    pub fn run(&self, sites: &mut [Site]) -> DroughtResult<SpinupSummary> {
        let (years, reused_records) = self.schedule()?;
        let first_year = years.first().map_or(0, |y| y.key);
        info!(
            first_year,
            years = years.len(),
            sites = sites.len(),
            "starting climate spin-up"
        );

        let spun = sites
            .par_iter_mut()
            .map(|site| self.spin_up_site(site, &years))
            .collect::<DroughtResult<Vec<bool>>>()?;
        let active_sites = spun.into_iter().filter(|&active| active).count();

        info!(sites = active_sites, reused_records, "climate spin-up complete");
        Ok(SpinupSummary {
            first_year,
            sites: active_sites,
            reused_records,
        })
    }

    /// Returns false when the site's ecoregion is inactive and was skipped.
    fn spin_up_site(&self, site: &mut Site, years: &[SpinupYear<'_>]) -> DroughtResult<bool> {
        if !self.is_active(site.ecoregion) {
            return Ok(false);
        }
        for year in years {
            let Some(climate) = year.climate.get(site.ecoregion.index()).copied().flatten()
            else {
                return Ok(false);
            };
            for &month in &SPINUP_MONTH_ORDER {
                self.balance.step(site, &climate.month(month), month, year.key)?;
            }
            site.close_year(climate.annual_mean_temperature());
        }
        Ok(true)
    }

    fn is_active(&self, ecoregion: EcoregionId) -> bool {
        self.ecoregions.get(ecoregion).is_some_and(|e| e.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::climate::MonthlyClimate;
    use crate::core_types::site::{ClimateNormals, SoilProperties};
    use crate::core_types::units::{Celsius, Centimeters, Degrees};

    fn year_at(temperature: f64) -> AnnualClimate {
        AnnualClimate::uniform(MonthlyClimate::new(
            Centimeters::new(6.0),
            Celsius::new(temperature),
            Celsius::new(temperature + 6.0),
            Celsius::new(temperature - 6.0),
            Centimeters::new(5.0),
        ))
    }

    fn soil() -> SoilProperties {
        SoilProperties {
            depth: Centimeters::new(100.0),
            field_capacity: 0.3,
            wilting_point: 0.1,
            storm_flow_fraction: 0.3,
            base_flow_fraction: 0.1,
            slope: Degrees::new(0.0),
            aspect: Degrees::new(-1.0),
        }
    }

    fn two_ecoregions() -> EcoregionTable {
        EcoregionTable::new([("valley".to_string(), true), ("alpine".to_string(), false)])
            .unwrap()
    }

    #[test]
    fn test_empty_table_is_an_error() {
        let ecoregions = two_ecoregions();
        let climate = ClimateTable::new(ecoregions.len());
        let spinup = ClimateSpinup::new(&ecoregions, &climate, SoilWaterBalance::default());
        assert!(matches!(
            spinup.schedule(),
            Err(DroughtError::EmptySpinupClimate)
        ));
    }

    #[test]
    fn test_schedule_starts_at_minimum_key_and_reuses_missing_years() {
        let ecoregions = two_ecoregions();
        let mut climate = ClimateTable::new(ecoregions.len());
        climate.insert(1990, EcoregionId(0), year_at(5.0)).unwrap();
        climate.insert(1991, EcoregionId(0), year_at(6.0)).unwrap();
        // 1992..1994 missing
        climate.insert(1995, EcoregionId(0), year_at(9.0)).unwrap();

        let spinup = ClimateSpinup::new(&ecoregions, &climate, SoilWaterBalance::default());
        let (years, reused) = spinup.schedule().unwrap();

        assert_eq!(years.len(), SPINUP_YEARS);
        assert_eq!(years[0].key, 1990);
        assert_eq!(years[9].key, 1999);
        let temp = |i: usize| *years[i].climate[0].unwrap().temperature[0];
        assert_eq!(temp(0), 5.0);
        assert_eq!(temp(1), 6.0);
        assert_eq!(temp(2), 6.0);
        assert_eq!(temp(4), 6.0);
        assert_eq!(temp(5), 9.0);
        assert_eq!(temp(9), 9.0);
        // Inactive ecoregion never gets a record
        assert!(years.iter().all(|y| y.climate[1].is_none()));
        // 1992, 1993, 1994, 1996..=1999
        assert_eq!(reused, 7);
    }

    #[test]
    fn test_active_ecoregion_without_first_year_record() {
        let ecoregions = two_ecoregions();
        let mut climate = ClimateTable::new(ecoregions.len());
        climate.insert(1990, EcoregionId(1), year_at(5.0)).unwrap();
        let spinup = ClimateSpinup::new(&ecoregions, &climate, SoilWaterBalance::default());
        assert!(matches!(
            spinup.schedule(),
            Err(DroughtError::MissingClimate { ecoregion: 0, year: 1990 })
        ));
    }

    #[test]
    fn test_run_seeds_histories_and_skips_inactive_sites() {
        let ecoregions = two_ecoregions();
        let mut climate = ClimateTable::new(ecoregions.len());
        for (k, year) in (2000..2010).enumerate() {
            climate.insert(year, EcoregionId(0), year_at(k as f64)).unwrap();
        }

        let mut sites = vec![
            Site::new(0, 0, EcoregionId(0), soil(), ClimateNormals::default()),
            Site::new(0, 1, EcoregionId(1), soil(), ClimateNormals::default()),
        ];
        let spinup = ClimateSpinup::new(&ecoregions, &climate, SoilWaterBalance::default());
        let summary = spinup.run(&mut sites).unwrap();

        assert_eq!(summary.first_year, 2000);
        assert_eq!(summary.sites, 1);
        assert_eq!(summary.reused_records, 0);

        let active = &sites[0];
        assert!(active.history.soil_water.is_full());
        assert_eq!(
            active.history.temperature.recent(10),
            (0..10).map(f64::from).collect::<Vec<_>>()
        );
        assert!(active.water.soil_water_content > 0.0);
        assert!(active.history.cwd.recent(10).iter().all(|&v| v >= 0.0));

        let inactive = &sites[1];
        assert!(inactive.history.soil_water.is_empty());
        assert_eq!(inactive.water.soil_water_content, 0.0);
    }

    #[test]
    fn test_run_rejects_invalid_soil() {
        let ecoregions = two_ecoregions();
        let mut climate = ClimateTable::new(ecoregions.len());
        climate.insert(2000, EcoregionId(0), year_at(8.0)).unwrap();

        let mut bad = soil();
        bad.wilting_point = 0.3;
        let mut sites = vec![Site::new(3, 5, EcoregionId(0), bad, ClimateNormals::default())];
        let spinup = ClimateSpinup::new(&ecoregions, &climate, SoilWaterBalance::default());
        assert!(matches!(
            spinup.run(&mut sites),
            Err(DroughtError::InvalidSoil { row: 3, column: 5, .. })
        ));
    }
}
