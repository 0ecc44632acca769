//! Ecoregion climate records
//!
//! An ecoregion carries one `AnnualClimate` per simulated year: twelve
//! monthly values each of precipitation, mean/max/min temperature and
//! potential evapotranspiration, plus the growing-season bounds. Records are
//! immutable once assigned to a year.

use super::units::{Celsius, Centimeters};
use serde::{Deserialize, Serialize};

/// Months per simulated year
pub const MONTHS_PER_YEAR: usize = 12;

/// One month of climate forcing for an ecoregion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyClimate {
    /// Total precipitation (cm)
    pub precipitation: Centimeters,
    /// Mean air temperature
    pub mean_temperature: Celsius,
    /// Mean daily maximum temperature; drives snowmelt
    pub max_temperature: Celsius,
    /// Mean daily minimum temperature; decides rain vs. snow
    pub min_temperature: Celsius,
    /// Potential evapotranspiration before terrain adjustment (cm)
    pub pet: Centimeters,
}

impl MonthlyClimate {
    pub fn new(
        precipitation: Centimeters,
        mean_temperature: Celsius,
        max_temperature: Celsius,
        min_temperature: Celsius,
        pet: Centimeters,
    ) -> Self {
        Self {
            precipitation,
            mean_temperature,
            max_temperature,
            min_temperature,
            pet,
        }
    }
}

/// Twelve months of climate for one ecoregion in one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualClimate {
    pub precipitation: [Centimeters; MONTHS_PER_YEAR],
    pub temperature: [Celsius; MONTHS_PER_YEAR],
    pub max_temperature: [Celsius; MONTHS_PER_YEAR],
    pub min_temperature: [Celsius; MONTHS_PER_YEAR],
    pub pet: [Centimeters; MONTHS_PER_YEAR],
    /// First month (0-based) of the growing season
    pub begin_growing: usize,
    /// Last month (0-based) of the growing season
    pub end_growing: usize,
}

impl AnnualClimate {
    /// Build a year in which every month has the same forcing.
    pub fn uniform(month: MonthlyClimate) -> Self {
        Self {
            precipitation: [month.precipitation; MONTHS_PER_YEAR],
            temperature: [month.mean_temperature; MONTHS_PER_YEAR],
            max_temperature: [month.max_temperature; MONTHS_PER_YEAR],
            min_temperature: [month.min_temperature; MONTHS_PER_YEAR],
            pet: [month.pet; MONTHS_PER_YEAR],
            begin_growing: 3,
            end_growing: 8,
        }
    }

    /// Extract the forcing for a calendar month (0 = January).
    ///
    /// # Panics
    /// Panics if `month >= 12`.
    #[inline]
    pub fn month(&self, month: usize) -> MonthlyClimate {
        MonthlyClimate {
            precipitation: self.precipitation[month],
            mean_temperature: self.temperature[month],
            max_temperature: self.max_temperature[month],
            min_temperature: self.min_temperature[month],
            pet: self.pet[month],
        }
    }

    /// Mean of the twelve monthly mean temperatures
    pub fn annual_mean_temperature(&self) -> Celsius {
        let total: f64 = self.temperature.iter().map(|t| **t).sum();
        Celsius::from(total / MONTHS_PER_YEAR as f64)
    }

    /// Total annual precipitation (cm)
    pub fn annual_precipitation(&self) -> Centimeters {
        Centimeters::new(self.precipitation.iter().map(|p| **p).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_month() -> MonthlyClimate {
        MonthlyClimate::new(
            Centimeters::new(4.0),
            Celsius::new(12.0),
            Celsius::new(20.0),
            Celsius::new(4.0),
            Centimeters::new(6.0),
        )
    }

    #[test]
    fn test_uniform_year_round_trips_month() {
        let year = AnnualClimate::uniform(sample_month());
        assert_eq!(year.month(0), sample_month());
        assert_eq!(year.month(11), sample_month());
    }

    #[test]
    fn test_annual_summaries() {
        let mut year = AnnualClimate::uniform(sample_month());
        year.temperature[0] = Celsius::new(0.0);
        // (11 * 12 + 0) / 12
        assert!((*year.annual_mean_temperature() - 11.0).abs() < 1e-12);
        assert!((*year.annual_precipitation() - 48.0).abs() < 1e-12);
    }
}
