//! Lagged climate predictors
//!
//! Once per site per year the trailing annual histories are reduced to three
//! scalars used by the mortality regression:
//! - soil water: mean of the 8 wettest of the last 10 years
//! - temperature: mean of the 7 warmest of the last 10 years
//! - water deficit: mean of all of the last 10 years
//!
//! During the first years of a run the window shrinks to the years simulated
//! so far, and each mean is taken over the values actually kept so early
//! aggregates are not diluted by absent years.

use crate::core_types::site::{ClimateHistory, LaggedPredictors, Site, HISTORY_YEARS};
use tracing::debug;

/// Wettest years of soil water kept from the window
pub const SOIL_WATER_YEARS: usize = 8;

/// Warmest years of temperature kept from the window
pub const TEMPERATURE_YEARS: usize = 7;

/// Mean of the `keep` largest values (all of them if fewer), 0 when empty
fn mean_of_largest(values: &[f64], keep: usize) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted.truncate(keep);
    mean(&sorted)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Number of trailing years considered in simulated year `simulated_year` (1-based)
#[inline]
pub fn window_years(simulated_year: u32) -> usize {
    (simulated_year as usize).clamp(1, HISTORY_YEARS)
}

/// Reduce rolling histories to lagged predictors for `simulated_year` (1-based).
pub fn lagged_predictors(history: &ClimateHistory, simulated_year: u32) -> LaggedPredictors {
    let window = window_years(simulated_year);

    let soil_water = history.soil_water.recent(window);
    let temperature = history.temperature.recent(window);
    let cwd = history.cwd.recent(window);

    LaggedPredictors {
        swa: mean_of_largest(&soil_water, SOIL_WATER_YEARS),
        temperature: mean_of_largest(&temperature, TEMPERATURE_YEARS),
        cwd: mean(&cwd),
    }
}

/// Compute and store a site's lagged predictors for the year.
pub fn aggregate(site: &mut Site, simulated_year: u32) -> LaggedPredictors {
    let lagged = lagged_predictors(&site.history, simulated_year);
    debug!(
        row = site.row,
        column = site.column,
        simulated_year,
        swa = lagged.swa,
        temperature = lagged.temperature,
        cwd = lagged.cwd,
        "lagged climate"
    );
    site.lagged = lagged;
    lagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn history(soil_water: &[f64], temperature: &[f64], cwd: &[f64]) -> ClimateHistory {
        let mut h = ClimateHistory::default();
        for &v in soil_water {
            h.soil_water.push(v);
        }
        for &v in temperature {
            h.temperature.push(v);
        }
        for &v in cwd {
            h.cwd.push(v);
        }
        h
    }

    #[test]
    fn test_year_one_uses_single_value() {
        let h = history(&[4.2], &[9.5], &[310.0]);
        let lagged = lagged_predictors(&h, 1);
        assert_eq!(lagged.swa, 4.2);
        assert_eq!(lagged.temperature, 9.5);
        assert_eq!(lagged.cwd, 310.0);
    }

    #[test]
    fn test_year_one_ignores_seeded_spinup_years() {
        // Nine spin-up years then the first simulated year
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let h = history(&values, &values, &values);
        let lagged = lagged_predictors(&h, 1);
        assert_eq!(lagged.swa, 10.0);
        assert_eq!(lagged.temperature, 10.0);
        assert_eq!(lagged.cwd, 10.0);
    }

    #[test]
    fn test_full_window_selects_top_values() {
        // Oldest first; pushes beyond 10 evict the oldest
        let soil: Vec<f64> = vec![100.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let h = history(&soil, &soil, &soil);
        let lagged = lagged_predictors(&h, 25);

        // Window is 1..=10; 8 largest are 3..=10
        assert_relative_eq!(lagged.swa, (3..=10).map(f64::from).sum::<f64>() / 8.0);
        // 7 largest are 4..=10
        assert_relative_eq!(lagged.temperature, (4..=10).map(f64::from).sum::<f64>() / 7.0);
        // CWD is the plain mean of all 10
        assert_relative_eq!(lagged.cwd, 5.5);
    }

    #[test]
    fn test_ramp_up_years_use_own_denominators() {
        let values = [5.0, 1.0, 3.0];
        let h = history(&values, &values, &values);
        let lagged = lagged_predictors(&h, 3);
        assert_relative_eq!(lagged.swa, 3.0);
        assert_relative_eq!(lagged.temperature, 3.0);
        assert_relative_eq!(lagged.cwd, 3.0);
    }

    #[test]
    fn test_year_eight_and_nine() {
        let values: Vec<f64> = (1..=9).map(f64::from).collect();
        let h = history(&values, &values, &values);

        let nine = lagged_predictors(&h, 9);
        // 8 largest of 1..=9 are 2..=9
        assert_relative_eq!(nine.swa, (2..=9).map(f64::from).sum::<f64>() / 8.0);
        // 7 largest are 3..=9
        assert_relative_eq!(nine.temperature, (3..=9).map(f64::from).sum::<f64>() / 7.0);
        assert_relative_eq!(nine.cwd, 5.0);

        let eight = lagged_predictors(&h, 8);
        // Window is 2..=9: soil keeps all 8, temperature drops the smallest
        assert_relative_eq!(eight.swa, (2..=9).map(f64::from).sum::<f64>() / 8.0);
        assert_relative_eq!(eight.temperature, (3..=9).map(f64::from).sum::<f64>() / 7.0);
        assert_relative_eq!(eight.cwd, (2..=9).map(f64::from).sum::<f64>() / 8.0);
    }

    #[test]
    fn test_empty_history_yields_zero() {
        let lagged = lagged_predictors(&ClimateHistory::default(), 4);
        assert_eq!(lagged, LaggedPredictors::default());
    }

    #[test]
    fn test_window_years_clamps() {
        assert_eq!(window_years(0), 1);
        assert_eq!(window_years(7), 7);
        assert_eq!(window_years(10), 10);
        assert_eq!(window_years(40), 10);
    }
}
