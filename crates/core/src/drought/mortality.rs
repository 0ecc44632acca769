//! Drought mortality decision
//!
//! Per cohort per year, an annual mortality probability comes from either a
//! two-tier CWD threshold rule or a decadal logistic survival regression. One
//! uniform draw then decides whether the whole cohort dies; partial mortality
//! within a cohort is not modeled.
//!
//! # Decision order
//! 1. `cwd_threshold` set and exceeded → `mortality_above_threshold`
//! 2. `cwd_threshold2` set and exceeded → `mortality_above_threshold2`
//!    (overrides step 1 regardless of which threshold is larger)
//! 3. both thresholds zero → logistic regression
//!
//! # References
//! - Flake, S.W. & Scheller, R.M. drought mortality extension to the NECN
//!   succession model (lagged SWA, temperature and CWD predictors)

use crate::core_types::cohort::{Cohort, DroughtKill};
use crate::core_types::site::Site;
use crate::core_types::species::SpeciesDroughtParameters;
use crate::rng::UniformSource;
use tracing::{debug, warn};

/// The regression is fit to survival over ten years
const REGRESSION_INTERVAL_YEARS: f64 = 10.0;

/// Predictors for one cohort's regression, gathered from site and cohort
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MortalityPredictors {
    pub age: f64,
    pub lagged_temperature: f64,
    pub swa_anomaly: f64,
    pub site_biomass: f64,
    pub lagged_cwd: f64,
    pub normal_cwd: f64,
    pub normal_temperature: f64,
}

impl MortalityPredictors {
    pub fn new(cohort: &Cohort, site: &Site, site_biomass: f64) -> Self {
        Self {
            age: f64::from(cohort.age),
            lagged_temperature: site.lagged.temperature,
            swa_anomaly: site.swa_anomaly(),
            site_biomass,
            lagged_cwd: site.lagged.cwd,
            normal_cwd: site.normals.cwd,
            normal_temperature: site.normals.temperature,
        }
    }
}

/// Decadal log-odds of survival
pub fn survival_log_odds(params: &SpeciesDroughtParameters, x: &MortalityPredictors) -> f64 {
    params.intercept
        + params.beta_age * x.age
        + params.beta_temp * x.lagged_temperature
        + params.beta_swa_anom * x.swa_anomaly
        + params.beta_biomass * x.site_biomass
        + params.beta_cwd * x.lagged_cwd
        + params.beta_norm_cwd * x.normal_cwd
        + params.beta_norm_temp * x.normal_temperature
        + params.intxn_cwd_biomass * x.lagged_cwd * x.site_biomass
}

/// Annual mortality probability from the decadal survival regression
///
/// `p_surv = e^L / (e^L + 1)` and `p_mort = 1 - p_surv^(1/10)`, assuming an
/// independent hazard in each of the ten years.
pub fn regression_mortality(params: &SpeciesDroughtParameters, x: &MortalityPredictors) -> f64 {
    let odds = survival_log_odds(params, x).exp();
    let p_surv = odds / (odds + 1.0);
    1.0 - p_surv.powf(1.0 / REGRESSION_INTERVAL_YEARS)
}

/// Annual mortality probability for one cohort
pub fn mortality_probability(params: &SpeciesDroughtParameters, x: &MortalityPredictors) -> f64 {
    let mut p_mort = 0.0;

    if params.cwd_threshold != 0.0 && x.lagged_cwd > params.cwd_threshold {
        p_mort = params.mortality_above_threshold;
        debug!(p_mort, lagged_cwd = x.lagged_cwd, "p_mort from CWD threshold");
    }

    if params.cwd_threshold2 != 0.0 && x.lagged_cwd > params.cwd_threshold2 {
        p_mort = params.mortality_above_threshold2;
        debug!(p_mort, lagged_cwd = x.lagged_cwd, "p_mort from CWD threshold 2");
    }

    if params.uses_regression() {
        p_mort = regression_mortality(params, x);
        debug!(p_mort, "p_mort from regression");
    }

    p_mort
}

/// Evaluate drought mortality for one cohort.
///
/// Consumes exactly one draw from `rng`. Returns `Some` when the cohort dies,
/// even if it carried no biomass; the cohort's entire leaf and wood biomass
/// is reported and added to the site's cumulative and per-species totals.
/// The cohort itself is left for the caller to remove.
/// `site_biomass` is the site's total biomass before this year's kills.
pub fn evaluate<R: UniformSource + ?Sized>(
    cohort: &Cohort,
    site: &mut Site,
    params: &SpeciesDroughtParameters,
    site_biomass: f64,
    rng: &mut R,
) -> Option<DroughtKill> {
    let predictors = MortalityPredictors::new(cohort, site, site_biomass);
    let p_mort = mortality_probability(params, &predictors);
    if !p_mort.is_finite() {
        warn!(
            row = site.row,
            column = site.column,
            species = cohort.species.index(),
            p_mort,
            "non-finite drought mortality probability; cohort survives"
        );
    }

    let draw = rng.next_uniform();
    if p_mort > draw {
        let kill = DroughtKill {
            wood: cohort.wood_biomass,
            leaf: cohort.leaf_biomass,
        };
        site.record_drought_kill(cohort.species, kill.total());
        debug!(
            row = site.row,
            column = site.column,
            species = cohort.species.index(),
            age = cohort.age,
            wood = kill.wood,
            leaf = kill.leaf,
            "cohort killed by drought"
        );
        Some(kill)
    } else {
        None
    }
}
