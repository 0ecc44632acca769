//! Terrain adjustment of potential evapotranspiration
//!
//! South-facing slopes receive more radiation and so have higher
//! evaporative demand than flat ground; north-facing slopes less. The
//! slope-aspect index scales monthly PET before the water budget runs.
//!
//! # Scientific References
//!
//! - Bugmann, H. (1994). "On the ecology of mountainous forests in a changing
//!   climate: a simulation study." PhD thesis, ETH Zürich, p. 82.
//! - Schumacher, S. (2004). "The role of large-scale disturbances and climate
//!   for the dynamics of forested landscapes in the European Alps."
//!   PhD thesis, ETH Zürich, p. 114.

use crate::core_types::units::{Centimeters, Degrees};

/// Slopes steeper than this contribute no further to the index
const MAX_EFFECTIVE_SLOPE_DEG: f64 = 60.0;

/// Slope at which a due-south cell reaches an index of 1
const SLOPE_SCALE_DEG: f64 = 30.0;

/// PET gain per unit of positive index (sun-facing)
const SUN_FACING_PET_GAIN: f64 = 0.125;

/// PET gain per unit of negative index (shaded)
const SHADED_PET_GAIN: f64 = 0.063;

/// Calculate the slope-aspect index
///
/// Index = -cos(aspect) × min(slope, 60°) / 30°
///
/// # Parameters
/// - `slope`: Slope steepness in degrees
/// - `aspect`: Direction the slope faces, clockwise from north; negative
///   values mean aspect is unknown
///
/// # Returns
/// Index in [-2, 2]: positive on south-facing slopes, negative on
/// north-facing slopes, zero on flat ground or with unknown aspect
pub fn slope_aspect_effect(slope: Degrees, aspect: Degrees) -> f64 {
    if *slope <= 0.0 || *aspect < 0.0 {
        return 0.0;
    }

    let steepness = (*slope).min(MAX_EFFECTIVE_SLOPE_DEG) / SLOPE_SCALE_DEG;

    // Aspect 180° (south) → -cos = +1; aspect 0° (north) → -1
    -aspect.to_radians().cos() * steepness
}

/// Scale monthly PET by the slope-aspect index
///
/// Sun-facing slopes gain 12.5% per unit index; shaded slopes lose 6.3%
/// per unit.
pub fn adjust_pet(pet: Centimeters, slope: Degrees, aspect: Degrees) -> Centimeters {
    let sl_asp = slope_aspect_effect(slope, aspect);
    if sl_asp > 0.0 {
        pet * (1.0 + sl_asp * SUN_FACING_PET_GAIN)
    } else {
        pet * (1.0 + sl_asp * SHADED_PET_GAIN)
    }
}
