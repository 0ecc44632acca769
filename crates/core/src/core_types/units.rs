//! Semantic unit types for the water budget
//!
//! Newtype wrappers keep the centimeter-based soil water budget from being
//! mixed with the millimeter-based deficit reporting, and keep temperatures
//! and angles from being passed where a depth is expected.
//!
//! # Design Philosophy
//! - All quantities are f64; the monthly budget accumulates over decades of
//!   spin-up and simulation and single precision drifts visibly
//! - `Deref` to the inner f64 so physics code can work on plain numbers
//! - Total ordering via `total_cmp` (NaN sorts above everything)
//! - Serde transparent so configuration files carry bare numbers
//!
//! # Usage
//! ```
//! use drought_sim_core::core_types::units::{Centimeters, Millimeters};
//!
//! let deficit = Centimeters::new(2.5);
//! let mm: Millimeters = deficit.into();
//! assert!((*mm - 25.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Deref, Mul, Sub, SubAssign};

/// Millimeters per centimeter; deficits are reported in mm by convention.
pub const MM_PER_CM: f64 = 10.0;

macro_rules! scalar_unit {
    ($name:ident, $suffix:literal) => {
        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        impl Deref for $name {
            type Target = f64;
            #[inline]
            fn deref(&self) -> &f64 {
                &self.0
            }
        }

        impl From<f64> for $name {
            #[inline]
            fn from(value: f64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:.3}{}", self.0, $suffix)
            }
        }
    };
}

macro_rules! additive_unit {
    ($name:ident) => {
        impl Add for $name {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $name {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                Self(self.0 - rhs.0)
            }
        }

        impl AddAssign for $name {
            #[inline]
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl SubAssign for $name {
            #[inline]
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }

        impl Mul<f64> for $name {
            type Output = Self;
            #[inline]
            fn mul(self, rhs: f64) -> Self {
                Self(self.0 * rhs)
            }
        }
    };
}

// ============================================================================
// DEPTH TYPES (water stocks and fluxes)
// ============================================================================

/// Water depth or soil depth in centimeters
///
/// Soil water content, snowpack, precipitation and PET all share this unit
/// inside the monthly budget.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Centimeters(f64);

impl Centimeters {
    pub const ZERO: Centimeters = Centimeters(0.0);

    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Centimeters(value)
    }

    #[inline]
    #[must_use]
    pub fn to_millimeters(self) -> Millimeters {
        Millimeters(self.0 * MM_PER_CM)
    }
}

scalar_unit!(Centimeters, " cm");
additive_unit!(Centimeters);

impl From<Centimeters> for Millimeters {
    fn from(value: Centimeters) -> Self {
        value.to_millimeters()
    }
}

/// Water depth in millimeters (climatic water deficit, annual PET)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Millimeters(f64);

impl Millimeters {
    pub const ZERO: Millimeters = Millimeters(0.0);

    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Millimeters(value)
    }

    #[inline]
    #[must_use]
    pub fn to_centimeters(self) -> Centimeters {
        Centimeters(self.0 / MM_PER_CM)
    }
}

scalar_unit!(Millimeters, " mm");
additive_unit!(Millimeters);

// ============================================================================
// TEMPERATURE
// ============================================================================

/// Air temperature in degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Celsius(f64);

impl Celsius {
    /// Water freezing point; at or below this minimum temperature precipitation falls as snow
    pub const FREEZING: Celsius = Celsius(0.0);

    /// Create a new Celsius temperature. Asserts value >= absolute zero (-273.15°C).
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(
            value >= -273.15,
            "Celsius::new: value is below absolute zero (-273.15°C)"
        );
        Celsius(value)
    }
}

scalar_unit!(Celsius, "°C");

// ============================================================================
// ANGLES
// ============================================================================

/// Angle in degrees (slope steepness, aspect clockwise from north)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Degrees(f64);

impl Degrees {
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Degrees(value)
    }

    #[inline]
    #[must_use]
    pub fn to_radians(self) -> f64 {
        self.0.to_radians()
    }
}

scalar_unit!(Degrees, "°");
