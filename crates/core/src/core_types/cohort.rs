//! Tree cohorts
//!
//! A cohort is one (species, age) class of trees at a site tracked as a
//! single leaf + wood biomass pool. Age and biomass belong to the
//! surrounding succession model; the drought model only reads them and
//! reports how much died.

use super::species::SpeciesId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    pub species: SpeciesId,
    /// Age in years
    pub age: u32,
    /// Leaf biomass (g/m²)
    pub leaf_biomass: f64,
    /// Wood biomass (g/m²)
    pub wood_biomass: f64,
}

impl Cohort {
    pub fn new(species: SpeciesId, age: u32, leaf_biomass: f64, wood_biomass: f64) -> Self {
        Self {
            species,
            age,
            leaf_biomass,
            wood_biomass,
        }
    }

    /// Aboveground biomass (leaf + wood)
    #[inline]
    pub fn total_biomass(&self) -> f64 {
        self.leaf_biomass + self.wood_biomass
    }

    /// Remove the whole cohort's biomass.
    pub(crate) fn kill(&mut self) {
        self.leaf_biomass = 0.0;
        self.wood_biomass = 0.0;
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.total_biomass() <= 0.0
    }
}

/// Biomass removed from one cohort by drought in one year
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DroughtKill {
    pub wood: f64,
    pub leaf: f64,
}

impl DroughtKill {
    #[inline]
    pub fn total(&self) -> f64 {
        self.wood + self.leaf
    }
}
