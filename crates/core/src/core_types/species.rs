//! Species drought parameters
//!
//! Each species carries two independent (threshold, probability) pairs for
//! the direct CWD threshold rule and the coefficients of the decadal
//! logistic survival regression. Loaded once, never mutated.

use crate::error::{DroughtError, DroughtResult};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Dense species index assigned at load time in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpeciesId(pub usize);

impl SpeciesId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Drought response parameters for one species
///
/// Thresholds are lagged CWD values in mm. A threshold of zero disables its
/// rule; when both are zero the regression path is used instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesDroughtParameters {
    pub cwd_threshold: f64,
    pub mortality_above_threshold: f64,
    pub cwd_threshold2: f64,
    pub mortality_above_threshold2: f64,
    pub intercept: f64,
    pub beta_age: f64,
    pub beta_temp: f64,
    pub beta_swa_anom: f64,
    pub beta_biomass: f64,
    pub beta_cwd: f64,
    pub beta_norm_cwd: f64,
    pub beta_norm_temp: f64,
    /// Interaction between lagged CWD and site biomass
    pub intxn_cwd_biomass: f64,
}

impl SpeciesDroughtParameters {
    /// True when neither threshold rule is configured
    #[inline]
    pub fn uses_regression(&self) -> bool {
        self.cwd_threshold == 0.0 && self.cwd_threshold2 == 0.0
    }
}

/// A named species with its drought parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub id: SpeciesId,
    pub name: String,
    pub drought: SpeciesDroughtParameters,
}

/// Immutable species lookup built once at load
#[derive(Debug, Clone, Default)]
pub struct SpeciesTable {
    species: Vec<Species>,
    by_name: FxHashMap<String, SpeciesId>,
}

impl SpeciesTable {
    /// Build the table, assigning ids in iteration order.
    ///
    /// # Errors
    /// Returns [`DroughtError::Config`] when a species name appears twice.
    pub fn new<I>(entries: I) -> DroughtResult<Self>
    where
        I: IntoIterator<Item = (String, SpeciesDroughtParameters)>,
    {
        let mut table = SpeciesTable::default();
        for (name, drought) in entries {
            if table.by_name.contains_key(&name) {
                return Err(DroughtError::Config(format!(
                    "species '{name}' defined more than once"
                )));
            }
            let both_set = drought.cwd_threshold != 0.0 && drought.cwd_threshold2 != 0.0;
            if both_set && drought.cwd_threshold2 < drought.cwd_threshold {
                // The second rule is evaluated last and always wins when it fires.
                warn!(
                    species = %name,
                    cwd_threshold = drought.cwd_threshold,
                    cwd_threshold2 = drought.cwd_threshold2,
                    "cwd_threshold2 is below cwd_threshold; the second threshold overrides the first whenever both are exceeded"
                );
            }
            let id = SpeciesId(table.species.len());
            table.by_name.insert(name.clone(), id);
            table.species.push(Species { id, name, drought });
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    pub fn get(&self, id: SpeciesId) -> Option<&Species> {
        self.species.get(id.index())
    }

    /// # Errors
    /// Returns [`DroughtError::UnknownSpecies`] for names not in the table.
    pub fn id_of(&self, name: &str) -> DroughtResult<SpeciesId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| DroughtError::UnknownSpecies(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Species> {
        self.species.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_declaration_order() {
        let table = SpeciesTable::new([
            ("abiegran".to_string(), SpeciesDroughtParameters::default()),
            ("pinupond".to_string(), SpeciesDroughtParameters::default()),
        ])
        .unwrap();
        assert_eq!(table.id_of("pinupond").unwrap(), SpeciesId(1));
        assert_eq!(table.get(SpeciesId(0)).unwrap().name, "abiegran");
        assert!(matches!(
            table.id_of("quercus"),
            Err(DroughtError::UnknownSpecies(name)) if name == "quercus"
        ));
    }

    #[test]
    fn test_duplicate_species_rejected() {
        let result = SpeciesTable::new([
            ("abiegran".to_string(), SpeciesDroughtParameters::default()),
            ("abiegran".to_string(), SpeciesDroughtParameters::default()),
        ]);
        assert!(matches!(result, Err(DroughtError::Config(_))));
    }

    #[test]
    fn test_regression_only_when_both_thresholds_zero() {
        let mut params = SpeciesDroughtParameters::default();
        assert!(params.uses_regression());
        params.cwd_threshold2 = 400.0;
        assert!(!params.uses_regression());
    }
}
