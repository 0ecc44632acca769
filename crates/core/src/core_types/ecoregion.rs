//! Ecoregions and their year-indexed climate tables

use super::climate::AnnualClimate;
use crate::error::{DroughtError, DroughtResult};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dense ecoregion index assigned at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EcoregionId(pub usize);

impl EcoregionId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ecoregion {
    pub id: EcoregionId,
    pub name: String,
    /// Inactive ecoregions hold no simulated sites and get no spin-up climate
    pub active: bool,
}

/// Immutable ecoregion lookup built once at load
#[derive(Debug, Clone, Default)]
pub struct EcoregionTable {
    ecoregions: Vec<Ecoregion>,
    by_name: FxHashMap<String, EcoregionId>,
}

impl EcoregionTable {
    /// # Errors
    /// Returns [`DroughtError::Config`] when a name appears twice.
    pub fn new<I>(entries: I) -> DroughtResult<Self>
    where
        I: IntoIterator<Item = (String, bool)>,
    {
        let mut table = EcoregionTable::default();
        for (name, active) in entries {
            if table.by_name.contains_key(&name) {
                return Err(DroughtError::Config(format!(
                    "ecoregion '{name}' defined more than once"
                )));
            }
            let id = EcoregionId(table.ecoregions.len());
            table.by_name.insert(name.clone(), id);
            table.ecoregions.push(Ecoregion { id, name, active });
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.ecoregions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ecoregions.is_empty()
    }

    pub fn get(&self, id: EcoregionId) -> Option<&Ecoregion> {
        self.ecoregions.get(id.index())
    }

    /// # Errors
    /// Returns [`DroughtError::UnknownEcoregion`] for names not in the table.
    pub fn id_of(&self, name: &str) -> DroughtResult<EcoregionId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| DroughtError::UnknownEcoregion(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ecoregion> {
        self.ecoregions.iter()
    }

    pub fn active(&self) -> impl Iterator<Item = &Ecoregion> {
        self.ecoregions.iter().filter(|e| e.active)
    }
}

/// Climate records keyed by calendar year, one record per ecoregion
///
/// Years are kept ordered so the earliest year is available for the
/// spin-up offset arithmetic.
#[derive(Debug, Clone, Default)]
pub struct ClimateTable {
    years: BTreeMap<i32, Vec<Option<AnnualClimate>>>,
    ecoregion_count: usize,
}

impl ClimateTable {
    pub fn new(ecoregion_count: usize) -> Self {
        Self {
            years: BTreeMap::new(),
            ecoregion_count,
        }
    }

    /// Insert or replace the record for one ecoregion in one year.
    ///
    /// # Errors
    /// Returns [`DroughtError::UnknownEcoregion`] when the id is out of range.
    pub fn insert(
        &mut self,
        year: i32,
        ecoregion: EcoregionId,
        climate: AnnualClimate,
    ) -> DroughtResult<()> {
        if ecoregion.index() >= self.ecoregion_count {
            return Err(DroughtError::UnknownEcoregion(format!(
                "ecoregion index {}",
                ecoregion.index()
            )));
        }
        let count = self.ecoregion_count;
        let records = self.years.entry(year).or_insert_with(|| vec![None; count]);
        records[ecoregion.index()] = Some(climate);
        Ok(())
    }

    pub fn min_year(&self) -> Option<i32> {
        self.years.keys().next().copied()
    }

    pub fn max_year(&self) -> Option<i32> {
        self.years.keys().next_back().copied()
    }

    pub fn contains_year(&self, year: i32) -> bool {
        self.years.contains_key(&year)
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    /// Record for one ecoregion in one year, if present
    pub fn get(&self, year: i32, ecoregion: EcoregionId) -> Option<&AnnualClimate> {
        self.years
            .get(&year)
            .and_then(|records| records.get(ecoregion.index()))
            .and_then(Option::as_ref)
    }

    /// Record that must exist for the main simulation.
    ///
    /// # Errors
    /// Returns [`DroughtError::MissingClimate`] when the year or ecoregion has no record.
    pub fn require(&self, year: i32, ecoregion: EcoregionId) -> DroughtResult<&AnnualClimate> {
        self.get(year, ecoregion)
            .ok_or(DroughtError::MissingClimate {
                ecoregion: ecoregion.index(),
                year,
            })
    }
}
