//! Shared fixtures for integration tests

#![allow(dead_code)]

use drought_sim_core::core_types::climate::{AnnualClimate, MonthlyClimate};
use drought_sim_core::core_types::ecoregion::EcoregionId;
use drought_sim_core::core_types::site::{ClimateNormals, Site, SoilProperties};
use drought_sim_core::core_types::units::{Celsius, Centimeters, Degrees};
use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Loam from the reference scenario: 100 cm deep, FC 0.3, WP 0.1
pub fn loam() -> SoilProperties {
    SoilProperties {
        depth: Centimeters::new(100.0),
        field_capacity: 0.3,
        wilting_point: 0.1,
        storm_flow_fraction: 0.2,
        base_flow_fraction: 0.1,
        slope: Degrees::new(0.0),
        aspect: Degrees::new(-1.0),
    }
}

pub fn site(row: u32, column: u32) -> Site {
    Site::new(row, column, EcoregionId(0), loam(), ClimateNormals::default())
}

pub fn month(precip: f64, tmax: f64, tmin: f64, pet: f64) -> MonthlyClimate {
    MonthlyClimate::new(
        Centimeters::new(precip),
        Celsius::new((tmax + tmin) / 2.0),
        Celsius::new(tmax),
        Celsius::new(tmin),
        Centimeters::new(pet),
    )
}

/// A temperate year with a snowy winter and a dry summer
pub fn seasonal_year(offset: f64) -> AnnualClimate {
    let precip = [9.0, 8.0, 7.5, 6.0, 4.5, 2.5, 1.0, 1.2, 2.8, 5.0, 7.5, 9.0];
    let tmax = [2.0, 4.0, 8.0, 13.0, 18.0, 24.0, 29.0, 28.0, 23.0, 16.0, 8.0, 3.0];
    let tmin = [-9.0, -7.0, -4.0, 0.5, 4.0, 8.0, 12.0, 11.0, 7.0, 2.0, -3.0, -8.0];
    let pet = [0.4, 0.8, 2.2, 4.0, 7.5, 11.0, 14.0, 12.5, 8.0, 4.0, 1.2, 0.4];

    let mut year = AnnualClimate::uniform(month(0.0, 0.0, 0.0, 0.0));
    for m in 0..12 {
        let t_max = tmax[m] + offset;
        let t_min = tmin[m] + offset;
        year.precipitation[m] = Centimeters::new(precip[m]);
        year.max_temperature[m] = Celsius::new(t_max);
        year.min_temperature[m] = Celsius::new(t_min);
        year.temperature[m] = Celsius::new((t_max + t_min) / 2.0);
        year.pet[m] = Centimeters::new(pet[m] * (1.0 + offset / 20.0).max(0.1));
    }
    year
}
