//! End-to-end drought runs on the bundled foothills scenario
//!
//! Loads the TOML scenario shipped with the headless demo, spins it up, and
//! runs the full climate record through the landscape driver.

mod common;

use approx::assert_relative_eq;
use drought_sim_core::config::{Scenario, ScenarioConfig};
use drought_sim_core::landscape::DroughtYearReport;
use drought_sim_core::rng::MortalityRng;

const FOOTHILLS: &str = include_str!("../../../demo-headless/scenarios/foothills_drought.toml");

fn load() -> Scenario {
    ScenarioConfig::from_toml_str(FOOTHILLS)
        .expect("scenario parses")
        .build()
        .expect("scenario builds")
}

fn run(scenario: &mut Scenario, rng: &mut MortalityRng) -> Vec<DroughtYearReport> {
    scenario
        .landscape
        .spin_up(&scenario.ecoregions, &scenario.spinup_climate)
        .unwrap();
    (1..=scenario.available_years())
        .map(|year| {
            let calendar = scenario.calendar_year(year).unwrap();
            scenario
                .landscape
                .run_year(year, calendar, &scenario.climate, &scenario.species, rng)
                .unwrap()
        })
        .collect()
}

#[test]
fn bundled_scenario_loads() {
    let scenario = load();
    assert_eq!(scenario.species.len(), 3);
    assert_eq!(scenario.ecoregions.len(), 3);
    // The lake site is in an inactive ecoregion
    assert_eq!(scenario.landscape.len(), 5);
    assert_eq!(scenario.available_years(), 12);
    assert_eq!(scenario.calendar_year(1), Some(2000));
    assert_eq!(scenario.calendar_year(12), Some(2011));
    assert_eq!(scenario.spinup_climate.min_year(), Some(1980));
    assert_eq!(scenario.parameters.random_seed, 20240611);
}

#[test]
fn spin_up_fills_histories() {
    let mut scenario = load();
    let summary = scenario
        .landscape
        .spin_up(&scenario.ecoregions, &scenario.spinup_climate)
        .unwrap();
    assert_eq!(summary.first_year, 1980);
    assert_eq!(summary.sites, 5);
    assert_eq!(summary.reused_records, 0);
    for site in scenario.landscape.sites() {
        assert!(site.history.soil_water.is_full());
        assert!(site.history.temperature.is_full());
        assert!(site.history.cwd.is_full());
    }
}

#[test]
fn spin_up_reuses_last_record_for_missing_years() {
    let mut config = ScenarioConfig::from_toml_str(FOOTHILLS).unwrap();
    for record in &mut config.spinup_climate {
        record.through = Some(1983);
    }
    let mut scenario = config.build().unwrap();
    let summary = scenario
        .landscape
        .spin_up(&scenario.ecoregions, &scenario.spinup_climate)
        .unwrap();
    // 1984..=1989 fall back to the 1983 record
    assert_eq!(summary.reused_records, 6);
    assert!(scenario.landscape.sites()[0].history.cwd.is_full());
}

#[test]
fn first_year_lagged_values_ignore_spin_up_history() {
    let mut scenario = load();
    scenario
        .landscape
        .spin_up(&scenario.ecoregions, &scenario.spinup_climate)
        .unwrap();
    let mut rng = scenario.rng();
    scenario
        .landscape
        .run_year(1, 2000, &scenario.climate, &scenario.species, &mut rng)
        .unwrap();

    for site in scenario.landscape.sites() {
        assert_eq!(site.lagged.cwd, site.history.cwd.latest().unwrap());
        assert_eq!(site.lagged.swa, site.history.soil_water.latest().unwrap());
        assert_eq!(site.lagged.temperature, site.history.temperature.latest().unwrap());
    }
}

#[test]
fn seeded_runs_replay_exactly() {
    let mut first = load();
    let mut rng_a = first.rng();
    let reports_a = run(&mut first, &mut rng_a);

    let mut second = load();
    let mut rng_b = second.rng();
    let reports_b = run(&mut second, &mut rng_b);

    assert_eq!(reports_a, reports_b);
    assert_eq!(rng_a.draws(), rng_b.draws());
    for (a, b) in first.landscape.sites().iter().zip(second.landscape.sites()) {
        assert_eq!(a.drought_mortality, b.drought_mortality);
        assert_eq!(a.cohorts, b.cohorts);
        assert_eq!(a.water, b.water);
    }
}

#[test]
fn drought_raises_lagged_deficit() {
    let mut scenario = load();
    let mut rng = scenario.rng();
    let reports = run(&mut scenario, &mut rng);

    // Year 4 is 2003, the last wet year; year 9 is 2008, the fifth drought year
    let wet = reports[3].mean_lagged;
    let dry = reports[8].mean_lagged;
    assert!(dry.cwd > wet.cwd, "wet {wet:?} dry {dry:?}");
    assert!(dry.temperature > wet.temperature, "wet {wet:?} dry {dry:?}");
    assert!(dry.swa < wet.swa, "wet {wet:?} dry {dry:?}");
}

#[test]
fn mortality_totals_are_consistent() {
    let mut scenario = load();
    let initial = scenario.landscape.total_biomass();
    let mut rng = scenario.rng();
    let reports = run(&mut scenario, &mut rng);

    let reported: f64 = reports.iter().map(|r| r.killed_biomass).sum();
    let recorded: f64 = scenario
        .landscape
        .sites()
        .iter()
        .map(|s| s.drought_mortality)
        .sum();
    assert_relative_eq!(reported, recorded, epsilon = 1e-6);
    assert_relative_eq!(
        scenario.landscape.total_biomass(),
        initial - reported,
        epsilon = 1e-6
    );

    for site in scenario.landscape.sites() {
        let by_species: f64 = site.species_drought_mortality.iter().sum();
        assert_relative_eq!(by_species, site.drought_mortality, epsilon = 1e-9);
    }
    for report in &reports {
        let by_species: f64 = report.species_killed.iter().sum();
        assert_relative_eq!(by_species, report.killed_biomass, epsilon = 1e-9);
        assert!(report.cohorts_killed <= report.cohorts_evaluated);
    }
}

#[test]
fn certain_threshold_kills_every_cohort_of_species() {
    let mut config = ScenarioConfig::from_toml_str(FOOTHILLS).unwrap();
    let fir = config
        .species
        .iter_mut()
        .find(|s| s.name == "abiegran")
        .unwrap();
    fir.drought.cwd_threshold = 1.0;
    fir.drought.mortality_above_threshold = 1.0;

    let mut scenario = config.build().unwrap();
    let fir_id = scenario.species.id_of("abiegran").unwrap();
    let fir_biomass: f64 = scenario
        .landscape
        .sites()
        .iter()
        .flat_map(|s| &s.cohorts)
        .filter(|c| c.species == fir_id)
        .map(|c| c.total_biomass())
        .sum();
    assert!(fir_biomass > 0.0);

    scenario
        .landscape
        .spin_up(&scenario.ecoregions, &scenario.spinup_climate)
        .unwrap();
    let mut rng = MortalityRng::from_seed(1);
    let report = scenario
        .landscape
        .run_year(1, 2000, &scenario.climate, &scenario.species, &mut rng)
        .unwrap();

    assert_relative_eq!(report.species(fir_id), fir_biomass, epsilon = 1e-9);
    assert!(scenario
        .landscape
        .sites()
        .iter()
        .flat_map(|s| &s.cohorts)
        .all(|c| c.species != fir_id));
}

#[test]
fn species_map_paths_follow_template() {
    let scenario = load();
    let paths = scenario.species_map_paths(3).unwrap();
    assert_eq!(
        paths,
        vec![
            "drought/pinupond-mortality-3.img",
            "drought/abiegran-mortality-3.img",
            "drought/querkell-mortality-3.img",
        ]
    );
}
