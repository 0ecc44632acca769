use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use drought_sim_core::{DroughtYearReport, MortalityRng, Scenario, ScenarioConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_SCENARIO: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/scenarios/foothills_drought.toml"
);

/// Drought mortality simulation over a TOML scenario
#[derive(Parser, Debug)]
#[command(name = "drought-sim")]
#[command(about = "Soil water balance and drought mortality for a forest landscape", long_about = None)]
struct Args {
    /// Scenario file
    #[arg(short, long, default_value = DEFAULT_SCENARIO)]
    scenario: PathBuf,

    /// Simulated years (defaults to every year in the climate table)
    #[arg(short, long)]
    years: Option<u32>,

    /// Override the scenario's random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the climate spin-up
    #[arg(long)]
    no_spinup: bool,

    /// Per-site and per-cohort diagnostics
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let config = ScenarioConfig::load(&args.scenario)
        .with_context(|| format!("loading scenario {}", args.scenario.display()))?;
    let mut scenario = config.build().context("building scenario")?;
    if let Some(seed) = args.seed {
        scenario.parameters.random_seed = seed;
    }

    let available = scenario.available_years();
    let years = args.years.unwrap_or(available);
    if years > available {
        bail!("scenario has climate for {available} years, {years} requested");
    }

    println!("=== Drought Mortality Simulation ===\n");
    println!(
        "Scenario: {} ({} sites, {} species, seed {})",
        args.scenario.display(),
        scenario.landscape.len(),
        scenario.species.len(),
        scenario.parameters.random_seed
    );

    if args.no_spinup {
        info!("climate spin-up skipped");
    } else {
        let summary = scenario
            .landscape
            .spin_up(&scenario.ecoregions, &scenario.spinup_climate)
            .context("climate spin-up")?;
        println!(
            "Spin-up from {}: {} sites, {} years reused a previous record",
            summary.first_year, summary.sites, summary.reused_records
        );
    }

    let initial_biomass = scenario.landscape.total_biomass();
    let mut rng = scenario.rng();
    let mut reports = Vec::with_capacity(years as usize);

    println!();
    print_header(&scenario);
    for year in 1..=years {
        let calendar = scenario
            .calendar_year(year)
            .context("simulated year outside the climate table")?;
        let report = scenario
            .landscape
            .run_year(year, calendar, &scenario.climate, &scenario.species, &mut rng)
            .with_context(|| format!("simulating {calendar}"))?;
        print_year(&scenario, calendar, &report);

        if scenario.parameters.write_species_drought_maps {
            for path in scenario.species_map_paths(year)? {
                println!("    map: {path}");
            }
        }
        reports.push(report);
    }

    print_summary(&scenario, initial_biomass, &reports, &rng);
    Ok(())
}

fn print_header(scenario: &Scenario) {
    let params = &scenario.parameters;
    let mut header = format!("{:>4} {:>6} {:>12} {:>7}", "year", "cal", "killed", "cohorts");
    if params.output_soil_water_available {
        header.push_str(&format!(" {:>8}", "swa"));
    }
    if params.output_climate_water_deficit {
        header.push_str(&format!(" {:>8}", "cwd"));
    }
    if params.output_temperature {
        header.push_str(&format!(" {:>6}", "temp"));
    }
    println!("{header}");
}

fn print_year(scenario: &Scenario, calendar: i32, report: &DroughtYearReport) {
    let params = &scenario.parameters;
    let lagged = report.mean_lagged;
    let mut line = format!(
        "{:>4} {:>6} {:>12.1} {:>3}/{:<3}",
        report.simulated_year,
        calendar,
        report.killed_biomass,
        report.cohorts_killed,
        report.cohorts_evaluated
    );
    if params.output_soil_water_available {
        line.push_str(&format!(" {:>8.2}", lagged.swa));
    }
    if params.output_climate_water_deficit {
        line.push_str(&format!(" {:>8.1}", lagged.cwd));
    }
    if params.output_temperature {
        line.push_str(&format!(" {:>6.2}", lagged.temperature));
    }
    println!("{line}");
}

fn print_summary(
    scenario: &Scenario,
    initial_biomass: f64,
    reports: &[DroughtYearReport],
    rng: &MortalityRng,
) {
    let killed: f64 = reports.iter().map(|r| r.killed_biomass).sum();
    println!("\n=== Summary ===");
    println!("Years simulated: {}", reports.len());
    println!("Mortality draws: {}", rng.draws());
    println!(
        "Biomass: {:.1} -> {:.1} ({:.1} killed by drought)",
        initial_biomass,
        scenario.landscape.total_biomass(),
        killed
    );
    for species in scenario.species.iter() {
        let total: f64 = reports.iter().map(|r| r.species(species.id)).sum();
        println!("  {:<12} {:>12.1}", species.name, total);
    }
}
