use anyhow::Result;
use log::{debug, error, info, warn};
use std::path::Path;
use std::time::Instant;

// Define modules used by main
mod output;
mod physics;
mod simulation;
mod trajectory;

use output::{save_summary, TableSink};
use rutherford_common::SimulationConfig;
use simulation::ScatteringSimulation;

const CONFIG_PATH: &str = "config.toml";

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting Rutherford Scattering Engine...");

    // --- Load Configuration ---
    let config = if Path::new(CONFIG_PATH).exists() {
        info!("Loading configuration from {}", CONFIG_PATH);
        SimulationConfig::load(CONFIG_PATH)?
    } else {
        info!("No {} found; using built-in defaults.", CONFIG_PATH);
        SimulationConfig::default()
    };
    debug!("Configuration: {:#?}", config);

    // --- Open Output Tables ---
    // Opened before simulating: an unwritable destination is the only fatal error.
    let sink = match TableSink::create(&config.output) {
        Ok(sink) => sink,
        Err(e) => {
            error!("Cannot open output files: {:#}", e);
            return Err(e);
        }
    };

    // --- Initialize Simulation ---
    let sim = ScatteringSimulation::new(config)?;
    let params = sim.params();
    info!("Using {} Rayon threads.", rayon::current_num_threads());
    info!(
        "Parameters: E = {} MeV | Z1 = {} | Z2 = {} | bmax = {:e} m | v0 = {:e} m/s | seed = {}",
        params.energy_mev,
        params.projectile_charge_number,
        params.target_charge_number,
        params.max_impact_parameter,
        params.v0,
        sim.seed()
    );
    debug!("Simulation Parameters: {:#?}", params);
    debug!("Physical Constants: {:#?}", sim.constants());

    // --- Run ---
    info!("Simulating {} particles...", params.particle_count);
    let start_time = Instant::now();
    let run = sim.run();
    info!("Simulation finished in {:.3} seconds.", start_time.elapsed().as_secs_f64());

    let summary = sim.summarize(&run);
    info!(
        "Terminations: exit plane {} | escaped |y| {} | frames exhausted {}",
        summary.terminations.exit_x_reached,
        summary.terminations.escaped_y,
        summary.terminations.frames_exhausted
    );
    info!(
        "Angles: mean {:.6} deg | max {:.6} deg | backscattered (> 90 deg) {}",
        summary.mean_theta_deg, summary.max_theta_deg, summary.backscattered
    );
    if summary.histogram.non_finite > 0 {
        warn!("{} particles produced non-finite angles.", summary.histogram.non_finite);
    }

    // --- Save Recorded Data ---
    info!("Saving recorded data...");
    sink.write(&run)?;

    if sim.config().output.save_summary {
        let path = save_summary(&summary, &sim.config().output)?;
        info!("Summary saved to {}", path.display());
    } else {
        info!("Skipping summary as per config (save_summary is false).");
    }

    info!("Wrote trajectories and angles (particles: {}).", params.particle_count);
    Ok(())
}
