use crate::constants::{PhysicalConstants, ALPHA_MASS_NUMBER};
use crate::sim_params::SimParams;
use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Projectile beam, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct BeamConfig {
    pub particle_count: u32,
    pub energy_mev: f64,
    pub projectile_charge_number: f64,
    pub projectile_mass_amu: f64,
    pub max_impact_parameter_m: f64,
}

impl Default for BeamConfig {
    fn default() -> Self {
        BeamConfig {
            particle_count: 2500,
            energy_mev: 5.0,
            projectile_charge_number: 2.0,
            projectile_mass_amu: ALPHA_MASS_NUMBER,
            max_impact_parameter_m: 1.0e-10, // ~ atomic scale
        }
    }
}

// Scattering nucleus (gold by default)
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct TargetConfig {
    pub charge_number: f64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        TargetConfig { charge_number: 79.0 }
    }
}

// Positions along the beam axis and the transverse escape bound
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct GeometryConfig {
    pub start_x_m: f64,
    pub foil_x_m: f64,
    pub exit_x_m: f64,
    pub escape_y_m: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        GeometryConfig {
            start_x_m: -6e-14,
            foil_x_m: 0.0,
            exit_x_m: 6e-14,
            escape_y_m: 1e-11,
        }
    }
}

// Frame counts and the post-foil time step
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct TimingConfig {
    pub frames_before: u32,
    pub frames_after: u32,
    pub frame_dt_s: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            frames_before: 220,
            frames_after: 400,
            frame_dt_s: 1e-17,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct RunConfig {
    /// Base seed for the per-particle generators. `None` means seed from the clock.
    pub seed: Option<u64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    Json,
    Bincode,
    Messagepack,
}

impl SummaryFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SummaryFormat::Json => "json",
            SummaryFormat::Bincode => "bin",
            SummaryFormat::Messagepack => "msgpack",
        }
    }
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: String,
    pub trajectories_file: String,
    pub angles_file: String,
    pub base_filename: String,
    pub save_summary: bool,
    pub summary_format: SummaryFormat,
    pub histogram_bins: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: ".".to_string(),
            trajectories_file: "trajectories.csv".to_string(),
            angles_file: "angles.csv".to_string(),
            base_filename: "rutherford".to_string(),
            save_summary: true,
            summary_format: SummaryFormat::Json,
            histogram_bins: 36,
        }
    }
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SimulationConfig {
    pub beam: BeamConfig,
    pub target: TargetConfig,
    pub geometry: GeometryConfig,
    pub timing: TimingConfig,
    pub run: RunConfig,
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config in '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that make the run meaningless. Physics values are only
    /// warned about: degenerate beams still run and emit non-finite records.
    pub fn validate(&self) -> Result<()> {
        if self.output.histogram_bins == 0 {
            anyhow::bail!("histogram_bins must be greater than 0.");
        }
        if self.output.trajectories_file.is_empty() || self.output.angles_file.is_empty() {
            anyhow::bail!("trajectories_file and angles_file must be non-empty.");
        }

        if self.beam.max_impact_parameter_m <= 0.0 {
            warn!(
                "max_impact_parameter_m = {} is not positive; angles will saturate or be non-finite.",
                self.beam.max_impact_parameter_m
            );
        }
        if self.beam.energy_mev <= 0.0 {
            warn!(
                "energy_mev = {} is not positive; angles and velocities will be non-finite.",
                self.beam.energy_mev
            );
        }
        if self.timing.frames_before == 0 {
            warn!("frames_before is 0; no pre-foil frames will be written.");
        }
        Ok(())
    }

    /// Resolves the physical constants for the configured projectile.
    pub fn physical_constants(&self) -> PhysicalConstants {
        PhysicalConstants::for_projectile(self.beam.projectile_mass_amu)
    }

    /// Converts the configuration into simulation parameters used at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        let constants = self.physical_constants();

        // --- Derived beam quantities ---
        let energy_joule = constants.mev_to_joule(self.beam.energy_mev);
        // approximate speed, non-relativistic
        let v0 = (2.0 * energy_joule / constants.projectile_mass).sqrt();
        let q1 = self.beam.projectile_charge_number * constants.elementary_charge;
        let q2 = self.target.charge_number * constants.elementary_charge;
        let coulomb_product = constants.coulomb_constant * q1 * q2;

        SimParams {
            // Beam
            particle_count: self.beam.particle_count,
            energy_mev: self.beam.energy_mev,
            energy_joule,
            projectile_charge_number: self.beam.projectile_charge_number,
            target_charge_number: self.target.charge_number,
            coulomb_product,
            v0,
            max_impact_parameter: self.beam.max_impact_parameter_m,
            // Geometry
            start_x: self.geometry.start_x_m,
            foil_x: self.geometry.foil_x_m,
            exit_x: self.geometry.exit_x_m,
            escape_y: self.geometry.escape_y_m,
            // Frames
            frames_before: self.timing.frames_before,
            frames_after: self.timing.frames_after,
            frame_dt: self.timing.frame_dt_s,
        }
    }
}
