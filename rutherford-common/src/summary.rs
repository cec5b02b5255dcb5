use crate::histogram::AngularHistogram;
use serde::{Deserialize, Serialize};

/// How many particles ended their post-foil segment in each terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationCounts {
    pub exit_x_reached: u32,
    pub escaped_y: u32,
    pub frames_exhausted: u32,
}

/// Aggregate results of one Monte Carlo run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScatteringSummary {
    /// Base seed of the per-particle generators; rerunning with it reproduces the tables.
    pub seed: u64,
    pub particle_count: u32,
    pub energy_mev: f64,
    /// Projectile speed before and after scattering (m/s).
    pub v0_m_per_s: f64,
    pub max_impact_parameter_m: f64,
    pub mean_theta_deg: f64,
    pub max_theta_deg: f64,
    /// Particles deflected by more than 90 degrees.
    pub backscattered: u32,
    pub trajectory_frames: u64,
    pub terminations: TerminationCounts,
    pub histogram: AngularHistogram,
}
