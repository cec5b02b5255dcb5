use serde::{Deserialize, Serialize};

/// Runtime parameters derived from the configuration, read by every particle trial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // Beam
    pub particle_count: u32,
    pub energy_mev: f64,
    pub energy_joule: f64, // Kinetic energy E (J)
    pub projectile_charge_number: f64, // Z1
    pub target_charge_number: f64, // Z2
    pub coulomb_product: f64, // k * q1 * q2 (J m)
    pub v0: f64, // Non-relativistic speed sqrt(2E/m) (m/s)
    pub max_impact_parameter: f64, // bmax (m)

    // Geometry (m)
    pub start_x: f64,
    pub foil_x: f64,
    pub exit_x: f64,
    pub escape_y: f64, // |y| beyond which a scattered particle is no longer followed

    // Frames
    pub frames_before: u32,
    pub frames_after: u32,
    pub frame_dt: f64, // Artificial time per post-foil frame (s)
}
