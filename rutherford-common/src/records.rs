use serde::{Deserialize, Serialize};

/// One animation sample of a particle's position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryFrame {
    /// 0-based particle index.
    pub particle: u32,
    /// 0-based frame index, contiguous within a particle.
    pub frame: u32,
    /// Position along the beam axis (m).
    #[serde(rename = "x_m")]
    pub x: f64,
    /// Transverse position (m).
    #[serde(rename = "y_m")]
    pub y: f64,
}

/// Scattering angle of one particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleRecord {
    pub particle: u32,
    pub theta_deg: f64,
}
