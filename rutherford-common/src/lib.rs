pub mod config;
pub mod constants;
pub mod histogram;
pub mod records;
pub mod sim_params;
pub mod summary;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{BeamConfig, GeometryConfig, OutputConfig, RunConfig, SimulationConfig, SummaryFormat, TargetConfig, TimingConfig};
pub use constants::PhysicalConstants;
pub use histogram::AngularHistogram;
pub use records::{AngleRecord, TrajectoryFrame};
pub use sim_params::SimParams;
pub use summary::{ScatteringSummary, TerminationCounts};
pub use vecmath::Vec2;
