use crate::physics::{sample_particle, ImpactSampler};
use crate::trajectory::{synthesize, Termination};
use anyhow::Result;
use log::{debug, info, trace};
use rand::prelude::*;
use rayon::prelude::*;
use rutherford_common::{
    AngleRecord, AngularHistogram, PhysicalConstants, ScatteringSummary, SimParams, SimulationConfig,
    TerminationCounts, TrajectoryFrame,
};
use std::time::{SystemTime, UNIX_EPOCH};

/// Everything one particle contributes to the output tables.
#[derive(Debug, Clone)]
pub struct ParticleRun {
    pub angle: AngleRecord,
    pub frames: Vec<TrajectoryFrame>,
    pub termination: Termination,
}

/// Results of a run, ordered by particle index.
#[derive(Debug, Clone, Default)]
pub struct SimulationOutput {
    pub particles: Vec<ParticleRun>,
}

impl SimulationOutput {
    pub fn angles(&self) -> impl Iterator<Item = &AngleRecord> {
        self.particles.iter().map(|p| &p.angle)
    }

    pub fn frames(&self) -> impl Iterator<Item = &TrajectoryFrame> {
        self.particles.iter().flat_map(|p| p.frames.iter())
    }

    pub fn frame_count(&self) -> u64 {
        self.particles.iter().map(|p| p.frames.len() as u64).sum()
    }

    pub fn termination_counts(&self) -> TerminationCounts {
        let mut counts = TerminationCounts::default();
        for p in &self.particles {
            match p.termination {
                Termination::ExitXReached => counts.exit_x_reached += 1,
                Termination::EscapedY => counts.escaped_y += 1,
                Termination::FramesExhausted => counts.frames_exhausted += 1,
            }
        }
        counts
    }
}

/// Monte Carlo driver: samples, scatters and traces every particle of the beam.
pub struct ScatteringSimulation {
    config: SimulationConfig,
    params: SimParams,
    constants: PhysicalConstants,
    sampler: ImpactSampler,
    /// Base seed; particle `i` draws from `StdRng::seed_from_u64(seed + i)`.
    seed: u64,
}

impl ScatteringSimulation {
    /// Creates a new simulation. Without a configured seed, the clock supplies one.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let seed = match config.run.seed {
            Some(seed) => seed,
            None => {
                let seed = clock_seed();
                info!("No seed configured; seeding from the clock with {}.", seed);
                seed
            }
        };
        Self::with_seed(config, seed)
    }

    /// Creates a simulation with an explicit base seed, ignoring `config.run.seed`.
    pub fn with_seed(config: SimulationConfig, seed: u64) -> Result<Self> {
        let params = config.get_sim_params();
        let constants = config.physical_constants();
        let sampler = ImpactSampler::new(&params)?;
        Ok(Self { config, params, constants, sampler, seed })
    }

    /// Runs every particle in parallel. Each particle owns its generator, so the
    /// result depends only on the seed and never on thread scheduling.
    pub fn run(&self) -> SimulationOutput {
        let params = &self.params;
        let sampler = &self.sampler;
        let seed = self.seed;

        debug!("Simulating {} particles with base seed {}.", params.particle_count, seed);

        let particles: Vec<ParticleRun> = (0..params.particle_count)
            .into_par_iter()
            .map(|particle| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(particle as u64));
                let outcome = sample_particle(sampler, &mut rng, params);
                let trajectory = synthesize(particle, &outcome, params);

                trace!(
                    "Particle {}: b = {:e} m, theta = {:.6} deg, {} post-foil frames, {:?}",
                    particle,
                    outcome.geometry.impact_parameter,
                    outcome.theta_deg,
                    trajectory.post_foil_len(params),
                    trajectory.termination
                );

                ParticleRun {
                    angle: AngleRecord { particle, theta_deg: outcome.theta_deg },
                    frames: trajectory.frames,
                    termination: trajectory.termination,
                }
            })
            .collect(); // Indexed collect keeps particle order

        SimulationOutput { particles }
    }

    /// Aggregates a finished run into a summary.
    pub fn summarize(&self, output: &SimulationOutput) -> ScatteringSummary {
        let angles: Vec<f64> = output.angles().map(|a| a.theta_deg).collect();
        let histogram = AngularHistogram::from_angles(angles.iter().copied(), self.config.output.histogram_bins);

        let finite: Vec<f64> = angles.iter().copied().filter(|a| a.is_finite()).collect();
        let mean_theta_deg = if finite.is_empty() {
            0.0
        } else {
            finite.iter().sum::<f64>() / finite.len() as f64
        };
        let max_theta_deg = finite.iter().copied().fold(0.0, f64::max);
        let backscattered = finite.iter().filter(|&&a| a > 90.0).count() as u32;

        ScatteringSummary {
            seed: self.seed,
            particle_count: self.params.particle_count,
            energy_mev: self.params.energy_mev,
            v0_m_per_s: self.params.v0,
            max_impact_parameter_m: self.params.max_impact_parameter,
            mean_theta_deg,
            max_theta_deg,
            backscattered,
            trajectory_frames: output.frame_count(),
            terminations: output.termination_counts(),
            histogram,
        }
    }

    /// Provides access to the simulation parameters.
    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Provides access to the original simulation configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn constants(&self) -> &PhysicalConstants {
        &self.constants
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

fn clock_seed() -> u64 {
    // Clock before the epoch: fall back to seed 0.
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(particles: u32) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.beam.particle_count = particles;
        config
    }

    #[test]
    fn same_seed_same_records() {
        let a = ScatteringSimulation::with_seed(small_config(200), 99).unwrap().run();
        let b = ScatteringSimulation::with_seed(small_config(200), 99).unwrap().run();

        assert!(a.angles().eq(b.angles()));
        assert!(a.frames().eq(b.frames()));
    }

    #[test]
    fn different_seeds_differ() {
        let a = ScatteringSimulation::with_seed(small_config(50), 1).unwrap().run();
        let b = ScatteringSimulation::with_seed(small_config(50), 2).unwrap().run();
        assert!(!a.angles().eq(b.angles()));
    }

    #[test]
    fn configured_seed_is_used() {
        let mut config = small_config(10);
        config.run.seed = Some(1234);
        let sim = ScatteringSimulation::new(config).unwrap();
        assert_eq!(sim.seed(), 1234);
    }

    #[test]
    fn records_are_grouped_in_particle_order() {
        let sim = ScatteringSimulation::with_seed(small_config(300), 5).unwrap();
        let output = sim.run();

        assert_eq!(output.particles.len(), 300);
        for (i, run) in output.particles.iter().enumerate() {
            assert_eq!(run.angle.particle as usize, i);
            assert!(run.frames.iter().all(|f| f.particle as usize == i));
            assert_eq!(run.frames[0].frame, 0);
            assert!(run.frames.len() >= sim.params().frames_before as usize);
            assert!(run.frames.len() <= (sim.params().frames_before + sim.params().frames_after) as usize);
        }
    }

    #[test]
    fn summary_matches_records() {
        let sim = ScatteringSimulation::with_seed(small_config(500), 17).unwrap();
        let output = sim.run();
        let summary = sim.summarize(&output);

        let t = summary.terminations;
        assert_eq!(t.exit_x_reached + t.escaped_y + t.frames_exhausted, 500);
        assert_eq!(summary.histogram.counts.iter().sum::<u32>() + summary.histogram.non_finite, 500);
        assert_eq!(summary.trajectory_frames, output.frame_count());
        assert_eq!(summary.seed, 17);
        assert!(summary.max_theta_deg <= 180.0);
        assert!(summary.mean_theta_deg <= summary.max_theta_deg);
    }

    #[test]
    fn empty_beam_produces_empty_output() {
        let sim = ScatteringSimulation::with_seed(small_config(0), 3).unwrap();
        let output = sim.run();
        let summary = sim.summarize(&output);
        assert!(output.particles.is_empty());
        assert_eq!(summary.mean_theta_deg, 0.0);
    }
}
