use anyhow::Result;
use rand::distr::Uniform;
use rand::prelude::*;
use rutherford_common::{SimParams, Vec2};
use std::f64::consts::PI;

/// Above this value of tan(theta/2) the angle is taken as the head-on limit.
pub const TAN_HALF_ANGLE_LIMIT: f64 = 1e300;

/// Where a projectile crosses the foil plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactGeometry {
    /// Impact parameter b (m), in [0, bmax].
    pub impact_parameter: f64,
    /// Transverse offset y0 = sign * b (m).
    pub y0: f64,
}

impl ImpactGeometry {
    /// Maps the two uniform draws onto the target disk.
    ///
    /// `u` in [0, 1) is area-weighted through the square root so that the incoming
    /// flux is uniform over the disk of radius `bmax`; `sign_draw` in [-1, 1) picks
    /// the side of the nucleus.
    #[inline(always)]
    pub fn from_draws(u: f64, sign_draw: f64, bmax: f64) -> Self {
        let b = bmax * u.sqrt();
        let sign = if sign_draw >= 0.0 { 1.0 } else { -1.0 };
        ImpactGeometry { impact_parameter: b, y0: sign * b }
    }
}

/// Draws impact geometries from an injected random source.
#[derive(Debug, Clone)]
pub struct ImpactSampler {
    unit_dist: Uniform<f64>,
    sign_dist: Uniform<f64>,
    bmax: f64,
}

impl ImpactSampler {
    pub fn new(params: &SimParams) -> Result<Self> {
        Ok(Self {
            unit_dist: Uniform::new(0.0, 1.0)?,
            sign_dist: Uniform::new(-1.0, 1.0)?,
            bmax: params.max_impact_parameter,
        })
    }

    /// Draws `u` then the sign, in that order, from `rng`.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> ImpactGeometry {
        let u = self.unit_dist.sample(rng);
        let sign_draw = self.sign_dist.sample(rng);
        ImpactGeometry::from_draws(u, sign_draw, self.bmax)
    }
}

/// Physics outcome of one trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatteringOutcome {
    pub geometry: ImpactGeometry,
    /// Deflection angle in [0, pi] (rad).
    pub theta: f64,
    /// Deflection angle in degrees, as written to the angle table.
    pub theta_deg: f64,
    /// `theta` carrying the sign of the transverse offset.
    pub theta_signed: f64,
    /// Velocity after the foil; same magnitude as before (m/s).
    pub velocity_after: Vec2,
}

/// Rutherford deflection angle for impact parameter `b`:
/// tan(theta/2) = k q1 q2 / (2 E b).
#[inline(always)]
pub fn rutherford_angle(b: f64, params: &SimParams) -> f64 {
    let t2 = params.coulomb_product / (2.0 * params.energy_joule * b);
    if t2 > TAN_HALF_ANGLE_LIMIT {
        PI
    } else {
        2.0 * t2.atan()
    }
}

/// Scatters a projectile crossing the foil at `geometry`.
///
/// The whole deflection is applied at the foil plane and the speed keeps its
/// incoming value v0. Degenerate parameters are not checked; NaN and infinities
/// flow through to the caller.
pub fn scatter(geometry: ImpactGeometry, params: &SimParams) -> ScatteringOutcome {
    let theta = rutherford_angle(geometry.impact_parameter, params);
    let theta_deg = theta * 180.0 / PI;

    // Deflect away from the nucleus: upward for y0 >= 0.
    let theta_signed = if geometry.y0 >= 0.0 { theta } else { -theta };
    let velocity_after = Vec2::from_polar(params.v0, theta_signed);

    ScatteringOutcome { geometry, theta, theta_deg, theta_signed, velocity_after }
}

/// Samples and scatters one particle.
pub fn sample_particle<R: Rng + ?Sized>(
    sampler: &ImpactSampler,
    rng: &mut R,
    params: &SimParams,
) -> ScatteringOutcome {
    scatter(sampler.draw(rng), params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rutherford_common::SimulationConfig;

    fn reference_params() -> SimParams {
        SimulationConfig::default().get_sim_params()
    }

    #[test]
    fn gold_foil_at_one_angstrom() {
        let params = reference_params();
        let geometry = ImpactGeometry { impact_parameter: 1e-10, y0: 1e-10 };
        let outcome = scatter(geometry, &params);

        let expected_deg = 0.02607122918195044;
        assert!((outcome.theta_deg - expected_deg).abs() / expected_deg < 1e-6);
    }

    #[test]
    fn gold_foil_close_approach() {
        let params = reference_params();
        let theta = rutherford_angle(1e-14, &params);
        let theta_deg = theta * 180.0 / PI;
        assert!((theta_deg - 132.5458894251831).abs() / 132.5458894251831 < 1e-6);
    }

    #[test]
    fn zero_impact_parameter_is_head_on() {
        let params = reference_params();
        let outcome = scatter(ImpactGeometry { impact_parameter: 0.0, y0: 0.0 }, &params);
        assert_eq!(outcome.theta, PI);
        assert_eq!(outcome.theta_deg, 180.0);
        assert!(outcome.velocity_after.x < 0.0);
    }

    #[test]
    fn tiny_impact_parameter_hits_overflow_guard() {
        let params = reference_params();
        assert_eq!(rutherford_angle(1e-320, &params), PI);
    }

    #[test]
    fn zero_energy_propagates_non_finite_velocity() {
        let mut params = reference_params();
        params.energy_joule = 0.0;
        params.v0 = 0.0;
        let outcome = scatter(ImpactGeometry { impact_parameter: 1e-12, y0: -1e-12 }, &params);
        // t2 = inf, so the angle saturates rather than failing.
        assert_eq!(outcome.theta, PI);
        assert_eq!(outcome.theta_signed, -PI);
    }

    #[test]
    fn zero_charge_with_zero_b_is_nan() {
        let mut params = reference_params();
        params.coulomb_product = 0.0;
        let outcome = scatter(ImpactGeometry { impact_parameter: 0.0, y0: 0.0 }, &params);
        assert!(outcome.theta_deg.is_nan());
    }

    #[test]
    fn sign_draw_boundary_counts_as_positive() {
        let g = ImpactGeometry::from_draws(0.25, 0.0, 2.0);
        assert_eq!(g.impact_parameter, 1.0);
        assert_eq!(g.y0, 1.0);

        let g = ImpactGeometry::from_draws(0.25, -1e-12, 2.0);
        assert_eq!(g.y0, -1.0);
    }

    #[test]
    fn sampler_is_reproducible_for_a_seed() {
        let params = reference_params();
        let sampler = ImpactSampler::new(&params).unwrap();
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(sample_particle(&sampler, &mut a, &params), sample_particle(&sampler, &mut b, &params));
        }
    }

    #[test]
    fn squared_impact_parameter_is_uniform() {
        // Kolmogorov-Smirnov on b^2 / bmax^2 against Uniform(0, 1).
        let params = reference_params();
        let sampler = ImpactSampler::new(&params).unwrap();
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let n = 20_000;

        let bmax_sq = params.max_impact_parameter * params.max_impact_parameter;
        let mut samples: Vec<f64> = (0..n)
            .map(|_| {
                let b = sampler.draw(&mut rng).impact_parameter;
                assert!((0.0..=params.max_impact_parameter).contains(&b));
                b * b / bmax_sq
            })
            .collect();
        samples.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let d = samples
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let lo = i as f64 / n as f64;
                let hi = (i + 1) as f64 / n as f64;
                (hi - x).max(x - lo)
            })
            .fold(0.0, f64::max);

        // Critical value at alpha = 0.001.
        let critical = 1.95 / (n as f64).sqrt();
        assert!(d < critical, "KS statistic {} exceeds {}", d, critical);
    }

    #[test]
    fn raw_impact_parameter_is_not_uniform() {
        // Area weighting puts three quarters of the particles beyond bmax / 2.
        let params = reference_params();
        let sampler = ImpactSampler::new(&params).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let n = 10_000;
        let outer = (0..n)
            .filter(|_| sampler.draw(&mut rng).impact_parameter > params.max_impact_parameter / 2.0)
            .count();
        let fraction = outer as f64 / n as f64;
        assert!((fraction - 0.75).abs() < 0.03, "outer fraction {}", fraction);
    }

    proptest! {
        #[test]
        fn signed_angle_follows_offset(seed in any::<u64>()) {
            let params = reference_params();
            let sampler = ImpactSampler::new(&params).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = sample_particle(&sampler, &mut rng, &params);

            prop_assert!(outcome.theta >= 0.0 && outcome.theta <= PI);
            prop_assert_eq!(outcome.theta_signed.abs(), outcome.theta);
            prop_assert_eq!(outcome.theta_signed.is_sign_negative(), outcome.geometry.y0 < 0.0);
            prop_assert!(outcome.geometry.impact_parameter <= params.max_impact_parameter);
        }

        #[test]
        fn speed_is_conserved(seed in any::<u64>()) {
            let params = reference_params();
            let sampler = ImpactSampler::new(&params).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = sample_particle(&sampler, &mut rng, &params);

            let speed = outcome.velocity_after.x.hypot(outcome.velocity_after.y);
            prop_assert!((speed - params.v0).abs() / params.v0 < 1e-12);
        }

        #[test]
        fn angle_decreases_with_impact_parameter(
            b1 in 1e-15f64..1e-10,
            factor in 1.001f64..100.0,
        ) {
            let params = reference_params();
            let b2 = b1 * factor;
            prop_assert!(rutherford_angle(b1, &params) > rutherford_angle(b2, &params));
        }
    }
}
