use serde::{Deserialize, Serialize};

/// Distribution of scattering angles over [0, 180] degrees, alongside the counts the
/// Rutherford cross-section predicts for the same number of particles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngularHistogram {
    pub bin_width_deg: f64,
    /// Simulated counts per bin.
    pub counts: Vec<u32>,
    /// Rutherford expectation per bin, normalized to the number of binned angles.
    pub expected: Vec<f64>,
    /// Angles that were NaN or infinite and therefore not binned.
    pub non_finite: u32,
}

impl AngularHistogram {
    /// Bins `angles_deg` into `bins` equal-width bins. Angles at or above 180 degrees
    /// land in the last bin, negative ones in the first.
    pub fn from_angles<I>(angles_deg: I, bins: usize) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let bins = bins.max(1);
        let bin_width_deg = 180.0 / bins as f64;
        let mut counts = vec![0u32; bins];
        let mut non_finite = 0;

        for deg in angles_deg {
            if !deg.is_finite() {
                non_finite += 1;
                continue;
            }
            let bin = (deg / bin_width_deg).floor().max(0.0) as usize;
            counts[bin.min(bins - 1)] += 1;
        }

        let binned: u32 = counts.iter().sum();
        let expected = rutherford_expected_counts(bins, binned as f64);

        AngularHistogram { bin_width_deg, counts, expected, non_finite }
    }

    /// Centre of bin `i` in degrees.
    pub fn bin_center_deg(&self, i: usize) -> f64 {
        (i as f64 + 0.5) * self.bin_width_deg
    }
}

/// Expected counts per bin for dsigma/dOmega ~ 1 / sin^4(theta/2), weighted by the
/// solid angle 2 pi sin(theta) dtheta of each bin and evaluated at the bin centres.
/// The kinematic prefactor cancels in the normalization to `total`.
pub fn rutherford_expected_counts(bins: usize, total: f64) -> Vec<f64> {
    let dtheta = std::f64::consts::PI / bins as f64;
    let weights: Vec<f64> = (0..bins)
        .map(|i| {
            let theta = (i as f64 + 0.5) * dtheta;
            let sin_half = (theta / 2.0).sin();
            if sin_half <= 0.0 {
                return 0.0;
            }
            2.0 * std::f64::consts::PI * theta.sin() * dtheta / sin_half.powi(4)
        })
        .collect();

    let norm: f64 = weights.iter().sum();
    if norm > 0.0 {
        weights.into_iter().map(|w| w / norm * total).collect()
    } else {
        vec![0.0; bins]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bins_by_floor_and_clamps_the_top_edge() {
        let hist = AngularHistogram::from_angles([0.0, 4.9, 5.0, 179.9, 180.0], 36);
        assert_eq!(hist.counts.len(), 36);
        assert_eq!(hist.counts[0], 2);
        assert_eq!(hist.counts[1], 1);
        assert_eq!(hist.counts[35], 2);
        assert_eq!(hist.non_finite, 0);
    }

    #[test]
    fn non_finite_angles_are_counted_separately() {
        let hist = AngularHistogram::from_angles([f64::NAN, 10.0, f64::INFINITY], 18);
        assert_eq!(hist.non_finite, 2);
        assert_eq!(hist.counts.iter().sum::<u32>(), 1);
    }

    #[test]
    fn expectation_sums_to_binned_total() {
        let angles = (0..1000).map(|i| i as f64 * 0.18);
        let hist = AngularHistogram::from_angles(angles, 20);
        let total: f64 = hist.expected.iter().sum();
        assert!((total - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn expectation_falls_with_angle() {
        let expected = rutherford_expected_counts(36, 1.0);
        for pair in expected.windows(2) {
            assert!(pair[0] > pair[1]);
        }
    }

    #[test]
    fn bin_centres() {
        let hist = AngularHistogram::from_angles(std::iter::empty(), 4);
        assert_eq!(hist.bin_center_deg(0), 22.5);
        assert_eq!(hist.bin_center_deg(3), 157.5);
        assert!(hist.expected.iter().all(|&e| e == 0.0));
    }
}
