use anyhow::{Context, Result};
use log::{debug, warn};
use rayon::prelude::*;
use rutherford_common::{AngleRecord, TrajectoryFrame};
use std::collections::BTreeMap;
use std::path::Path;

/// One particle's path, ready for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub particle: u32,
    /// Scattering angle in degrees, if the angle table listed this particle.
    pub theta_deg: Option<f64>,
    /// Finite (x, y) samples in frame order.
    pub points: Vec<(f64, f64)>,
}

pub fn read_trajectories(path: &Path) -> Result<Vec<TrajectoryFrame>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open trajectory table: {}", path.display()))?;
    let mut frames = Vec::new();
    for (row, record) in reader.deserialize::<TrajectoryFrame>().enumerate() {
        let frame = record.with_context(|| format!("Bad row {} in {}", row + 1, path.display()))?;
        frames.push(frame);
    }
    Ok(frames)
}

pub fn read_angles(path: &Path) -> Result<Vec<AngleRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open angle table: {}", path.display()))?;
    let mut angles = Vec::new();
    for (row, record) in reader.deserialize::<AngleRecord>().enumerate() {
        let angle = record.with_context(|| format!("Bad row {} in {}", row + 1, path.display()))?;
        angles.push(angle);
    }
    Ok(angles)
}

/// Groups frames by particle, sorted by frame index, and attaches each particle's
/// angle. Non-finite samples are dropped.
pub fn build_tracks(frames: &[TrajectoryFrame], angles: &[AngleRecord]) -> Vec<Track> {
    let mut grouped: BTreeMap<u32, Vec<&TrajectoryFrame>> = BTreeMap::new();
    for frame in frames {
        grouped.entry(frame.particle).or_default().push(frame);
    }
    let theta_by_particle: BTreeMap<u32, f64> =
        angles.iter().map(|a| (a.particle, a.theta_deg)).collect();

    let tracks: Vec<Track> = grouped
        .into_par_iter()
        .map(|(particle, mut group)| {
            group.sort_by_key(|f| f.frame);
            let points: Vec<(f64, f64)> = group
                .iter()
                .filter(|f| f.x.is_finite() && f.y.is_finite())
                .map(|f| (f.x, f.y))
                .collect();
            if points.len() < group.len() {
                debug!("Particle {}: dropped {} non-finite samples.", particle, group.len() - points.len());
            }
            Track { particle, theta_deg: theta_by_particle.get(&particle).copied(), points }
        })
        .collect();

    let missing = tracks.iter().filter(|t| t.theta_deg.is_none()).count();
    if missing > 0 {
        warn!("{} particles have trajectories but no angle record.", missing);
    }
    tracks
}

/// Axis ranges covering every point, padded by 5% on each side.
pub fn bounds(tracks: &[Track]) -> Option<((f64, f64), (f64, f64))> {
    let mut points = tracks.iter().flat_map(|t| t.points.iter());
    let &(x0, y0) = points.next()?;
    let (mut x_min, mut x_max, mut y_min, mut y_max) = (x0, x0, y0, y0);
    for &(x, y) in points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    Some((pad(x_min, x_max), pad(y_min, y_max)))
}

fn pad(min: f64, max: f64) -> (f64, f64) {
    let span = max - min;
    if span > 0.0 {
        (min - 0.05 * span, max + 0.05 * span)
    } else {
        let half = if min != 0.0 { min.abs() * 0.5 } else { 1e-12 };
        (min - half, max + half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn frame(particle: u32, frame: u32, x: f64, y: f64) -> TrajectoryFrame {
        TrajectoryFrame { particle, frame, x, y }
    }

    #[test]
    fn reads_tables_written_by_the_engine() {
        let dir = tempfile::tempdir().unwrap();
        let traj_path = dir.path().join("trajectories.csv");
        let angle_path = dir.path().join("angles.csv");

        let mut traj = std::fs::File::create(&traj_path).unwrap();
        write!(traj, "particle,frame,x_m,y_m\n0,0,-6.000000e-14,1.000000e-10\n0,1,1.553104e-10,1.000000e-10\n").unwrap();
        let mut angles = std::fs::File::create(&angle_path).unwrap();
        write!(angles, "particle,theta_deg\n0,0.02607123\n1,nan\n").unwrap();

        let frames = read_trajectories(&traj_path).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1], frame(0, 1, 1.553104e-10, 1e-10));

        let angles = read_angles(&angle_path).unwrap();
        assert_eq!(angles[0].theta_deg, 0.02607123);
        assert!(angles[1].theta_deg.is_nan());
    }

    #[test]
    fn missing_table_is_an_error() {
        let err = read_angles(Path::new("/nonexistent/angles.csv")).unwrap_err();
        assert!(err.to_string().contains("Failed to open angle table"));
    }

    #[test]
    fn tracks_are_grouped_sorted_and_filtered() {
        let frames = [
            frame(1, 1, 2.0, 2.0),
            frame(0, 0, 0.0, 0.0),
            frame(1, 0, 1.0, 1.0),
            frame(0, 1, f64::NAN, 0.5),
        ];
        let angles = [AngleRecord { particle: 1, theta_deg: 12.5 }];
        let tracks = build_tracks(&frames, &angles);

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].particle, 0);
        assert_eq!(tracks[0].points, vec![(0.0, 0.0)]);
        assert_eq!(tracks[0].theta_deg, None);
        assert_eq!(tracks[1].points, vec![(1.0, 1.0), (2.0, 2.0)]);
        assert_eq!(tracks[1].theta_deg, Some(12.5));
    }

    #[test]
    fn bounds_are_padded() {
        let tracks = [Track { particle: 0, theta_deg: None, points: vec![(0.0, -1.0), (10.0, 1.0)] }];
        let ((x0, x1), (y0, y1)) = bounds(&tracks).unwrap();
        assert_eq!((x0, x1), (-0.5, 10.5));
        assert!((y0 + 1.1).abs() < 1e-12 && (y1 - 1.1).abs() < 1e-12);
    }

    #[test]
    fn degenerate_bounds_are_widened() {
        let tracks = [Track { particle: 0, theta_deg: None, points: vec![(0.0, 2.0)] }];
        let ((x0, x1), (y0, y1)) = bounds(&tracks).unwrap();
        assert!(x0 < x1);
        assert_eq!((y0, y1), (1.0, 3.0));
        assert!(bounds(&[]).is_none());
    }
}
