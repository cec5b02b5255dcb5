use crate::simulation::SimulationOutput;
use anyhow::{Context, Result};
use log::info;
use rutherford_common::{AngleRecord, OutputConfig, ScatteringSummary, SummaryFormat, TrajectoryFrame};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const TRAJECTORY_HEADER: [&str; 4] = ["particle", "frame", "x_m", "y_m"];
pub const ANGLE_HEADER: [&str; 2] = ["particle", "theta_deg"];

/// Formats like C's `%e`: six fractional digits and a signed exponent of at least
/// two digits (`-6.000000e-14`, `0.000000e+00`).
pub fn format_scientific(value: f64) -> String {
    if !value.is_finite() {
        return format_non_finite(value);
    }
    let formatted = format!("{:.6e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exponent.abs())
        }
        None => formatted,
    }
}

/// Fixed notation with eight decimals (`180.00000000`).
pub fn format_fixed8(value: f64) -> String {
    if !value.is_finite() {
        return format_non_finite(value);
    }
    format!("{:.8}", value)
}

fn format_non_finite(value: f64) -> String {
    if value.is_nan() {
        if value.is_sign_negative() {
            "-nan".to_string()
        } else {
            "nan".to_string()
        }
    } else if value.is_sign_negative() {
        "-inf".to_string()
    } else {
        "inf".to_string()
    }
}

fn csv_writer<W: Write>(sink: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(sink)
}

/// Writes the trajectory table: header, then one row per frame in the given order.
pub fn write_trajectories<'a, W, I>(sink: W, frames: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a TrajectoryFrame>,
{
    let mut writer = csv_writer(sink);
    writer.write_record(TRAJECTORY_HEADER)?;
    for f in frames {
        writer.write_record(&[
            f.particle.to_string(),
            f.frame.to_string(),
            format_scientific(f.x),
            format_scientific(f.y),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the angle table: header, then one row per particle.
pub fn write_angles<'a, W, I>(sink: W, angles: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a AngleRecord>,
{
    let mut writer = csv_writer(sink);
    writer.write_record(ANGLE_HEADER)?;
    for a in angles {
        writer.write_record(&[a.particle.to_string(), format_fixed8(a.theta_deg)])?;
    }
    writer.flush()?;
    Ok(())
}

/// The two output tables, opened up front so that an unwritable destination fails
/// before any particle is simulated.
pub struct TableSink {
    trajectories_path: PathBuf,
    angles_path: PathBuf,
    trajectories: BufWriter<File>,
    angles: BufWriter<File>,
}

impl TableSink {
    pub fn create(output: &OutputConfig) -> Result<Self> {
        let dir = Path::new(&output.directory);
        let trajectories_path = dir.join(&output.trajectories_file);
        let angles_path = dir.join(&output.angles_file);

        let trajectories = File::create(&trajectories_path)
            .with_context(|| format!("Cannot open output file '{}'", trajectories_path.display()))?;
        let angles = File::create(&angles_path)
            .with_context(|| format!("Cannot open output file '{}'", angles_path.display()))?;

        Ok(Self {
            trajectories_path,
            angles_path,
            trajectories: BufWriter::new(trajectories),
            angles: BufWriter::new(angles),
        })
    }

    /// Writes both tables and closes the files.
    pub fn write(self, output: &SimulationOutput) -> Result<()> {
        write_trajectories(self.trajectories, output.frames())
            .with_context(|| format!("Failed writing '{}'", self.trajectories_path.display()))?;
        info!("Trajectories saved to {} ({} rows)", self.trajectories_path.display(), output.frame_count());

        write_angles(self.angles, output.angles())
            .with_context(|| format!("Failed writing '{}'", self.angles_path.display()))?;
        info!("Angles saved to {} ({} rows)", self.angles_path.display(), output.particles.len());
        Ok(())
    }
}

/// Saves the run summary in the configured format and returns the path written.
pub fn save_summary(summary: &ScatteringSummary, output: &OutputConfig) -> Result<PathBuf> {
    let filename = format!("{}_summary.{}", output.base_filename, output.summary_format.extension());
    let path = Path::new(&output.directory).join(filename);
    let file = File::create(&path)
        .with_context(|| format!("Error creating summary file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);

    match output.summary_format {
        SummaryFormat::Json => serde_json::to_writer_pretty(&mut writer, summary)
            .context("Error serializing summary to JSON")?,
        SummaryFormat::Bincode => bincode::serialize_into(&mut writer, summary)
            .context("Error serializing summary to bincode")?,
        SummaryFormat::Messagepack => rmp_serde::encode::write(&mut writer, summary)
            .context("Error serializing summary to MessagePack")?,
    }
    writer.flush()?;
    Ok(path)
}
