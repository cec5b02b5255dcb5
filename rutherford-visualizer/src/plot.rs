use crate::tables::{bounds, Track};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use plotters::prelude::*;
use rutherford_common::AngularHistogram;
use std::path::Path;

/// Number of previous samples drawn behind each particle in the animation.
const TRAIL_LEN: usize = 6;

const FOIL_COLOR: RGBColor = RGBColor(212, 175, 55);
const NUCLEUS_COLOR: RGBColor = RGBColor(255, 207, 77);
const EXPECTED_COLOR: RGBColor = RGBColor(255, 139, 58);

/// Shared drawing settings.
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub text: RGBColor,
    pub bars: RGBColor,
    /// Foil plane x-coordinate (m).
    pub foil_x: f64,
}

/// Picks black or white text for legibility on `bg`.
pub fn text_color_for(bg: RGBColor) -> RGBColor {
    let luminance = 0.299 * bg.0 as f32 + 0.587 * bg.1 as f32 + 0.114 * bg.2 as f32;
    if luminance > 128.0 {
        BLACK
    } else {
        WHITE
    }
}

fn progress_bar(len: u64, what: &str) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg} ({percent}%) [{eta}]")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar.set_message(what.to_string());
    bar
}

fn label_formatter(v: &f64) -> String {
    format!("{:.1e}", v)
}

/// Draws every track as a polyline on one chart, with the foil plane and nucleus.
pub fn render_trajectories(
    path: &Path,
    tracks: &[Track],
    colors: &[RGBColor],
    style: &PlotStyle,
) -> Result<()> {
    let Some(((x0, x1), (y0, y1))) = bounds(tracks) else {
        warn!("No finite trajectory samples; skipping {}.", path.display());
        return Ok(());
    };

    let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
    root.fill(&style.background)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Rutherford scattering trajectories", ("sans-serif", 22).into_font().color(&style.text))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_desc("x (m)")
        .y_desc("y (m)")
        .x_label_formatter(&label_formatter)
        .y_label_formatter(&label_formatter)
        .label_style(("sans-serif", 12).into_font().color(&style.text))
        .axis_desc_style(("sans-serif", 14).into_font().color(&style.text))
        .draw()?;

    chart.draw_series(LineSeries::new(vec![(style.foil_x, y0), (style.foil_x, y1)], FOIL_COLOR.stroke_width(3)))?;
    chart.draw_series(std::iter::once(Circle::new((style.foil_x, 0.0), 6, NUCLEUS_COLOR.filled())))?;

    let bar = progress_bar(tracks.len() as u64, "trajectories");
    for (track, color) in tracks.iter().zip(colors) {
        chart.draw_series(LineSeries::new(track.points.iter().copied(), color))?;
        bar.inc(1);
    }
    bar.finish_with_message("trajectories drawn");

    root.present()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Trajectory plot saved to {}", path.display());
    Ok(())
}

/// Draws the simulated angular histogram as bars with the Rutherford expectation
/// overlaid at the bin centres.
pub fn render_histogram(path: &Path, histogram: &AngularHistogram, style: &PlotStyle) -> Result<()> {
    let max_count = histogram.counts.iter().copied().max().unwrap_or(0) as f64;
    let max_expected = histogram.expected.iter().copied().fold(0.0, f64::max);
    let y_max = (max_count.max(max_expected) * 1.1).max(1.0);

    let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
    root.fill(&style.background)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Scattering angle distribution", ("sans-serif", 22).into_font().color(&style.text))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..180.0, 0.0..y_max)?;

    chart
        .configure_mesh()
        .x_desc("theta (deg)")
        .y_desc("particles")
        .label_style(("sans-serif", 12).into_font().color(&style.text))
        .axis_desc_style(("sans-serif", 14).into_font().color(&style.text))
        .draw()?;

    let width = histogram.bin_width_deg;
    let bars = style.bars;
    chart
        .draw_series(histogram.counts.iter().enumerate().map(|(i, &count)| {
            let left = i as f64 * width;
            Rectangle::new([(left, 0.0), (left + width * 0.9, count as f64)], bars.filled())
        }))?
        .label("simulated")
        .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], bars.filled()));

    chart
        .draw_series(LineSeries::new(
            histogram.expected.iter().enumerate().map(|(i, &e)| (histogram.bin_center_deg(i), e)),
            EXPECTED_COLOR.stroke_width(2),
        ))?
        .label("Rutherford expectation")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 12, y)], EXPECTED_COLOR.stroke_width(2)));

    chart
        .configure_series_labels()
        .label_font(("sans-serif", 12).into_font().color(&style.text))
        .border_style(&style.text)
        .draw()?;

    root.present()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Histogram saved to {}", path.display());
    Ok(())
}

/// Animation frame indices to draw, every `stride`-th up to the longest track.
pub fn animation_frames(tracks: &[Track], stride: usize) -> Vec<usize> {
    let longest = tracks.iter().map(|t| t.points.len()).max().unwrap_or(0);
    (0..longest).step_by(stride.max(1)).collect()
}

/// Index of the sample shown at animation frame `frame`; tracks that already ended
/// stay on their last sample.
pub fn sample_at(track: &Track, frame: usize) -> Option<usize> {
    if track.points.is_empty() {
        None
    } else {
        Some(frame.min(track.points.len() - 1))
    }
}

/// Renders an animated GIF of particle positions with short trails.
pub fn render_animation(
    path: &Path,
    tracks: &[Track],
    colors: &[RGBColor],
    style: &PlotStyle,
    stride: usize,
    frame_delay_ms: u32,
) -> Result<()> {
    let Some(((x0, x1), (y0, y1))) = bounds(tracks) else {
        warn!("No finite trajectory samples; skipping {}.", path.display());
        return Ok(());
    };
    let frames = animation_frames(tracks, stride);

    let root = BitMapBackend::gif(path, (style.width, style.height), frame_delay_ms)
        .with_context(|| format!("Failed to create {}", path.display()))?
        .into_drawing_area();

    let bar = progress_bar(frames.len() as u64, "frames");
    for &frame in &frames {
        root.fill(&style.background)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(format!("frame {}", frame), ("sans-serif", 16).into_font().color(&style.text))
            .margin(12)
            .build_cartesian_2d(x0..x1, y0..y1)?;

        chart.draw_series(LineSeries::new(vec![(style.foil_x, y0), (style.foil_x, y1)], FOIL_COLOR.stroke_width(3)))?;
        chart.draw_series(std::iter::once(Circle::new((style.foil_x, 0.0), 6, NUCLEUS_COLOR.filled())))?;

        for (track, color) in tracks.iter().zip(colors) {
            let Some(idx) = sample_at(track, frame) else { continue };
            let trail_start = idx.saturating_sub(TRAIL_LEN);
            chart.draw_series(LineSeries::new(track.points[trail_start..=idx].iter().copied(), color))?;
            chart.draw_series(std::iter::once(Circle::new(track.points[idx], 3, color.filled())))?;
        }

        root.present()?;
        bar.inc(1);
    }
    bar.finish_with_message("animation encoded");
    info!("Animation saved to {} ({} frames)", path.display(), frames.len());
    Ok(())
}
