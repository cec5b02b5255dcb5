use anyhow::Result;
use clap::Parser;
use env_logger::Builder;
use log::{info, warn, LevelFilter};
use palette::{FromColor, Hsv, Srgb};
use plotters::style::RGBColor;
use rutherford_common::AngularHistogram;
use std::path::PathBuf;
use std::time::Instant;

mod plot;
mod tables;

use plot::{render_animation, render_histogram, render_trajectories, text_color_for, PlotStyle};
use tables::{build_tracks, read_angles, read_trajectories, Track};

/// Command-line arguments for the visualizer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Trajectory table written by the engine
    #[arg(short, long, default_value = "trajectories.csv")]
    trajectories: PathBuf,

    /// Angle table written by the engine
    #[arg(short, long, default_value = "angles.csv")]
    angles: PathBuf,

    /// Directory for the rendered images
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Width of the images in pixels
    #[arg(long, default_value_t = 1024)]
    width: u32,

    /// Height of the images in pixels (defaults to 3/4 of the width)
    #[arg(long)]
    height: Option<u32>,

    /// Number of histogram bins over 0..180 degrees
    #[arg(long, default_value_t = 36)]
    bins: usize,

    /// Draw at most this many trajectories (lowest particle indices first)
    #[arg(long, default_value_t = 500)]
    max_particles: usize,

    /// Foil plane x-coordinate in metres
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    foil_x: f64,

    /// Track color - use "palette" to color by deflection angle, or a specific color name
    /// (black, white, red, green, blue, yellow, cyan, magenta)
    #[arg(long, default_value = "palette")]
    color: String,

    /// Background color - name of the color for the background
    #[arg(long, default_value = "white")]
    bg_color: String,

    /// Also render an animated GIF of the particles
    #[arg(long)]
    animate: bool,

    /// Draw every n-th frame in the animation
    #[arg(long, default_value_t = 1)]
    frame_stride: usize,

    /// Delay between animation frames in milliseconds
    #[arg(long, default_value_t = 40)]
    frame_delay_ms: u32,
}

// Color definitions for named colors (RGB)
const COLOR_MAP: &[(&str, (u8, u8, u8))] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("green", (0, 255, 0)),
    ("blue", (0, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("cyan", (0, 255, 255)),
    ("magenta", (255, 0, 255)),
];

/// Parse a color name to RGB values
fn parse_color(color_name: &str) -> RGBColor {
    for &(name, (r, g, b)) in COLOR_MAP {
        if name.eq_ignore_ascii_case(color_name) {
            return RGBColor(r, g, b);
        }
    }
    // Default to black if color not found
    warn!("Color '{}' not recognized, using black.", color_name);
    RGBColor(0, 0, 0)
}

/// Maps a deflection angle onto a blue (undeflected) to red (backscattered) hue.
/// The square root spreads the many small angles over more of the ramp.
fn angle_color(theta_deg: Option<f64>) -> RGBColor {
    let Some(theta) = theta_deg.filter(|t| t.is_finite()) else {
        return RGBColor(128, 128, 128);
    };
    let fraction = (theta.abs() / 180.0).clamp(0.0, 1.0).sqrt();
    let hue = 220.0 * (1.0 - fraction as f32);
    let hsv: Hsv = Hsv::new(hue, 0.75, 0.9);
    let rgb: Srgb = Srgb::from_color(hsv);
    RGBColor(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

fn track_colors(tracks: &[Track], color: &str) -> Vec<RGBColor> {
    if color.eq_ignore_ascii_case("palette") {
        tracks.iter().map(|t| angle_color(t.theta_deg)).collect()
    } else {
        vec![parse_color(color); tracks.len()]
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    Builder::from_default_env()
        .filter(None, LevelFilter::Info)
        .init();

    run_with_args(args)
}

fn run_with_args(args: Args) -> Result<()> {
    info!("Starting Rutherford Visualizer...");
    info!("Trajectory table: {}", args.trajectories.display());
    info!("Angle table: {}", args.angles.display());

    let start_time = Instant::now();

    // --- Load Tables ---
    let frames = read_trajectories(&args.trajectories)?;
    let angles = read_angles(&args.angles)?;
    info!("Loaded {} trajectory frames and {} angles.", frames.len(), angles.len());

    let mut tracks = build_tracks(&frames, &angles);
    if tracks.len() > args.max_particles {
        info!("Drawing the first {} of {} particles.", args.max_particles, tracks.len());
        tracks.truncate(args.max_particles);
    }

    // --- Set up Style ---
    let background = parse_color(&args.bg_color);
    let style = PlotStyle {
        width: args.width,
        height: args.height.unwrap_or(args.width * 3 / 4),
        background,
        text: text_color_for(background),
        bars: RGBColor(90, 110, 140),
        foil_x: args.foil_x,
    };
    let colors = track_colors(&tracks, &args.color);

    std::fs::create_dir_all(&args.output_dir)?;

    // --- Render ---
    render_trajectories(&args.output_dir.join("trajectories.png"), &tracks, &colors, &style)?;

    let histogram = AngularHistogram::from_angles(angles.iter().map(|a| a.theta_deg), args.bins);
    if histogram.non_finite > 0 {
        warn!("{} non-finite angles left out of the histogram.", histogram.non_finite);
    }
    render_histogram(&args.output_dir.join("histogram.png"), &histogram, &style)?;

    if args.animate {
        render_animation(
            &args.output_dir.join("animation.gif"),
            &tracks,
            &colors,
            &style,
            args.frame_stride,
            args.frame_delay_ms,
        )?;
    }

    info!("Rendering completed in {:.2?}", start_time.elapsed());
    Ok(())
}
