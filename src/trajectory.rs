use crate::physics::ScatteringOutcome;
use rutherford_common::{SimParams, TrajectoryFrame, Vec2};

/// How a particle's post-foil segment ended. Every variant is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// x moved past the exit plane.
    ExitXReached,
    /// |y| moved past the escape bound.
    EscapedY,
    /// All post-foil frames were emitted without leaving the region.
    FramesExhausted,
}

/// Per-particle progress through the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreFoil,
    PostFoil,
    Done(Termination),
}

/// The frames of one particle, pre-foil followed by post-foil, and how it ended.
#[derive(Debug, Clone)]
pub struct Trajectory {
    pub frames: Vec<TrajectoryFrame>,
    pub termination: Termination,
}

impl Trajectory {
    /// Number of frames emitted after the foil.
    pub fn post_foil_len(&self, params: &SimParams) -> usize {
        self.frames.len().saturating_sub(params.frames_before as usize)
    }
}

/// Stop condition checked after each post-foil frame. The exit plane is tested first.
#[inline(always)]
pub fn stop_condition(pos: Vec2, params: &SimParams) -> Option<Termination> {
    if pos.x > params.exit_x {
        Some(Termination::ExitXReached)
    } else if pos.y.abs() > params.escape_y {
        Some(Termination::EscapedY)
    } else {
        None
    }
}

/// Emits the frame sequence for `particle`.
///
/// Before the foil x is interpolated from `start_x` towards `foil_x` in
/// `frames_before` equal steps at constant y0. After it, the position advances by
/// `velocity_after * frame_dt` per frame, frame indices continuing from
/// `frames_before`, until a stop condition holds or `frames_after` frames are out.
pub fn synthesize(particle: u32, outcome: &ScatteringOutcome, params: &SimParams) -> Trajectory {
    let y0 = outcome.geometry.y0;
    let mut frames = Vec::with_capacity((params.frames_before + params.frames_after) as usize);
    let mut phase = Phase::PreFoil;

    loop {
        phase = match phase {
            Phase::PreFoil => {
                let pre_dx = (params.foil_x - params.start_x) / params.frames_before as f64;
                for f in 0..params.frames_before {
                    let x = params.start_x + pre_dx * f as f64;
                    frames.push(TrajectoryFrame { particle, frame: f, x, y: y0 });
                }
                Phase::PostFoil
            }
            Phase::PostFoil => {
                let step = outcome.velocity_after * params.frame_dt;
                let mut pos = Vec2::new(params.foil_x, y0);
                let mut termination = Termination::FramesExhausted;
                for f2 in 0..params.frames_after {
                    pos = pos + step;
                    frames.push(TrajectoryFrame {
                        particle,
                        frame: params.frames_before + f2,
                        x: pos.x,
                        y: pos.y,
                    });
                    if let Some(stop) = stop_condition(pos, params) {
                        termination = stop;
                        break;
                    }
                }
                Phase::Done(termination)
            }
            Phase::Done(termination) => return Trajectory { frames, termination },
        };
    }
}
