//! Session lifecycle: idle → recording → finished → (exit) → idle.

mod context;
mod machine;

pub use context::SessionContext;
pub use machine::SessionMachine;

use std::fmt;
use std::time::Duration;

use crate::curve::CurveParams;
use crate::features::FeatureSample;
use crate::placement::ShapeInstance;
use crate::stats::SessionStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
    Finished,
    ExitAnimating,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Recording => "recording",
            SessionState::Finished => "finished",
            SessionState::ExitAnimating => "exit-animating",
        };
        f.write_str(name)
    }
}

/// A phase deadline owned by one episode. Deadlines from any other episode
/// are stale and never fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    pub episode: u64,
    pub at: Duration,
}

/// Read-only snapshot handed to the renderer each frame
#[derive(Debug, Clone)]
pub struct SessionView<'a> {
    pub state: SessionState,
    pub episode: u64,
    /// Clock time the view was taken at
    pub now: Duration,
    pub shapes: &'a [ShapeInstance],
    pub stats: Option<&'a SessionStats>,
    pub date_text: Option<&'a str>,
    /// Eased curve params while recording
    pub live_params: Option<CurveParams>,
    /// Most recent raw sample while recording
    pub latest: Option<FeatureSample>,
    /// Raw input level (before gain) of the latest tick while recording
    pub level: Option<f32>,
    /// Fraction of the recording window elapsed (recording only)
    pub recording_progress: Option<f32>,
    /// Fraction of the exit slide elapsed (exit phase only)
    pub exit_progress: Option<f32>,
}
