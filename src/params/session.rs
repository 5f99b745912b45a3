//! Session lifecycle timing and trigger policy.

use std::time::Duration;

/// How an idle installation decides to start listening.
///
/// Exactly one policy is active per deployment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerPolicy {
    /// Visitor presses start (`SessionMachine::start_capture`)
    Manual,

    /// Raw input level crossing `threshold` starts a session on its own.
    /// The microphone is opened while idle so the level can be monitored.
    AutoStart { threshold: f32 },
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        Self::Manual
    }
}

/// Slide-and-fade exit played after the hold period
#[derive(Debug, Clone)]
pub struct ExitAnimation {
    /// Slide/fade duration
    pub duration: Duration,

    /// Empty screen kept after the slide before returning to idle
    pub trailing_hold: Duration,

    /// Vertical travel of each shape over the full slide (pixels)
    pub slide_px: f32,
}

impl Default for ExitAnimation {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(2000),
            trailing_hold: Duration::from_millis(1000),
            slide_px: 240.0,
        }
    }
}

/// Fixed durations of one episode
#[derive(Debug, Clone)]
pub struct SessionTiming {
    /// Listening window, measured from episode start
    pub recording: Duration,

    /// How long the finished collage stays on screen
    pub hold: Duration,

    /// Optional exit phase; `None` returns to idle straight after the hold
    pub exit: Option<ExitAnimation>,

    /// Interval between shape snapshots while recording
    pub placement_interval: Duration,

    /// Minimum spacing between audio start attempts while idle under auto-start
    pub device_retry: Duration,

    pub trigger: TriggerPolicy,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            recording: Duration::from_secs(10),
            hold: Duration::from_secs(5),
            exit: Some(ExitAnimation::default()),
            placement_interval: Duration::from_millis(500),
            device_retry: Duration::from_secs(2),
            trigger: TriggerPolicy::default(),
        }
    }
}

impl SessionTiming {
    pub fn validate(&self) -> Result<(), String> {
        if self.recording.is_zero() {
            return Err("Recording window must be longer than zero".to_string());
        }
        if self.placement_interval.is_zero() {
            return Err("Placement interval must be longer than zero".to_string());
        }
        if let TriggerPolicy::AutoStart { threshold } = self.trigger {
            if !(threshold > 0.0 && threshold.is_finite()) {
                return Err(format!("Auto-start threshold must be > 0, got {threshold}"));
            }
        }
        Ok(())
    }
}
