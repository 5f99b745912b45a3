//! Monotonic time and the wall-clock date stamp.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub trait Clock {
    /// Monotonic time since the clock was created
    fn now(&self) -> Duration;

    /// Human-readable local date and time for the finished collage
    fn date_text(&self) -> String;
}

/// Real time: `Instant` for ticks, local calendar for the stamp
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn date_text(&self) -> String {
        chrono::Local::now().format("%Y/%m/%d %H:%M:%S").to_string()
    }
}

/// Hand-advanced clock. Clones share the same time, so a test can keep one
/// handle while the session owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, dt: Duration) {
        self.now.set(self.now.get() + dt);
    }

    pub fn set(&self, t: Duration) {
        self.now.set(t);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn date_text(&self) -> String {
        // Fixed stamp keeps test output stable
        "2024/01/01 00:00:00".to_string()
    }
}
