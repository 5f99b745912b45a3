//! All episode-scoped data, owned by the session machine.

use std::time::Duration;

use super::Deadline;
use crate::curve::CurveParameterMapper;
use crate::features::{FeatureSample, FeatureSmoother};
use crate::params::InstallationConfig;
use crate::placement::{strategy_for, ShapeInstance, ShapePlacer};
use crate::stats::SessionStats;

/// Buffers, accumulators and timers for the current episode
pub struct SessionContext {
    /// Increments on every episode start; tags deadlines
    pub episode: u64,
    /// Clock time the current episode began recording
    pub started_at: Duration,
    /// Clock time the current phase began
    pub phase_started: Duration,
    pub samples: Vec<FeatureSample>,
    pub shapes: Vec<ShapeInstance>,
    pub stats: Option<SessionStats>,
    pub date_text: Option<String>,
    pub latest: Option<FeatureSample>,
    /// Raw input level of the latest recording tick
    pub latest_level: Option<f32>,
    pub deadline: Option<Deadline>,
    pub smoother: FeatureSmoother,
    pub mapper: CurveParameterMapper,
    pub placer: ShapePlacer,
}

impl SessionContext {
    pub fn new(config: &InstallationConfig) -> Self {
        Self {
            episode: 0,
            started_at: Duration::ZERO,
            phase_started: Duration::ZERO,
            samples: Vec::new(),
            shapes: Vec::new(),
            stats: None,
            date_text: None,
            latest: None,
            latest_level: None,
            deadline: None,
            smoother: FeatureSmoother::new(config.easing.feature_alpha),
            mapper: CurveParameterMapper::new(config.ranges.clone(), config.easing.curve_rate),
            placer: ShapePlacer::new(
                strategy_for(&config.placement),
                config.timing.placement_interval,
                &config.ranges,
            ),
        }
    }

    /// Drop everything the last episode produced, including pending deadlines.
    /// The episode counter is kept so stale deadlines stay distinguishable.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.shapes.clear();
        self.stats = None;
        self.date_text = None;
        self.latest = None;
        self.latest_level = None;
        self.deadline = None;
        self.smoother.reset();
        self.mapper.reset();
        self.placer.disarm();
    }

    /// Schedule the end of the current phase
    pub fn schedule(&mut self, at: Duration) {
        self.deadline = Some(Deadline {
            episode: self.episode,
            at,
        });
    }

    /// Whether this episode's deadline has passed. A deadline left over
    /// from another episode is discarded.
    pub fn deadline_reached(&mut self, now: Duration) -> bool {
        match self.deadline {
            Some(d) if d.episode != self.episode => {
                log::warn!("dropping stale deadline from episode {}", d.episode);
                self.deadline = None;
                false
            }
            Some(d) => now >= d.at,
            None => false,
        }
    }
}
