//! Canvas and shape placement configuration.

use std::time::Duration;

/// Drawing surface configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Canvas width (pixels)
    pub canvas_width: u32,

    /// Canvas height (pixels)
    pub canvas_height: u32,

    /// Target tick rate of the frame loop (frames per second)
    pub fps: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1280,
            canvas_height: 720,
            fps: 60,
        }
    }
}

impl RenderConfig {
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}

/// Placement policy for new shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementMode {
    /// Sequential cells, row-major
    Grid,

    /// Random positions with rejection of near neighbours
    Scatter,
}

/// Shape placement configuration
#[derive(Debug, Clone)]
pub struct PlacementConfig {
    pub mode: PlacementMode,

    /// Grid cell edge (pixels)
    pub cell_size: f32,

    /// Fraction of the cell the shape's maximum extent fills
    pub cell_fill: f32,

    /// Scatter mode: shape diameter range (pixels)
    pub diameter_px: (f32, f32),

    /// Scatter mode: minimum centre-to-centre distance (pixels)
    pub min_distance: f32,

    /// Scatter mode: candidate draws before accepting an overlap
    pub max_attempts: u32,

    /// RNG seed for scatter mode; `None` seeds from the OS
    pub seed: Option<u64>,

    /// Entrance animation length
    pub entrance: Duration,

    /// Stroke alpha reached at the end of the entrance (0..1)
    pub entrance_alpha: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            mode: PlacementMode::Scatter,
            cell_size: 200.0,
            cell_fill: 0.85,
            diameter_px: (80.0, 150.0),
            min_distance: 120.0,
            max_attempts: 100,
            seed: None,
            entrance: Duration::from_millis(1000),
            entrance_alpha: 0.85,
        }
    }
}

impl PlacementConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.cell_size.is_finite() || self.cell_size < 1.0 {
            return Err(format!("Cell size must be at least 1 pixel, got {}", self.cell_size));
        }
        if !(0.0..=1.0).contains(&self.cell_fill) {
            return Err(format!("Cell fill must be in [0, 1], got {}", self.cell_fill));
        }
        let (lo, hi) = self.diameter_px;
        if !lo.is_finite() || !hi.is_finite() || lo <= 0.0 || hi < lo {
            return Err(format!("Diameter range is invalid: {lo}..{hi}"));
        }
        if !self.min_distance.is_finite() || self.min_distance < 0.0 {
            return Err(format!("Min distance must be >= 0, got {}", self.min_distance));
        }
        if self.max_attempts == 0 {
            return Err("Scatter mode needs at least one attempt".to_string());
        }
        Ok(())
    }
}
