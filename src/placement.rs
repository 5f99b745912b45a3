//! Periodic shape snapshots and where they land on the canvas.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use crate::curve::{rose_curve, CurveParams};
use crate::features::{FeatureSample, SoundType};
use crate::params::{CurveRanges, PlacementConfig, PlacementMode};

/// One placed curve. Never mutated after placement; only its drawn
/// appearance changes with time since `birth`.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeInstance {
    pub params: CurveParams,
    /// Features at the moment of placement (drives stroke colour)
    pub sample: FeatureSample,
    /// Sound type at placement (picks the icon)
    pub kind: SoundType,
    /// Centre on the canvas (pixels)
    pub position: Vec2,
    /// Uniform scale passed to [`rose_curve`]
    pub size: f32,
    /// Placement time on the session clock
    pub birth: Duration,
}

/// Visual entrance state at some instant
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entrance {
    pub scale: f32,
    pub alpha: f32,
}

impl ShapeInstance {
    /// Scale 0→1 with cubic ease-out and alpha 0→`target_alpha`, both over `duration`
    pub fn entrance(&self, now: Duration, duration: Duration, target_alpha: f32) -> Entrance {
        let elapsed = now.saturating_sub(self.birth);
        let t = if duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f32() / duration.as_secs_f32()).min(1.0)
        };
        Entrance {
            scale: ease_out_cubic(t),
            alpha: target_alpha * t,
        }
    }

    /// Canvas-space polyline at the given entrance scale
    pub fn outline(&self, scale: f32) -> Vec<Vec2> {
        rose_curve(&self.params, self.size * scale)
            .into_iter()
            .map(|p| p + self.position)
            .collect()
    }
}

pub fn ease_out_cubic(t: f32) -> f32 {
    let u = 1.0 - t.clamp(0.0, 1.0);
    1.0 - u * u * u
}

/// Where a new shape goes and how large it is drawn
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub center: Vec2,
    pub diameter: f32,
}

/// Chooses the slot for the `index`-th shape of an episode
pub trait PlacementStrategy {
    fn place(&mut self, index: usize, placed: &[ShapeInstance], bounds: Vec2) -> Placement;
}

/// Row-major cells of `cell_size`, centred on the canvas, wrapping back to
/// the first cell once all are used
#[derive(Debug, Clone)]
pub struct GridPlacement {
    pub cell_size: f32,
    pub fill: f32,
}

impl GridPlacement {
    /// Whole cells that fit, at least one and at most one per pixel
    fn dims(&self, bounds: Vec2) -> (usize, usize) {
        let fit = |extent: f32| {
            let n = (extent / self.cell_size).floor();
            if n.is_nan() {
                1
            } else {
                n.clamp(1.0, extent.max(1.0)) as usize
            }
        };
        (fit(bounds.x), fit(bounds.y))
    }
}

impl PlacementStrategy for GridPlacement {
    fn place(&mut self, index: usize, _placed: &[ShapeInstance], bounds: Vec2) -> Placement {
        let (cols, rows) = self.dims(bounds);
        let slot = index % cols.saturating_mul(rows);
        let (col, row) = (slot % cols, slot / cols);
        let grid = Vec2::new(cols as f32, rows as f32) * self.cell_size;
        let origin = (bounds - grid) * 0.5;
        Placement {
            center: origin + (Vec2::new(col as f32, row as f32) + 0.5) * self.cell_size,
            diameter: self.cell_size * self.fill,
        }
    }
}

/// Uniform random centres, redrawn while too close to an earlier shape
pub struct ScatterPlacement {
    rng: StdRng,
    diameter: (f32, f32),
    min_distance: f32,
    max_attempts: u32,
}

impl ScatterPlacement {
    pub fn new(config: &PlacementConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            diameter: config.diameter_px,
            min_distance: config.min_distance,
            max_attempts: config.max_attempts.max(1),
        }
    }

    fn candidate(&mut self, bounds: Vec2) -> Placement {
        let (lo, hi) = self.diameter;
        let diameter = if hi > lo {
            self.rng.gen_range(lo..=hi)
        } else {
            lo
        };
        let r = diameter * 0.5;
        let mut axis = |extent: f32| {
            if extent - r > r {
                self.rng.gen_range(r..extent - r)
            } else {
                extent * 0.5
            }
        };
        let center = Vec2::new(axis(bounds.x), axis(bounds.y));
        Placement { center, diameter }
    }
}

impl PlacementStrategy for ScatterPlacement {
    fn place(&mut self, _index: usize, placed: &[ShapeInstance], bounds: Vec2) -> Placement {
        let mut candidate = self.candidate(bounds);
        for attempt in 1..=self.max_attempts {
            let clear = placed
                .iter()
                .all(|s| s.position.distance(candidate.center) >= self.min_distance);
            if clear {
                return candidate;
            }
            if attempt < self.max_attempts {
                candidate = self.candidate(bounds);
            }
        }
        log::debug!(
            "no free spot after {} attempts, overlapping at ({:.0}, {:.0})",
            self.max_attempts,
            candidate.center.x,
            candidate.center.y
        );
        candidate
    }
}

/// Build the strategy selected by `config.mode`
pub fn strategy_for(config: &PlacementConfig) -> Box<dyn PlacementStrategy> {
    match config.mode {
        PlacementMode::Grid => Box::new(GridPlacement {
            cell_size: config.cell_size,
            fill: config.cell_fill,
        }),
        PlacementMode::Scatter => Box::new(ScatterPlacement::new(config)),
    }
}

/// Emits a [`ShapeInstance`] every `interval` while recording
pub struct ShapePlacer {
    strategy: Box<dyn PlacementStrategy>,
    interval: Duration,
    /// Radius a size-1.0 curve can reach; maps pixel diameters to scale
    max_extent: f32,
    next_due: Option<Duration>,
}

impl ShapePlacer {
    pub fn new(
        strategy: Box<dyn PlacementStrategy>,
        interval: Duration,
        ranges: &CurveRanges,
    ) -> Self {
        Self {
            strategy,
            interval,
            max_extent: ranges.max_extent().max(f32::EPSILON),
            next_due: None,
        }
    }

    /// Arm for an episode starting at `start`; first snapshot one interval later
    pub fn reset(&mut self, start: Duration) {
        self.next_due = Some(start + self.interval);
    }

    pub fn disarm(&mut self) {
        self.next_due = None;
    }

    /// Place a shape if the interval has elapsed. Missed intervals are
    /// skipped rather than replayed, so a stalled frame never emits a burst.
    pub fn poll(
        &mut self,
        now: Duration,
        params: CurveParams,
        sample: FeatureSample,
        kind: SoundType,
        shapes: &[ShapeInstance],
        bounds: Vec2,
    ) -> Option<ShapeInstance> {
        let due = self.next_due?;
        if now < due {
            return None;
        }
        let mut next = due + self.interval;
        while next <= now {
            next += self.interval;
        }
        self.next_due = Some(next);

        let slot = self.strategy.place(shapes.len(), shapes, bounds);
        Some(ShapeInstance {
            params,
            sample,
            kind,
            position: slot.center,
            size: slot.diameter / (2.0 * self.max_extent),
            birth: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> CurveParams {
        CurveParams::resting(&CurveRanges::default())
    }

    fn shape_at(x: f32, y: f32) -> ShapeInstance {
        ShapeInstance {
            params: params(),
            sample: FeatureSample::default(),
            kind: SoundType::Quiet,
            position: Vec2::new(x, y),
            size: 0.2,
            birth: Duration::ZERO,
        }
    }

    #[test]
    fn test_grid_is_row_major_and_centred() {
        let mut grid = GridPlacement {
            cell_size: 200.0,
            fill: 0.5,
        };
        let bounds = Vec2::new(1000.0, 400.0);

        // 5 columns × 2 rows, exactly filling the canvas
        let first = grid.place(0, &[], bounds);
        assert_eq!(first.center, Vec2::new(100.0, 100.0));
        assert_eq!(first.diameter, 100.0);

        assert_eq!(grid.place(4, &[], bounds).center, Vec2::new(900.0, 100.0));
        assert_eq!(grid.place(5, &[], bounds).center, Vec2::new(100.0, 300.0));

        // Wraps once every cell is used
        assert_eq!(grid.place(10, &[], bounds).center, first.center);
    }

    #[test]
    fn test_grid_centres_leftover_margin() {
        let mut grid = GridPlacement {
            cell_size: 200.0,
            fill: 1.0,
        };
        let p = grid.place(0, &[], Vec2::new(1100.0, 500.0));
        // 5 × 2 cells leave 100 px horizontally, 100 px vertically
        assert_eq!(p.center, Vec2::new(150.0, 150.0));
    }

    #[test]
    fn test_grid_with_subpixel_cells_does_not_overflow() {
        let mut grid = GridPlacement {
            cell_size: 1e-30,
            fill: 1.0,
        };
        let bounds = Vec2::new(1280.0, 720.0);
        // At most one cell per pixel
        let p = grid.place(1280 * 720 + 3, &[], bounds);
        assert!(p.center.x.is_finite() && p.center.y.is_finite());
        assert_eq!(grid.dims(bounds), (1280, 720));
    }

    #[test]
    fn test_scatter_keeps_minimum_distance_when_room() {
        let config = PlacementConfig {
            seed: Some(3),
            ..PlacementConfig::default()
        };
        let mut scatter = ScatterPlacement::new(&config);
        let bounds = Vec2::new(1280.0, 720.0);
        let mut placed: Vec<ShapeInstance> = Vec::new();
        for i in 0..10 {
            let p = scatter.place(i, &placed, bounds);
            let r = p.diameter * 0.5;
            assert!(p.center.x >= r && p.center.x <= bounds.x - r);
            assert!(p.center.y >= r && p.center.y <= bounds.y - r);
            assert!((80.0..=150.0).contains(&p.diameter));
            for s in &placed {
                assert!(s.position.distance(p.center) >= config.min_distance);
            }
            placed.push(shape_at(p.center.x, p.center.y));
        }
    }

    #[test]
    fn test_scatter_accepts_overlap_after_exhausting_attempts() {
        let config = PlacementConfig {
            seed: Some(11),
            min_distance: 10_000.0,
            max_attempts: 5,
            ..PlacementConfig::default()
        };
        let mut scatter = ScatterPlacement::new(&config);
        let placed = vec![shape_at(640.0, 360.0)];
        let p = scatter.place(1, &placed, Vec2::new(1280.0, 720.0));
        assert!(p.center.distance(placed[0].position) < config.min_distance);
    }

    #[test]
    fn test_scatter_is_reproducible_with_seed() {
        let config = PlacementConfig {
            seed: Some(42),
            ..PlacementConfig::default()
        };
        let bounds = Vec2::new(800.0, 600.0);
        let a = ScatterPlacement::new(&config).place(0, &[], bounds);
        let b = ScatterPlacement::new(&config).place(0, &[], bounds);
        assert_eq!(a, b);
    }

    #[test]
    fn test_entrance_eases_in() {
        let shape = ShapeInstance {
            birth: Duration::from_millis(500),
            ..shape_at(0.0, 0.0)
        };
        let dur = Duration::from_millis(1000);

        let e = shape.entrance(Duration::from_millis(500), dur, 0.8);
        assert_eq!(e.scale, 0.0);
        assert_eq!(e.alpha, 0.0);

        let mid = shape.entrance(Duration::from_millis(1000), dur, 0.8);
        assert!((mid.scale - 0.875).abs() < 1e-6);
        assert!((mid.alpha - 0.4).abs() < 1e-6);

        let done = shape.entrance(Duration::from_secs(5), dur, 0.8);
        assert_eq!(done.scale, 1.0);
        assert!((done.alpha - 0.8).abs() < 1e-6);

        // Before birth counts as not yet entered
        assert_eq!(shape.entrance(Duration::ZERO, dur, 0.8).scale, 0.0);
    }

    #[test]
    fn test_placer_fires_on_interval_without_bursts() {
        let grid = GridPlacement {
            cell_size: 100.0,
            fill: 1.0,
        };
        let interval = Duration::from_millis(500);
        let mut placer = ShapePlacer::new(Box::new(grid), interval, &CurveRanges::default());
        let bounds = Vec2::new(400.0, 400.0);
        let sample = FeatureSample::default();
        let kind = SoundType::Quiet;

        // Not armed yet
        assert!(placer
            .poll(Duration::from_secs(1), params(), sample, kind, &[], bounds)
            .is_none());

        placer.reset(Duration::ZERO);
        assert!(placer
            .poll(Duration::from_millis(499), params(), sample, kind, &[], bounds)
            .is_none());
        let shape = placer
            .poll(Duration::from_millis(500), params(), sample, kind, &[], bounds)
            .expect("due at one interval");
        assert_eq!(shape.birth, Duration::from_millis(500));
        assert_eq!(shape.position, Vec2::new(50.0, 50.0));

        // A long stall yields a single shape, then resumes on the grid of intervals
        let shapes = vec![shape];
        assert!(placer
            .poll(Duration::from_millis(2600), params(), sample, kind, &shapes, bounds)
            .is_some());
        assert!(placer
            .poll(Duration::from_millis(2900), params(), sample, kind, &shapes, bounds)
            .is_none());
        assert!(placer
            .poll(Duration::from_millis(3000), params(), sample, kind, &shapes, bounds)
            .is_some());
    }

    #[test]
    fn test_size_maps_diameter_to_curve_scale() {
        let grid = GridPlacement {
            cell_size: 300.0,
            fill: 1.0,
        };
        let ranges = CurveRanges::default();
        let mut placer = ShapePlacer::new(Box::new(grid), Duration::from_millis(500), &ranges);
        placer.reset(Duration::ZERO);
        let shape = placer
            .poll(
                Duration::from_millis(500),
                params(),
                FeatureSample::default(),
                SoundType::Quiet,
                &[],
                Vec2::new(600.0, 600.0),
            )
            .expect("due at one interval");
        assert!((shape.size * 2.0 * ranges.max_extent() - 300.0).abs() < 1e-3);
    }
}
