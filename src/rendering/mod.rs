//! Drawing intents for the external canvas.
//!
//! The core never touches pixels: [`Painter`] turns a [`SessionView`] into
//! calls on a [`RenderSurface`]. Any window or image backend can implement
//! the surface.

mod raster;

pub use raster::ImageSurface;

use glam::Vec2;
use std::time::Duration;

use crate::curve::rose_curve;
use crate::features::{lerp, FeatureSample};
use crate::params::{InstallationConfig, SessionTiming};
use crate::session::{SessionState, SessionView};
use crate::stats::SessionStats;

/// Colour as linear RGB in 0..1
pub type Rgb = [f32; 3];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgb,
    pub alpha: f32,
    /// Line width (pixels)
    pub width: f32,
}

impl StrokeStyle {
    /// Cool blue for quiet input warming to coral as it gets louder,
    /// lifted toward white by treble
    pub fn from_sample(sample: &FeatureSample, alpha: f32) -> Self {
        const COOL: Rgb = [0.35, 0.55, 1.0];
        const WARM: Rgb = [1.0, 0.45, 0.35];
        let lift = sample.high * 0.3;
        let color = std::array::from_fn(|i| {
            let base = lerp(COOL[i], WARM[i], sample.volume);
            lerp(base, 1.0, lift)
        });
        Self {
            color,
            alpha,
            width: 1.5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    /// Glyph height (pixels)
    pub size: f32,
    pub color: Rgb,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 24.0,
            color: [1.0, 1.0, 1.0],
        }
    }
}

/// Fire-and-forget drawing target
pub trait RenderSurface {
    /// Draw a closed polyline
    fn draw_polyline(&mut self, points: &[Vec2], stroke: &StrokeStyle);

    /// Draw text with its baseline-left corner at `position`
    fn draw_text(&mut self, text: &str, position: Vec2, style: &TextStyle);

    /// Draw the named asset with its top-left corner at `position`
    fn draw_image(&mut self, key: &str, position: Vec2, size: Vec2);
}

/// Asset key of the idle start prompt
pub const START_IMAGE: &str = "start";

/// Turns session snapshots into drawing intents
#[derive(Debug, Clone)]
pub struct Painter {
    bounds: Vec2,
    entrance: Duration,
    entrance_alpha: f32,
    slide_px: f32,
    margin: f32,
    /// Edge length of a sound-type icon at full entrance (pixels)
    icon_size: f32,
}

impl Painter {
    pub fn new(config: &InstallationConfig) -> Self {
        Self {
            bounds: Vec2::new(
                config.render.canvas_width as f32,
                config.render.canvas_height as f32,
            ),
            entrance: config.placement.entrance,
            entrance_alpha: config.placement.entrance_alpha,
            slide_px: slide_distance(&config.timing),
            margin: 20.0,
            icon_size: 48.0,
        }
    }

    pub fn paint(&self, view: &SessionView<'_>, surface: &mut dyn RenderSurface) {
        match view.state {
            SessionState::Idle => {
                let size = Vec2::new(120.0, 60.0);
                surface.draw_image(START_IMAGE, (self.bounds - size) * 0.5, size);
            }
            SessionState::Recording => {
                self.paint_shapes(view, surface, Vec2::ZERO, 1.0);
                self.paint_live(view, surface);
            }
            SessionState::Finished => {
                self.paint_shapes(view, surface, Vec2::ZERO, 1.0);
                self.paint_icons(view, surface);
                self.paint_captions(view, surface);
            }
            SessionState::ExitAnimating => {
                let p = view.exit_progress.unwrap_or(1.0);
                let fade = 1.0 - p;
                if fade > 0.0 {
                    let offset = Vec2::new(0.0, self.slide_px * p * p * p);
                    self.paint_shapes(view, surface, offset, fade);
                }
            }
        }
    }

    fn paint_shapes(
        &self,
        view: &SessionView<'_>,
        surface: &mut dyn RenderSurface,
        offset: Vec2,
        fade: f32,
    ) {
        for shape in view.shapes {
            let entrance = shape.entrance(view.now, self.entrance, self.entrance_alpha);
            let alpha = entrance.alpha * fade;
            if entrance.scale <= 0.0 || alpha <= 0.0 {
                continue;
            }
            let points: Vec<Vec2> = shape
                .outline(entrance.scale)
                .into_iter()
                .map(|p| p + offset)
                .collect();
            surface.draw_polyline(&points, &StrokeStyle::from_sample(&shape.sample, alpha));
        }
    }

    /// One icon per shape, centred on it, keyed by its sound type.
    /// Surfaces skip keys they have no asset for.
    fn paint_icons(&self, view: &SessionView<'_>, surface: &mut dyn RenderSurface) {
        for shape in view.shapes {
            let entrance = shape.entrance(view.now, self.entrance, self.entrance_alpha);
            if entrance.scale <= 0.0 {
                continue;
            }
            let size = Vec2::splat(self.icon_size * entrance.scale);
            surface.draw_image(shape.kind.asset_key(), shape.position - size * 0.5, size);
        }
    }

    /// Evolving curve at the canvas centre, plus the raw level readout
    fn paint_live(&self, view: &SessionView<'_>, surface: &mut dyn RenderSurface) {
        let (Some(params), Some(sample), Some(level)) = (view.live_params, view.latest, view.level)
        else {
            return;
        };
        let center = self.bounds * 0.5;
        let points: Vec<Vec2> = rose_curve(&params, 1.0)
            .into_iter()
            .map(|p| p + center)
            .collect();
        surface.draw_polyline(&points, &StrokeStyle::from_sample(&sample, 1.0));
        surface.draw_text(
            &format!("level: {:.3}", level),
            Vec2::new(self.margin, 40.0),
            &TextStyle::default(),
        );
    }

    /// Date stamp bottom-left, averages just above it
    fn paint_captions(&self, view: &SessionView<'_>, surface: &mut dyn RenderSurface) {
        let style = TextStyle::default();
        let baseline = self.bounds.y - self.margin;
        if let Some(stats) = view.stats {
            surface.draw_text(
                &stats_line(stats),
                Vec2::new(self.margin, baseline - style.size * 1.25),
                &TextStyle {
                    size: 16.0,
                    ..style
                },
            );
        }
        if let Some(date) = view.date_text {
            surface.draw_text(date, Vec2::new(self.margin, baseline), &style);
        }
    }
}

fn slide_distance(timing: &SessionTiming) -> f32 {
    timing.exit.as_ref().map(|e| e.slide_px).unwrap_or(0.0)
}

/// One-line summary of an episode's averages
pub fn stats_line(stats: &SessionStats) -> String {
    format!(
        "high {:.2}  low {:.2}  volume {:.2}  quiet {:.2}  distance {:.2}  near {:.2}",
        stats.high, stats.low, stats.volume, stats.quiet, stats.distance, stats.near
    )
}
