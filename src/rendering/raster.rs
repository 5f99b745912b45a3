//! Software raster surface backed by an RGBA image, for PNG export.

use glam::Vec2;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{RenderSurface, Rgb, StrokeStyle, TextStyle};
use crate::Result;

pub struct ImageSurface {
    canvas: RgbaImage,
    assets_dir: Option<PathBuf>,
    /// Decoded assets by key; `None` marks a key that failed to load
    assets: HashMap<String, Option<RgbaImage>>,
    captions: Vec<String>,
}

impl ImageSurface {
    pub fn new(width: u32, height: u32, assets_dir: Option<PathBuf>) -> Self {
        Self {
            canvas: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
            assets_dir,
            assets: HashMap::new(),
            captions: Vec::new(),
        }
    }

    /// Fill with opaque black and forget captions
    pub fn clear(&mut self) {
        for px in self.canvas.pixels_mut() {
            *px = Rgba([0, 0, 0, 255]);
        }
        self.captions.clear();
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Text drawn since the last clear. Glyphs are not rasterised.
    pub fn captions(&self) -> &[String] {
        &self.captions
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.canvas.save(path)?;
        log::info!("saved {}", path.display());
        Ok(())
    }

    fn blend(&mut self, x: i32, y: i32, color: [u8; 3], alpha: f32) {
        if x < 0 || y < 0 || x >= self.canvas.width() as i32 || y >= self.canvas.height() as i32 {
            return;
        }
        let px = self.canvas.get_pixel_mut(x as u32, y as u32);
        for (dst, src) in px.0.iter_mut().zip(color) {
            *dst = (*dst as f32 * (1.0 - alpha) + src as f32 * alpha).round() as u8;
        }
        px.0[3] = 255;
    }

    /// DDA line stamped with a square brush of the stroke width
    fn line(&mut self, a: Vec2, b: Vec2, color: [u8; 3], alpha: f32, width: f32) {
        let steps = (b - a).abs().max_element().ceil().max(1.0) as usize;
        let radius = ((width - 1.0) * 0.5).round().max(0.0) as i32;
        for i in 0..=steps {
            let p = a.lerp(b, i as f32 / steps as f32);
            let (cx, cy) = (p.x.round() as i32, p.y.round() as i32);
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    self.blend(cx + dx, cy + dy, color, alpha);
                }
            }
        }
    }

    fn asset(&mut self, key: &str) -> Option<&RgbaImage> {
        if !self.assets.contains_key(key) {
            let loaded = self.assets_dir.as_ref().and_then(|dir| {
                let path = dir.join(format!("{key}.png"));
                match image::open(&path) {
                    Ok(img) => Some(img.to_rgba8()),
                    Err(e) => {
                        log::warn!("asset {} unavailable: {}", path.display(), e);
                        None
                    }
                }
            });
            self.assets.insert(key.to_string(), loaded);
        }
        self.assets.get(key).and_then(Option::as_ref)
    }
}

fn to_bytes(color: Rgb) -> [u8; 3] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

impl RenderSurface for ImageSurface {
    fn draw_polyline(&mut self, points: &[Vec2], stroke: &StrokeStyle) {
        if points.len() < 2 {
            return;
        }
        let color = to_bytes(stroke.color);
        let alpha = stroke.alpha.clamp(0.0, 1.0);
        // A two-point polyline is a single segment, not a there-and-back
        let segments = if points.len() > 2 { points.len() } else { 1 };
        for i in 0..segments {
            let next = points[(i + 1) % points.len()];
            self.line(points[i], next, color, alpha, stroke.width);
        }
    }

    fn draw_text(&mut self, text: &str, position: Vec2, _style: &TextStyle) {
        log::debug!("text at ({:.0}, {:.0}): {}", position.x, position.y, text);
        self.captions.push(text.to_string());
    }

    fn draw_image(&mut self, key: &str, position: Vec2, size: Vec2) {
        let (w, h) = (size.x.round().max(1.0) as u32, size.y.round().max(1.0) as u32);
        let Some(asset) = self.asset(key) else {
            return;
        };
        let scaled = imageops::resize(asset, w, h, FilterType::Triangle);
        imageops::overlay(
            &mut self.canvas,
            &scaled,
            position.x.round() as i64,
            position.y.round() as i64,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(surface: &ImageSurface) -> usize {
        surface
            .image()
            .pixels()
            .filter(|p| p.0[..3] != [0, 0, 0])
            .count()
    }

    #[test]
    fn test_new_surface_is_black() {
        let surface = ImageSurface::new(8, 8, None);
        assert_eq!(lit(&surface), 0);
        assert!(surface.image().pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn test_polyline_marks_pixels() {
        let mut surface = ImageSurface::new(32, 32, None);
        let square = [
            Vec2::new(4.0, 4.0),
            Vec2::new(20.0, 4.0),
            Vec2::new(20.0, 20.0),
            Vec2::new(4.0, 20.0),
        ];
        let stroke = StrokeStyle {
            color: [1.0, 1.0, 1.0],
            alpha: 1.0,
            width: 1.0,
        };
        surface.draw_polyline(&square, &stroke);
        assert_eq!(surface.image().get_pixel(12, 4).0, [255, 255, 255, 255]);
        // Closing edge back to the first point
        assert_eq!(surface.image().get_pixel(4, 12).0, [255, 255, 255, 255]);
        assert_eq!(surface.image().get_pixel(12, 12).0, [0, 0, 0, 255]);

        surface.clear();
        assert_eq!(lit(&surface), 0);
    }

    #[test]
    fn test_half_alpha_blends_over_black() {
        let mut surface = ImageSurface::new(8, 8, None);
        let stroke = StrokeStyle {
            color: [1.0, 0.0, 0.0],
            alpha: 0.5,
            width: 1.0,
        };
        surface.draw_polyline(&[Vec2::new(1.0, 1.0), Vec2::new(6.0, 1.0)], &stroke);
        assert_eq!(surface.image().get_pixel(3, 1).0, [128, 0, 0, 255]);
    }

    #[test]
    fn test_offscreen_points_are_clipped() {
        let mut surface = ImageSurface::new(8, 8, None);
        let stroke = StrokeStyle {
            color: [1.0, 1.0, 1.0],
            alpha: 1.0,
            width: 3.0,
        };
        surface.draw_polyline(&[Vec2::new(-50.0, -50.0), Vec2::new(-10.0, 100.0)], &stroke);
        assert_eq!(lit(&surface), 0);
    }

    #[test]
    fn test_missing_asset_is_skipped() {
        let mut surface = ImageSurface::new(8, 8, Some(PathBuf::from("/nonexistent/assets")));
        surface.draw_image("start", Vec2::ZERO, Vec2::new(4.0, 4.0));
        assert_eq!(lit(&surface), 0);
    }

    #[test]
    fn test_asset_is_drawn_and_png_saved() {
        let dir = std::env::temp_dir().join(format!("sonorose-raster-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 255]))
            .save(dir.join("start.png"))
            .unwrap();

        let mut surface = ImageSurface::new(8, 8, Some(dir.clone()));
        surface.draw_image("start", Vec2::new(2.0, 2.0), Vec2::new(4.0, 4.0));
        let inside = surface.image().get_pixel(3, 3).0;
        assert!(inside[1] > 200 && inside[0] < 50);
        assert_eq!(surface.image().get_pixel(0, 0).0, [0, 0, 0, 255]);

        let out = dir.join("out").join("frame.png");
        surface.save_png(&out).unwrap();
        let reloaded = image::open(&out).unwrap().to_rgba8();
        assert_eq!(reloaded.dimensions(), (8, 8));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
