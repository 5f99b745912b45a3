//! Rose (rhodonea) curve with a second-harmonic perturbation.

use glam::Vec2;
use std::f32::consts::TAU;

use super::CurveParams;

/// Generate the closed polyline for `params`, scaled uniformly by `size`.
///
/// Vertex `i` of `loops` sits at θ = i/loops · 2π with radius
/// `base_radius · (cos(kθ) + sharpness · sin((k+2)θ))`, k = petal count.
/// The sine term breaks the symmetry of the plain rose. The last vertex
/// joins back to the first; the closing point is not repeated.
pub fn rose_curve(params: &CurveParams, size: f32) -> Vec<Vec2> {
    let loops = params.vertex_count();
    let k = params.petal_count() as f32;
    (0..loops)
        .map(|i| {
            let theta = i as f32 / loops as f32 * TAU;
            let r = params.base_radius
                * ((k * theta).cos() + params.sharpness * ((k + 2.0) * theta).sin());
            Vec2::new(r * theta.cos(), r * theta.sin()) * size
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> CurveParams {
        CurveParams {
            petals: 5.0,
            sharpness: 0.7,
            base_radius: 100.0,
            loops: 360.0,
        }
    }

    #[test]
    fn test_rose_curve_is_deterministic() {
        let a = rose_curve(&params(), 0.4);
        let b = rose_curve(&params(), 0.4);
        assert_eq!(a.len(), b.len());
        for (p, q) in a.iter().zip(&b) {
            assert_eq!(p.x.to_bits(), q.x.to_bits());
            assert_eq!(p.y.to_bits(), q.y.to_bits());
        }
    }

    #[test]
    fn test_vertex_count_follows_loops() {
        assert_eq!(rose_curve(&params(), 1.0).len(), 360);

        let mut p = params();
        p.loops = 200.4;
        assert_eq!(rose_curve(&p, 1.0).len(), 200);
    }

    #[test]
    fn test_first_vertex_on_positive_x_axis() {
        // θ = 0: r = base_radius · (cos 0 + s · sin 0) = base_radius
        let pts = rose_curve(&params(), 0.5);
        assert!((pts[0].x - 50.0).abs() < 1e-4);
        assert!(pts[0].y.abs() < 1e-4);
    }

    #[test]
    fn test_extent_bounded_by_radius_and_sharpness() {
        let p = params();
        let bound = p.base_radius * (1.0 + p.sharpness) * 2.0;
        for v in rose_curve(&p, 2.0) {
            assert!(v.length() <= bound + 1e-3);
        }
    }

    #[test]
    fn test_size_scales_uniformly() {
        let unit = rose_curve(&params(), 1.0);
        let half = rose_curve(&params(), 0.5);
        for (u, h) in unit.iter().zip(&half) {
            assert!((*u * 0.5 - *h).length() < 1e-4);
        }
    }
}
