//! Rose curve family: parameters, feature mapping and polyline generation.

mod mapper;
mod rose;

pub use mapper::CurveParameterMapper;
pub use rose::rose_curve;

use crate::params::CurveRanges;

/// Shape parameters of one rose curve.
///
/// Values are continuous so they can ease smoothly between targets;
/// `petal_count` and `vertex_count` give the integer forms used for drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveParams {
    pub petals: f32,
    pub sharpness: f32,
    pub base_radius: f32,
    pub loops: f32,
}

impl CurveParams {
    /// Lower corner of the ranges; where easing starts each episode
    pub fn resting(ranges: &CurveRanges) -> Self {
        Self {
            petals: ranges.petals.0,
            sharpness: ranges.sharpness.0,
            base_radius: ranges.base_radius.0,
            loops: ranges.loops.0,
        }
    }

    pub fn petal_count(&self) -> u32 {
        self.petals.round().max(1.0) as u32
    }

    pub fn vertex_count(&self) -> usize {
        self.loops.round().max(3.0) as usize
    }
}
