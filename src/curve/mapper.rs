//! Smoothed features → curve parameters, with a second easing layer.

use super::CurveParams;
use crate::features::{lerp, SmoothedFeatures};
use crate::params::CurveRanges;

/// Maps smoothed features onto a target [`CurveParams`] and eases a current
/// value toward it.
#[derive(Debug, Clone)]
pub struct CurveParameterMapper {
    ranges: CurveRanges,
    rate: f32,
    current: CurveParams,
}

impl CurveParameterMapper {
    pub fn new(ranges: CurveRanges, rate: f32) -> Self {
        let current = CurveParams::resting(&ranges);
        Self {
            ranges,
            rate: rate.clamp(0.0, 1.0),
            current,
        }
    }

    /// Instantaneous target for the given features
    ///
    /// * petals ← pitch, rounded
    /// * sharpness ← pitch
    /// * base radius ← volume
    /// * loops ← distance, rounded
    pub fn target(&self, features: &SmoothedFeatures) -> CurveParams {
        let r = &self.ranges;
        let pitch = features.pitch.clamp(0.0, 1.0);
        CurveParams {
            petals: lerp(r.petals.0, r.petals.1, pitch).round(),
            sharpness: lerp(r.sharpness.0, r.sharpness.1, pitch),
            base_radius: lerp(r.base_radius.0, r.base_radius.1, features.volume.clamp(0.0, 1.0)),
            loops: lerp(r.loops.0, r.loops.1, features.distance.clamp(0.0, 1.0)).round(),
        }
    }

    /// Ease one tick toward the target for `features`; returns the new current value
    pub fn update(&mut self, features: &SmoothedFeatures) -> CurveParams {
        let target = self.target(features);
        let c = &mut self.current;
        c.petals = lerp(c.petals, target.petals, self.rate);
        c.sharpness = lerp(c.sharpness, target.sharpness, self.rate);
        c.base_radius = lerp(c.base_radius, target.base_radius, self.rate);
        c.loops = lerp(c.loops, target.loops, self.rate);
        self.current
    }

    pub fn current(&self) -> CurveParams {
        self.current
    }

    pub fn ranges(&self) -> &CurveRanges {
        &self.ranges
    }

    /// Back to the resting params for a new episode
    pub fn reset(&mut self) {
        self.current = CurveParams::resting(&self.ranges);
    }
}
