//! Curve shape ranges and easing rates.

/// Output ranges of the feature → curve mapping
#[derive(Debug, Clone)]
pub struct CurveRanges {
    /// Petal count range (integer after rounding)
    pub petals: (f32, f32),

    /// Second-harmonic perturbation weight
    pub sharpness: (f32, f32),

    /// Base radius (pixels at size 1.0)
    pub base_radius: (f32, f32),

    /// Vertex count range (integer after rounding)
    pub loops: (f32, f32),
}

impl Default for CurveRanges {
    fn default() -> Self {
        Self {
            petals: (3.0, 12.0),
            sharpness: (0.3, 1.5),
            base_radius: (80.0, 150.0),
            loops: (200.0, 600.0),
        }
    }
}

impl CurveRanges {
    /// Largest radius any mapped curve can reach: `|cos| + sharpness·|sin| ≤ 1 + sharpness`
    pub fn max_extent(&self) -> f32 {
        self.base_radius.1 * (1.0 + self.sharpness.1)
    }
}

/// Per-tick smoothing rates
#[derive(Debug, Clone)]
pub struct EasingRates {
    /// Feature low-pass coefficient (fraction of the new sample taken each tick)
    pub feature_alpha: f32,

    /// Curve parameter easing toward the mapped target, per tick.
    /// Slower than `feature_alpha` so shapes morph with a visible delay.
    pub curve_rate: f32,
}

impl Default for EasingRates {
    fn default() -> Self {
        Self {
            feature_alpha: 0.1,
            curve_rate: 0.05,
        }
    }
}
