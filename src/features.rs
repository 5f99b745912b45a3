//! Perceptual features derived from raw audio readings.

use rand::Rng;
use std::fmt;

use crate::audio::AudioFrame;
use crate::params::FeatureConfig;

/// One tick's normalized features, every field in [0, 1].
///
/// `quiet` and `distance` are not measured: `quiet = 1 - volume`,
/// `distance = 1 - volume` (louder reads as nearer) and `near = 1 - distance`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FeatureSample {
    pub high: f32,
    pub low: f32,
    pub volume: f32,
    pub distance: f32,
    pub quiet: f32,
    pub near: f32,
}

impl FeatureSample {
    /// Build a sample from the three measured quantities, clamping each and
    /// deriving the complementary fields.
    pub fn from_measured(high: f32, low: f32, volume: f32) -> Self {
        let volume = clamp_unit(volume);
        let distance = 1.0 - volume;
        Self {
            high: clamp_unit(high),
            low: clamp_unit(low),
            volume,
            distance,
            quiet: 1.0 - volume,
            near: 1.0 - distance,
        }
    }
}

/// Clamp a sensor-derived value into [0, 1]; NaN reads as 0.
fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        log::debug!("feature reading is NaN, treating as 0");
        return 0.0;
    }
    if !(0.0..=1.0).contains(&value) {
        log::debug!("feature reading {value} outside [0, 1], clamping");
    }
    value.clamp(0.0, 1.0)
}

/// Stateless mapping from raw readings to a [`FeatureSample`]
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn extract(&self, frame: &AudioFrame) -> FeatureSample {
        FeatureSample::from_measured(
            frame.treble_energy / self.config.max_energy,
            frame.bass_energy / self.config.max_energy,
            frame.level * self.config.gain,
        )
    }
}

/// Coarse label for one reading, used to pick a shape's icon.
///
/// Checked in order against the raw level (before gain) and the 0..255
/// band energies; the first match wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundType {
    /// level < 0.005
    Silence,
    /// treble energy > 140
    High,
    /// bass energy > 140
    Low,
    /// level > 0.1
    Loud,
    /// level < 0.02
    Quiet,
    Near,
    Far,
}

impl SoundType {
    pub const ALL: [SoundType; 7] = [
        SoundType::Silence,
        SoundType::High,
        SoundType::Low,
        SoundType::Loud,
        SoundType::Quiet,
        SoundType::Near,
        SoundType::Far,
    ];

    const SILENCE_LEVEL: f32 = 0.005;
    const BAND_ENERGY: f32 = 140.0;
    const LOUD_LEVEL: f32 = 0.1;
    const QUIET_LEVEL: f32 = 0.02;

    /// Classify a frame. Mid-level readings with no dominant band are
    /// split between `Near` and `Far` at random.
    pub fn classify<R: Rng + ?Sized>(frame: &AudioFrame, rng: &mut R) -> Self {
        // NaN never passes a comparison, so it must be caught up front
        if frame.level.is_nan() || frame.level < Self::SILENCE_LEVEL {
            return SoundType::Silence;
        }
        if frame.treble_energy > Self::BAND_ENERGY {
            return SoundType::High;
        }
        if frame.bass_energy > Self::BAND_ENERGY {
            return SoundType::Low;
        }
        if frame.level > Self::LOUD_LEVEL {
            return SoundType::Loud;
        }
        if frame.level < Self::QUIET_LEVEL {
            return SoundType::Quiet;
        }
        if rng.gen_bool(0.5) {
            SoundType::Near
        } else {
            SoundType::Far
        }
    }

    /// Mid-level reading with no dominant band
    pub fn is_ambient(self) -> bool {
        matches!(self, SoundType::Near | SoundType::Far)
    }

    /// Asset key of the icon drawn for this type
    pub fn asset_key(self) -> &'static str {
        match self {
            SoundType::Silence => "silence",
            SoundType::High => "high",
            SoundType::Low => "low",
            SoundType::Loud => "loud",
            SoundType::Quiet => "quiet",
            SoundType::Near => "near",
            SoundType::Far => "far",
        }
    }
}

impl fmt::Display for SoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.asset_key())
    }
}

/// Subset of features that drives the curve shape
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SmoothedFeatures {
    pub volume: f32,
    /// Treble share of the spectrum
    pub pitch: f32,
    pub distance: f32,
}

impl From<&FeatureSample> for SmoothedFeatures {
    fn from(sample: &FeatureSample) -> Self {
        Self {
            volume: sample.volume,
            pitch: sample.high,
            distance: sample.distance,
        }
    }
}

/// First-order low-pass over [`SmoothedFeatures`].
///
/// Seeds itself from the first sample after construction or `reset`.
#[derive(Debug, Clone)]
pub struct FeatureSmoother {
    alpha: f32,
    value: Option<SmoothedFeatures>,
}

impl FeatureSmoother {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            value: None,
        }
    }

    pub fn update(&mut self, sample: &FeatureSample) -> SmoothedFeatures {
        let input = SmoothedFeatures::from(sample);
        let next = match self.value {
            None => input,
            Some(prev) => SmoothedFeatures {
                volume: lerp(prev.volume, input.volume, self.alpha),
                pitch: lerp(prev.pitch, input.pitch, self.alpha),
                distance: lerp(prev.distance, input.distance, self.alpha),
            },
        };
        self.value = Some(next);
        next
    }

    /// Current value; zero before the first sample
    pub fn value(&self) -> SmoothedFeatures {
        self.value.unwrap_or_default()
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

/// Linear interpolation from `a` toward `b` by `t`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
