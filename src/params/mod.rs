//! Parameter definitions with units and documented semantics.
//!
//! All tuning numbers live here with:
//! - Units (pixels, seconds, Hz, etc.)
//! - Documented ranges and meanings
//! - Defaults matching the installation as exhibited

mod audio;
mod render;
mod session;
mod shape;

// Re-export all types
pub use audio::{Band, FFTConfig, FeatureConfig};
pub use render::{PlacementConfig, PlacementMode, RenderConfig};
pub use session::{ExitAnimation, SessionTiming, TriggerPolicy};
pub use shape::{CurveRanges, EasingRates};

/// Everything a session needs, bundled for construction
#[derive(Debug, Clone, Default)]
pub struct InstallationConfig {
    pub features: FeatureConfig,
    pub ranges: CurveRanges,
    pub easing: EasingRates,
    pub timing: SessionTiming,
    pub placement: PlacementConfig,
    pub render: RenderConfig,
}

impl InstallationConfig {
    /// Validate every section, reporting the first problem found
    pub fn validate(&self) -> crate::Result<()> {
        self.timing
            .validate()
            .and_then(|_| self.placement.validate())
            .map_err(crate::Error::InvalidConfig)?;
        if self.features.gain <= 0.0 || self.features.max_energy <= 0.0 {
            return Err(crate::Error::InvalidConfig(
                "Feature gain and max energy must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
