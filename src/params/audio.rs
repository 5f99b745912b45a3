//! Audio analysis and feature extraction configuration.

use std::ops::Range;

/// Spectral bands reported by the analyser, named after the classic
/// bass/mid/treble split used by browser sketching tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    Bass,
    LowMid,
    Mid,
    HighMid,
    Treble,
}

impl Band {
    pub const ALL: [Band; 5] = [
        Band::Bass,
        Band::LowMid,
        Band::Mid,
        Band::HighMid,
        Band::Treble,
    ];

    /// Frequency range covered by this band (Hz)
    pub fn range_hz(self) -> (f32, f32) {
        match self {
            Band::Bass => (20.0, 140.0),
            Band::LowMid => (140.0, 400.0),
            Band::Mid => (400.0, 2600.0),
            Band::HighMid => (2600.0, 5200.0),
            Band::Treble => (5200.0, 14000.0),
        }
    }

    /// Position of this band in `Band::ALL`
    pub fn index(self) -> usize {
        self as usize
    }
}

/// FFT analysis configuration
#[derive(Debug, Clone)]
pub struct FFTConfig {
    /// Audio sample rate (Hz). Replaced by the device rate once a stream opens.
    pub sample_rate_hz: usize,

    /// FFT window size (must be power of 2)
    /// 2048 samples = 1024 usable bins
    pub fft_size: usize,

    /// Spectrum thread update interval (milliseconds)
    /// 16 ms ≈ one analysis per 60 Hz frame
    pub update_interval_ms: u64,

    /// Blend between the previous and the new magnitude spectrum, 0..1.
    /// 0.8 matches the default analyser time smoothing.
    pub smoothing: f32,

    /// Decibel level mapped to byte energy 0
    pub min_db: f32,

    /// Decibel level mapped to byte energy 255
    pub max_db: f32,
}

impl Default for FFTConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            fft_size: 2048,
            update_interval_ms: 16,
            smoothing: 0.8,
            min_db: -100.0,
            max_db: -30.0,
        }
    }
}

impl FFTConfig {
    /// Convert frequency (Hz) to FFT bin index
    pub fn hz_to_bin(&self, hz: f32) -> usize {
        ((hz * self.fft_size as f32) / self.sample_rate_hz as f32) as usize
    }

    /// FFT bin range covered by a band, clipped to the usable half spectrum.
    /// Always contains at least one bin.
    pub fn band_bins(&self, band: Band) -> Range<usize> {
        let half = self.fft_size / 2;
        let (lo_hz, hi_hz) = band.range_hz();
        let start = self.hz_to_bin(lo_hz).min(half - 1);
        let end = self.hz_to_bin(hi_hz).clamp(start + 1, half);
        start..end
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 64 {
            return Err(format!(
                "FFT size must be a power of 2 and at least 64, got {}",
                self.fft_size
            ));
        }
        if self.sample_rate_hz == 0 {
            return Err("Sample rate must be > 0".to_string());
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(format!("Smoothing must be in [0, 1), got {}", self.smoothing));
        }
        if self.min_db >= self.max_db {
            return Err(format!(
                "Decibel range is empty: {}..{}",
                self.min_db, self.max_db
            ));
        }
        Ok(())
    }
}

/// Scaling from raw analyser readings to normalized features
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    /// Multiplier applied to the RMS level before clamping to [0, 1].
    /// Typical room silence reads 0.001-0.01, speech 0.05-0.3.
    pub gain: f32,

    /// Largest band energy the analyser reports (byte scale)
    pub max_energy: f32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            gain: 5.0,
            max_energy: 255.0,
        }
    }
}
