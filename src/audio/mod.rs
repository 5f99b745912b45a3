//! Audio input and spectrum analysis.
//!
//! Sources deliver a scalar level plus per-band energies each tick. The
//! microphone source captures on the device thread and analyses on a
//! background spectrum thread; the WAV source analyses on demand.

mod fft;
mod system;
mod wav;

use std::time::Duration;

use crate::params::Band;
use crate::Result;

// Re-export public types
pub use fft::{hann_window, rms, SpectrumAnalyzer};
pub use system::MicInput;
pub use wav::WavInput;

/// Byte-scaled energy (0..255) per analyser band
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BandEnergies(pub [f32; 5]);

impl BandEnergies {
    pub fn get(&self, band: Band) -> f32 {
        self.0[band.index()]
    }
}

/// Provider of raw audio readings.
///
/// `read_*` results are only meaningful after `start` has returned `Ok`.
pub trait AudioSource {
    /// Open the device (or file) and begin delivering readings.
    /// Calling it again once started is a no-op.
    fn start(&mut self) -> Result<()>;

    fn is_started(&self) -> bool;

    /// RMS amplitude of the most recent audio, nominally 0..1
    fn read_level(&mut self) -> f32;

    /// Energy of one band on the 0..255 analyser scale
    fn read_band_energy(&mut self, band: Band) -> f32;

    /// Move a clock-driven source forward. Live devices ignore this.
    fn advance(&mut self, _dt: Duration) {}
}

impl<T: AudioSource + ?Sized> AudioSource for Box<T> {
    fn start(&mut self) -> Result<()> {
        (**self).start()
    }

    fn is_started(&self) -> bool {
        (**self).is_started()
    }

    fn read_level(&mut self) -> f32 {
        (**self).read_level()
    }

    fn read_band_energy(&mut self, band: Band) -> f32 {
        (**self).read_band_energy(band)
    }

    fn advance(&mut self, dt: Duration) {
        (**self).advance(dt)
    }
}

/// The readings the feature extractor consumes for one tick
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AudioFrame {
    pub level: f32,
    pub bass_energy: f32,
    pub treble_energy: f32,
}

impl AudioFrame {
    pub fn read<S: AudioSource + ?Sized>(source: &mut S) -> Self {
        Self {
            level: source.read_level(),
            bass_energy: source.read_band_energy(Band::Bass),
            treble_energy: source.read_band_energy(Band::Treble),
        }
    }
}
