//! WAV file playback as an audio source, paced by the session clock.

use std::path::Path;
use std::time::Duration;

use super::fft::{rms, SpectrumAnalyzer};
use super::{AudioSource, BandEnergies};
use crate::params::{Band, FFTConfig};
use crate::{Error, Result};

/// Samples used for one level reading (≈23 ms at 44.1 kHz)
const LEVEL_WINDOW: usize = 1024;

/// Mono file contents read through a moving cursor.
///
/// Past the end of the file the source reads as silence.
pub struct WavInput {
    samples: Vec<f32>,
    sample_rate: u32,
    position: f64,
    started: bool,
    analyzer: SpectrumAnalyzer,
    fft_size: usize,
    bands: Option<BandEnergies>,
}

impl WavInput {
    /// Load and downmix a WAV file
    pub fn open(path: impl AsRef<Path>, fft_config: FFTConfig) -> Result<Self> {
        let mut reader = hound::WavReader::open(path.as_ref())?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<std::result::Result<_, _>>()?
            }
        };

        let mono = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect::<Vec<_>>();

        log::info!(
            "Audio file: {} ({:.1}s @ {}Hz, {} channel(s))",
            path.as_ref().display(),
            mono.len() as f32 / spec.sample_rate.max(1) as f32,
            spec.sample_rate,
            channels
        );

        Self::from_samples(mono, spec.sample_rate, fft_config)
    }

    /// Wrap already decoded mono samples
    pub fn from_samples(
        samples: Vec<f32>,
        sample_rate: u32,
        mut fft_config: FFTConfig,
    ) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidConfig("WAV sample rate is zero".into()));
        }
        fft_config.sample_rate_hz = sample_rate as usize;
        fft_config.validate().map_err(Error::InvalidConfig)?;
        let fft_size = fft_config.fft_size;
        Ok(Self {
            samples,
            sample_rate,
            position: 0.0,
            started: false,
            analyzer: SpectrumAnalyzer::new(fft_config),
            fft_size,
            bands: None,
        })
    }

    /// Seconds of audio consumed so far
    pub fn elapsed_secs(&self) -> f64 {
        self.position / self.sample_rate as f64
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor() >= self.samples.len()
    }

    fn cursor(&self) -> usize {
        self.position as usize
    }

    /// Samples ending at the cursor, at most `len` long
    fn window(&self, len: usize) -> &[f32] {
        let end = self.cursor();
        if end >= self.samples.len() {
            return &[];
        }
        &self.samples[end.saturating_sub(len)..end]
    }
}

impl AudioSource for WavInput {
    fn start(&mut self) -> Result<()> {
        if !self.started {
            self.started = true;
            self.analyzer.reset();
            log::debug!("WAV source started at {:.2}s", self.elapsed_secs());
        }
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.started
    }

    fn read_level(&mut self) -> f32 {
        rms(self.window(LEVEL_WINDOW))
    }

    fn read_band_energy(&mut self, band: Band) -> f32 {
        if self.bands.is_none() {
            let window = self.window(self.fft_size).to_vec();
            self.bands = Some(self.analyzer.analyze(&window));
        }
        self.bands.map(|b| b.get(band)).unwrap_or(0.0)
    }

    fn advance(&mut self, dt: Duration) {
        if !self.started {
            return;
        }
        self.position += dt.as_secs_f64() * self.sample_rate as f64;
        self.bands = None;
    }
}
