//! Spectrum analysis: windowed FFT reduced to byte-scaled band energies.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::BandEnergies;
use crate::params::{Band, FFTConfig};

/// Analyser state carried between frames (time smoothing of magnitudes)
pub struct SpectrumAnalyzer {
    config: FFTConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl SpectrumAnalyzer {
    pub fn new(config: FFTConfig) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let window = (0..config.fft_size)
            .map(|i| hann_window(i, config.fft_size))
            .collect();
        Self {
            scratch: vec![Complex::new(0.0, 0.0); config.fft_size],
            magnitudes: vec![0.0; config.fft_size / 2],
            fft,
            window,
            config,
        }
    }

    /// Analyse the most recent `fft_size` samples of `samples`.
    /// Shorter input is zero-padded at the front.
    pub fn analyze(&mut self, samples: &[f32]) -> BandEnergies {
        let n = self.config.fft_size;
        let tail = &samples[samples.len().saturating_sub(n)..];
        let pad = n - tail.len();

        // Apply Hann window
        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let s = if i < pad { 0.0 } else { tail[i - pad] };
            *slot = Complex::new(s * self.window[i], 0.0);
        }

        self.fft.process(&mut self.scratch);

        // Blend with previous magnitudes (analyser time smoothing)
        let k = self.config.smoothing;
        let norm = 1.0 / n as f32;
        for (mag, bin) in self.magnitudes.iter_mut().zip(&self.scratch) {
            *mag = k * *mag + (1.0 - k) * bin.norm() * norm;
        }

        let mut energies = BandEnergies::default();
        for band in Band::ALL {
            let bins = self.config.band_bins(band);
            let total: f32 = self.magnitudes[bins.clone()]
                .iter()
                .map(|&m| self.to_byte(m))
                .sum();
            energies.0[band.index()] = total / bins.len() as f32;
        }
        energies
    }

    /// Map a linear magnitude onto the 0..255 decibel scale
    fn to_byte(&self, magnitude: f32) -> f32 {
        let db = 20.0 * magnitude.max(1e-12).log10();
        let t = (db - self.config.min_db) / (self.config.max_db - self.config.min_db);
        (t * 255.0).clamp(0.0, 255.0)
    }

    pub fn reset(&mut self) {
        self.magnitudes.iter_mut().for_each(|m| *m = 0.0);
    }
}

/// Root mean square of a block of samples
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Spawn the spectrum analysis thread.
///
/// Reads the newest window from `capture` every `update_interval_ms`, publishes
/// band energies, and trims `capture` so it never grows past one window.
pub fn spawn_fft_thread(
    config: FFTConfig,
    capture: Arc<Mutex<Vec<f32>>>,
    bands: Arc<Mutex<BandEnergies>>,
    running: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let interval = Duration::from_millis(config.update_interval_ms);
        let fft_size = config.fft_size;
        let mut analyzer = SpectrumAnalyzer::new(config);
        let mut window = Vec::with_capacity(fft_size);

        while running.load(Ordering::Relaxed) {
            thread::sleep(interval);

            {
                let Ok(mut buf) = capture.lock() else {
                    log::error!("capture buffer poisoned; stopping spectrum thread");
                    return;
                };
                if buf.len() > fft_size {
                    let excess = buf.len() - fft_size;
                    buf.drain(0..excess);
                }
                window.clear();
                window.extend_from_slice(&buf);
            }

            let energies = analyzer.analyze(&window);
            if let Ok(mut shared) = bands.lock() {
                *shared = energies;
            }
        }
        log::debug!("spectrum thread stopped");
    })
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}
