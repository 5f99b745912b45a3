//! Microphone capture feeding the spectrum thread.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use super::fft::{rms, spawn_fft_thread};
use super::{AudioSource, BandEnergies};
use crate::params::{Band, FFTConfig};
use crate::{Error, Result};

/// Live stream state, present once `start` succeeds
struct Running {
    /// Audio input stream (kept alive)
    _stream: cpal::Stream,

    /// Spectrum thread handle (joined on drop)
    fft_thread: Option<thread::JoinHandle<()>>,
}

/// Default input device with background spectrum analysis
pub struct MicInput {
    fft_config: FFTConfig,

    /// Latest RMS level, stored as f32 bits
    level: Arc<AtomicU32>,

    /// Shared band energies (written by the spectrum thread)
    bands: Arc<Mutex<BandEnergies>>,

    /// Clears to stop the spectrum thread
    running: Arc<AtomicBool>,

    live: Option<Running>,
}

impl MicInput {
    pub fn new(fft_config: FFTConfig) -> Result<Self> {
        fft_config.validate().map_err(Error::InvalidConfig)?;
        Ok(Self {
            fft_config,
            level: Arc::new(AtomicU32::new(0.0f32.to_bits())),
            bands: Arc::new(Mutex::new(BandEnergies::default())),
            running: Arc::new(AtomicBool::new(false)),
            live: None,
        })
    }

    fn open_stream(&mut self) -> Result<Running> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::DeviceUnavailable("No audio input device found".into()))?;

        let config = device
            .default_input_config()
            .map_err(|e| Error::DeviceUnavailable(format!("Failed to get input config: {e}")))?;

        log::info!(
            "Audio input: {} @ {}Hz, {} channel(s)",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            config.sample_rate().0,
            config.channels()
        );

        let mut fft_config = self.fft_config.clone();
        fft_config.sample_rate_hz = config.sample_rate().0 as usize;
        let channels = config.channels().max(1) as usize;

        let capture = Arc::new(Mutex::new(Vec::<f32>::with_capacity(fft_config.fft_size * 2)));
        let capture_cb = Arc::clone(&capture);
        let level_cb = Arc::clone(&self.level);
        let limit = fft_config.fft_size * 4;

        let stream = device
            .build_input_stream(
                &config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Downmix to mono
                    let mono: Vec<f32> = data
                        .chunks(channels)
                        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
                        .collect();

                    level_cb.store(rms(&mono).to_bits(), Ordering::Relaxed);

                    if let Ok(mut buf) = capture_cb.lock() {
                        buf.extend_from_slice(&mono);
                        // Drop the oldest audio if the spectrum thread falls behind
                        if buf.len() > limit {
                            let excess = buf.len() - limit;
                            buf.drain(0..excess);
                        }
                    }
                },
                |err| log::error!("Audio input stream error: {}", err),
                None,
            )
            .map_err(|e| Error::DeviceUnavailable(format!("Failed to build input stream: {e}")))?;

        stream
            .play()
            .map_err(|e| Error::DeviceUnavailable(format!("Failed to start input stream: {e}")))?;

        self.running.store(true, Ordering::Relaxed);
        let fft_thread = spawn_fft_thread(
            fft_config,
            capture,
            Arc::clone(&self.bands),
            Arc::clone(&self.running),
        );

        Ok(Running {
            _stream: stream,
            fft_thread: Some(fft_thread),
        })
    }
}

impl AudioSource for MicInput {
    fn start(&mut self) -> Result<()> {
        if self.live.is_some() {
            return Ok(());
        }
        let running = self.open_stream()?;
        self.live = Some(running);
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.live.is_some()
    }

    fn read_level(&mut self) -> f32 {
        f32::from_bits(self.level.load(Ordering::Relaxed))
    }

    fn read_band_energy(&mut self, band: Band) -> f32 {
        self.bands.lock().map(|b| b.get(band)).unwrap_or(0.0)
    }
}

impl Drop for MicInput {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.live.as_mut().and_then(|r| r.fft_thread.take()) {
            let _ = handle.join();
        }
    }
}
