//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::params::{InstallationConfig, PlacementMode, TriggerPolicy};
use crate::{Error, Result};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "sonorose")]
#[command(about = "Turns a few seconds of sound into a collage of rose curves", long_about = None)]
pub struct Args {
    /// Play a WAV file instead of listening to the microphone
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Trigger: manual (Enter starts an episode, default) or auto
    #[arg(long, value_name = "MODE", default_value = "manual")]
    pub trigger: String,

    /// Raw input level that starts an episode in auto mode (0..1)
    #[arg(long, value_name = "LEVEL", default_value = "0.05")]
    pub threshold: f32,

    /// Shape layout: scatter (default) or grid
    #[arg(long, value_name = "MODE", default_value = "scatter")]
    pub placement: String,

    /// Seed for scatter placement (random if omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Recording window length
    #[arg(long, value_name = "SECONDS", default_value = "10")]
    pub record_secs: f32,

    /// How long the finished collage stays up
    #[arg(long, value_name = "SECONDS", default_value = "5")]
    pub hold_secs: f32,

    /// Go straight back to idle after the hold instead of sliding shapes away
    #[arg(long)]
    pub no_exit_animation: bool,

    /// Stop after this many completed episodes
    #[arg(long, value_name = "N")]
    pub sessions: Option<u64>,

    /// Write each finished collage here as PNG
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Directory holding image assets such as start.png
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Canvas width (pixels)
    #[arg(long, default_value = "1280")]
    pub width: u32,

    /// Canvas height (pixels)
    #[arg(long, default_value = "720")]
    pub height: u32,

    /// Frame rate of the tick loop
    #[arg(long, default_value = "60")]
    pub fps: u32,
}

impl Args {
    /// Parse trigger policy from command-line arguments
    pub fn parse_trigger(&self) -> TriggerPolicy {
        match self.trigger.to_lowercase().as_str() {
            "manual" => {
                log::info!("Trigger: manual (press Enter to start)");
                TriggerPolicy::Manual
            }
            "auto" => {
                log::info!("Trigger: auto (level > {})", self.threshold);
                TriggerPolicy::AutoStart {
                    threshold: self.threshold,
                }
            }
            other => {
                log::warn!("Unknown trigger '{}', using manual", other);
                TriggerPolicy::Manual
            }
        }
    }

    /// Parse placement mode from command-line arguments
    pub fn parse_placement(&self) -> PlacementMode {
        match self.placement.to_lowercase().as_str() {
            "grid" => PlacementMode::Grid,
            "scatter" => PlacementMode::Scatter,
            other => {
                log::warn!("Unknown placement '{}', using scatter", other);
                PlacementMode::Scatter
            }
        }
    }

    /// Defaults overlaid with whatever was given on the command line
    pub fn to_config(&self) -> Result<InstallationConfig> {
        let mut config = InstallationConfig::default();
        config.timing.trigger = self.parse_trigger();
        config.timing.recording = seconds("--record-secs", self.record_secs)?;
        config.timing.hold = seconds("--hold-secs", self.hold_secs)?;
        if self.no_exit_animation {
            config.timing.exit = None;
        }
        config.placement.mode = self.parse_placement();
        config.placement.seed = self.seed;
        config.render.canvas_width = self.width;
        config.render.canvas_height = self.height;
        config.render.fps = self.fps;
        config.validate()?;
        Ok(config)
    }
}

/// Non-negative, finite, representable seconds
fn seconds(flag: &str, value: f32) -> Result<Duration> {
    Duration::try_from_secs_f32(value)
        .map_err(|e| Error::InvalidConfig(format!("{flag} {value}: {e}")))
}
