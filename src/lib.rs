//! sonorose library - audio-reactive rose curve collages

pub mod audio;
pub mod cli;
pub mod clock;
pub mod curve;
mod error;
pub mod features;
pub mod params;
pub mod placement;
pub mod rendering;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
