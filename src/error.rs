//! Error types shared across the installation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Audio input could not be opened or started. Never fatal: the session
    /// stays idle and the next trigger may retry.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("wav input: {0}")]
    Wav(#[from] hound::Error),

    #[error("image output: {0}")]
    Image(#[from] image::ImageError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a later trigger may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::DeviceUnavailable(_))
    }
}
