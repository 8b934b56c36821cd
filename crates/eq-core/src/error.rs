//! Error types for the equalizer

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EqError {
    #[error("Band index {index} out of range (0..{len})")]
    InvalidArgument { index: usize, len: usize },

    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(f64),

    #[error("Invalid buffer size: {0} frames")]
    InvalidBufferSize(usize),

    #[error("Invalid channel count: {0}")]
    InvalidChannelCount(usize),

    #[error("Invalid preset: {0}")]
    InvalidPreset(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias
pub type EqResult<T> = Result<T, EqError>;

/// Check a band index against a bank length
#[inline]
pub fn check_band_index(index: usize, len: usize) -> EqResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(EqError::InvalidArgument { index, len })
    }
}
