//! Engine configuration

use eq_core::{EqError, EqResult};
use serde::{Deserialize, Serialize};

pub const MIN_SAMPLE_RATE: f64 = 8000.0;
pub const MAX_SAMPLE_RATE: f64 = 768000.0;
pub const MIN_BUFFER_SIZE: usize = 16;
pub const MAX_BUFFER_SIZE: usize = 16384;
pub const MAX_CHANNELS: usize = 32;

/// Settings fixed at engine initialization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub sample_rate_hz: f64,
    pub buffer_size_frames: usize,
    /// Channels the renderer preallocates filter state for
    pub max_channels: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 48000.0,
            buffer_size_frames: 256,
            max_channels: 2,
        }
    }
}

impl EngineConfig {
    /// Stereo config for a sample rate and buffer size
    pub fn new(sample_rate_hz: f64, buffer_size_frames: usize) -> Self {
        Self {
            sample_rate_hz,
            buffer_size_frames,
            ..Self::default()
        }
    }

    pub fn with_max_channels(mut self, max_channels: usize) -> Self {
        self.max_channels = max_channels;
        self
    }

    /// Parse from the host application's JSON settings
    pub fn from_json_str(json: &str) -> EqResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EqError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EqResult<()> {
        validate_sample_rate(self.sample_rate_hz)?;

        if !(MIN_BUFFER_SIZE..=MAX_BUFFER_SIZE).contains(&self.buffer_size_frames) {
            return Err(EqError::InvalidBufferSize(self.buffer_size_frames));
        }
        if !(1..=MAX_CHANNELS).contains(&self.max_channels) {
            return Err(EqError::InvalidChannelCount(self.max_channels));
        }
        Ok(())
    }

    /// Duration of one buffer in milliseconds
    #[inline]
    pub fn buffer_latency_ms(&self) -> f64 {
        (self.buffer_size_frames as f64 / self.sample_rate_hz) * 1000.0
    }
}

pub(crate) fn validate_sample_rate(sample_rate_hz: f64) -> EqResult<()> {
    if sample_rate_hz.is_finite() && (MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate_hz) {
        Ok(())
    } else {
        Err(EqError::InvalidSampleRate(sample_rate_hz))
    }
}
