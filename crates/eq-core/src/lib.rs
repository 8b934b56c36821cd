//! eq-core: Shared types for the equalizer workspace
//!
//! Band data model, parameter ranges, decibel helpers and the error type
//! used by `eq-dsp` and `eq-engine`.

mod band;
mod error;

pub use band::*;
pub use error::*;

/// Type alias for audio samples (always f64 for maximum precision)
pub type Sample = f64;

/// Decibel value wrapper
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Decibels(pub f64);

impl Decibels {
    pub const ZERO: Self = Self(0.0);
    pub const NEG_INF: Self = Self(f64::NEG_INFINITY);

    /// Amplitude ratio to dB (20·log10)
    #[inline]
    pub fn from_gain(gain: f64) -> Self {
        if gain <= 0.0 {
            Self::NEG_INF
        } else {
            Self(20.0 * gain.log10())
        }
    }

    /// Power ratio to dB (10·log10)
    #[inline]
    pub fn from_power(power: f64) -> Self {
        if power <= 0.0 {
            Self::NEG_INF
        } else {
            Self(10.0 * power.log10())
        }
    }

    #[inline]
    pub fn to_gain(self) -> f64 {
        if self.0 <= -144.0 {
            0.0
        } else {
            10.0_f64.powf(self.0 / 20.0)
        }
    }

    #[inline]
    pub fn db(self) -> f64 {
        self.0
    }
}

impl Default for Decibels {
    fn default() -> Self {
        Self::ZERO
    }
}
