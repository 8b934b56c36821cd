//! Equalizer state value type

use eq_core::{EqMode, NUM_BANDS, ParametricBand, default_parametric_bands};
use serde::{Deserialize, Serialize};

use crate::bank::BandBank;
use crate::biquad::BiquadCoeffs;
use crate::graphic::to_parametric_bands;

/// Complete equalizer parameter set.
///
/// Parametric and graphic bands are kept side by side; the mode only
/// selects which of the two is active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqualizerState {
    pub enabled: bool,
    pub mode: EqMode,
    pub parametric_bands: [ParametricBand; NUM_BANDS],
    pub graphic_bands: [f64; NUM_BANDS],
    pub sample_rate_hz: f64,
}

impl EqualizerState {
    /// Flat, enabled, parametric
    pub fn new(sample_rate_hz: f64) -> Self {
        Self {
            enabled: true,
            mode: EqMode::Parametric,
            parametric_bands: default_parametric_bands(),
            graphic_bands: [0.0; NUM_BANDS],
            sample_rate_hz,
        }
    }

    /// Bands of the current mode, graphic gains mapped to parametric form
    pub fn active_bands(&self) -> [ParametricBand; NUM_BANDS] {
        match self.mode {
            EqMode::Parametric => self.parametric_bands,
            EqMode::Graphic => to_parametric_bands(&self.graphic_bands),
        }
    }

    /// Cascade of the current mode, derived exactly as the renderer's
    pub fn active_cascade(&self) -> [BiquadCoeffs; NUM_BANDS] {
        BandBank::derive_cascade(&self.active_bands(), self.sample_rate_hz)
    }
}

impl Default for EqualizerState {
    fn default() -> Self {
        Self::new(48000.0)
    }
}
