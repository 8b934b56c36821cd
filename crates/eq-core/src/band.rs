//! Band data model and parameter ranges

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of bands in both parametric and graphic mode
pub const NUM_BANDS: usize = 10;

/// Lowest center frequency a band can take
pub const MIN_FREQUENCY_HZ: f64 = 20.0;
/// Highest center frequency a band can take (before the Nyquist limit)
pub const MAX_FREQUENCY_HZ: f64 = 20000.0;
/// Distance kept between a center frequency and Nyquist
pub const NYQUIST_GUARD_HZ: f64 = 1.0;

pub const MIN_GAIN_DB: f64 = -30.0;
pub const MAX_GAIN_DB: f64 = 30.0;

pub const MIN_Q: f64 = 0.1;
pub const MAX_Q: f64 = 30.0;

/// Default parametric Q (~1 octave)
pub const DEFAULT_Q: f64 = 1.41;

/// Q used whenever graphic gains are expressed as parametric bands
pub const GRAPHIC_Q: f64 = 1.414;

/// Fallback center frequency for NaN input
pub const DEFAULT_FREQUENCY_HZ: f64 = 1000.0;

/// Fixed graphic-EQ center frequencies
pub const GRAPHIC_FREQUENCIES_HZ: [f64; NUM_BANDS] = [
    31.25, 62.5, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

/// Initial parametric center frequencies
pub const DEFAULT_PARAMETRIC_FREQUENCIES_HZ: [f64; NUM_BANDS] = [
    31.0, 62.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

/// Equalizer mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EqMode {
    #[default]
    Parametric,
    Graphic,
}

impl fmt::Display for EqMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EqMode::Parametric => write!(f, "parametric"),
            EqMode::Graphic => write!(f, "graphic"),
        }
    }
}

/// One fully adjustable peaking band
///
/// Identity is positional: the engine addresses bands by index 0..9.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParametricBand {
    #[serde(alias = "frequency")]
    pub center_frequency_hz: f64,
    #[serde(alias = "gain")]
    pub gain_db: f64,
    pub q: f64,
}

impl ParametricBand {
    pub const fn new(center_frequency_hz: f64, gain_db: f64, q: f64) -> Self {
        Self {
            center_frequency_hz,
            gain_db,
            q,
        }
    }

    /// 0 dB band at the given frequency with the default Q
    pub const fn flat(center_frequency_hz: f64) -> Self {
        Self::new(center_frequency_hz, 0.0, DEFAULT_Q)
    }

    /// Highest usable center frequency at a sample rate
    #[inline]
    pub fn max_frequency_hz(sample_rate: f64) -> f64 {
        MAX_FREQUENCY_HZ.min(sample_rate * 0.5 - NYQUIST_GUARD_HZ)
    }

    /// Whether a sample rate leaves room for a center between 20 Hz and Nyquist
    #[inline]
    pub fn supports_sample_rate(sample_rate: f64) -> bool {
        sample_rate.is_finite() && Self::max_frequency_hz(sample_rate) >= MIN_FREQUENCY_HZ
    }

    /// Clamp every parameter into its playable range for `sample_rate`.
    ///
    /// NaN is replaced by the parameter's default before clamping.
    pub fn clamped(&self, sample_rate: f64) -> Self {
        let max_freq = Self::max_frequency_hz(sample_rate).max(MIN_FREQUENCY_HZ);
        let freq = if self.center_frequency_hz.is_nan() {
            DEFAULT_FREQUENCY_HZ
        } else {
            self.center_frequency_hz
        };
        let gain = if self.gain_db.is_nan() { 0.0 } else { self.gain_db };
        let q = if self.q.is_nan() { DEFAULT_Q } else { self.q };

        Self {
            center_frequency_hz: freq.clamp(MIN_FREQUENCY_HZ, max_freq),
            gain_db: clamp_gain_db(gain),
            q: q.clamp(MIN_Q, MAX_Q),
        }
    }

    /// Clamp into the sample-rate independent ranges (20 Hz..20 kHz)
    pub fn sanitized(&self) -> Self {
        self.clamped(f64::INFINITY)
    }

    /// A 0 dB peaking band is the identity filter
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.gain_db == 0.0
    }
}

impl Default for ParametricBand {
    fn default() -> Self {
        Self::flat(DEFAULT_FREQUENCY_HZ)
    }
}

/// Clamp a gain to the engine's range, mapping NaN to 0 dB
#[inline]
pub fn clamp_gain_db(gain_db: f64) -> f64 {
    if gain_db.is_nan() {
        0.0
    } else {
        gain_db.clamp(MIN_GAIN_DB, MAX_GAIN_DB)
    }
}

/// Flat parametric bands at the default centers
pub fn default_parametric_bands() -> [ParametricBand; NUM_BANDS] {
    DEFAULT_PARAMETRIC_FREQUENCIES_HZ.map(ParametricBand::flat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_ranges() {
        let band = ParametricBand::new(5.0, 45.0, 0.0).clamped(48000.0);
        assert_eq!(band.center_frequency_hz, MIN_FREQUENCY_HZ);
        assert_eq!(band.gain_db, MAX_GAIN_DB);
        assert_eq!(band.q, MIN_Q);

        let band = ParametricBand::new(30000.0, -45.0, 99.0).clamped(48000.0);
        assert_eq!(band.center_frequency_hz, MAX_FREQUENCY_HZ);
        assert_eq!(band.gain_db, MIN_GAIN_DB);
        assert_eq!(band.q, MAX_Q);
    }

    #[test]
    fn test_clamp_below_nyquist() {
        let band = ParametricBand::new(20000.0, 3.0, 1.0).clamped(32000.0);
        assert_eq!(band.center_frequency_hz, 16000.0 - NYQUIST_GUARD_HZ);
    }

    #[test]
    fn test_supported_sample_rates() {
        assert!(ParametricBand::supports_sample_rate(48000.0));
        assert!(ParametricBand::supports_sample_rate(42.0));
        assert!(!ParametricBand::supports_sample_rate(41.0));
        assert!(!ParametricBand::supports_sample_rate(0.0));
        assert!(!ParametricBand::supports_sample_rate(f64::NAN));
        assert!(!ParametricBand::supports_sample_rate(f64::INFINITY));
    }

    #[test]
    fn test_sanitized_ignores_nyquist() {
        let band = ParametricBand::new(25000.0, 3.0, 1.0).sanitized();
        assert_eq!(band.center_frequency_hz, MAX_FREQUENCY_HZ);
    }

    #[test]
    fn test_nan_falls_back_to_defaults() {
        let band = ParametricBand::new(f64::NAN, f64::NAN, f64::NAN).clamped(48000.0);
        assert_eq!(band.center_frequency_hz, DEFAULT_FREQUENCY_HZ);
        assert_eq!(band.gain_db, 0.0);
        assert_eq!(band.q, DEFAULT_Q);
    }

    #[test]
    fn test_default_bands_are_flat() {
        let bands = default_parametric_bands();
        assert!(bands.iter().all(ParametricBand::is_identity));
        assert_eq!(bands[5].center_frequency_hz, 1000.0);
    }

    #[test]
    fn test_band_serde_aliases() {
        let band: ParametricBand =
            serde_json::from_str(r#"{"frequency": 250.0, "gain": -3.5, "q": 0.7}"#).unwrap();
        assert_eq!(band, ParametricBand::new(250.0, -3.5, 0.7));

        let json = serde_json::to_string(&band).unwrap();
        assert!(json.contains("centerFrequencyHz"));
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(EqMode::Graphic.to_string(), "graphic");
        assert_eq!(EqMode::default(), EqMode::Parametric);
    }
}
