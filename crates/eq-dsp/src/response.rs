//! Magnitude response analysis
//!
//! Display curves for the equalizer and the mean power gain used by
//! auto-gain. Every value here comes from the exact biquad transfer
//! function, so a curve agrees with what the renderer does to a signal.

use eq_core::{Decibels, Sample};
use serde::{Deserialize, Serialize};

use crate::biquad::BiquadCoeffs;
use crate::state::EqualizerState;

/// Lowest frequency of the analysis grid
pub const RESPONSE_MIN_HZ: f64 = 20.0;
/// Highest frequency of the analysis grid
pub const RESPONSE_MAX_HZ: f64 = 20000.0;
/// Points in a display curve
pub const DEFAULT_POINT_COUNT: usize = 200;
/// Points in the auto-gain power sweep
pub const POWER_SWEEP_POINTS: usize = 1000;
/// Display clamp (±dB), plotting only
pub const DISPLAY_RANGE_DB: f64 = 15.0;

/// One (frequency, gain) pair of a response curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePoint {
    pub frequency_hz: f64,
    pub gain_db: f64,
}

impl ResponsePoint {
    /// Gain clamped to the plot range
    #[inline]
    pub fn display_gain_db(&self) -> f64 {
        self.gain_db.clamp(-DISPLAY_RANGE_DB, DISPLAY_RANGE_DB)
    }
}

/// Log-spaced magnitude response, low to high frequency
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseCurve {
    points: Vec<ResponsePoint>,
}

impl ResponseCurve {
    pub fn points(&self) -> &[ResponsePoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResponsePoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// (frequency, clamped gain) pairs for plotting
    pub fn display_points(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.frequency_hz, p.display_gain_db()))
            .collect()
    }

    /// (frequency, gain) pairs, unclamped
    pub fn to_pairs(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.frequency_hz, p.gain_db)).collect()
    }

    /// Largest absolute gain on the curve
    pub fn peak_abs_db(&self) -> f64 {
        self.points.iter().fold(0.0_f64, |acc, p| acc.max(p.gain_db.abs()))
    }
}

impl FromIterator<ResponsePoint> for ResponseCurve {
    fn from_iter<I: IntoIterator<Item = ResponsePoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ResponseCurve {
    type Item = ResponsePoint;
    type IntoIter = std::vec::IntoIter<ResponsePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

/// i-th frequency of a `count`-point log grid between 20 Hz and 20 kHz
///
/// f_i = 20 · (20000/20)^(i/(count-1)); a single-point grid sits at 20 Hz.
#[inline]
pub fn log_frequency(i: usize, count: usize) -> f64 {
    if count < 2 {
        return RESPONSE_MIN_HZ;
    }
    let t = i as f64 / (count - 1) as f64;
    RESPONSE_MIN_HZ * (RESPONSE_MAX_HZ / RESPONSE_MIN_HZ).powf(t)
}

/// All frequencies of a `count`-point log grid
pub fn log_frequency_grid(count: usize) -> impl Iterator<Item = f64> {
    (0..count).map(move |i| log_frequency(i, count))
}

/// Cascade magnitude in dB: per-stage dB values summed (product in linear)
pub fn cascade_magnitude_db(cascade: &[BiquadCoeffs], freq: f64, sample_rate: f64) -> f64 {
    cascade
        .iter()
        .map(|c| c.magnitude_db(freq, sample_rate))
        .sum()
}

/// Response curve of an arbitrary cascade
pub fn compute_cascade_curve(
    cascade: &[BiquadCoeffs],
    sample_rate: f64,
    point_count: usize,
) -> ResponseCurve {
    log_frequency_grid(point_count)
        .map(|frequency_hz| ResponsePoint {
            frequency_hz,
            gain_db: cascade_magnitude_db(cascade, frequency_hz, sample_rate),
        })
        .collect()
}

/// Response curve of the current mode's bands.
///
/// A disabled equalizer passes audio untouched, so its curve is flat.
pub fn compute_curve(state: &EqualizerState, sample_rate: f64, point_count: usize) -> ResponseCurve {
    if !state.enabled {
        return compute_cascade_curve(&[], sample_rate, point_count);
    }

    let mut at_rate = *state;
    at_rate.sample_rate_hz = sample_rate;
    compute_cascade_curve(&at_rate.active_cascade(), sample_rate, point_count)
}

/// Mean of |H(f)|² over a log grid (linear power ratio)
pub fn mean_power_gain(cascade: &[BiquadCoeffs], sample_rate: f64, points: usize) -> f64 {
    if points == 0 {
        return 1.0;
    }

    let total: f64 = log_frequency_grid(points)
        .map(|freq| {
            cascade
                .iter()
                .map(|c| {
                    let mag = c.magnitude(freq, sample_rate);
                    mag * mag
                })
                .product::<f64>()
        })
        .sum();

    total / points as f64
}

/// Broadband offset that cancels the cascade's mean power gain
///
/// compensationDb = -10·log10(meanPowerLinear)
pub fn auto_gain_compensation_db(cascade: &[BiquadCoeffs], sample_rate: f64) -> f64 {
    let mean = mean_power_gain(cascade, sample_rate, POWER_SWEEP_POINTS);
    let compensation = -Decibels::from_power(mean).db();
    if compensation.is_finite() {
        compensation
    } else {
        0.0
    }
}

/// Steady-state amplitude of a sine of `freq` in a signal block.
///
/// Correlates against sin/cos over the block; exact when the block
/// holds a whole number of periods.
pub fn measure_sine_amplitude(signal: &[Sample], freq: f64, sample_rate: f64) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }

    let omega = 2.0 * std::f64::consts::PI * freq / sample_rate;
    let (mut re, mut im) = (0.0, 0.0);
    for (n, &x) in signal.iter().enumerate() {
        let phase = omega * n as f64;
        re += x * phase.cos();
        im += x * phase.sin();
    }
    2.0 * (re * re + im * im).sqrt() / signal.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biquad::derive_coefficients;
    use approx::assert_relative_eq;
    use eq_core::{EqMode, ParametricBand};

    #[test]
    fn test_grid_endpoints() {
        let grid: Vec<f64> = log_frequency_grid(DEFAULT_POINT_COUNT).collect();
        assert_eq!(grid.len(), 200);
        assert_eq!(grid[0], 20.0);
        assert_relative_eq!(grid[199], 20000.0, epsilon = 1e-9);
        assert!(grid.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(log_frequency(0, 1), 20.0);
        assert_eq!(log_frequency_grid(0).count(), 0);
    }

    #[test]
    fn test_flat_state_curve_is_zero() {
        let state = EqualizerState::new(48000.0);
        let curve = compute_curve(&state, 48000.0, DEFAULT_POINT_COUNT);
        assert_eq!(curve.len(), DEFAULT_POINT_COUNT);
        assert!(curve.iter().all(|p| p.gain_db == 0.0));
    }

    #[test]
    fn test_disabled_curve_is_flat() {
        let mut state = EqualizerState::new(48000.0);
        state.parametric_bands[5] = ParametricBand::new(1000.0, 9.0, 1.0);
        state.enabled = false;
        let curve = compute_curve(&state, 48000.0, 50);
        assert_eq!(curve.peak_abs_db(), 0.0);
    }

    #[test]
    fn test_display_clamp_keeps_raw_value() {
        let mut state = EqualizerState::new(48000.0);
        state.parametric_bands[5] = ParametricBand::new(1000.0, 24.0, 1.0);
        let curve = compute_curve(&state, 48000.0, DEFAULT_POINT_COUNT);

        assert!(curve.peak_abs_db() > 20.0);
        assert!(curve.display_points().iter().all(|&(_, g)| g.abs() <= DISPLAY_RANGE_DB));
        assert_eq!(curve.to_pairs().len(), curve.display_points().len());
    }

    #[test]
    fn test_curve_sums_bands_in_db() {
        let a = derive_coefficients(200.0, 4.0, 1.0, 48000.0);
        let b = derive_coefficients(3000.0, -6.0, 2.0, 48000.0);
        for freq in [50.0, 200.0, 1000.0, 3000.0] {
            assert_relative_eq!(
                cascade_magnitude_db(&[a, b], freq, 48000.0),
                a.magnitude_db(freq, 48000.0) + b.magnitude_db(freq, 48000.0),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_graphic_curve_uses_mapped_bands() {
        let mut state = EqualizerState::new(48000.0);
        state.mode = EqMode::Graphic;
        state.graphic_bands[5] = 6.0;
        let curve = compute_curve(&state, 48000.0, 200);
        let expected = derive_coefficients(1000.0, 6.0, eq_core::GRAPHIC_Q, 48000.0);
        for p in curve.iter() {
            assert_relative_eq!(p.gain_db, expected.magnitude_db(p.frequency_hz, 48000.0), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_mean_power_gain_identity() {
        assert_eq!(mean_power_gain(&[BiquadCoeffs::IDENTITY; 10], 48000.0, 1000), 1.0);
        assert_eq!(auto_gain_compensation_db(&[BiquadCoeffs::IDENTITY; 10], 48000.0), 0.0);
    }

    #[test]
    fn test_compensation_sign() {
        let boost = [derive_coefficients(1000.0, 9.0, 0.7, 48000.0)];
        let cut = [derive_coefficients(1000.0, -9.0, 0.7, 48000.0)];
        assert!(auto_gain_compensation_db(&boost, 48000.0) < 0.0);
        assert!(auto_gain_compensation_db(&cut, 48000.0) > 0.0);
    }

    #[test]
    fn test_compensation_cancels_mean_power() {
        let cascade = [
            derive_coefficients(120.0, 6.0, 0.8, 48000.0),
            derive_coefficients(2500.0, -4.0, 2.0, 48000.0),
            derive_coefficients(9000.0, 3.0, 1.41, 48000.0),
        ];
        let mean = mean_power_gain(&cascade, 48000.0, POWER_SWEEP_POINTS);
        assert_ne!(mean, 1.0);
        assert_relative_eq!(
            auto_gain_compensation_db(&cascade, 48000.0),
            -10.0 * mean.log10(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_measure_sine_amplitude() {
        let signal: Vec<f64> = (0..4800)
            .map(|n| 0.25 * (2.0 * std::f64::consts::PI * 1000.0 * n as f64 / 48000.0 + 0.3).sin())
            .collect();
        assert_relative_eq!(measure_sine_amplitude(&signal, 1000.0, 48000.0), 0.25, epsilon = 1e-9);
        assert_eq!(measure_sine_amplitude(&[], 1000.0, 48000.0), 0.0);
    }
}
