//! Peaking biquad using Transposed Direct Form II
//!
//! TDF-II keeps two state registers per stage and is the numerically
//! friendliest direct form for floating point. Coefficients follow the
//! RBJ cookbook peaking EQ, normalized so that a0 = 1.

use eq_core::{ParametricBand, Sample};
use num_complex::Complex64;
use std::f64::consts::PI;

use crate::{MonoProcessor, Processor, ProcessorConfig};

/// Biquad coefficients (a0 normalized to 1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Unity gain, no filtering
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Calculate peaking EQ filter coefficients
    ///
    /// Raw RBJ formula with no clamping and no 0 dB short-circuit; use
    /// [`derive_coefficients`] for band parameters coming from the outside.
    pub fn peaking(freq: f64, q: f64, gain_db: f64, sample_rate: f64) -> Self {
        let a = 10.0_f64.powf(gain_db / 40.0);
        let omega = 2.0 * PI * freq / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = 1.0 + alpha * a;
        let b1 = -2.0 * cos_omega;
        let b2 = 1.0 - alpha * a;
        let a0 = 1.0 + alpha / a;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha / a;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Bypass (unity gain, no filtering)
    #[inline]
    pub const fn bypass() -> Self {
        Self::IDENTITY
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Complex frequency response H(e^jω) at `freq`
    ///
    /// Evaluates H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
    /// at z = e^(jω) where ω = 2πf/fs
    pub fn frequency_response(&self, freq: f64, sample_rate: f64) -> Complex64 {
        let omega = 2.0 * PI * freq / sample_rate;
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;

        let num = self.b0 + z1 * self.b1 + z2 * self.b2;
        let den = 1.0 + z1 * self.a1 + z2 * self.a2;
        num / den
    }

    /// Linear magnitude |H(e^jω)|
    pub fn magnitude(&self, freq: f64, sample_rate: f64) -> f64 {
        let omega = 2.0 * PI * freq / sample_rate;
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;

        let num = self.b0 + z1 * self.b1 + z2 * self.b2;
        let den = 1.0 + z1 * self.a1 + z2 * self.a2;
        num.norm() / den.norm()
    }

    /// Magnitude in dB
    #[inline]
    pub fn magnitude_db(&self, freq: f64, sample_rate: f64) -> f64 {
        if self.is_identity() {
            return 0.0;
        }
        20.0 * self.magnitude(freq, sample_rate).log10()
    }
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Derive peaking coefficients for one band.
///
/// Parameters are clamped into the playable range first (20 Hz up to just
/// below Nyquist, ±30 dB, Q in [0.1, 30]). A 0 dB band returns the exact
/// identity filter instead of a round-off approximation of it.
pub fn derive_coefficients(
    center_freq: f64,
    gain_db: f64,
    q: f64,
    sample_rate: f64,
) -> BiquadCoeffs {
    if !ParametricBand::supports_sample_rate(sample_rate) {
        return BiquadCoeffs::IDENTITY;
    }

    let band = ParametricBand::new(center_freq, gain_db, q).clamped(sample_rate);
    if band.is_identity() {
        return BiquadCoeffs::IDENTITY;
    }

    BiquadCoeffs::peaking(band.center_frequency_hz, band.q, band.gain_db, sample_rate)
}

/// Magnitude of one stage in dB (free-function form of [`BiquadCoeffs::magnitude_db`])
#[inline]
pub fn evaluate_magnitude_db(coeffs: &BiquadCoeffs, frequency_hz: f64, sample_rate: f64) -> f64 {
    coeffs.magnitude_db(frequency_hz, sample_rate)
}

/// TDF-II state registers for one stage of one channel
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiquadState {
    pub z1: f64,
    pub z2: f64,
}

impl BiquadState {
    pub const ZERO: Self = Self { z1: 0.0, z2: 0.0 };

    #[inline(always)]
    pub fn process(&mut self, coeffs: &BiquadCoeffs, input: Sample) -> Sample {
        let output = coeffs.b0 * input + self.z1;
        self.z1 = coeffs.b1 * input - coeffs.a1 * output + self.z2;
        self.z2 = coeffs.b2 * input - coeffs.a2 * output;
        output
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::ZERO;
    }
}

/// Run one sample through one stage.
///
/// An identity stage returns the input bit-for-bit (signed zero included).
#[inline(always)]
pub fn process_sample(coeffs: &BiquadCoeffs, state: &mut BiquadState, input: Sample) -> Sample {
    if coeffs.is_identity() {
        return input;
    }
    state.process(coeffs, input)
}

/// Transposed Direct Form II biquad filter (coefficients plus state)
#[derive(Debug, Clone)]
pub struct BiquadTDF2 {
    coeffs: BiquadCoeffs,
    state: BiquadState,
    sample_rate: f64,
}

impl BiquadTDF2 {
    pub fn new(sample_rate: f64) -> Self {
        Self::with_coeffs(BiquadCoeffs::IDENTITY, sample_rate)
    }

    pub fn with_coeffs(coeffs: BiquadCoeffs, sample_rate: f64) -> Self {
        Self {
            coeffs,
            state: BiquadState::ZERO,
            sample_rate,
        }
    }

    #[inline]
    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    #[inline]
    pub fn coeffs(&self) -> &BiquadCoeffs {
        &self.coeffs
    }

    #[inline]
    pub fn state(&self) -> &BiquadState {
        &self.state
    }

    /// Set as peaking EQ filter
    pub fn set_peaking(&mut self, freq: f64, q: f64, gain_db: f64) {
        self.coeffs = derive_coefficients(freq, gain_db, q, self.sample_rate);
    }

    /// Set as bypass
    pub fn set_bypass(&mut self) {
        self.coeffs = BiquadCoeffs::IDENTITY;
    }

    /// Magnitude of the current coefficients in dB
    pub fn magnitude_db(&self, freq: f64) -> f64 {
        self.coeffs.magnitude_db(freq, self.sample_rate)
    }
}

impl Processor for BiquadTDF2 {
    fn reset(&mut self) {
        self.state.reset();
    }
}

impl MonoProcessor for BiquadTDF2 {
    #[inline(always)]
    fn process_sample(&mut self, input: Sample) -> Sample {
        self::process_sample(&self.coeffs, &mut self.state, input)
    }
}

impl ProcessorConfig for BiquadTDF2 {
    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }
}
