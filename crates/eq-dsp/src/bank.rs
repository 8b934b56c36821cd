//! 10-band bank of peaking stages
//!
//! Owns the per-band parameters and the coefficient set derived from them.
//! Setting one band re-derives only that band's coefficients.

use eq_core::{EqResult, NUM_BANDS, ParametricBand, check_band_index, default_parametric_bands};

use crate::ProcessorConfig;
use crate::biquad::{BiquadCoeffs, derive_coefficients};

/// Default sample rate for fallback
const DEFAULT_SAMPLE_RATE: f64 = 48000.0;

/// Ordered bank of peaking bands and their cascade coefficients
#[derive(Debug, Clone, PartialEq)]
pub struct BandBank {
    bands: [ParametricBand; NUM_BANDS],
    coeffs: [BiquadCoeffs; NUM_BANDS],
    sample_rate: f64,
}

impl BandBank {
    pub fn new(bands: [ParametricBand; NUM_BANDS], sample_rate: f64) -> Self {
        let sr = if ParametricBand::supports_sample_rate(sample_rate) {
            sample_rate
        } else {
            DEFAULT_SAMPLE_RATE
        };

        let mut bank = Self {
            bands,
            coeffs: [BiquadCoeffs::IDENTITY; NUM_BANDS],
            sample_rate: sr,
        };
        bank.rederive_all();
        bank
    }

    /// Bank with flat bands at the default parametric centers
    pub fn with_default_bands(sample_rate: f64) -> Self {
        Self::new(default_parametric_bands(), sample_rate)
    }

    /// Cascade coefficients for a band set without keeping a bank around
    pub fn derive_cascade(
        bands: &[ParametricBand; NUM_BANDS],
        sample_rate: f64,
    ) -> [BiquadCoeffs; NUM_BANDS] {
        Self::new(*bands, sample_rate).coeffs
    }

    /// Set one band. Out-of-range values are clamped; returns the stored band.
    pub fn set_band(&mut self, index: usize, params: ParametricBand) -> EqResult<ParametricBand> {
        check_band_index(index, NUM_BANDS)?;

        let band = params.clamped(self.sample_rate);
        if band != params {
            log::debug!("band {index}: clamped {params:?} -> {band:?}");
        }

        self.bands[index] = band;
        self.coeffs[index] = Self::derive(&band, self.sample_rate);
        Ok(band)
    }

    /// Replace all bands
    pub fn set_bands(&mut self, bands: &[ParametricBand; NUM_BANDS]) {
        self.bands = *bands;
        self.rederive_all();
    }

    pub fn get_band(&self, index: usize) -> EqResult<ParametricBand> {
        check_band_index(index, NUM_BANDS)?;
        Ok(self.bands[index])
    }

    #[inline]
    pub fn bands(&self) -> &[ParametricBand; NUM_BANDS] {
        &self.bands
    }

    pub fn coefficients(&self, index: usize) -> EqResult<BiquadCoeffs> {
        check_band_index(index, NUM_BANDS)?;
        Ok(self.coeffs[index])
    }

    /// Coefficients in band-index order
    #[inline]
    pub fn cascade_coefficients(&self) -> &[BiquadCoeffs; NUM_BANDS] {
        &self.coeffs
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Add `offset_db` to every band gain (clamped), re-deriving the cascade
    pub fn offset_gains(&mut self, offset_db: f64) {
        for band in &mut self.bands {
            band.gain_db += offset_db;
        }
        self.rederive_all();
    }

    /// Total cascade magnitude at `freq` in dB
    pub fn magnitude_db(&self, freq: f64) -> f64 {
        crate::response::cascade_magnitude_db(&self.coeffs, freq, self.sample_rate)
    }

    fn rederive_all(&mut self) {
        for (band, coeffs) in self.bands.iter_mut().zip(self.coeffs.iter_mut()) {
            *band = band.clamped(self.sample_rate);
            *coeffs = Self::derive(band, self.sample_rate);
        }
    }

    #[inline]
    fn derive(band: &ParametricBand, sample_rate: f64) -> BiquadCoeffs {
        derive_coefficients(band.center_frequency_hz, band.gain_db, band.q, sample_rate)
    }
}

impl ProcessorConfig for BandBank {
    /// Re-derive every band; Nyquist clamps are recomputed for the new rate
    fn set_sample_rate(&mut self, sample_rate: f64) {
        if !ParametricBand::supports_sample_rate(sample_rate) {
            log::warn!("ignoring invalid sample rate {sample_rate}");
            return;
        }
        self.sample_rate = sample_rate;
        self.rederive_all();
    }
}
