//! Graphic-to-parametric mapping
//!
//! A graphic band is a gain at a fixed center with a fixed one-octave Q.
//! Mapping it to a [`ParametricBand`] lets graphic mode reuse the same
//! coefficient and response path as parametric mode.

use eq_core::{
    EqResult, GRAPHIC_FREQUENCIES_HZ, GRAPHIC_Q, NUM_BANDS, ParametricBand, check_band_index,
    clamp_gain_db,
};

use crate::response::{ResponseCurve, ResponsePoint, log_frequency_grid};

/// Parametric equivalent of one graphic slider
pub fn graphic_band(index: usize, gain_db: f64) -> EqResult<ParametricBand> {
    check_band_index(index, NUM_BANDS)?;
    Ok(ParametricBand::new(GRAPHIC_FREQUENCIES_HZ[index], gain_db, GRAPHIC_Q))
}

/// Pair each graphic gain with its fixed center frequency and Q 1.414
pub fn to_parametric_bands(gains: &[f64; NUM_BANDS]) -> [ParametricBand; NUM_BANDS] {
    std::array::from_fn(|i| ParametricBand::new(GRAPHIC_FREQUENCIES_HZ[i], gains[i], GRAPHIC_Q))
}

/// Map a gain list of any length, one band per graphic center (at most ten)
pub fn map_graphic_gains(gains: &[f64]) -> Vec<ParametricBand> {
    gains
        .iter()
        .enumerate()
        .map_while(|(i, &gain)| graphic_band(i, gain).ok())
        .collect()
}

/// Clamp every graphic gain into ±30 dB
pub fn clamp_graphic_gains(gains: &[f64; NUM_BANDS]) -> [f64; NUM_BANDS] {
    (*gains).map(clamp_gain_db)
}

/// Slider curve: graphic gains interpolated linearly in log-frequency.
///
/// Flat extension outside 31.25 Hz..16 kHz. At a graphic center the
/// band's own gain is returned untouched.
pub fn graphic_response_db(frequency_hz: f64, gains: &[f64; NUM_BANDS]) -> f64 {
    let first = GRAPHIC_FREQUENCIES_HZ[0];
    let last = GRAPHIC_FREQUENCIES_HZ[NUM_BANDS - 1];

    if frequency_hz <= first {
        return gains[0];
    }
    if frequency_hz >= last {
        return gains[NUM_BANDS - 1];
    }
    if let Some(i) = GRAPHIC_FREQUENCIES_HZ.iter().position(|&f| f == frequency_hz) {
        return gains[i];
    }

    // first center strictly above the query; always 1..NUM_BANDS here
    let upper = GRAPHIC_FREQUENCIES_HZ
        .iter()
        .position(|&f| f > frequency_hz)
        .unwrap_or(NUM_BANDS - 1);
    let lower = upper - 1;

    let log_f = frequency_hz.log10();
    let log_lo = GRAPHIC_FREQUENCIES_HZ[lower].log10();
    let log_hi = GRAPHIC_FREQUENCIES_HZ[upper].log10();
    let ratio = (log_f - log_lo) / (log_hi - log_lo);

    gains[lower] + ratio * (gains[upper] - gains[lower])
}

/// Slider curve sampled on the analyzer's log grid
pub fn graphic_preview_curve(gains: &[f64; NUM_BANDS], point_count: usize) -> ResponseCurve {
    log_frequency_grid(point_count)
        .map(|frequency_hz| ResponsePoint {
            frequency_hz,
            gain_db: graphic_response_db(frequency_hz, gains),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const GAINS: [f64; NUM_BANDS] = [6.0, 4.0, 2.0, 0.0, -2.0, -4.5, -2.0, 0.0, 3.0, 5.0];

    #[test]
    fn test_mapping_pairs_fixed_centers() {
        let bands = to_parametric_bands(&GAINS);
        for (i, band) in bands.iter().enumerate() {
            assert_eq!(band.center_frequency_hz, GRAPHIC_FREQUENCIES_HZ[i]);
            assert_eq!(band.gain_db, GAINS[i]);
            assert_eq!(band.q, GRAPHIC_Q);
        }
        assert_eq!(graphic_band(4, GAINS[4]).unwrap(), bands[4]);
        assert!(graphic_band(NUM_BANDS, 0.0).is_err());
    }

    #[test]
    fn test_slice_mapping_matches_array_mapping() {
        let bands = to_parametric_bands(&GAINS);
        assert_eq!(map_graphic_gains(&GAINS), bands.to_vec());
        assert_eq!(map_graphic_gains(&GAINS[..3]), bands[..3].to_vec());
        assert_eq!(map_graphic_gains(&[1.0; 12]).len(), NUM_BANDS);
        assert!(map_graphic_gains(&[]).is_empty());
    }

    #[test]
    fn test_exact_center_has_no_interpolation_error() {
        for (i, &freq) in GRAPHIC_FREQUENCIES_HZ.iter().enumerate() {
            assert_eq!(graphic_response_db(freq, &GAINS), GAINS[i]);
        }
        assert_eq!(graphic_response_db(1000.0, &GAINS), -4.5);
    }

    #[test]
    fn test_flat_outside_range() {
        assert_eq!(graphic_response_db(20.0, &GAINS), GAINS[0]);
        assert_eq!(graphic_response_db(20000.0, &GAINS), GAINS[9]);
    }

    #[test]
    fn test_log_midpoint() {
        // geometric mean of 1 kHz and 2 kHz sits halfway in log space
        let mid = (1000.0_f64 * 2000.0).sqrt();
        assert_relative_eq!(graphic_response_db(mid, &GAINS), (-4.5 + -2.0) / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_preview_curve_follows_sliders() {
        let curve = graphic_preview_curve(&GAINS, 200);
        assert_eq!(curve.len(), 200);
        assert_eq!(curve.points()[0].gain_db, GAINS[0]);
        assert_eq!(curve.points()[199].gain_db, GAINS[9]);
        assert!(curve.iter().all(|p| p.gain_db >= -4.5 && p.gain_db <= 6.0));
    }

    #[test]
    fn test_clamp_graphic_gains() {
        let mut gains = [0.0; NUM_BANDS];
        gains[0] = 40.0;
        gains[1] = f64::NAN;
        gains[2] = -31.0;
        let clamped = clamp_graphic_gains(&gains);
        assert_eq!(&clamped[..3], &[30.0, 0.0, -30.0]);
    }
}
