//! Equalizer control plane
//!
//! [`EqualizerEngine`] owns both band banks and every setter. Each accepted
//! mutation re-derives the touched coefficients, publishes a fresh
//! [`CoefficientSnapshot`] to the renderer and bumps the change counter.

use std::sync::Arc;

use eq_core::{
    EqError, EqMode, EqResult, NUM_BANDS, ParametricBand, clamp_gain_db, default_parametric_bands,
};
use eq_dsp::graphic::graphic_band;
use eq_dsp::response::auto_gain_compensation_db;
use eq_dsp::{
    BandBank, BiquadCoeffs, EqualizerState, ProcessorConfig, ResponseCurve, compute_curve,
    graphic_preview_curve, to_parametric_bands,
};
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::config::{EngineConfig, validate_sample_rate};
use crate::notify::{ChangeNotifier, ChangeWatcher};
use crate::preset::{Preset, PresetData};
use crate::renderer::EqRenderer;
use crate::snapshot::{CoefficientSnapshot, SnapshotWriter, triple_buffer};

/// Control plane shared between UI adapters
pub type SharedEqualizer = Arc<Mutex<EqualizerEngine>>;

/// Compensation smaller than this is treated as "already flat"
const AUTO_GAIN_EPSILON_DB: f64 = 1e-9;

/// Equalizer control plane
pub struct EqualizerEngine {
    config: EngineConfig,
    enabled: bool,
    mode: EqMode,
    parametric: BandBank,
    /// Graphic gains held as bands at the fixed centers
    graphic: BandBank,
    writer: SnapshotWriter<CoefficientSnapshot>,
    notifier: ChangeNotifier,
}

impl EqualizerEngine {
    /// Build the control plane and its renderer.
    ///
    /// Starts enabled, in parametric mode, with every band flat.
    pub fn initialize(config: EngineConfig) -> EqResult<(Self, EqRenderer)> {
        config.validate()?;

        let sample_rate = config.sample_rate_hz;
        let parametric = BandBank::with_default_bands(sample_rate);
        let graphic = BandBank::new(to_parametric_bands(&[0.0; NUM_BANDS]), sample_rate);

        let initial = CoefficientSnapshot::flat(sample_rate);
        let (writer, reader) = triple_buffer(initial);
        let renderer = EqRenderer::new(reader, initial, config.max_channels);

        info!(
            "Equalizer initialized: {} Hz, {} frames ({:.2} ms), {} channels",
            sample_rate,
            config.buffer_size_frames,
            config.buffer_latency_ms(),
            config.max_channels
        );

        let engine = Self {
            config,
            enabled: true,
            mode: EqMode::Parametric,
            parametric,
            graphic,
            writer,
            notifier: ChangeNotifier::new(),
        };
        Ok((engine, renderer))
    }

    /// Wrap the control plane for sharing across UI threads
    pub fn into_shared(self) -> SharedEqualizer {
        Arc::new(Mutex::new(self))
    }

    // ═══════════════════════════════════════════════════════════════════
    // State
    // ═══════════════════════════════════════════════════════════════════

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn mode(&self) -> EqMode {
        self.mode
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate_hz
    }

    /// Value copy of the full parameter set
    pub fn state(&self) -> EqualizerState {
        EqualizerState {
            enabled: self.enabled,
            mode: self.mode,
            parametric_bands: *self.parametric.bands(),
            graphic_bands: self.graphic_gains(),
            sample_rate_hz: self.sample_rate(),
        }
    }

    pub fn parametric_band(&self, index: usize) -> EqResult<ParametricBand> {
        self.parametric.get_band(index)
    }

    pub fn parametric_bands(&self) -> [ParametricBand; NUM_BANDS] {
        *self.parametric.bands()
    }

    pub fn graphic_band(&self, index: usize) -> EqResult<f64> {
        Ok(self.graphic.get_band(index)?.gain_db)
    }

    pub fn graphic_gains(&self) -> [f64; NUM_BANDS] {
        self.graphic.bands().map(|band| band.gain_db)
    }

    /// Cascade the renderer is running (identity stages while disabled included)
    pub fn active_cascade(&self) -> [BiquadCoeffs; NUM_BANDS] {
        *self.active_bank().cascade_coefficients()
    }

    /// Current change generation
    pub fn generation(&self) -> u64 {
        self.notifier.generation()
    }

    /// Handle the UI polls for "parameters changed"
    pub fn watcher(&self) -> ChangeWatcher {
        self.notifier.watch()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Setters
    // ═══════════════════════════════════════════════════════════════════

    /// Enable or bypass. Band parameters are kept either way.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            info!("Equalizer {}", if enabled { "enabled" } else { "disabled" });
        }
        self.enabled = enabled;
        self.commit();
    }

    /// Select which bank feeds the renderer; nothing is converted
    pub fn set_mode(&mut self, mode: EqMode) {
        if self.mode != mode {
            info!("Equalizer mode: {} -> {}", self.mode, mode);
        }
        self.mode = mode;
        self.commit();
    }

    /// Set one parametric band; values are clamped, the stored band is returned
    pub fn set_parametric_band(
        &mut self,
        index: usize,
        frequency_hz: f64,
        gain_db: f64,
        q: f64,
    ) -> EqResult<ParametricBand> {
        let band = self
            .parametric
            .set_band(index, ParametricBand::new(frequency_hz, gain_db, q))
            .inspect_err(|e| warn!("set_parametric_band rejected: {e}"))?;

        debug!(
            "Parametric band {index}: {:.1} Hz, {:+.1} dB, Q {:.2}",
            band.center_frequency_hz, band.gain_db, band.q
        );
        self.commit();
        Ok(band)
    }

    /// Replace all parametric bands
    pub fn set_parametric_bands(&mut self, bands: &[ParametricBand; NUM_BANDS]) {
        self.parametric.set_bands(bands);
        debug!("Parametric bands replaced");
        self.commit();
    }

    /// Set one graphic slider; returns the stored (clamped) gain
    pub fn set_graphic_band(&mut self, index: usize, gain_db: f64) -> EqResult<f64> {
        let band = graphic_band(index, clamp_gain_db(gain_db))
            .and_then(|band| self.graphic.set_band(index, band))
            .inspect_err(|e| warn!("set_graphic_band rejected: {e}"))?;

        debug!("Graphic band {index}: {:+.1} dB", band.gain_db);
        self.commit();
        Ok(band.gain_db)
    }

    /// Replace all graphic gains
    pub fn set_graphic_bands(&mut self, gains: &[f64; NUM_BANDS]) {
        self.graphic.set_bands(&to_parametric_bands(gains));
        debug!("Graphic bands replaced");
        self.commit();
    }

    /// Re-derive both banks for a new sample rate
    pub fn set_sample_rate(&mut self, sample_rate_hz: f64) -> EqResult<()> {
        validate_sample_rate(sample_rate_hz)
            .inspect_err(|e| warn!("set_sample_rate rejected: {e}"))?;

        self.config.sample_rate_hz = sample_rate_hz;
        self.parametric.set_sample_rate(sample_rate_hz);
        // rebuilt from the gains so the fixed centers survive a trip through a low rate
        self.graphic = BandBank::new(to_parametric_bands(&self.graphic_gains()), sample_rate_hz);

        info!("Equalizer sample rate: {sample_rate_hz} Hz");
        self.commit();
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Analysis
    // ═══════════════════════════════════════════════════════════════════

    /// Magnitude response of the current mode on a log grid
    pub fn frequency_response(&self, point_count: usize) -> ResponseCurve {
        compute_curve(&self.state(), self.sample_rate(), point_count)
    }

    /// Interpolated graphic slider curve
    pub fn graphic_preview(&self, point_count: usize) -> ResponseCurve {
        graphic_preview_curve(&self.graphic_gains(), point_count)
    }

    /// Offset every band of the current mode so mean output power is unchanged.
    ///
    /// Returns the applied compensation in dB (0 when already flat).
    pub fn apply_auto_gain(&mut self) -> f64 {
        let compensation = auto_gain_compensation_db(&self.active_cascade(), self.sample_rate());
        if compensation.abs() < AUTO_GAIN_EPSILON_DB {
            return 0.0;
        }

        match self.mode {
            EqMode::Parametric => self.parametric.offset_gains(compensation),
            EqMode::Graphic => self.graphic.offset_gains(compensation),
        }

        info!("Auto gain: {compensation:+.2} dB applied to {} bands", self.mode);
        self.commit();
        compensation
    }

    // ═══════════════════════════════════════════════════════════════════
    // Presets
    // ═══════════════════════════════════════════════════════════════════

    /// Switch to the preset's mode and load its bands.
    ///
    /// Missing bands fall back to flat defaults; more than ten bands is
    /// rejected and leaves the engine untouched.
    pub fn apply_preset(&mut self, preset: &Preset) -> EqResult<()> {
        if preset.band_count() > NUM_BANDS {
            let err = EqError::InvalidPreset(format!(
                "'{}' has {} bands, at most {NUM_BANDS} supported",
                preset.name,
                preset.band_count()
            ));
            warn!("{err}");
            return Err(err);
        }

        match &preset.data {
            PresetData::Parametric(bands) => {
                let mut full = default_parametric_bands();
                for (slot, band) in full.iter_mut().zip(bands) {
                    *slot = *band;
                }
                self.parametric.set_bands(&full);
            }
            PresetData::Graphic(gains) => {
                let mut full = [0.0; NUM_BANDS];
                for (slot, gain) in full.iter_mut().zip(gains) {
                    *slot = clamp_gain_db(*gain);
                }
                self.graphic.set_bands(&to_parametric_bands(&full));
            }
        }
        self.mode = preset.mode();

        info!("Preset '{}' applied ({} mode)", preset.name, self.mode);
        self.commit();
        Ok(())
    }

    /// Record of the current mode's bands
    pub fn capture_preset(&self, name: &str) -> Preset {
        match self.mode {
            EqMode::Parametric => Preset::parametric(name, self.parametric_bands().to_vec()),
            EqMode::Graphic => Preset::graphic(name, self.graphic_gains().to_vec()),
        }
    }

    fn active_bank(&self) -> &BandBank {
        match self.mode {
            EqMode::Parametric => &self.parametric,
            EqMode::Graphic => &self.graphic,
        }
    }

    /// Publish the current coefficients and signal the change
    fn commit(&mut self) {
        let generation = self.notifier.notify();
        let snapshot = CoefficientSnapshot {
            enabled: self.enabled,
            mode: self.mode,
            sample_rate_hz: self.sample_rate(),
            coeffs: self.active_cascade(),
            generation,
        };
        self.writer.publish(snapshot);
    }
}

impl std::fmt::Debug for EqualizerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EqualizerEngine")
            .field("enabled", &self.enabled)
            .field("mode", &self.mode)
            .field("sample_rate", &self.sample_rate())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use eq_core::{DEFAULT_PARAMETRIC_FREQUENCIES_HZ, GRAPHIC_FREQUENCIES_HZ, GRAPHIC_Q};

    fn engine() -> (EqualizerEngine, EqRenderer) {
        EqualizerEngine::initialize(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let (engine, renderer) = engine();
        let state = engine.state();
        assert!(state.enabled);
        assert_eq!(state.mode, EqMode::Parametric);
        assert_eq!(state.graphic_bands, [0.0; NUM_BANDS]);
        for (band, freq) in state.parametric_bands.iter().zip(DEFAULT_PARAMETRIC_FREQUENCIES_HZ) {
            assert_eq!(*band, ParametricBand::flat(freq));
        }
        assert_eq!(renderer.channel_capacity(), 2);
        assert_eq!(engine.generation(), 0);
    }

    #[test]
    fn test_initialize_rejects_bad_config() {
        let config = EngineConfig::new(0.0, 256);
        assert!(matches!(
            EqualizerEngine::initialize(config),
            Err(EqError::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn test_set_parametric_band_clamps_and_publishes() {
        let (mut engine, _renderer) = engine();
        let band = engine.set_parametric_band(2, 50_000.0, 45.0, 0.0).unwrap();
        assert_eq!(band, ParametricBand::new(20000.0, 30.0, 0.1));
        assert_eq!(engine.parametric_band(2).unwrap(), band);
        assert_eq!(engine.generation(), 1);
    }

    #[test]
    fn test_out_of_range_index_has_no_effect() {
        let (mut engine, _renderer) = engine();
        let before = engine.state();

        assert!(engine.set_parametric_band(10, 1000.0, 6.0, 1.0).is_err());
        assert!(engine.set_graphic_band(11, 6.0).is_err());
        assert!(engine.graphic_band(10).is_err());

        assert_eq!(engine.state(), before);
        assert_eq!(engine.generation(), 0);
    }

    #[test]
    fn test_mode_isolation() {
        let (mut engine, _renderer) = engine();
        engine.set_mode(EqMode::Graphic);
        engine.set_graphic_band(4, -3.0).unwrap();
        engine.set_parametric_band(4, 700.0, 5.0, 2.0).unwrap();

        assert_eq!(engine.graphic_gains()[4], -3.0);
        engine.set_mode(EqMode::Parametric);
        engine.set_graphic_band(4, 8.0).unwrap();
        assert_eq!(engine.parametric_band(4).unwrap(), ParametricBand::new(700.0, 5.0, 2.0));
        assert_eq!(engine.graphic_band(4).unwrap(), 8.0);
    }

    #[test]
    fn test_active_cascade_follows_mode() {
        let (mut engine, _renderer) = engine();
        engine.set_graphic_band(5, 6.0).unwrap();
        assert!(engine.active_cascade().iter().all(BiquadCoeffs::is_identity));

        engine.set_mode(EqMode::Graphic);
        let expected = eq_dsp::derive_coefficients(GRAPHIC_FREQUENCIES_HZ[5], 6.0, GRAPHIC_Q, 48000.0);
        assert_eq!(engine.active_cascade()[5], expected);
    }

    #[test]
    fn test_disable_preserves_bands() {
        let (mut engine, _renderer) = engine();
        engine.set_parametric_band(0, 100.0, 4.0, 1.0).unwrap();
        engine.set_enabled(false);
        assert_eq!(engine.frequency_response(50).peak_abs_db(), 0.0);

        engine.set_enabled(true);
        assert_eq!(engine.parametric_band(0).unwrap(), ParametricBand::new(100.0, 4.0, 1.0));
        assert!(engine.frequency_response(50).peak_abs_db() > 3.0);
    }

    #[test]
    fn test_watcher_sees_changes() {
        let (mut engine, _renderer) = engine();
        let mut watcher = engine.watcher();
        assert!(!watcher.has_changed());

        engine.set_graphic_band(0, 1.0).unwrap();
        assert!(watcher.has_changed());
        assert!(!watcher.has_changed());
    }

    #[test]
    fn test_sample_rate_change() {
        let (mut engine, _renderer) = engine();
        engine.set_graphic_band(9, 3.0).unwrap();

        engine.set_sample_rate(22050.0).unwrap();
        engine.set_sample_rate(48000.0).unwrap();
        engine.set_mode(EqMode::Graphic);
        let expected = eq_dsp::derive_coefficients(16000.0, 3.0, GRAPHIC_Q, 48000.0);
        assert_eq!(engine.active_cascade()[9], expected);

        assert!(engine.set_sample_rate(f64::NAN).is_err());
        assert_eq!(engine.sample_rate(), 48000.0);
    }

    #[test]
    fn test_auto_gain_flat_is_noop() {
        let (mut engine, _renderer) = engine();
        assert_eq!(engine.apply_auto_gain(), 0.0);
        assert_eq!(engine.generation(), 0);
    }

    #[test]
    fn test_auto_gain_offsets_current_mode() {
        let (mut engine, _renderer) = engine();
        engine.set_mode(EqMode::Graphic);
        engine.set_graphic_bands(&[6.0; NUM_BANDS]);
        engine.set_parametric_band(0, 100.0, 2.0, 1.0).unwrap();

        let compensation = engine.apply_auto_gain();
        assert!(compensation < 0.0);
        for gain in engine.graphic_gains() {
            assert_relative_eq!(gain, 6.0 + compensation, epsilon = 1e-12);
        }
        assert_eq!(engine.parametric_band(0).unwrap().gain_db, 2.0);
    }

    #[test]
    fn test_preset_apply_and_capture() {
        let (mut engine, _renderer) = engine();
        let preset = Preset::graphic("Loudness", vec![4.0, 3.0, 1.0]);
        engine.apply_preset(&preset).unwrap();

        assert_eq!(engine.mode(), EqMode::Graphic);
        assert_eq!(engine.graphic_gains(), [4.0, 3.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);

        let captured = engine.capture_preset("Loudness");
        assert_eq!(captured.mode(), EqMode::Graphic);
        assert_eq!(captured.band_count(), NUM_BANDS);
    }

    #[test]
    fn test_preset_padding_and_overflow() {
        let (mut engine, _renderer) = engine();
        let preset = Preset::parametric("Two", vec![ParametricBand::new(80.0, 3.0, 0.7)]);
        engine.apply_preset(&preset).unwrap();
        assert_eq!(engine.parametric_band(0).unwrap(), ParametricBand::new(80.0, 3.0, 0.7));
        assert_eq!(engine.parametric_band(1).unwrap(), ParametricBand::flat(62.0));

        let generation = engine.generation();
        let too_many = Preset::parametric("Many", vec![ParametricBand::default(); 11]);
        assert!(matches!(engine.apply_preset(&too_many), Err(EqError::InvalidPreset(_))));
        assert_eq!(engine.generation(), generation);
    }

    #[test]
    fn test_shared_handle() {
        let (engine, _renderer) = engine();
        let shared = engine.into_shared();
        let ui = Arc::clone(&shared);
        ui.lock().set_enabled(false);
        assert!(!shared.lock().is_enabled());
    }
}
