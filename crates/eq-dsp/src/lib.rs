//! eq-dsp: Filter math for the 10-band equalizer
//!
//! ## Modules
//! - `biquad` - TDF-II peaking biquad, coefficient derivation, transfer-function magnitude
//! - `bank` - 10-band bank with clamping and per-band coefficient recomputation
//! - `graphic` - graphic-to-parametric mapping and the graphic slider curve
//! - `response` - log-spaced magnitude response and mean power gain
//! - `state` - equalizer state value type

pub mod bank;
pub mod biquad;
pub mod graphic;
pub mod response;
pub mod state;

pub use bank::BandBank;
pub use biquad::{BiquadCoeffs, BiquadState, BiquadTDF2, derive_coefficients, process_sample};
pub use graphic::{
    graphic_preview_curve, graphic_response_db, map_graphic_gains, to_parametric_bands,
};
pub use response::{ResponseCurve, ResponsePoint, compute_curve};
pub use state::EqualizerState;

use eq_core::Sample;

/// Trait for all DSP processors
pub trait Processor: Send {
    /// Reset processor state
    fn reset(&mut self);

    /// Get latency in samples
    fn latency(&self) -> usize {
        0
    }
}

/// Mono processor trait
pub trait MonoProcessor: Processor {
    /// Process a single sample
    fn process_sample(&mut self, input: Sample) -> Sample;

    /// Process a block of samples
    fn process_block(&mut self, buffer: &mut [Sample]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}

/// Processor configuration for sample rate changes
pub trait ProcessorConfig {
    fn set_sample_rate(&mut self, sample_rate: f64);
}
