//! eq-engine: Real-time 10-band equalizer engine
//!
//! The engine is split in two halves at initialization:
//! - [`EqualizerEngine`] - control plane (setters, analysis, presets), owned by the UI side
//! - [`EqRenderer`] - render path, owned by the audio callback
//!
//! Coefficients travel from one to the other through a lock-free triple
//! buffer; the audio thread never waits on the control thread.
//!
//! ```ignore
//! let (mut engine, mut renderer) = EqualizerEngine::initialize(EngineConfig::new(48000.0, 256))?;
//! engine.set_parametric_band(5, 1000.0, 6.0, 1.41)?;
//! renderer.process_buffer(&mut samples, 2, 256);
//! ```

mod config;
mod engine;
mod notify;
mod preset;
mod renderer;
mod snapshot;

pub use config::*;
pub use engine::*;
pub use notify::*;
pub use preset::*;
pub use renderer::*;
pub use snapshot::{CoefficientSnapshot, SnapshotReader, SnapshotWriter, triple_buffer};
