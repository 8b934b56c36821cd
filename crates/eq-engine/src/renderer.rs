//! Real-time render path
//!
//! [`EqRenderer`] is the audio thread's half of the engine. It reads the
//! latest coefficient snapshot once per buffer and owns every channel's
//! filter registers. Nothing in here locks, allocates or logs.

use eq_core::{NUM_BANDS, Sample};
use eq_dsp::{BiquadState, Processor};

use crate::snapshot::{CoefficientSnapshot, SnapshotReader};

/// Per-channel filter registers, one pair per band
type ChannelState = [BiquadState; NUM_BANDS];

/// Audio-thread renderer
pub struct EqRenderer {
    reader: SnapshotReader<CoefficientSnapshot>,
    current: CoefficientSnapshot,
    /// Stages that are not the identity filter in `current`
    active: [bool; NUM_BANDS],
    states: Vec<ChannelState>,
}

impl EqRenderer {
    pub(crate) fn new(
        reader: SnapshotReader<CoefficientSnapshot>,
        initial: CoefficientSnapshot,
        max_channels: usize,
    ) -> Self {
        Self {
            reader,
            current: initial,
            active: active_stages(&initial),
            states: vec![[BiquadState::ZERO; NUM_BANDS]; max_channels],
        }
    }

    /// Filter an interleaved buffer in place.
    ///
    /// Each channel runs the active mode's cascade in band order through
    /// its own registers. A disabled engine leaves the buffer untouched.
    /// Channels past the configured maximum and frames past the end of
    /// `samples` are skipped.
    pub fn process_buffer(&mut self, samples: &mut [Sample], channel_count: usize, frame_count: usize) {
        self.sync_snapshot();

        if !self.current.enabled || channel_count == 0 {
            return;
        }

        let frames = frame_count.min(samples.len() / channel_count);
        let coeffs = &self.current.coeffs;
        let active = &self.active;

        for (channel, state) in self.states.iter_mut().take(channel_count).enumerate() {
            for sample in samples.iter_mut().skip(channel).step_by(channel_count).take(frames) {
                let mut x = *sample;
                for ((stage, c), &on) in state.iter_mut().zip(coeffs).zip(active) {
                    if on {
                        x = stage.process(c, x);
                    }
                }
                *sample = x;
            }
        }
    }

    /// Filter one mono block with channel 0's registers
    pub fn process_mono(&mut self, samples: &mut [Sample]) {
        let frames = samples.len();
        self.process_buffer(samples, 1, frames);
    }

    /// Snapshot applied to the most recent buffer
    #[inline]
    pub fn snapshot(&self) -> &CoefficientSnapshot {
        &self.current
    }

    /// Number of channels with their own filter registers
    #[inline]
    pub fn channel_capacity(&self) -> usize {
        self.states.len()
    }

    /// Registers of one channel, `None` past the channel capacity
    pub fn channel_state(&self, channel: usize) -> Option<&[BiquadState; NUM_BANDS]> {
        self.states.get(channel)
    }

    /// Adopt a newer snapshot if one was published.
    ///
    /// Registers are cleared when the cascade they belong to goes away:
    /// mode switch, sample-rate change, or resuming from disabled. A stage
    /// that is switched in or out of the cascade starts from zero, since
    /// skipped stages do not advance their registers.
    fn sync_snapshot(&mut self) {
        if !self.reader.has_update() {
            return;
        }

        let next = *self.reader.read();
        let previous = self.current;
        let was_active = self.active;
        self.current = next;
        self.active = active_stages(&next);

        if next.mode != previous.mode
            || next.sample_rate_hz != previous.sample_rate_hz
            || (next.enabled && !previous.enabled)
        {
            self.reset();
            return;
        }

        for band in (0..NUM_BANDS).filter(|&b| was_active[b] != self.active[b]) {
            for state in &mut self.states {
                state[band].reset();
            }
        }
    }
}

impl Processor for EqRenderer {
    fn reset(&mut self) {
        for state in &mut self.states {
            state.iter_mut().for_each(BiquadState::reset);
        }
    }
}

#[inline]
fn active_stages(snapshot: &CoefficientSnapshot) -> [bool; NUM_BANDS] {
    snapshot.coeffs.map(|c| !c.is_identity())
}
