//! Lock-Free Snapshot Publication
//!
//! Single-producer / single-consumer triple buffer:
//! - Writer fills its private back buffer and swaps it into the middle slot
//! - Reader swaps the middle slot into its private front buffer when fresh
//! - Neither side ever blocks or allocates
//!
//! The two halves come out of [`triple_buffer`] and cannot be cloned, so
//! ownership guarantees one writer and one reader.

use eq_core::{EqMode, NUM_BANDS};
use eq_dsp::BiquadCoeffs;
use portable_atomic::{AtomicU32, Ordering};
use std::cell::UnsafeCell;
use std::sync::Arc;

const INDEX_MASK: u32 = 0b11;
const MIDDLE_SHIFT: u32 = 2;
const FRONT_SHIFT: u32 = 4;
const FRESH_BIT: u32 = 1 << 6;

/// Coefficient set the renderer applies for one buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoefficientSnapshot {
    pub enabled: bool,
    pub mode: EqMode,
    pub sample_rate_hz: f64,
    /// Active mode's cascade in band-index order
    pub coeffs: [BiquadCoeffs; NUM_BANDS],
    /// Change counter value at publication
    pub generation: u64,
}

impl CoefficientSnapshot {
    /// Enabled, parametric, all bands at unity
    pub fn flat(sample_rate_hz: f64) -> Self {
        Self {
            enabled: true,
            mode: EqMode::Parametric,
            sample_rate_hz,
            coeffs: [BiquadCoeffs::IDENTITY; NUM_BANDS],
            generation: 0,
        }
    }
}

/// Shared storage: three slots plus one state word
struct TripleBuffer<T> {
    buffers: [UnsafeCell<T>; 3],
    /// bits 0-1 = back (writer), bits 2-3 = middle, bits 4-5 = front (reader), bit 6 = fresh
    state: AtomicU32,
}

// SAFETY: the back slot is only touched by the writer half and the front
// slot only by the reader half; ownership of a slot changes hands through
// the AcqRel exchange on `state`.
unsafe impl<T: Send> Sync for TripleBuffer<T> {}

#[inline]
fn back_of(state: u32) -> u32 {
    state & INDEX_MASK
}

#[inline]
fn middle_of(state: u32) -> u32 {
    (state >> MIDDLE_SHIFT) & INDEX_MASK
}

#[inline]
fn front_of(state: u32) -> u32 {
    (state >> FRONT_SHIFT) & INDEX_MASK
}

#[inline]
fn pack(back: u32, middle: u32, front: u32) -> u32 {
    back | (middle << MIDDLE_SHIFT) | (front << FRONT_SHIFT)
}

/// Create a triple buffer and split it into writer and reader halves
pub fn triple_buffer<T: Copy + Send>(initial: T) -> (SnapshotWriter<T>, SnapshotReader<T>) {
    let shared = Arc::new(TripleBuffer {
        buffers: [
            UnsafeCell::new(initial),
            UnsafeCell::new(initial),
            UnsafeCell::new(initial),
        ],
        state: AtomicU32::new(pack(0, 1, 2)),
    });

    (
        SnapshotWriter {
            shared: Arc::clone(&shared),
        },
        SnapshotReader { shared },
    )
}

/// Producer half (control thread)
pub struct SnapshotWriter<T> {
    shared: Arc<TripleBuffer<T>>,
}

impl<T: Copy> SnapshotWriter<T> {
    /// Publish a new value; the reader picks it up on its next `read`
    pub fn publish(&mut self, value: T) {
        let back = back_of(self.shared.state.load(Ordering::Relaxed)) as usize;

        // SAFETY: the back slot belongs to this writer until the exchange below
        unsafe {
            *self.shared.buffers[back].get() = value;
        }

        let mut current = self.shared.state.load(Ordering::Relaxed);
        loop {
            let next = pack(middle_of(current), back_of(current), front_of(current)) | FRESH_BIT;
            match self.shared.state.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }
}

/// Consumer half (audio thread)
pub struct SnapshotReader<T> {
    shared: Arc<TripleBuffer<T>>,
}

impl<T: Copy> SnapshotReader<T> {
    /// Latest published value (or the previous one if nothing new arrived)
    pub fn read(&mut self) -> &T {
        let mut current = self.shared.state.load(Ordering::Relaxed);
        if current & FRESH_BIT != 0 {
            loop {
                let next = pack(back_of(current), front_of(current), middle_of(current));
                match self.shared.state.compare_exchange_weak(
                    current,
                    next,
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => break,
                    Err(actual) => current = actual,
                }
            }
        }

        let front = front_of(self.shared.state.load(Ordering::Relaxed)) as usize;
        // SAFETY: the front slot belongs to this reader until it swaps again
        unsafe { &*self.shared.buffers[front].get() }
    }

    /// Whether a newer value is waiting
    pub fn has_update(&self) -> bool {
        self.shared.state.load(Ordering::Relaxed) & FRESH_BIT != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_initial_value() {
        let (_writer, mut reader) = triple_buffer(7u64);
        assert!(!reader.has_update());
        assert_eq!(*reader.read(), 7);
    }

    #[test]
    fn test_last_write_wins() {
        let (mut writer, mut reader) = triple_buffer(0u64);
        writer.publish(1);
        writer.publish(2);
        writer.publish(3);
        assert!(reader.has_update());
        assert_eq!(*reader.read(), 3);
        assert!(!reader.has_update());
        assert_eq!(*reader.read(), 3);
    }

    #[test]
    fn test_interleaved() {
        let (mut writer, mut reader) = triple_buffer(0u64);
        for i in 1..100 {
            writer.publish(i);
            assert_eq!(*reader.read(), i);
        }
    }

    #[test]
    fn test_no_torn_reads_across_threads() {
        #[derive(Clone, Copy)]
        struct Pair {
            a: u64,
            b: u64,
            c: [u64; 8],
        }

        let (mut writer, mut reader) = triple_buffer(Pair { a: 0, b: 0, c: [0; 8] });

        let producer = thread::spawn(move || {
            for i in 1..=20_000u64 {
                writer.publish(Pair {
                    a: i,
                    b: i * 2,
                    c: [i; 8],
                });
            }
        });

        let mut last = 0;
        loop {
            let pair = *reader.read();
            assert_eq!(pair.b, pair.a * 2);
            assert!(pair.c.iter().all(|&c| c == pair.a));
            assert!(pair.a >= last);
            last = pair.a;
            if last == 20_000 {
                break;
            }
            std::hint::spin_loop();
        }

        producer.join().unwrap();
    }
}
