//! Parameter change notification
//!
//! The control plane bumps a shared counter on every accepted mutation.
//! UI layers poll a [`ChangeWatcher`] instead of subscribing to a stream.

use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counter owned by the control plane
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    generation: Arc<AtomicU64>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a change and return the new generation
    pub fn notify(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn watch(&self) -> ChangeWatcher {
        ChangeWatcher {
            generation: Arc::clone(&self.generation),
            seen: self.generation(),
        }
    }
}

/// Polling handle for "parameters changed"
#[derive(Debug, Clone)]
pub struct ChangeWatcher {
    generation: Arc<AtomicU64>,
    seen: u64,
}

impl ChangeWatcher {
    /// True once per batch of changes since the last call
    pub fn has_changed(&mut self) -> bool {
        let current = self.generation.load(Ordering::Acquire);
        if current != self.seen {
            self.seen = current;
            true
        } else {
            false
        }
    }

    /// Generation last observed by this watcher
    pub fn seen(&self) -> u64 {
        self.seen
    }
}
