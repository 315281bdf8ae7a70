//! Lock-free counters for the realtime boundary.
//!
//! Events refused by a full ring buffer are never logged from the producing
//! callback; they are counted here and surfaced later from a non-realtime
//! thread. Callback timing uses plain atomic stores so the audio thread
//! records without allocation or locking.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Counters {
    midi_dropped: AtomicU64,
    param_dropped: AtomicU64,
    callbacks: AtomicU64,
    /// Longest device callback seen since the last `take_summary`.
    max_callback_us: AtomicU32,
}

/// Cloneable handle to the shared counters. One handle lives in the MIDI
/// driver callback, one in the command router, one in the render callback,
/// and one wherever summaries get logged.
#[derive(Clone, Default)]
pub struct AudioMetrics {
    inner: Arc<Counters>,
}

impl AudioMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_midi_drop(&self) {
        self.inner.midi_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count_param_drop(&self) {
        self.inner.param_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn midi_dropped(&self) -> u64 {
        self.inner.midi_dropped.load(Ordering::Relaxed)
    }

    pub fn param_dropped(&self) -> u64 {
        self.inner.param_dropped.load(Ordering::Relaxed)
    }

    /// Record one device callback's duration. Audio thread only.
    #[inline]
    pub fn record_callback(&self, duration: Duration) {
        let us = duration.as_micros().min(u32::MAX as u128) as u32;
        self.inner.callbacks.fetch_add(1, Ordering::Relaxed);
        self.inner.max_callback_us.fetch_max(us, Ordering::Relaxed);
    }

    /// Snapshot `(callbacks, max_callback_us, midi_dropped, param_dropped)`
    /// and reset the max for the next observation window. Drop counts stay
    /// cumulative.
    pub fn take_summary(&self) -> (u64, u32, u64, u64) {
        (
            self.inner.callbacks.load(Ordering::Relaxed),
            self.inner.max_callback_us.swap(0, Ordering::Relaxed),
            self.midi_dropped(),
            self.param_dropped(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_counters() {
        let m = AudioMetrics::new();
        m.count_midi_drop();
        m.count_midi_drop();
        m.count_param_drop();
        assert_eq!(m.midi_dropped(), 2);
        assert_eq!(m.param_dropped(), 1);

        // Clones observe the same counters.
        let m2 = m.clone();
        m2.count_midi_drop();
        assert_eq!(m.midi_dropped(), 3);
    }

    #[test]
    fn test_summary_resets_max_only() {
        let m = AudioMetrics::new();
        m.record_callback(Duration::from_micros(120));
        m.record_callback(Duration::from_micros(80));
        m.count_midi_drop();

        let (callbacks, max_us, midi, param) = m.take_summary();
        assert_eq!(callbacks, 2);
        assert_eq!(max_us, 120);
        assert_eq!(midi, 1);
        assert_eq!(param, 0);

        let (callbacks, max_us, midi, _) = m.take_summary();
        assert_eq!(callbacks, 2);
        assert_eq!(max_us, 0);
        assert_eq!(midi, 1);
    }
}
