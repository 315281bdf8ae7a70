//! Block-paced render callback.
//!
//! The device hands us an output buffer of arbitrary length; internally the
//! engine renders fixed 32-sample blocks. At each block boundary both event
//! queues are drained completely, so every MIDI and parameter event queued
//! before the boundary is applied to the engine before that block is
//! rendered, and nothing is applied mid-block. This path never allocates,
//! locks, or performs I/O.

use std::sync::Arc;
use std::time::Instant;

use aulos_types::{MidiEvent, ParamUpdate, Synthesizer, BLOCK_SIZE};

use crate::metrics::AudioMetrics;
use crate::ring::RingConsumer;

/// Consumes both realtime queues and pulls rendered blocks from the engine.
/// Owned by the audio device callback; the single consumer of both rings.
pub struct BlockRenderer<E> {
    engine: Arc<E>,
    midi_rx: RingConsumer<MidiEvent>,
    param_rx: RingConsumer<ParamUpdate>,
    metrics: AudioMetrics,
    left: [f32; BLOCK_SIZE],
    right: [f32; BLOCK_SIZE],
    /// Read position within the current block. Starts exhausted so the first
    /// output sample forces a drain + render.
    pos: usize,
}

impl<E: Synthesizer> BlockRenderer<E> {
    pub fn new(
        engine: Arc<E>,
        midi_rx: RingConsumer<MidiEvent>,
        param_rx: RingConsumer<ParamUpdate>,
        metrics: AudioMetrics,
    ) -> Self {
        Self {
            engine,
            midi_rx,
            param_rx,
            metrics,
            left: [0.0; BLOCK_SIZE],
            right: [0.0; BLOCK_SIZE],
            pos: BLOCK_SIZE,
        }
    }

    /// Re-propagate the device sample rate into the engine. Called before the
    /// stream starts, and again whenever the device restarts with a new rate.
    pub fn prepare(&mut self, sample_rate: f64) {
        self.engine.set_sample_rate(sample_rate);
    }

    /// Fill one interleaved device buffer. Channel 0 is left, channel 1 is
    /// right, any further channels are silenced.
    pub fn render_into(&mut self, out: &mut [f32], channels: usize) {
        let started = Instant::now();

        // Engine housekeeping runs every callback, before any buffer work.
        self.engine.process_pending_control();

        for frame in out.chunks_mut(channels) {
            if self.pos >= BLOCK_SIZE {
                self.drain_events();
                self.engine.render_block(&mut self.left, &mut self.right);
                self.pos = 0;
            }
            frame[0] = self.left[self.pos];
            if channels > 1 {
                frame[1] = self.right[self.pos];
            }
            for sample in frame.iter_mut().skip(2) {
                *sample = 0.0;
            }
            self.pos += 1;
        }

        self.metrics.record_callback(started.elapsed());
    }

    /// Drain both queues in FIFO order. Raw MIDI that fails to parse is a
    /// no-op for that event; nothing propagates out of the apply step.
    fn drain_events(&mut self) {
        let engine = &self.engine;
        self.midi_rx.drain_all(|event| {
            if let Some(kind) = event.parse() {
                engine.apply_midi(kind);
            }
        });
        self.param_rx
            .drain_all(|update| engine.apply_realtime_parameter(update.param, update.value));
    }
}
