//! Serializes engine parameter state to the outbound control surface.

use std::sync::Arc;

use aulos_types::Synthesizer;

use crate::sender::OscSender;

/// Owns the outbound sender and knows how to express engine state as
/// address-tagged messages. Runs on non-realtime threads only.
pub struct StateExporter<E> {
    engine: Arc<E>,
    sender: OscSender,
}

impl<E: Synthesizer> StateExporter<E> {
    /// Construction leaves sending stopped.
    pub fn new(engine: Arc<E>) -> Self {
        Self {
            engine,
            sender: OscSender::new(),
        }
    }

    pub fn start_sending(&mut self, host: &str, port: u16) -> Result<(), String> {
        self.sender.start(host, port)
    }

    pub fn stop_sending(&mut self) {
        self.sender.stop();
    }

    pub fn is_sending(&self) -> bool {
        self.sender.is_sending()
    }

    pub fn port(&self) -> Option<u16> {
        self.sender.port()
    }

    /// Emit a single message. Fire-and-forget; failures are logged by the
    /// sender thread and never retried.
    pub fn send(&self, addr: &str, value: &str) {
        self.sender.send(addr, value);
    }

    /// Emit one message per engine parameter, in the engine's declaration
    /// order, each value formatted for its kind.
    pub fn send_all_parameters(&self) {
        for (addr, value) in self.engine.ordered_parameters() {
            self.sender.send(&addr, &value.to_wire_string());
        }
    }
}
