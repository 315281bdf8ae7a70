//! MIDI input via midir.
//!
//! The driver callback's entire job is to copy the message bytes into a
//! fixed-size [`MidiEvent`] and push it onto the realtime queue. No parsing,
//! filtering, or blocking happens there; a full queue only bumps a counter.

use midir::{MidiInput, MidiInputConnection};

use aulos_types::MidiEvent;

use crate::metrics::AudioMetrics;
use crate::ring::RingProducer;

/// Information about an available MIDI input port.
#[derive(Debug, Clone)]
pub struct MidiPortInfo {
    pub index: usize,
    pub name: String,
}

/// Owns the driver connection and the producer side of the MIDI queue.
pub struct MidiInputManager {
    midi_in: Option<MidiInput>,
    connection: Option<MidiInputConnection<()>>,
    connected_port_name: Option<String>,
}

impl MidiInputManager {
    pub fn new() -> Self {
        Self {
            midi_in: MidiInput::new("aulos").ok(),
            connection: None,
            connected_port_name: None,
        }
    }

    /// Enumerate the MIDI input ports currently visible to the driver.
    pub fn list_ports(&self) -> Vec<MidiPortInfo> {
        let mut out = Vec::new();
        if let Some(ref midi_in) = self.midi_in {
            for (index, port) in midi_in.ports().iter().enumerate() {
                if let Ok(name) = midi_in.port_name(port) {
                    out.push(MidiPortInfo { index, name });
                }
            }
        }
        out
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn connected_port_name(&self) -> Option<&str> {
        self.connected_port_name.as_deref()
    }

    /// Connect to a port by index; `producer` and `metrics` move into the
    /// driver callback, making it the queue's single writer.
    pub fn connect(
        &mut self,
        port_index: usize,
        mut producer: RingProducer<MidiEvent>,
        metrics: AudioMetrics,
    ) -> Result<(), String> {
        self.disconnect();

        // midir consumes the MidiInput on connect; make a fresh one.
        let midi_in = MidiInput::new("aulos").map_err(|e| e.to_string())?;
        let ports = midi_in.ports();
        let port = ports
            .get(port_index)
            .ok_or_else(|| format!("invalid MIDI port index: {}", port_index))?;
        let port_name = midi_in
            .port_name(port)
            .unwrap_or_else(|_| "Unknown".to_string());

        let connection = midi_in
            .connect(
                port,
                "aulos-input",
                move |timestamp_us, bytes, _| {
                    if let Some(event) = MidiEvent::from_bytes(timestamp_us, bytes) {
                        if !producer.try_push(event) {
                            metrics.count_midi_drop();
                        }
                    }
                },
                (),
            )
            .map_err(|e| e.to_string())?;

        self.connection = Some(connection);
        self.connected_port_name = Some(port_name);
        self.midi_in = MidiInput::new("aulos").ok();
        Ok(())
    }

    /// Close the driver connection. The queue producer moved into the
    /// callback is dropped with it.
    pub fn disconnect(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close();
        }
        self.connected_port_name = None;
    }
}

impl Default for MidiInputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MidiInputManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}
