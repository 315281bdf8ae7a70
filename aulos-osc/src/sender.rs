//! Outbound OSC over a dedicated send thread.
//!
//! Messages are encoded on the calling thread and pushed onto a bounded
//! channel; the `osc-sender` thread drains it and performs `send_to`, keeping
//! UDP I/O off every caller. A full queue drops the message with a warning
//! rather than blocking.

use std::net::{SocketAddr, UdpSocket};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Sender, TrySendError};
use rosc::{OscMessage, OscPacket, OscType};

/// Capacity of the send queue; a full parameter dump fits with room to spare.
const SEND_QUEUE_CAPACITY: usize = 512;

/// Sending half of the control surface. Stopped at construction; `start`
/// binds an ephemeral local socket and spawns the sender thread.
pub struct OscSender {
    tx: Option<Sender<Vec<u8>>>,
    handle: Option<JoinHandle<()>>,
    port: Option<u16>,
}

impl OscSender {
    pub fn new() -> Self {
        Self {
            tx: None,
            handle: None,
            port: None,
        }
    }

    pub fn is_sending(&self) -> bool {
        self.tx.is_some()
    }

    /// Target port while active.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Begin sending to `host:port`. An active sender is restarted with the
    /// new target. On failure the sender stays stopped.
    pub fn start(&mut self, host: &str, port: u16) -> Result<(), String> {
        self.stop();

        let target: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| format!("invalid OSC output target {}:{}: {}", host, port, e))?;
        let socket = UdpSocket::bind("0.0.0.0:0")
            .map_err(|e| format!("could not open OSC output socket: {}", e))?;

        let (tx, rx) = crossbeam_channel::bounded::<Vec<u8>>(SEND_QUEUE_CAPACITY);
        let handle = thread::Builder::new()
            .name("osc-sender".into())
            .spawn(move || {
                while let Ok(buf) = rx.recv() {
                    if let Err(e) = socket.send_to(&buf, target) {
                        log::warn!(target: "osc", "could not send OSC message: {}", e);
                    }
                }
            })
            .map_err(|e| format!("failed to spawn osc-sender thread: {}", e))?;

        self.tx = Some(tx);
        self.handle = Some(handle);
        self.port = Some(port);
        log::info!(target: "osc", "OSC output started on port {}", port);
        Ok(())
    }

    /// Stop the sender thread. Idempotent; queued messages already handed to
    /// the thread are flushed before it exits.
    pub fn stop(&mut self) {
        if self.tx.take().is_some() {
            log::info!(target: "osc", "OSC output stopped");
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        self.port = None;
    }

    /// Queue one message with a single string argument. A no-op while
    /// stopped; never blocks the caller.
    pub fn send(&self, addr: &str, value: &str) {
        let Some(ref tx) = self.tx else { return };

        let packet = OscPacket::Message(OscMessage {
            addr: addr.to_string(),
            args: vec![OscType::String(value.to_string())],
        });
        let buf = match rosc::encoder::encode(&packet) {
            Ok(buf) => buf,
            Err(e) => {
                log::warn!(target: "osc", "could not encode OSC message for {}: {}", addr, e);
                return;
            }
        };

        match tx.try_send(buf) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::warn!(target: "osc", "OSC send queue full, dropping message for {}", addr);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

impl Default for OscSender {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for OscSender {
    fn drop(&mut self) {
        self.stop();
    }
}
