//! Inbound OSC listener.
//!
//! One thread blocks on a UDP socket, decodes datagrams with rosc, and feeds
//! packets to the router it owns. Undecodable datagrams are dropped. The
//! listener is stopped at construction; `start` binds the port and takes
//! ownership of the router, `stop` is idempotent and joins the thread.

use std::io::ErrorKind;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use aulos_types::Synthesizer;

use crate::router::CommandRouter;

/// How often the listener thread checks the running flag while idle.
const RECV_TIMEOUT: Duration = Duration::from_millis(250);

pub struct OscReceiver {
    /// Shared with the listener thread. `stop` clears it to signal shutdown;
    /// the thread clears it itself when the socket dies, so status queries
    /// never report a listener whose thread has already exited.
    running: Option<Arc<AtomicBool>>,
    handle: Option<JoinHandle<()>>,
    port: Option<u16>,
}

impl OscReceiver {
    pub fn new() -> Self {
        Self {
            running: None,
            handle: None,
            port: None,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.running
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }

    /// Bound port while active.
    pub fn port(&self) -> Option<u16> {
        if self.is_listening() {
            self.port
        } else {
            None
        }
    }

    /// Bind `port` (0 picks an ephemeral port) and start dispatching inbound
    /// messages through `router`. Returns the effective bound port. On any
    /// failure the listener stays stopped.
    pub fn start<E: Synthesizer + 'static>(
        &mut self,
        port: u16,
        router: CommandRouter<E>,
    ) -> Result<u16, String> {
        self.stop();

        let socket = UdpSocket::bind(("0.0.0.0", port))
            .map_err(|e| format!("could not bind OSC input port {}: {}", port, e))?;
        let bound_port = socket
            .local_addr()
            .map_err(|e| format!("could not read bound address: {}", e))?
            .port();
        socket
            .set_read_timeout(Some(RECV_TIMEOUT))
            .map_err(|e| format!("could not configure OSC input socket: {}", e))?;

        let running = Arc::new(AtomicBool::new(true));
        let run_flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("osc-listener".into())
            .spawn(move || {
                let mut router = router;
                let mut buf = vec![0u8; 65536];
                while run_flag.load(Ordering::Relaxed) {
                    match socket.recv_from(&mut buf) {
                        Ok((len, _)) => match rosc::decoder::decode_udp(&buf[..len]) {
                            Ok((_, packet)) => router.handle_packet(packet),
                            Err(e) => {
                                log::debug!(target: "osc", "undecodable OSC datagram: {}", e);
                            }
                        },
                        Err(ref e)
                            if e.kind() == ErrorKind::WouldBlock
                                || e.kind() == ErrorKind::TimedOut =>
                        {
                            continue;
                        }
                        Err(e) => {
                            log::warn!(target: "osc", "OSC input socket error: {}", e);
                            run_flag.store(false, Ordering::Relaxed);
                            break;
                        }
                    }
                }
            })
            .map_err(|e| format!("failed to spawn osc-listener thread: {}", e))?;

        self.running = Some(running);
        self.handle = Some(handle);
        self.port = Some(bound_port);
        log::info!(target: "osc", "OSC input listening on port {}", bound_port);
        Ok(bound_port)
    }

    /// Stop listening. Idempotent; the router moved into the thread is
    /// dropped with it.
    pub fn stop(&mut self) {
        if let Some(flag) = self.running.take() {
            flag.store(false, Ordering::Relaxed);
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            log::info!(target: "osc", "OSC input stopped");
        }
        self.port = None;
    }
}

impl Default for OscReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for OscReceiver {
    fn drop(&mut self) {
        self.stop();
    }
}
