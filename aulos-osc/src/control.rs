//! Single-consumer worker for non-realtime engine operations.
//!
//! Commands that must not run on the audio thread or in the receive
//! callback's context (engine file I/O, full parameter dumps) are queued
//! here and executed exactly once, in order, by one named thread. Messages
//! still queued when the channel disconnects at shutdown are dropped.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;

use aulos_types::Synthesizer;

use crate::exporter::StateExporter;

/// Work items for the control thread.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMsg {
    /// `None` requests the engine's default save.
    SavePatch(Option<PathBuf>),
    DumpAllParameters,
}

/// Handle to the control thread. Dropping it (after all cloned senders are
/// gone) disconnects the channel and joins the thread.
pub struct ControlWorker {
    tx: Option<Sender<ControlMsg>>,
    handle: Option<JoinHandle<()>>,
}

impl ControlWorker {
    /// A cloneable submission handle for routers.
    pub fn sender(&self) -> Sender<ControlMsg> {
        self.tx.as_ref().expect("control worker running").clone()
    }

    pub fn submit(&self, msg: ControlMsg) {
        if let Some(ref tx) = self.tx {
            let _ = tx.send(msg);
        }
    }
}

impl Drop for ControlWorker {
    fn drop(&mut self) {
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Spawn the control thread. It holds the engine handle and the exporter;
/// the exporter's sender state moves with it.
pub fn spawn_control<E: Synthesizer + 'static>(
    engine: Arc<E>,
    exporter: StateExporter<E>,
) -> ControlWorker {
    let (tx, rx) = crossbeam_channel::unbounded::<ControlMsg>();

    let handle = thread::Builder::new()
        .name("aulos-control".into())
        .spawn(move || {
            while let Ok(msg) = rx.recv() {
                match msg {
                    ControlMsg::SavePatch(path) => {
                        log::debug!(target: "control", "patch save requested: {:?}", path);
                        engine.request_patch_save(path.as_deref());
                    }
                    ControlMsg::DumpAllParameters => {
                        exporter.send_all_parameters();
                    }
                }
            }
        })
        .expect("failed to spawn aulos-control thread");

    ControlWorker {
        tx: Some(tx),
        handle: Some(handle),
    }
}
