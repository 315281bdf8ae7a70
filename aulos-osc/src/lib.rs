pub mod config;
pub mod control;
pub mod exporter;
pub mod receiver;
pub mod router;
pub mod sender;

pub use config::{PathDefaults, TuningLibrary};
pub use control::{spawn_control, ControlMsg, ControlWorker};
pub use exporter::StateExporter;
pub use receiver::OscReceiver;
pub use router::CommandRouter;
pub use sender::OscSender;
