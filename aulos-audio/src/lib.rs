pub mod metrics;
pub mod midi_input;
pub mod playback;
pub mod ring;
pub mod stream;

pub use metrics::AudioMetrics;
pub use midi_input::MidiInputManager;
pub use playback::BlockRenderer;
pub use ring::{ring, RingConsumer, RingProducer};
pub use stream::{list_output_devices, start_output, OutputStream};
