pub mod command;
pub mod midi;
pub mod param;
pub mod synth;

pub use command::{AddressCommand, PatchNav, TuningKind};
pub use midi::{MidiEvent, MidiEventKind};
pub use param::{ParamKind, ParamUpdate, ParamValue, ParameterRef};
pub use synth::{Synthesizer, BLOCK_SIZE};
