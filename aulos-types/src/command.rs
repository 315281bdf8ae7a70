//! Validated inbound control commands.

use std::path::PathBuf;

use crate::param::ParameterRef;

/// Direction for patch and category navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchNav {
    Random,
    Next,
    Prev,
    NextCategory,
    PrevCategory,
}

/// Which tuning file family a command refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningKind {
    /// Scale definition (`.scl`)
    Scale,
    /// Keyboard mapping (`.kbm`)
    Mapping,
}

impl TuningKind {
    pub fn extension(&self) -> &'static str {
        match self {
            TuningKind::Scale => "scl",
            TuningKind::Mapping => "kbm",
        }
    }
}

/// One parsed and validated inbound message.
///
/// Built by the command router from a single OSC message, dispatched once,
/// then discarded. Paths are fully resolved (extension appended, relative
/// tuning paths joined against the active default directory) at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum AddressCommand {
    SetParameter { param: ParameterRef, value: f32 },
    LoadPatch { path: PathBuf },
    /// `None` requests the engine's default save.
    SavePatch { path: Option<PathBuf> },
    NavigatePatch(PatchNav),
    /// `None` resets the default lookup directory to the built-in library.
    SetTuningPath { kind: TuningKind, path: Option<PathBuf> },
    LoadTuning { kind: TuningKind, path: PathBuf },
    DumpAllParameters,
}
