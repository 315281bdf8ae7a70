//! Persisted control-surface path defaults.
//!
//! Relative tuning file loads resolve against a per-kind default directory.
//! The defaults survive restarts in a small JSON file under the user config
//! directory; a missing or unreadable file just means built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use aulos_types::TuningKind;

/// Location of the built-in tuning library under the app data directory.
#[derive(Debug, Clone)]
pub struct TuningLibrary {
    data_dir: PathBuf,
}

impl TuningLibrary {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// `<data_dir>/aulos`, falling back to the working directory when the
    /// platform reports no data directory.
    pub fn default_location() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join("aulos"))
    }

    /// Directory for bundled tuning files of the given kind.
    pub fn builtin_dir(&self, kind: TuningKind) -> PathBuf {
        let lib = self.data_dir.join("tuning_library");
        match kind {
            TuningKind::Scale => lib.join("SCL"),
            TuningKind::Mapping => lib.join("KBM Concert Pitch"),
        }
    }
}

/// User-set default lookup directories, `None` meaning the built-in library.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathDefaults {
    scl: Option<PathBuf>,
    kbm: Option<PathBuf>,
}

impl PathDefaults {
    /// Default location for the persisted file:
    /// `<config_dir>/aulos/control_paths.json`.
    pub fn default_file() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("aulos").join("control_paths.json")
    }

    /// Load from `path`; absent or corrupt files fall back to defaults.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(defaults) => defaults,
            Err(e) => {
                log::warn!(target: "osc", "unreadable path defaults at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Persist to `path`, creating parent directories. Failures are logged
    /// and otherwise ignored; the in-memory defaults stay authoritative.
    pub fn save(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let json = serde_json::to_string_pretty(self).unwrap_or_default();
        if let Err(e) = std::fs::write(path, json) {
            log::warn!(target: "osc", "could not persist path defaults to {}: {}", path.display(), e);
        }
    }

    pub fn get(&self, kind: TuningKind) -> Option<&Path> {
        match kind {
            TuningKind::Scale => self.scl.as_deref(),
            TuningKind::Mapping => self.kbm.as_deref(),
        }
    }

    /// `None` resets the kind back to the built-in library.
    pub fn set(&mut self, kind: TuningKind, path: Option<PathBuf>) {
        match kind {
            TuningKind::Scale => self.scl = path,
            TuningKind::Mapping => self.kbm = path,
        }
    }
}
