//! Built-in test-tone engine.
//!
//! A deliberately small `Synthesizer` so the player runs out of the box: one
//! monophonic sine voice and four parameters. Realtime state lives in
//! atomics; non-realtime operations (patch files, preset navigation) stage
//! their changes in a pending slot that the audio thread picks up with a
//! `try_lock` in `process_pending_control`, so the render path never waits
//! on a writer.

use std::f64::consts::TAU;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use aulos_types::{
    MidiEventKind, ParamKind, ParamValue, ParameterRef, PatchNav, Synthesizer, BLOCK_SIZE,
};

const PARAM_COUNT: usize = 4;

/// Declaration order defines protocol order for dumps.
const PARAMS: [(&str, ParamKind); PARAM_COUNT] = [
    ("/param/volume", ParamKind::Float),
    ("/param/detune", ParamKind::Float),
    ("/param/octave", ParamKind::Int),
    ("/param/mute", ParamKind::Bool),
];

const DEFAULT_VALUES: [f32; PARAM_COUNT] = [0.8, 0.0, 0.0, 0.0];

/// Built-in presets: (category, name, parameter values).
const PRESETS: [(&str, &str, [f32; PARAM_COUNT]); 4] = [
    ("Basics", "Init Sine", [0.8, 0.0, 0.0, 0.0]),
    ("Basics", "Quiet Sine", [0.3, 0.0, 0.0, 0.0]),
    ("Detuned", "Slow Beat", [0.8, 6.0, 0.0, 0.0]),
    ("Detuned", "Sub Beat", [0.8, 12.0, -1.0, 0.0]),
];

#[derive(Serialize, Deserialize)]
struct PatchFile {
    volume: f32,
    detune: f32,
    octave: f32,
    mute: f32,
}

pub struct ToneEngine {
    /// Parameter values as f32 bits, indexed by declaration order.
    values: [AtomicU32; PARAM_COUNT],
    sample_rate: AtomicU64,
    /// Oscillator phase in turns; audio thread only.
    phase: AtomicU64,
    /// Last note number, velocity, and gate. Mono, last-note priority.
    note: AtomicU32,
    velocity: AtomicU32,
    gate: AtomicU32,
    /// Staged parameter set from patch loads and preset navigation; applied
    /// at the next callback boundary.
    pending: Mutex<Option<[f32; PARAM_COUNT]>>,
    preset_index: AtomicUsize,
    rng_state: AtomicU64,
}

impl ToneEngine {
    pub fn new() -> Self {
        let values: [AtomicU32; PARAM_COUNT] =
            std::array::from_fn(|i| AtomicU32::new(DEFAULT_VALUES[i].to_bits()));
        Self {
            values,
            sample_rate: AtomicU64::new(48000.0f64.to_bits()),
            phase: AtomicU64::new(0.0f64.to_bits()),
            note: AtomicU32::new(69),
            velocity: AtomicU32::new(0),
            gate: AtomicU32::new(0),
            pending: Mutex::new(None),
            preset_index: AtomicUsize::new(0),
            rng_state: AtomicU64::new(0x9E3779B97F4A7C15),
        }
    }

    fn value(&self, index: usize) -> f32 {
        f32::from_bits(self.values[index].load(Ordering::Relaxed))
    }

    fn stage(&self, values: [f32; PARAM_COUNT]) {
        if let Ok(mut pending) = self.pending.lock() {
            *pending = Some(values);
        }
    }

    fn stage_preset(&self, index: usize) {
        let (category, name, values) = PRESETS[index];
        self.preset_index.store(index, Ordering::Relaxed);
        self.stage(values);
        log::info!(target: "engine", "preset selected: {} / {}", category, name);
    }

    fn next_random(&self) -> usize {
        let state = self
            .rng_state
            .load(Ordering::Relaxed)
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.rng_state.store(state, Ordering::Relaxed);
        (state >> 33) as usize % PRESETS.len()
    }

    /// First preset of the neighboring category in the given direction.
    fn category_jump(&self, forward: bool) -> usize {
        let current = PRESETS[self.preset_index.load(Ordering::Relaxed) % PRESETS.len()].0;
        let categories: Vec<&str> = {
            let mut seen = Vec::new();
            for (category, _, _) in PRESETS.iter() {
                if !seen.contains(category) {
                    seen.push(category);
                }
            }
            seen
        };
        let pos = categories.iter().position(|c| *c == current).unwrap_or(0);
        let next = if forward {
            (pos + 1) % categories.len()
        } else {
            (pos + categories.len() - 1) % categories.len()
        };
        PRESETS
            .iter()
            .position(|(c, _, _)| *c == categories[next])
            .unwrap_or(0)
    }

    fn default_patch_path() -> PathBuf {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("aulos").join("patches").join("default.fxp")
    }

    fn write_patch(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let patch = PatchFile {
            volume: self.value(0),
            detune: self.value(1),
            octave: self.value(2),
            mute: self.value(3),
        };
        let json = serde_json::to_string_pretty(&patch).map_err(|e| e.to_string())?;
        std::fs::write(path, json).map_err(|e| e.to_string())
    }
}

impl Default for ToneEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Synthesizer for ToneEngine {
    fn apply_midi(&self, event: MidiEventKind) {
        match event {
            MidiEventKind::NoteOn { note, velocity, .. } => {
                self.note.store(note as u32, Ordering::Relaxed);
                self.velocity.store(velocity as u32, Ordering::Relaxed);
                self.gate.store(1, Ordering::Relaxed);
            }
            MidiEventKind::NoteOff { note, .. } => {
                if self.note.load(Ordering::Relaxed) == note as u32 {
                    self.gate.store(0, Ordering::Relaxed);
                }
            }
            // CC 7 is channel volume.
            MidiEventKind::ControlChange {
                controller: 7,
                value,
                ..
            } => {
                self.values[0].store((value as f32 / 127.0).to_bits(), Ordering::Relaxed);
            }
            _ => {}
        }
    }

    fn apply_realtime_parameter(&self, param: ParameterRef, value: f32) {
        if param.index < PARAM_COUNT {
            self.values[param.index].store(value.to_bits(), Ordering::Relaxed);
        }
    }

    fn render_block(&self, left: &mut [f32; BLOCK_SIZE], right: &mut [f32; BLOCK_SIZE]) {
        if self.gate.load(Ordering::Relaxed) == 0 || self.value(3) >= 0.5 {
            left.fill(0.0);
            right.fill(0.0);
            return;
        }

        let note = self.note.load(Ordering::Relaxed) as f64;
        let detune_cents = self.value(1) as f64;
        let octave = self.value(2).round() as f64;
        let freq = 440.0 * ((note - 69.0) / 12.0 + detune_cents / 1200.0 + octave).exp2();
        let sample_rate = f64::from_bits(self.sample_rate.load(Ordering::Relaxed));
        let step = freq / sample_rate;
        let amp = self.value(0) * self.velocity.load(Ordering::Relaxed) as f32 / 127.0;

        let mut phase = f64::from_bits(self.phase.load(Ordering::Relaxed));
        for i in 0..BLOCK_SIZE {
            let sample = (phase * TAU).sin() as f32 * amp;
            left[i] = sample;
            right[i] = sample;
            phase = (phase + step).fract();
        }
        self.phase.store(phase.to_bits(), Ordering::Relaxed);
    }

    fn process_pending_control(&self) {
        // Non-blocking: skip this callback if a writer holds the slot.
        if let Ok(mut pending) = self.pending.try_lock() {
            if let Some(values) = pending.take() {
                for (slot, value) in self.values.iter().zip(values) {
                    slot.store(value.to_bits(), Ordering::Relaxed);
                }
            }
        }
    }

    fn set_sample_rate(&self, rate: f64) {
        self.sample_rate.store(rate.to_bits(), Ordering::Relaxed);
    }

    fn request_patch_load(&self, path: &Path) {
        let content = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                self.report_error(
                    &format!("could not read patch {}: {}", path.display(), e),
                    "Patch load failed",
                );
                return;
            }
        };
        match serde_json::from_str::<PatchFile>(&content) {
            Ok(patch) => {
                self.stage([patch.volume, patch.detune, patch.octave, patch.mute]);
                log::info!(target: "engine", "patch staged: {}", path.display());
            }
            Err(e) => self.report_error(
                &format!("invalid patch {}: {}", path.display(), e),
                "Patch load failed",
            ),
        }
    }

    fn request_patch_save(&self, path: Option<&Path>) {
        let target = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_patch_path);
        match self.write_patch(&target) {
            Ok(()) => log::info!(target: "engine", "patch saved: {}", target.display()),
            Err(e) => self.report_error(
                &format!("could not save patch {}: {}", target.display(), e),
                "Patch save failed",
            ),
        }
    }

    fn navigate_patch(&self, nav: PatchNav) {
        let len = PRESETS.len();
        let current = self.preset_index.load(Ordering::Relaxed) % len;
        let next = match nav {
            PatchNav::Random => self.next_random(),
            PatchNav::Next => (current + 1) % len,
            PatchNav::Prev => (current + len - 1) % len,
            PatchNav::NextCategory => self.category_jump(true),
            PatchNav::PrevCategory => self.category_jump(false),
        };
        self.stage_preset(next);
    }

    fn load_tuning_scale(&self, path: &Path) -> Result<(), String> {
        std::fs::read_to_string(path)
            .map_err(|e| format!("could not read scale {}: {}", path.display(), e))?;
        log::info!(
            target: "engine",
            "scale {} accepted; the built-in engine plays equal temperament only",
            path.display()
        );
        Ok(())
    }

    fn load_tuning_mapping(&self, path: &Path) -> Result<(), String> {
        std::fs::read_to_string(path)
            .map_err(|e| format!("could not read mapping {}: {}", path.display(), e))?;
        log::info!(
            target: "engine",
            "mapping {} accepted; the built-in engine plays equal temperament only",
            path.display()
        );
        Ok(())
    }

    fn resolve_parameter(&self, protocol_name: &str) -> Option<ParameterRef> {
        PARAMS
            .iter()
            .position(|(name, _)| *name == protocol_name)
            .map(|index| ParameterRef {
                index,
                kind: PARAMS[index].1,
            })
    }

    fn ordered_parameters(&self) -> Vec<(String, ParamValue)> {
        PARAMS
            .iter()
            .enumerate()
            .map(|(i, (name, kind))| {
                let raw = self.value(i);
                let value = match kind {
                    ParamKind::Float => ParamValue::Float(raw),
                    ParamKind::Int => ParamValue::Int(raw.round() as i32),
                    ParamKind::Bool => ParamValue::Bool(raw >= 0.5),
                };
                (name.to_string(), value)
            })
            .collect()
    }

    fn report_error(&self, message: &str, title: &str) {
        log::error!(target: "engine", "{}: {}", title, message);
    }
}
