//! The engine collaborator interface.

use std::path::Path;

use crate::command::PatchNav;
use crate::midi::MidiEventKind;
use crate::param::{ParamValue, ParameterRef};

/// Samples per internal render block. Events are applied only at block
/// boundaries, so this is also the event quantization granularity.
pub const BLOCK_SIZE: usize = 32;

/// Narrow interface the control core requires from a synthesis engine.
///
/// The engine is shared by handle between the audio thread and the control
/// threads; it is responsible for its own internal synchronization.
///
/// Realtime methods — `apply_midi`, `apply_realtime_parameter`,
/// `render_block`, `process_pending_control`, `set_sample_rate` — are called
/// from the audio thread only and must not allocate, lock unboundedly, or
/// perform I/O. Engines that need to move non-realtime work (patch loads,
/// tuning swaps) into the render path do so with a handoff slot checked in
/// `process_pending_control`, which runs once per device callback before any
/// rendering.
///
/// The remaining methods are non-realtime: they may block, allocate, and do
/// file I/O, and are called from network or worker threads, never from the
/// audio thread.
pub trait Synthesizer: Send + Sync {
    // --- realtime entry points ---

    fn apply_midi(&self, event: MidiEventKind);

    fn apply_realtime_parameter(&self, param: ParameterRef, value: f32);

    /// Render exactly one block into the caller-owned channel buffers.
    fn render_block(&self, left: &mut [f32; BLOCK_SIZE], right: &mut [f32; BLOCK_SIZE]);

    /// Per-callback housekeeping hook, run before any buffer is touched.
    /// Bounded, non-blocking work only.
    fn process_pending_control(&self);

    fn set_sample_rate(&self, rate: f64);

    // --- non-realtime entry points ---

    /// Hand a patch file to the engine's own safe-load mechanism. Must not
    /// mutate render state directly; the engine applies it at a block
    /// boundary.
    fn request_patch_load(&self, path: &Path);

    /// Save the current patch; `None` means the engine's default save.
    fn request_patch_save(&self, path: Option<&Path>);

    fn navigate_patch(&self, nav: PatchNav);

    fn load_tuning_scale(&self, path: &Path) -> Result<(), String>;

    fn load_tuning_mapping(&self, path: &Path) -> Result<(), String>;

    /// Resolve a full protocol address (`/param/<name>`) to a handle.
    fn resolve_parameter(&self, protocol_name: &str) -> Option<ParameterRef>;

    /// All parameters with their protocol addresses and current values, in
    /// the engine's declaration order. The order is stable across calls.
    fn ordered_parameters(&self) -> Vec<(String, ParamValue)>;

    /// User-visible error reporting channel.
    fn report_error(&self, message: &str, title: &str);
}
