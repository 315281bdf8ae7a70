//! Shared engine stub for integration tests.

use std::path::Path;
use std::sync::Mutex;

use aulos_types::{
    MidiEventKind, ParamKind, ParamValue, ParameterRef, PatchNav, Synthesizer, BLOCK_SIZE,
};

/// Minimal engine: three fixed parameters, every non-realtime call recorded.
#[derive(Default)]
pub struct TestSynth {
    pub calls: Mutex<Vec<String>>,
}

impl TestSynth {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Synthesizer for TestSynth {
    fn apply_midi(&self, _event: MidiEventKind) {}
    fn apply_realtime_parameter(&self, _param: ParameterRef, _value: f32) {}
    fn render_block(&self, _left: &mut [f32; BLOCK_SIZE], _right: &mut [f32; BLOCK_SIZE]) {}
    fn process_pending_control(&self) {}
    fn set_sample_rate(&self, _rate: f64) {}

    fn request_patch_load(&self, path: &Path) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("load:{}", path.display()));
    }

    fn request_patch_save(&self, path: Option<&Path>) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("save:{:?}", path.map(Path::to_path_buf)));
    }

    fn navigate_patch(&self, nav: PatchNav) {
        self.calls.lock().unwrap().push(format!("nav:{:?}", nav));
    }

    fn load_tuning_scale(&self, _path: &Path) -> Result<(), String> {
        Ok(())
    }

    fn load_tuning_mapping(&self, _path: &Path) -> Result<(), String> {
        Ok(())
    }

    fn resolve_parameter(&self, protocol_name: &str) -> Option<ParameterRef> {
        match protocol_name {
            "/param/volume" => Some(ParameterRef {
                index: 0,
                kind: ParamKind::Float,
            }),
            "/param/detune" => Some(ParameterRef {
                index: 1,
                kind: ParamKind::Float,
            }),
            _ => None,
        }
    }

    fn ordered_parameters(&self) -> Vec<(String, ParamValue)> {
        vec![
            ("/param/volume".to_string(), ParamValue::Float(0.75)),
            ("/param/octave".to_string(), ParamValue::Int(-1)),
            ("/param/mute".to_string(), ParamValue::Bool(true)),
        ]
    }

    fn report_error(&self, message: &str, title: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("error:{}: {}", title, message));
    }
}
