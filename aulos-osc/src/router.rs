//! Inbound address-pattern router.
//!
//! Converts one OSC message into an [`AddressCommand`] and dispatches it:
//! realtime parameter changes go through the lock-free parameter queue,
//! engine file I/O goes to the control worker, everything else is a direct
//! call into the engine's non-realtime entry points. The protocol is
//! fire-and-forget: malformed or unroutable messages are dropped (counted
//! and logged at debug level), never answered or escalated.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::Sender;
use rosc::{OscMessage, OscPacket, OscType};

use aulos_audio::{AudioMetrics, RingProducer};
use aulos_types::{AddressCommand, ParamUpdate, PatchNav, Synthesizer, TuningKind};

use crate::config::{PathDefaults, TuningLibrary};
use crate::control::ControlMsg;

/// Extension appended to patch names from the wire.
const PATCH_EXTENSION: &str = "fxp";

pub struct CommandRouter<E> {
    engine: Arc<E>,
    param_tx: RingProducer<ParamUpdate>,
    control_tx: Sender<ControlMsg>,
    metrics: AudioMetrics,
    library: TuningLibrary,
    defaults: PathDefaults,
    defaults_file: PathBuf,
    /// Unroutable/malformed messages seen. Diagnostic only.
    ignored: u64,
}

impl<E: Synthesizer> CommandRouter<E> {
    pub fn new(
        engine: Arc<E>,
        param_tx: RingProducer<ParamUpdate>,
        control_tx: Sender<ControlMsg>,
        metrics: AudioMetrics,
        library: TuningLibrary,
        defaults_file: PathBuf,
    ) -> Self {
        let defaults = PathDefaults::load(&defaults_file);
        Self {
            engine,
            param_tx,
            control_tx,
            metrics,
            library,
            defaults,
            defaults_file,
            ignored: 0,
        }
    }

    pub fn ignored(&self) -> u64 {
        self.ignored
    }

    /// Entry point for one decoded packet. Bundles are walked depth-first,
    /// members in order; each member gets the same per-message dispatch.
    pub fn handle_packet(&mut self, packet: OscPacket) {
        match packet {
            OscPacket::Message(msg) => self.handle_message(msg),
            OscPacket::Bundle(bundle) => {
                for member in bundle.content {
                    self.handle_packet(member);
                }
            }
        }
    }

    pub fn handle_message(&mut self, msg: OscMessage) {
        match self.parse(&msg) {
            Some(cmd) => self.dispatch(cmd),
            None => {
                self.ignored += 1;
                log::debug!(target: "osc", "ignoring unroutable message: {}", msg.addr);
            }
        }
    }

    /// Parse one message into a validated command. `None` means the message
    /// is dropped: unknown address, unresolvable parameter, or a payload of
    /// the wrong arity or type. Paths come out fully resolved.
    pub fn parse(&self, msg: &OscMessage) -> Option<AddressCommand> {
        // Addresses not beginning with the delimiter are rejected outright.
        let rest = msg.addr.strip_prefix('/')?;
        let mut segments = rest.split('/');

        match segments.next()? {
            "param" => {
                // The whole address is the parameter's protocol name.
                let param = self.engine.resolve_parameter(&msg.addr)?;
                let value = match msg.args.as_slice() {
                    [OscType::Float(v)] => *v,
                    _ => return None,
                };
                Some(AddressCommand::SetParameter { param, value })
            }
            "patch" => match segments.next()? {
                "load" => {
                    let name = whole_string(msg);
                    if name.is_empty() {
                        return None;
                    }
                    Some(AddressCommand::LoadPatch {
                        path: PathBuf::from(format!("{}.{}", name, PATCH_EXTENSION)),
                    })
                }
                "save" => {
                    let name = whole_string(msg);
                    let path = if name.is_empty() {
                        None
                    } else {
                        Some(PathBuf::from(format!("{}.{}", name, PATCH_EXTENSION)))
                    };
                    Some(AddressCommand::SavePatch { path })
                }
                "random" => Some(AddressCommand::NavigatePatch(PatchNav::Random)),
                "incr" => Some(AddressCommand::NavigatePatch(PatchNav::Next)),
                "decr" => Some(AddressCommand::NavigatePatch(PatchNav::Prev)),
                "incr_category" => Some(AddressCommand::NavigatePatch(PatchNav::NextCategory)),
                "decr_category" => Some(AddressCommand::NavigatePatch(PatchNav::PrevCategory)),
                _ => None,
            },
            "tuning" => match segments.next()? {
                "path" => {
                    let kind = tuning_kind(segments.next()?)?;
                    let payload = whole_string(msg);
                    if payload.is_empty() {
                        return None;
                    }
                    let path = if payload == "_reset" {
                        None
                    } else {
                        Some(PathBuf::from(payload))
                    };
                    Some(AddressCommand::SetTuningPath { kind, path })
                }
                seg => {
                    let kind = tuning_kind(seg)?;
                    let payload = whole_string(msg);
                    if payload.is_empty() {
                        return None;
                    }
                    Some(AddressCommand::LoadTuning {
                        kind,
                        path: self.resolve_tuning_path(kind, &payload),
                    })
                }
            },
            "send_all_parameters" => Some(AddressCommand::DumpAllParameters),
            _ => None,
        }
    }

    fn dispatch(&mut self, cmd: AddressCommand) {
        match cmd {
            AddressCommand::SetParameter { param, value } => {
                // Realtime path: hand off to the audio thread, never block.
                if !self.param_tx.try_push(ParamUpdate { param, value }) {
                    self.metrics.count_param_drop();
                }
            }
            AddressCommand::LoadPatch { path } => {
                log::debug!(target: "osc", "patch load: {}", path.display());
                self.engine.request_patch_load(&path);
            }
            AddressCommand::SavePatch { path } => {
                let _ = self.control_tx.send(ControlMsg::SavePatch(path));
            }
            AddressCommand::NavigatePatch(nav) => {
                self.engine.navigate_patch(nav);
            }
            AddressCommand::SetTuningPath { kind, path } => {
                if let Some(ref p) = path {
                    if !p.exists() {
                        self.engine.report_error(
                            &format!(
                                "tuning path {} does not exist; the default path will not change",
                                p.display()
                            ),
                            "Path does not exist",
                        );
                        return;
                    }
                }
                self.defaults.set(kind, path);
                self.defaults.save(&self.defaults_file);
            }
            AddressCommand::LoadTuning { kind, path } => {
                let result = match kind {
                    TuningKind::Scale => self.engine.load_tuning_scale(&path),
                    TuningKind::Mapping => self.engine.load_tuning_mapping(&path),
                };
                if let Err(e) = result {
                    self.engine.report_error(&e, "Tuning load failed");
                }
            }
            AddressCommand::DumpAllParameters => {
                let _ = self.control_tx.send(ControlMsg::DumpAllParameters);
            }
        }
    }

    /// Resolve a tuning payload: relative names join the active default
    /// directory for the kind; the fixed extension is always appended.
    /// `tuning/path/<kind>` and `tuning/<kind>` share this lookup, so their
    /// reset semantics agree by construction.
    fn resolve_tuning_path(&self, kind: TuningKind, raw: &str) -> PathBuf {
        let p = Path::new(raw);
        let base = if p.is_relative() {
            self.tuning_dir(kind).join(p)
        } else {
            p.to_path_buf()
        };
        let mut full = base.into_os_string();
        full.push(".");
        full.push(kind.extension());
        PathBuf::from(full)
    }

    fn tuning_dir(&self, kind: TuningKind) -> PathBuf {
        self.defaults
            .get(kind)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.library.builtin_dir(kind))
    }
}

fn tuning_kind(segment: &str) -> Option<TuningKind> {
    match segment {
        "scl" => Some(TuningKind::Scale),
        "kbm" => Some(TuningKind::Mapping),
        _ => None,
    }
}

/// Concatenate the message's string arguments, space-separated. Payloads
/// carrying file names may arrive split across several string args.
fn whole_string(msg: &OscMessage) -> String {
    msg.args
        .iter()
        .filter_map(|arg| match arg {
            OscType::String(s) => Some(s.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use aulos_audio::{ring, RingConsumer};
    use aulos_types::{MidiEventKind, ParamKind, ParamValue, ParameterRef, BLOCK_SIZE};
    use crossbeam_channel::Receiver;
    use rosc::{OscBundle, OscTime};
    use std::sync::Mutex;

    /// Engine stub exposing three parameters and recording every
    /// non-realtime call it receives.
    #[derive(Default)]
    struct StubSynth {
        calls: Mutex<Vec<String>>,
        errors: Mutex<Vec<String>>,
    }

    impl StubSynth {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn errors(&self) -> Vec<String> {
            self.errors.lock().unwrap().clone()
        }
    }

    impl Synthesizer for StubSynth {
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

        fn load_tuning_scale(&self, path: &Path) -> Result<(), String> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("scl:{}", path.display()));
            Ok(())
        }

        fn load_tuning_mapping(&self, path: &Path) -> Result<(), String> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("kbm:{}", path.display()));
            Ok(())
        }

        fn resolve_parameter(&self, protocol_name: &str) -> Option<ParameterRef> {
            match protocol_name {
                "/param/volume" => Some(ParameterRef {
                    index: 0,
                    kind: ParamKind::Float,
                }),
                "/param/osc/mode" => Some(ParameterRef {
                    index: 1,
                    kind: ParamKind::Int,
                }),
                _ => None,
            }
        }

        fn ordered_parameters(&self) -> Vec<(String, ParamValue)> {
            vec![
                ("/param/volume".to_string(), ParamValue::Float(0.5)),
                ("/param/osc/mode".to_string(), ParamValue::Int(2)),
                ("/param/mute".to_string(), ParamValue::Bool(false)),
            ]
        }

        fn report_error(&self, message: &str, title: &str) {
            self.errors
                .lock()
                .unwrap()
                .push(format!("{}: {}", title, message));
        }
    }

    struct Fixture {
        engine: Arc<StubSynth>,
        router: CommandRouter<StubSynth>,
        param_rx: RingConsumer<ParamUpdate>,
        control_rx: Receiver<ControlMsg>,
        metrics: AudioMetrics,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        fixture_with_capacity(64)
    }

    fn fixture_with_capacity(capacity: usize) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(StubSynth::default());
        let metrics = AudioMetrics::new();
        let (param_tx, param_rx) = ring::<ParamUpdate>(capacity);
        let (control_tx, control_rx) = crossbeam_channel::unbounded();
        let router = CommandRouter::new(
            Arc::clone(&engine),
            param_tx,
            control_tx,
            metrics.clone(),
            TuningLibrary::new(PathBuf::from("/data")),
            dir.path().join("control_paths.json"),
        );
        Fixture {
            engine,
            router,
            param_rx,
            control_rx,
            metrics,
            _dir: dir,
        }
    }

    fn message(addr: &str, args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: addr.to_string(),
            args,
        }
    }

    fn string_arg(s: &str) -> Vec<OscType> {
        vec![OscType::String(s.to_string())]
    }

    #[test]
    fn test_known_param_yields_one_update() {
        let mut f = fixture();
        f.router
            .handle_message(message("/param/volume", vec![OscType::Float(3.5)]));

        let update = f.param_rx.try_pop().unwrap();
        assert_eq!(update.param.index, 0);
        assert_eq!(update.value, 3.5);
        assert!(f.param_rx.is_empty());
        assert_eq!(f.router.ignored(), 0);
    }

    #[test]
    fn test_unknown_param_is_ignored() {
        let mut f = fixture();
        f.router
            .handle_message(message("/param/nope", vec![OscType::Float(1.0)]));
        assert!(f.param_rx.is_empty());
        assert_eq!(f.router.ignored(), 1);
    }

    #[test]
    fn test_param_payload_arity_and_type_enforced() {
        let mut f = fixture();
        f.router.handle_message(message(
            "/param/volume",
            vec![OscType::Float(1.0), OscType::Float(2.0)],
        ));
        f.router
            .handle_message(message("/param/volume", string_arg("1.0")));
        f.router.handle_message(message("/param/volume", vec![]));
        assert!(f.param_rx.is_empty());
        assert_eq!(f.router.ignored(), 3);
    }

    #[test]
    fn test_param_queue_saturation_counts_drops() {
        let mut f = fixture_with_capacity(4);
        for _ in 0..5 {
            f.router
                .handle_message(message("/param/volume", vec![OscType::Float(0.1)]));
        }
        // Capacity 4 holds 3 updates; two were refused and counted.
        assert_eq!(f.param_rx.len(), 3);
        assert_eq!(f.metrics.param_dropped(), 2);
    }

    #[test]
    fn test_patch_load_appends_extension() {
        let mut f = fixture();
        f.router
            .handle_message(message("/patch/load", string_arg("Init Saw")));
        assert_eq!(f.engine.calls(), vec!["load:Init Saw.fxp"]);
    }

    #[test]
    fn test_patch_save_default_and_named() {
        let f_calls = {
            let mut f = fixture();
            f.router.handle_message(message("/patch/save", vec![]));
            f.router
                .handle_message(message("/patch/save", string_arg("foo")));
            let msgs: Vec<_> = f.control_rx.try_iter().collect();
            msgs
        };
        assert_eq!(
            f_calls,
            vec![
                ControlMsg::SavePatch(None),
                ControlMsg::SavePatch(Some(PathBuf::from("foo.fxp"))),
            ]
        );
    }

    #[test]
    fn test_navigation_addresses() {
        let mut f = fixture();
        for addr in [
            "/patch/random",
            "/patch/incr",
            "/patch/decr",
            "/patch/incr_category",
            "/patch/decr_category",
        ] {
            f.router.handle_message(message(addr, vec![]));
        }
        assert_eq!(
            f.engine.calls(),
            vec![
                "nav:Random",
                "nav:Next",
                "nav:Prev",
                "nav:NextCategory",
                "nav:PrevCategory",
            ]
        );
    }

    #[test]
    fn test_tuning_load_resolves_against_builtin_by_default() {
        let mut f = fixture();
        f.router
            .handle_message(message("/tuning/scl", string_arg("bar")));
        assert_eq!(
            f.engine.calls(),
            vec!["scl:/data/tuning_library/SCL/bar.scl"]
        );
    }

    #[test]
    fn test_tuning_path_override_then_reset() {
        let mut f = fixture();
        let custom = f._dir.path().join("scales");
        std::fs::create_dir_all(&custom).unwrap();

        f.router.handle_message(message(
            "/tuning/path/scl",
            string_arg(custom.to_str().unwrap()),
        ));
        f.router
            .handle_message(message("/tuning/scl", string_arg("bar")));
        assert_eq!(
            f.engine.calls(),
            vec![format!("scl:{}/bar.scl", custom.display())]
        );

        f.router
            .handle_message(message("/tuning/path/scl", string_arg("_reset")));
        f.router
            .handle_message(message("/tuning/scl", string_arg("bar")));
        assert_eq!(
            f.engine.calls().last().unwrap(),
            "scl:/data/tuning_library/SCL/bar.scl"
        );
    }

    #[test]
    fn test_tuning_path_must_exist() {
        let mut f = fixture();
        f.router.handle_message(message(
            "/tuning/path/kbm",
            string_arg("/definitely/not/here"),
        ));
        assert_eq!(f.engine.errors().len(), 1);
        assert!(f.engine.errors()[0].starts_with("Path does not exist"));

        // Default unchanged: loads still resolve against the built-in dir.
        f.router
            .handle_message(message("/tuning/kbm", string_arg("concert")));
        assert_eq!(
            f.engine.calls(),
            vec!["kbm:/data/tuning_library/KBM Concert Pitch/concert.kbm"]
        );
    }

    #[test]
    fn test_tuning_absolute_path_bypasses_default_dir() {
        let mut f = fixture();
        f.router
            .handle_message(message("/tuning/scl", string_arg("/abs/just12")));
        assert_eq!(f.engine.calls(), vec!["scl:/abs/just12.scl"]);
    }

    #[test]
    fn test_tuning_defaults_persist_across_routers() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("kbms");
        std::fs::create_dir_all(&custom).unwrap();
        let defaults_file = dir.path().join("control_paths.json");

        let engine = Arc::new(StubSynth::default());
        let (param_tx, _param_rx) = ring::<ParamUpdate>(8);
        let (control_tx, _control_rx) = crossbeam_channel::unbounded();
        let mut first = CommandRouter::new(
            Arc::clone(&engine),
            param_tx,
            control_tx.clone(),
            AudioMetrics::new(),
            TuningLibrary::new(PathBuf::from("/data")),
            defaults_file.clone(),
        );
        first.handle_message(message(
            "/tuning/path/kbm",
            string_arg(custom.to_str().unwrap()),
        ));

        let (param_tx, _param_rx2) = ring::<ParamUpdate>(8);
        let mut second = CommandRouter::new(
            Arc::clone(&engine),
            param_tx,
            control_tx,
            AudioMetrics::new(),
            TuningLibrary::new(PathBuf::from("/data")),
            defaults_file,
        );
        second.handle_message(message("/tuning/kbm", string_arg("concert")));
        assert_eq!(
            engine.calls(),
            vec![format!("kbm:{}/concert.kbm", custom.display())]
        );
    }

    #[test]
    fn test_dump_all_parameters_goes_to_control_worker() {
        let mut f = fixture();
        f.router.handle_message(message("/send_all_parameters", vec![]));
        assert_eq!(
            f.control_rx.try_recv().unwrap(),
            ControlMsg::DumpAllParameters
        );
    }

    #[test]
    fn test_bundle_members_processed_in_order() {
        let mut f = fixture();
        let bundle = OscPacket::Bundle(OscBundle {
            timetag: OscTime {
                seconds: 0,
                fractional: 1,
            },
            content: vec![
                OscPacket::Message(message("/patch/incr", vec![])),
                OscPacket::Bundle(OscBundle {
                    timetag: OscTime {
                        seconds: 0,
                        fractional: 1,
                    },
                    content: vec![OscPacket::Message(message("/patch/incr", vec![]))],
                }),
                OscPacket::Message(message("/patch/decr", vec![])),
            ],
        });
        f.router.handle_packet(bundle);
        assert_eq!(f.engine.calls(), vec!["nav:Next", "nav:Next", "nav:Prev"]);
    }

    #[test]
    fn test_malformed_addresses_rejected() {
        let mut f = fixture();
        f.router.handle_message(message("noslash", vec![]));
        f.router.handle_message(message("/unknown/domain", vec![]));
        f.router.handle_message(message("/patch/explode", vec![]));
        f.router.handle_message(message("/tuning/xyz", string_arg("a")));
        f.router.handle_message(message("/tuning/path/xyz", string_arg("a")));
        assert_eq!(f.router.ignored(), 5);
        assert!(f.engine.calls().is_empty());
        assert!(f.param_rx.is_empty());
    }

    #[test]
    fn test_empty_payloads_where_required() {
        let mut f = fixture();
        f.router.handle_message(message("/patch/load", vec![]));
        f.router.handle_message(message("/tuning/scl", vec![]));
        f.router.handle_message(message("/tuning/path/scl", vec![]));
        assert_eq!(f.router.ignored(), 3);
        assert!(f.engine.calls().is_empty());
    }
}
