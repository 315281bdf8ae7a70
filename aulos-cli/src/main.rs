//! Headless player binary: MIDI and OSC in, audio out.

mod engine;

use std::sync::Arc;
use std::time::Duration;

use aulos_audio::{list_output_devices, ring, start_output, AudioMetrics, BlockRenderer, MidiInputManager};
use aulos_osc::{spawn_control, CommandRouter, OscReceiver, PathDefaults, StateExporter, TuningLibrary};
use aulos_types::{MidiEvent, ParamUpdate, Synthesizer};

use engine::ToneEngine;

/// Capacity of each realtime event queue, in events.
const QUEUE_CAPACITY: usize = 4096;

/// Exit code when the requested MIDI input cannot be opened.
const EXIT_CODE_MIDI: i32 = 1;
/// Exit code when the audio output cannot be started.
const EXIT_CODE_AUDIO: i32 = 2;

const USAGE: &str = "\
usage: aulos [options]
  -l, --list-devices        list audio output and MIDI input devices, then exit
  -m, --midi-input <index>  connect the MIDI input port with this index
      --osc-in-port <port>  listen for OSC control messages on this UDP port
      --osc-out-port <port> send OSC replies to 127.0.0.1:<port> (needs --osc-in-port)
      --init-patch <path>   load this patch file at startup
  -v, --verbose             debug-level logging
      --version             print the version, then exit";

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .expect("Failed to initialize logger");

    log::info!("aulos starting (log level: {:?})", log_level);
}

fn flag_value(args: &[String], long: &str, short: Option<&str>) -> Option<String> {
    args.iter()
        .position(|a| a == long || short.map_or(false, |s| a == s))
        .and_then(|i| args.get(i + 1).cloned())
}

fn parse_port(args: &[String], flag: &str) -> Option<u16> {
    let raw = flag_value(args, flag, None)?;
    match raw.parse() {
        Ok(port) => Some(port),
        Err(_) => {
            eprintln!("invalid value for {}: {}", flag, raw);
            std::process::exit(2);
        }
    }
}

fn list_devices() {
    println!("Audio output devices:");
    let outputs = list_output_devices();
    if outputs.is_empty() {
        println!("  (none)");
    }
    for (i, name) in outputs.iter().enumerate() {
        println!("  [{}] {}", i, name);
    }

    println!("MIDI input ports:");
    let manager = MidiInputManager::new();
    let ports = manager.list_ports();
    if ports.is_empty() {
        println!("  (none)");
    }
    for port in ports {
        println!("  [{}] {}", port.index, port.name);
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--version") {
        println!("aulos {}", env!("CARGO_PKG_VERSION"));
        return;
    }
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", USAGE);
        return;
    }

    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    init_logging(verbose);

    if args.iter().any(|a| a == "--list-devices" || a == "-l") {
        list_devices();
        return;
    }

    let midi_port = flag_value(&args, "--midi-input", Some("-m")).map(|raw| {
        raw.parse::<usize>().unwrap_or_else(|_| {
            eprintln!("invalid MIDI port index: {}", raw);
            std::process::exit(2);
        })
    });
    let osc_in_port = parse_port(&args, "--osc-in-port");
    let osc_out_port = parse_port(&args, "--osc-out-port");
    if osc_out_port.is_some() && osc_in_port.is_none() {
        eprintln!("--osc-out-port requires --osc-in-port");
        std::process::exit(2);
    }
    let init_patch = flag_value(&args, "--init-patch", None);

    let engine = Arc::new(ToneEngine::new());
    let metrics = AudioMetrics::new();

    if let Some(ref path) = init_patch {
        engine.request_patch_load(std::path::Path::new(path));
    }

    // Realtime queues: driver callbacks write, the audio thread reads.
    let (midi_tx, midi_rx) = ring::<MidiEvent>(QUEUE_CAPACITY);
    let (param_tx, param_rx) = ring::<ParamUpdate>(QUEUE_CAPACITY);

    let mut midi_input = MidiInputManager::new();
    match midi_port {
        Some(index) => {
            if let Err(e) = midi_input.connect(index, midi_tx, metrics.clone()) {
                log::error!(target: "audio", "MIDI connect failed: {}", e);
                eprintln!("could not open MIDI input {}: {}", index, e);
                std::process::exit(EXIT_CODE_MIDI);
            }
            log::info!(
                target: "audio",
                "MIDI input connected: {}",
                midi_input.connected_port_name().unwrap_or("Unknown")
            );
        }
        None => drop(midi_tx),
    }

    let renderer = BlockRenderer::new(Arc::clone(&engine), midi_rx, param_rx, metrics.clone());
    let _stream = match start_output(renderer) {
        Ok(stream) => stream,
        Err(e) => {
            log::error!(target: "audio", "audio startup failed: {}", e);
            eprintln!("could not start audio output: {}", e);
            std::process::exit(EXIT_CODE_AUDIO);
        }
    };

    let mut exporter = StateExporter::new(Arc::clone(&engine));
    if let Some(port) = osc_out_port {
        match exporter.start_sending("127.0.0.1", port) {
            Ok(()) => log::info!(target: "osc", "OSC output to 127.0.0.1:{}", port),
            Err(e) => log::error!(target: "osc", "OSC output unavailable: {}", e),
        }
    }
    let worker = spawn_control(Arc::clone(&engine), exporter);

    let mut receiver = OscReceiver::new();
    if let Some(port) = osc_in_port {
        let router = CommandRouter::new(
            Arc::clone(&engine),
            param_tx,
            worker.sender(),
            metrics.clone(),
            TuningLibrary::default_location(),
            PathDefaults::default_file(),
        );
        if let Err(e) = receiver.start(port, router) {
            log::error!(target: "osc", "OSC input unavailable: {}", e);
        }
    } else {
        drop(param_tx);
    }

    run_forever(metrics);
}

fn run_forever(metrics: AudioMetrics) -> ! {
    println!("aulos running; press Ctrl-C to quit");
    loop {
        std::thread::sleep(Duration::from_secs(10));
        let (callbacks, max_us, midi_dropped, param_dropped) = metrics.take_summary();
        log::debug!(
            target: "audio",
            "callbacks={} max_callback_us={} midi_dropped={} param_dropped={}",
            callbacks,
            max_us,
            midi_dropped,
            param_dropped
        );
    }
}
