//! Audio device output via cpal.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};

use aulos_types::Synthesizer;

use crate::playback::BlockRenderer;

/// A running output stream. Dropping it stops the device callback.
pub struct OutputStream {
    _stream: cpal::Stream,
    sample_rate: u32,
    channels: u16,
}

impl OutputStream {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

/// Names of the output devices visible to the default host.
pub fn list_output_devices() -> Vec<String> {
    cpal::default_host()
        .output_devices()
        .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
        .unwrap_or_default()
}

/// Open the default output device and start the block renderer on its
/// callback. On failure the device stays closed and the error goes back to
/// the caller.
pub fn start_output<E: Synthesizer + 'static>(
    mut renderer: BlockRenderer<E>,
) -> Result<OutputStream, String> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| "no audio output device available".to_string())?;
    let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

    let config = device
        .default_output_config()
        .map_err(|e| format!("failed to get output config: {}", e))?;
    if config.sample_format() != SampleFormat::F32 {
        return Err(format!(
            "unsupported output sample format: {:?}",
            config.sample_format()
        ));
    }

    let channels = config.channels();
    let sample_rate = config.sample_rate().0;
    let stream_config: StreamConfig = config.into();

    // The device clock drives the renderer from here on; hand it the rate
    // before the first callback fires.
    renderer.prepare(sample_rate as f64);

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                renderer.render_into(data, channels as usize);
            },
            |err| {
                log::error!(target: "audio", "output stream error: {}", err);
            },
            None,
        )
        .map_err(|e| format!("failed to build output stream: {}", e))?;

    stream
        .play()
        .map_err(|e| format!("failed to start output stream: {}", e))?;

    log::info!(
        target: "audio",
        "audio output started: [{}] {} Hz, {} channels",
        name,
        sample_rate,
        channels
    );

    Ok(OutputStream {
        _stream: stream,
        sample_rate,
        channels,
    })
}
