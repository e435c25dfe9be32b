//! Real-time playback via cpal.

use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, Stream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Extract device name via `description()` (cpal 0.17+).
fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Audio device information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Whether the device supports audio input.
    pub is_input: bool,
    /// Whether the device supports audio output.
    pub is_output: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Default output channel count (0 for input-only devices).
    pub output_channels: u16,
}

fn describe(device: &Device, name: String, is_input: bool) -> AudioDevice {
    let output = device.default_output_config().ok();
    let sample_rate = output
        .as_ref()
        .map(cpal::SupportedStreamConfig::sample_rate)
        .or_else(|| device.default_input_config().ok().map(|c| c.sample_rate()))
        .unwrap_or(48000);
    AudioDevice {
        name,
        is_input,
        is_output: output.is_some(),
        default_sample_rate: sample_rate,
        output_channels: output.map_or(0, |c| c.channels()),
    }
}

/// Lists all audio devices of the default host, inputs first.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let mut devices: Vec<AudioDevice> = Vec::new();

    if let Ok(inputs) = host.input_devices() {
        for device in inputs {
            if let Ok(name) = device_name(&device) {
                devices.push(describe(&device, name, true));
            }
        }
    }

    if let Ok(outputs) = host.output_devices() {
        for device in outputs {
            if let Ok(name) = device_name(&device) {
                if devices.iter().any(|d| d.name == name) {
                    continue;
                }
                devices.push(describe(&device, name, false));
            }
        }
    }

    Ok(devices)
}

/// Lists output devices in host order. Positions match the indices
/// accepted by [`OutputStream::open`].
pub fn list_output_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let outputs = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?;
    Ok(outputs
        .filter_map(|device| {
            let name = device_name(&device).ok()?;
            let is_input = device.default_input_config().is_ok();
            Some(describe(&device, name, is_input))
        })
        .collect())
}

/// The default output device, if the host has one.
pub fn default_output_device() -> Option<AudioDevice> {
    let device = cpal::default_host().default_output_device()?;
    let name = device_name(&device).ok()?;
    Some(describe(&device, name, false))
}

/// Finds an output device by index, exact name, or case-insensitive
/// substring, in that order.
fn find_output_device(host: &Host, name_or_index: &str) -> Result<Device> {
    let devices: Vec<Device> = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .collect();

    if let Ok(index) = name_or_index.parse::<usize>() {
        return devices.get(index).cloned().ok_or_else(|| {
            Error::DeviceNotFound(format!(
                "output device index {index} (only {} devices available)",
                devices.len()
            ))
        });
    }

    if let Some(device) = devices
        .iter()
        .find(|d| device_name(d).is_ok_and(|n| n == name_or_index))
    {
        return Ok(device.clone());
    }

    let search = name_or_index.to_lowercase();
    let mut matches: Vec<(Device, String)> = devices
        .iter()
        .filter_map(|d| {
            let name = device_name(d).ok()?;
            name.to_lowercase()
                .contains(&search)
                .then(|| (d.clone(), name))
        })
        .collect();

    match matches.len() {
        0 => Err(Error::DeviceNotFound(format!(
            "no output device matching '{name_or_index}'"
        ))),
        1 => Ok(matches.remove(0).0),
        _ => {
            let names: Vec<_> = matches.iter().map(|(_, n)| n.as_str()).collect();
            tracing::warn!(
                search = name_or_index,
                candidates = ?names,
                "multiple output devices match, using the first"
            );
            Ok(matches.remove(0).0)
        }
    }
}

/// Cloneable flag that stops a running [`OutputStream`].
///
/// Safe to trigger from a signal handler thread.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Requests the stream to stop.
    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// True while the stream is running.
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Stereo output stream on one device.
pub struct OutputStream {
    device: Device,
    name: String,
    config: cpal::StreamConfig,
    running: Arc<AtomicBool>,
    stream: Option<Stream>,
}

impl OutputStream {
    /// Opens the named device (index, name or substring), or the default
    /// output device for `None`, at its default configuration.
    pub fn open(device: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = match device {
            Some(name) => find_output_device(&host, name)?,
            None => host.default_output_device().ok_or(Error::NoDevice)?,
        };
        let supported = device
            .default_output_config()
            .map_err(|e| Error::Stream(e.to_string()))?;
        let name = device_name(&device).unwrap_or_else(|_| "unknown".to_string());

        tracing::info!(
            host = host.id().name(),
            device = %name,
            sample_rate = supported.sample_rate(),
            channels = supported.channels(),
            "output device opened"
        );

        Ok(Self {
            device,
            name,
            config: supported.into(),
            running: Arc::new(AtomicBool::new(false)),
            stream: None,
        })
    }

    /// Requests a fixed hardware buffer size in frames.
    #[must_use]
    pub fn with_buffer_size(mut self, frames: u32) -> Self {
        self.config.buffer_size = cpal::BufferSize::Fixed(frames);
        self
    }

    /// Device sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Device channel count.
    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Device name.
    pub fn device_name(&self) -> &str {
        &self.name
    }

    /// Handle for stopping the stream from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.running))
    }

    /// Plays until stopped, blocking the calling thread.
    ///
    /// `render(left, right)` fills at most `max_frames` frames per call and
    /// returns `false` once the source is exhausted, which stops the stream.
    /// Scratch buffers are allocated here, never in the callback.
    pub fn run<F>(&mut self, max_frames: usize, mut render: F) -> Result<()>
    where
        F: FnMut(&mut [f32], &mut [f32]) -> bool + Send + 'static,
    {
        let channels = usize::from(self.config.channels).max(1);
        let max_frames = max_frames.max(1);
        let mut left = vec![0.0f32; max_frames];
        let mut right = vec![0.0f32; max_frames];

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !running.load(Ordering::SeqCst) {
                        data.fill(0.0);
                        return;
                    }
                    for chunk in data.chunks_mut(max_frames * channels) {
                        let frames = chunk.len() / channels;
                        if !render(&mut left[..frames], &mut right[..frames]) {
                            running.store(false, Ordering::SeqCst);
                        }
                        interleave_into(&left[..frames], &right[..frames], chunk, channels);
                    }
                },
                |err| tracing::error!(error = %err, "output stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        self.stream = Some(stream);

        while self.running.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(50));
        }

        self.stream = None;
        tracing::info!(device = %self.name, "output stream stopped");
        Ok(())
    }

    /// Stops the stream.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// True while [`run`](Self::run) is playing.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Writes stereo frames into an interleaved buffer of `channels`.
///
/// Mono devices get the channel average; extra channels are silenced.
fn interleave_into(left: &[f32], right: &[f32], output: &mut [f32], channels: usize) {
    for ((frame, &l), &r) in output.chunks_exact_mut(channels).zip(left).zip(right) {
        match frame {
            [mono] => *mono = (l + r) * 0.5,
            [out_l, out_r, rest @ ..] => {
                *out_l = l;
                *out_r = r;
                rest.fill(0.0);
            }
            [] => {}
        }
    }
}
