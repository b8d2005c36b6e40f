//! Real audio capture using CPAL (Cross-Platform Audio Library).
//!
//! Adapts a cpal input stream to the push-callback [`AudioCaptureDevice`]
//! contract: each cpal data callback is downmixed to mono f32, resampled to
//! the configured rate, and handed to the registered chunk callback.

use crate::audio::device::{
    AudioCaptureDevice, CaptureErrorCallback, ChunkCallback, InputDeviceInfo,
};
use crate::error::{LiverecError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Preferred device names for desktop audio servers that route the user's
/// chosen input transparently.
const PREFERRED_DEVICES: &[&str] = &["pipewire", "pulse", "pulseaudio"];

/// Device name patterns that are never useful for voice input.
const FILTERED_PATTERNS: &[&str] = &[
    "surround",
    "front:",
    "rear:",
    "center:",
    "side:",
    "hdmi",
    "s/pdif",
    "digital output",
];

/// Name patterns that indicate a loopback/system-audio input.
const LOOPBACK_PATTERNS: &[&str] = &["monitor", "loopback"];

fn should_filter_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    FILTERED_PATTERNS.iter().any(|pattern| lower.contains(pattern))
}

fn is_preferred_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    PREFERRED_DEVICES.iter().any(|pref| lower.contains(pref))
}

fn is_loopback_device(name: &str) -> bool {
    let lower = name.to_lowercase();
    LOOPBACK_PATTERNS.iter().any(|pattern| lower.contains(pattern))
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only touched under the Mutex in CpalCaptureDevice,
/// so access is exclusive and never crosses threads concurrently.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Capture backend backed by the default cpal host.
pub struct CpalCaptureDevice {
    stream: Mutex<Option<SendableStream>>,
    sample_rate: AtomicU32,
}

impl CpalCaptureDevice {
    pub fn new() -> Self {
        Self {
            stream: Mutex::new(None),
            sample_rate: AtomicU32::new(crate::defaults::SAMPLE_RATE),
        }
    }

    /// Enumerate usable input devices in a stable order.
    fn usable_devices() -> Result<Vec<(cpal::Device, String)>> {
        let host = cpal::default_host();
        let devices = host.input_devices().map_err(|e| LiverecError::AudioCapture {
            message: format!("Failed to enumerate input devices: {}", e),
        })?;

        let mut usable = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                if !should_filter_device(&name) {
                    usable.push((device, name));
                }
            }
        }
        Ok(usable)
    }

    /// Pick the capture device: explicit index into the usable list, else a
    /// preferred audio-server device, else the system default input.
    fn select_device(device_index: Option<usize>) -> Result<cpal::Device> {
        let usable = Self::usable_devices()?;

        if let Some(index) = device_index {
            return usable
                .into_iter()
                .nth(index)
                .map(|(device, _)| device)
                .ok_or_else(|| LiverecError::AudioDeviceNotFound {
                    device: format!("index {}", index),
                });
        }

        for (device, name) in &usable {
            if is_preferred_device(name) {
                return Ok(device.clone());
            }
        }

        cpal::default_host()
            .default_input_device()
            .ok_or_else(|| LiverecError::AudioDeviceNotFound {
                device: "default".to_string(),
            })
    }
}

impl Default for CpalCaptureDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioCaptureDevice for CpalCaptureDevice {
    fn start_capture(
        &self,
        device_index: Option<usize>,
        on_chunk: ChunkCallback,
        on_error: CaptureErrorCallback,
    ) -> Result<()> {
        {
            let guard = self.stream.lock().map_err(|e| LiverecError::AudioCapture {
                message: format!("Failed to lock stream: {}", e),
            })?;
            if guard.is_some() {
                return Ok(()); // Already started
            }
        }

        let device = Self::select_device(device_index)?;
        let default_config =
            device
                .default_input_config()
                .map_err(|e| LiverecError::AudioCapture {
                    message: format!("Failed to query default input config: {}", e),
                })?;

        let native_rate = default_config.sample_rate().0;
        let native_channels = default_config.channels() as usize;
        let target_rate = self.sample_rate.load(Ordering::SeqCst);
        let stream_config: cpal::StreamConfig = default_config.clone().into();

        let err_callback = move |err: cpal::StreamError| {
            on_error(format!("Audio stream error: {}", err));
        };

        let stream = match default_config.sample_format() {
            cpal::SampleFormat::F32 => device
                .build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        let chunk =
                            convert_to_mono(data, native_channels, native_rate, target_rate);
                        on_chunk(&chunk);
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| LiverecError::AudioCapture {
                    message: format!("Failed to build f32 input stream: {}", e),
                })?,
            cpal::SampleFormat::I16 => device
                .build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        let floats: Vec<f32> =
                            data.iter().map(|&s| s as f32 / i16::MAX as f32).collect();
                        let chunk =
                            convert_to_mono(&floats, native_channels, native_rate, target_rate);
                        on_chunk(&chunk);
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| LiverecError::AudioCapture {
                    message: format!("Failed to build i16 input stream: {}", e),
                })?,
            fmt => {
                return Err(LiverecError::AudioCapture {
                    message: format!("Unsupported native sample format: {:?}", fmt),
                })
            }
        };

        stream.play().map_err(|e| LiverecError::AudioCapture {
            message: format!("Failed to start audio stream: {}", e),
        })?;

        let mut guard = self.stream.lock().map_err(|e| LiverecError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;
        *guard = Some(SendableStream(stream));
        Ok(())
    }

    fn stop_capture(&self) -> Result<()> {
        let mut guard = self.stream.lock().map_err(|e| LiverecError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;

        if let Some(stream) = guard.take() {
            stream.0.pause().map_err(|e| LiverecError::AudioCapture {
                message: format!("Failed to stop audio stream: {}", e),
            })?;
        }
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::SeqCst)
    }

    fn set_sample_rate(&self, rate: u32) {
        self.sample_rate.store(rate, Ordering::SeqCst);
    }

    fn list_input_devices(&self) -> Result<Vec<InputDeviceInfo>> {
        let usable = Self::usable_devices()?;
        let mut infos = Vec::new();
        for (index, (device, name)) in usable.into_iter().enumerate() {
            let default_sample_rate = device
                .default_input_config()
                .map(|config| config.sample_rate().0)
                .unwrap_or(crate::defaults::SAMPLE_RATE);
            infos.push(InputDeviceInfo {
                index,
                is_loopback: is_loopback_device(&name),
                name,
                default_sample_rate,
            });
        }
        Ok(infos)
    }

    // cpal delivers data callbacks we can observe directly, so a missing
    // first-audio signal is authoritative.
    fn reports_activity(&self) -> bool {
        true
    }
}

/// Mix multi-channel audio to mono and resample to the target rate.
fn convert_to_mono(samples: &[f32], channels: usize, source_rate: u32, target_rate: u32) -> Vec<f32> {
    let mono: Vec<f32> = if channels <= 1 {
        samples.to_vec()
    } else {
        samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    if source_rate == target_rate {
        mono
    } else {
        resample(&mono, source_rate, target_rate)
    }
}

/// Simple linear interpolation resampling.
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[samples.len() - 1]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as f32
            }
        })
        .collect()
}
