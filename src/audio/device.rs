//! Audio capture device abstraction.
//!
//! A capture device owns a dedicated I/O thread and pushes mono f32 chunks
//! into a registered callback, one chunk per invocation. The callback runs on
//! that thread and must return quickly: bounded hand-offs only, no blocking
//! I/O, no awaiting.

use crate::error::{LiverecError, Result};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Per-chunk callback invoked synchronously from the capture thread.
pub type ChunkCallback = Arc<dyn Fn(&[f32]) + Send + Sync>;

/// Callback for asynchronous capture errors (device lost, stream error).
pub type CaptureErrorCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Metadata for one enumerable input device.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct InputDeviceInfo {
    pub index: usize,
    pub name: String,
    pub default_sample_rate: u32,
    /// True for loopback/monitor inputs that capture system audio.
    pub is_loopback: bool,
}

/// Trait for audio capture backends.
///
/// This trait allows swapping implementations (real device vs mock).
pub trait AudioCaptureDevice: Send + Sync {
    /// Start capturing on the given input, delivering chunks to `on_chunk`
    /// from a dedicated thread until `stop_capture` is called.
    fn start_capture(
        &self,
        device_index: Option<usize>,
        on_chunk: ChunkCallback,
        on_error: CaptureErrorCallback,
    ) -> Result<()>;

    /// Stop capturing. Idempotent.
    fn stop_capture(&self) -> Result<()>;

    /// Currently configured sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Reconfigure the sample rate. Takes effect on the next `start_capture`.
    fn set_sample_rate(&self, rate: u32);

    /// Enumerate available input devices.
    fn list_input_devices(&self) -> Result<Vec<InputDeviceInfo>>;

    /// Whether this backend can authoritatively report that no data is
    /// flowing. Backends that cannot observe delivery return false, and
    /// startup validation proceeds optimistically.
    fn reports_activity(&self) -> bool {
        true
    }
}

/// Mock capture device for testing.
///
/// Emits a configured sequence of chunks from a background thread, or stays
/// silent, or reports an error — whatever the test needs.
pub struct MockCaptureDevice {
    chunks: Mutex<Vec<Vec<f32>>>,
    chunk_interval: Duration,
    sample_rate: AtomicU32,
    devices: Vec<InputDeviceInfo>,
    running: Arc<AtomicBool>,
    silent: bool,
    start_error: Option<String>,
    async_error: Option<String>,
    authoritative: bool,
    started_count: Arc<AtomicU32>,
    stopped_count: Arc<AtomicU32>,
}

impl MockCaptureDevice {
    pub fn new() -> Self {
        Self {
            chunks: Mutex::new(Vec::new()),
            chunk_interval: Duration::from_millis(5),
            sample_rate: AtomicU32::new(crate::defaults::SAMPLE_RATE),
            devices: vec![InputDeviceInfo {
                index: 0,
                name: "mock input".to_string(),
                default_sample_rate: crate::defaults::SAMPLE_RATE,
                is_loopback: false,
            }],
            running: Arc::new(AtomicBool::new(false)),
            silent: false,
            start_error: None,
            async_error: None,
            authoritative: true,
            started_count: Arc::new(AtomicU32::new(0)),
            stopped_count: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Emit these chunks, in order, then go quiet.
    pub fn with_chunks(self, chunks: Vec<Vec<f32>>) -> Self {
        *self.chunks.lock().unwrap() = chunks;
        self
    }

    /// Emit `count` copies of the same chunk.
    pub fn with_repeated_chunk(self, chunk: Vec<f32>, count: usize) -> Self {
        *self.chunks.lock().unwrap() = vec![chunk; count];
        self
    }

    /// Delay between emitted chunks.
    pub fn with_chunk_interval(mut self, interval: Duration) -> Self {
        self.chunk_interval = interval;
        self
    }

    /// Never invoke the chunk callback (simulates a dead input).
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Fail `start_capture` immediately.
    pub fn with_start_error(mut self, message: &str) -> Self {
        self.start_error = Some(message.to_string());
        self
    }

    /// Report this error through the error callback right after starting.
    pub fn with_async_error(mut self, message: &str) -> Self {
        self.async_error = Some(message.to_string());
        self
    }

    /// Override the enumerable device list.
    pub fn with_devices(mut self, devices: Vec<InputDeviceInfo>) -> Self {
        self.devices = devices;
        self
    }

    /// Control whether the backend claims authoritative activity reporting.
    pub fn with_authoritative(mut self, authoritative: bool) -> Self {
        self.authoritative = authoritative;
        self
    }

    pub fn start_count(&self) -> u32 {
        self.started_count.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> u32 {
        self.stopped_count.load(Ordering::SeqCst)
    }
}

impl Default for MockCaptureDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioCaptureDevice for MockCaptureDevice {
    fn start_capture(
        &self,
        _device_index: Option<usize>,
        on_chunk: ChunkCallback,
        on_error: CaptureErrorCallback,
    ) -> Result<()> {
        if let Some(message) = &self.start_error {
            return Err(LiverecError::AudioCapture {
                message: message.clone(),
            });
        }

        self.started_count.fetch_add(1, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);

        if let Some(message) = self.async_error.clone() {
            on_error(message);
        }

        if self.silent {
            return Ok(());
        }

        let chunks: Vec<Vec<f32>> = self.chunks.lock().unwrap().clone();
        let running = self.running.clone();
        let interval = self.chunk_interval;

        thread::spawn(move || {
            for chunk in chunks {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                on_chunk(&chunk);
                thread::sleep(interval);
            }
        });

        Ok(())
    }

    fn stop_capture(&self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        self.stopped_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::SeqCst)
    }

    fn set_sample_rate(&self, rate: u32) {
        self.sample_rate.store(rate, Ordering::SeqCst);
    }

    fn list_input_devices(&self) -> Result<Vec<InputDeviceInfo>> {
        Ok(self.devices.clone())
    }

    fn reports_activity(&self) -> bool {
        self.authoritative
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_mock_emits_configured_chunks() {
        let device = MockCaptureDevice::new().with_repeated_chunk(vec![0.1; 160], 3);
        let received = Arc::new(AtomicUsize::new(0));

        let counter = received.clone();
        device
            .start_capture(
                None,
                Arc::new(move |chunk| {
                    assert_eq!(chunk.len(), 160);
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
                Arc::new(|_| {}),
            )
            .unwrap();

        thread::sleep(Duration::from_millis(100));
        device.stop_capture().unwrap();

        assert_eq!(received.load(Ordering::SeqCst), 3);
        assert_eq!(device.start_count(), 1);
        assert_eq!(device.stop_count(), 1);
    }

    #[test]
    fn test_mock_silent_never_invokes_callback() {
        let device = MockCaptureDevice::new()
            .with_repeated_chunk(vec![0.1; 160], 5)
            .silent();
        let received = Arc::new(AtomicUsize::new(0));

        let counter = received.clone();
        device
            .start_capture(
                None,
                Arc::new(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
                Arc::new(|_| {}),
            )
            .unwrap();

        thread::sleep(Duration::from_millis(50));
        assert_eq!(received.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_mock_start_error() {
        let device = MockCaptureDevice::new().with_start_error("permission denied");
        let result = device.start_capture(None, Arc::new(|_| {}), Arc::new(|_| {}));

        match result {
            Err(LiverecError::AudioCapture { message }) => {
                assert_eq!(message, "permission denied");
            }
            other => panic!("Expected AudioCapture error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_mock_async_error_reaches_callback() {
        let device = MockCaptureDevice::new().silent().with_async_error("device unplugged");
        let reported = Arc::new(Mutex::new(None::<String>));

        let slot = reported.clone();
        device
            .start_capture(
                None,
                Arc::new(|_| {}),
                Arc::new(move |message| {
                    *slot.lock().unwrap() = Some(message);
                }),
            )
            .unwrap();

        assert_eq!(
            reported.lock().unwrap().as_deref(),
            Some("device unplugged")
        );
    }

    #[test]
    fn test_mock_sample_rate_settable() {
        let device = MockCaptureDevice::new();
        assert_eq!(device.sample_rate(), 16_000);
        device.set_sample_rate(48_000);
        assert_eq!(device.sample_rate(), 48_000);
    }

    #[test]
    fn test_mock_device_listing() {
        let device = MockCaptureDevice::new().with_devices(vec![
            InputDeviceInfo {
                index: 0,
                name: "mic".to_string(),
                default_sample_rate: 44_100,
                is_loopback: false,
            },
            InputDeviceInfo {
                index: 1,
                name: "monitor".to_string(),
                default_sample_rate: 48_000,
                is_loopback: true,
            },
        ]);

        let devices = device.list_input_devices().unwrap();
        assert_eq!(devices.len(), 2);
        assert!(devices[1].is_loopback);
    }

    #[test]
    fn test_trait_is_object_safe() {
        let device: Arc<dyn AudioCaptureDevice> = Arc::new(MockCaptureDevice::new());
        assert!(device.reports_activity());
        assert_eq!(device.sample_rate(), 16_000);
    }
}
