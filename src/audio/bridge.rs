//! Bridge between the capture thread and the cooperative pipeline.
//!
//! The capture device invokes the bridge synchronously, once per chunk, from
//! its own I/O thread. Everything here is a bounded, non-blocking hand-off:
//! a light stats lock, a latched first-audio signal, a streaming append with
//! failover, a `try_send` onto the raw queue, and a panic-isolated observer
//! call. The capture thread must never block or await.

use crate::audio::device::ChunkCallback;
use crate::audio::vad::rms;
use crate::session::observer::{self, SessionObserver};
use crate::session::state::SessionState;
use crate::storage::archiver::{AppendOutcome, StreamingArchiver};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::Notify;

/// One-shot signal that the first audio chunk has arrived.
///
/// Set from the capture thread, awaited by `start` during its validation
/// window.
pub struct FirstAudioSignal {
    received: AtomicBool,
    notify: Notify,
}

impl FirstAudioSignal {
    pub fn new() -> Self {
        Self {
            received: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Latch the signal. Only the first call has any effect.
    pub fn signal(&self) {
        if !self.received.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    pub fn received(&self) -> bool {
        self.received.load(Ordering::SeqCst)
    }

    /// Wait up to `deadline` for the signal. Returns whether it arrived.
    pub async fn wait(&self, deadline: Duration) -> bool {
        if self.received() {
            return true;
        }
        let waited = tokio::time::timeout(deadline, async {
            loop {
                let notified = self.notify.notified();
                if self.received() {
                    return;
                }
                notified.await;
            }
        })
        .await;
        waited.is_ok() || self.received()
    }
}

impl Default for FirstAudioSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Adapts the push-based capture callback into the session's queues and
/// collaborators.
pub struct CaptureBridge {
    state: Arc<SessionState>,
    /// Present only when streaming persistence is enabled for this session.
    archiver: Option<Arc<StreamingArchiver>>,
    /// In-memory fallback once streaming has degraded.
    fallback_chunks: Mutex<Vec<Vec<f32>>>,
    /// Present only when transcription is enabled.
    raw_tx: Option<mpsc::Sender<Vec<f32>>>,
    observer: Option<Arc<dyn SessionObserver>>,
    first_audio: Arc<FirstAudioSignal>,
    streaming_degraded: AtomicBool,
    dropped_chunks: AtomicU64,
}

impl CaptureBridge {
    pub fn new(
        state: Arc<SessionState>,
        archiver: Option<Arc<StreamingArchiver>>,
        raw_tx: Option<mpsc::Sender<Vec<f32>>>,
        observer: Option<Arc<dyn SessionObserver>>,
    ) -> Self {
        Self {
            state,
            archiver,
            fallback_chunks: Mutex::new(Vec::new()),
            raw_tx,
            observer,
            first_audio: Arc::new(FirstAudioSignal::new()),
            streaming_degraded: AtomicBool::new(false),
            dropped_chunks: AtomicU64::new(0),
        }
    }

    pub fn first_audio(&self) -> Arc<FirstAudioSignal> {
        self.first_audio.clone()
    }

    /// Chunks buffered in memory after a streaming failure, in arrival order.
    pub fn take_fallback_chunks(&self) -> Vec<Vec<f32>> {
        std::mem::take(&mut *self.lock_fallback())
    }

    pub fn streaming_degraded(&self) -> bool {
        self.streaming_degraded.load(Ordering::SeqCst)
    }

    pub fn dropped_chunks(&self) -> u64 {
        self.dropped_chunks.load(Ordering::SeqCst)
    }

    /// Build the callback handed to the capture device.
    pub fn callback(self: &Arc<Self>) -> ChunkCallback {
        let bridge = self.clone();
        Arc::new(move |chunk| bridge.handle_chunk(chunk))
    }

    /// Per-chunk entry point; runs on the capture thread.
    pub fn handle_chunk(&self, chunk: &[f32]) {
        if chunk.is_empty() {
            return;
        }

        let peak = chunk.iter().fold(0.0f32, |max, &s| max.max(s.abs()));
        let level = rms(chunk);
        self.state.record_audio_stats(peak, level);
        self.first_audio.signal();

        if let Some(archiver) = &self.archiver {
            match archiver.append_or_failover(chunk) {
                AppendOutcome::Written => {}
                AppendOutcome::Recovered(path) => {
                    if !self.streaming_degraded.swap(true, Ordering::SeqCst) {
                        eprintln!(
                            "liverec: streaming capture failed, partial file kept at {}; buffering in memory",
                            path.display()
                        );
                        observer::notify(&self.observer, |o| {
                            o.on_error("streaming capture failed; buffering audio in memory")
                        });
                    }
                    self.lock_fallback().push(chunk.to_vec());
                }
                AppendOutcome::Failed => {
                    if !self.streaming_degraded.swap(true, Ordering::SeqCst) {
                        eprintln!("liverec: streaming capture failed; buffering in memory");
                        observer::notify(&self.observer, |o| {
                            o.on_error("streaming capture failed; buffering audio in memory")
                        });
                    }
                    self.lock_fallback().push(chunk.to_vec());
                }
            }
        }

        if let Some(tx) = &self.raw_tx {
            if tx.try_send(chunk.to_vec()).is_err() {
                // Queue full or consumer gone: drop rather than block capture.
                if self.dropped_chunks.fetch_add(1, Ordering::SeqCst) == 0 {
                    eprintln!("liverec: raw audio queue full, dropping chunks");
                }
            }
        }

        observer::notify(&self.observer, |o| o.on_audio_level(level, peak));
    }

    fn lock_fallback(&self) -> std::sync::MutexGuard<'_, Vec<Vec<f32>>> {
        match self.fallback_chunks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::options::OutputFormat;
    use crate::storage::LocalFileStorage;
    use chrono::Utc;
    use tempfile::TempDir;

    fn recording_state() -> Arc<SessionState> {
        let state = Arc::new(SessionState::new());
        state.begin(Utc::now());
        state
    }

    fn streaming_archiver(dir: &TempDir) -> Arc<StreamingArchiver> {
        let storage = Arc::new(
            LocalFileStorage::new(dir.path().join("root")).with_temp_dir(dir.path().join("tmp")),
        );
        let archiver = Arc::new(StreamingArchiver::new(storage));
        archiver
            .start_recording_capture(Utc::now(), 16_000)
            .unwrap();
        archiver
    }

    #[test]
    fn test_chunk_updates_stats_and_first_audio() {
        let state = recording_state();
        let bridge = Arc::new(CaptureBridge::new(state.clone(), None, None, None));
        let first = bridge.first_audio();
        assert!(!first.received());

        bridge.handle_chunk(&[0.5, -0.8, 0.2]);
        bridge.handle_chunk(&[0.1; 10]);

        assert!(first.received());
        let stats = state.audio_stats();
        assert_eq!(stats.chunk_count, 2);
        assert_eq!(stats.peak_amplitude, 0.8);
        assert!(stats.last_rms > 0.0);
    }

    #[test]
    fn test_empty_chunk_ignored() {
        let state = recording_state();
        let bridge = Arc::new(CaptureBridge::new(state.clone(), None, None, None));

        bridge.handle_chunk(&[]);

        assert!(!bridge.first_audio().received());
        assert_eq!(state.audio_stats().chunk_count, 0);
    }

    #[test]
    fn test_chunks_reach_raw_queue_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let bridge = Arc::new(CaptureBridge::new(recording_state(), None, Some(tx), None));

        bridge.handle_chunk(&[0.1; 4]);
        bridge.handle_chunk(&[0.2; 4]);

        assert_eq!(rx.try_recv().unwrap(), vec![0.1; 4]);
        assert_eq!(rx.try_recv().unwrap(), vec![0.2; 4]);
    }

    #[test]
    fn test_full_queue_drops_without_blocking() {
        let (tx, mut rx) = mpsc::channel(1);
        let bridge = Arc::new(CaptureBridge::new(recording_state(), None, Some(tx), None));

        bridge.handle_chunk(&[0.1; 4]);
        bridge.handle_chunk(&[0.2; 4]); // dropped, queue full
        bridge.handle_chunk(&[0.3; 4]); // dropped

        assert_eq!(bridge.dropped_chunks(), 2);
        assert_eq!(rx.try_recv().unwrap(), vec![0.1; 4]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_streaming_append_keeps_fallback_empty() {
        let dir = TempDir::new().unwrap();
        let archiver = streaming_archiver(&dir);
        let bridge = Arc::new(CaptureBridge::new(
            recording_state(),
            Some(archiver.clone()),
            None,
            None,
        ));

        bridge.handle_chunk(&[0.4; 64]);
        bridge.handle_chunk(&[0.4; 64]);

        assert!(!bridge.streaming_degraded());
        assert!(bridge.take_fallback_chunks().is_empty());
        assert!(archiver.is_streaming());
    }

    #[test]
    fn test_write_failure_degrades_to_memory_buffering() {
        let dir = TempDir::new().unwrap();
        let archiver = streaming_archiver(&dir);
        let bridge = Arc::new(CaptureBridge::new(
            recording_state(),
            Some(archiver.clone()),
            None,
            None,
        ));

        bridge.handle_chunk(&[0.4; 64]);
        archiver.inject_write_error();
        bridge.handle_chunk(&[0.5; 64]);
        bridge.handle_chunk(&[0.6; 64]);

        assert!(bridge.streaming_degraded());
        assert!(archiver.has_failed_prefix());
        let fallback = bridge.take_fallback_chunks();
        assert_eq!(fallback, vec![vec![0.5; 64], vec![0.6; 64]]);
    }

    #[tokio::test]
    async fn test_first_audio_wait_resolves_on_signal() {
        let signal = Arc::new(FirstAudioSignal::new());

        let waiter = signal.clone();
        let handle = tokio::spawn(async move { waiter.wait(Duration::from_secs(2)).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        signal.signal();

        assert!(handle.await.unwrap());
    }

    #[tokio::test]
    async fn test_first_audio_wait_times_out_without_signal() {
        let signal = FirstAudioSignal::new();
        assert!(!signal.wait(Duration::from_millis(30)).await);
    }

    #[tokio::test]
    async fn test_first_audio_wait_returns_immediately_when_latched() {
        let signal = FirstAudioSignal::new();
        signal.signal();
        assert!(signal.wait(Duration::from_millis(1)).await);
    }

    #[test]
    fn test_observer_panic_does_not_stop_capture() {
        struct Panicking;
        impl SessionObserver for Panicking {
            fn on_audio_level(&self, _rms: f32, _peak: f32) {
                panic!("meter bug");
            }
        }

        let state = recording_state();
        let bridge = Arc::new(CaptureBridge::new(
            state.clone(),
            None,
            None,
            Some(Arc::new(Panicking)),
        ));

        bridge.handle_chunk(&[0.1; 8]);
        bridge.handle_chunk(&[0.1; 8]);

        assert_eq!(state.audio_stats().chunk_count, 2);
    }

    #[test]
    fn test_fallback_then_save_recording_roundtrip() {
        let dir = TempDir::new().unwrap();
        let archiver = streaming_archiver(&dir);
        let bridge = Arc::new(CaptureBridge::new(
            recording_state(),
            Some(archiver.clone()),
            None,
            None,
        ));

        bridge.handle_chunk(&[0.25; 100]);
        archiver.inject_write_error();
        bridge.handle_chunk(&[0.5; 100]);

        let fallback = bridge.take_fallback_chunks();
        let path = archiver
            .save_recording(&fallback, Utc::now(), 16_000, OutputFormat::Wav)
            .unwrap()
            .unwrap();

        let samples: Vec<i16> = hound::WavReader::open(&path)
            .unwrap()
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(samples.len(), 200);
    }
}
