//! Shared session state.
//!
//! Mutated from the capture thread (audio stats), the cooperative loops
//! (accumulated text) and possibly a UI thread (markers), so every field
//! group sits behind its own narrow, lock-guarded accessor. Raw field access
//! is never exposed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

/// A user-placed marker within a session. Append-only, never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// 1-based, strictly increasing within a session.
    pub index: u32,
    /// Seconds since session start.
    pub offset: f64,
    pub absolute_time: DateTime<Utc>,
    pub label: String,
}

/// Running audio-level statistics for a session.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AudioStats {
    pub chunk_count: u64,
    /// Maximum absolute sample amplitude seen so far.
    pub peak_amplitude: f32,
    pub last_rms: f32,
}

struct Clock {
    wall: DateTime<Utc>,
    monotonic: Instant,
}

/// State shared between the capture thread, the loops and the orchestrator.
pub struct SessionState {
    recording: AtomicBool,
    clock: Mutex<Option<Clock>>,
    stats: Mutex<AudioStats>,
    markers: Mutex<Vec<Marker>>,
    transcript: Mutex<Vec<String>>,
    translation: Mutex<Vec<String>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            recording: AtomicBool::new(false),
            clock: Mutex::new(None),
            stats: Mutex::new(AudioStats::default()),
            markers: Mutex::new(Vec::new()),
            transcript: Mutex::new(Vec::new()),
            translation: Mutex::new(Vec::new()),
        }
    }

    /// Reset all per-session fields and mark the session recording.
    pub fn begin(&self, start_time: DateTime<Utc>) {
        *lock(&self.clock) = Some(Clock {
            wall: start_time,
            monotonic: Instant::now(),
        });
        *lock(&self.stats) = AudioStats::default();
        lock(&self.markers).clear();
        lock(&self.transcript).clear();
        lock(&self.translation).clear();
        self.recording.store(true, Ordering::SeqCst);
    }

    /// Flip the recording flag; the loops observe this to begin draining.
    pub fn end(&self) {
        self.recording.store(false, Ordering::SeqCst);
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        lock(&self.clock).as_ref().map(|c| c.wall)
    }

    /// Seconds elapsed since `begin`, from the monotonic clock.
    pub fn elapsed_secs(&self) -> f64 {
        lock(&self.clock)
            .as_ref()
            .map(|c| c.monotonic.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Update the running statistics with one chunk's precomputed levels.
    ///
    /// Called from the capture thread once per chunk; must stay cheap.
    pub fn record_audio_stats(&self, chunk_peak: f32, chunk_rms: f32) {
        let mut stats = lock(&self.stats);
        stats.chunk_count += 1;
        if chunk_peak > stats.peak_amplitude {
            stats.peak_amplitude = chunk_peak;
        }
        stats.last_rms = chunk_rms;
    }

    pub fn audio_stats(&self) -> AudioStats {
        *lock(&self.stats)
    }

    /// Append a marker at the current session offset.
    ///
    /// Valid only while recording; returns a copy of the created marker so
    /// callers cannot mutate session state through the return value.
    pub fn append_marker(&self, label: &str) -> Option<Marker> {
        if !self.is_recording() {
            return None;
        }

        let offset = self.elapsed_secs();
        let mut markers = lock(&self.markers);
        let marker = Marker {
            index: markers.len() as u32 + 1,
            offset,
            absolute_time: Utc::now(),
            label: label.to_string(),
        };
        markers.push(marker.clone());
        Some(marker)
    }

    pub fn markers(&self) -> Vec<Marker> {
        lock(&self.markers).clone()
    }

    pub fn append_transcript_line(&self, line: String) {
        lock(&self.transcript).push(line);
    }

    pub fn transcript_lines(&self) -> Vec<String> {
        lock(&self.transcript).clone()
    }

    pub fn append_translation_line(&self, line: String) {
        lock(&self.translation).push(line);
    }

    pub fn translation_lines(&self) -> Vec<String> {
        lock(&self.translation).clone()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

// Stats keep flowing even if a callback panicked while holding a lock.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
