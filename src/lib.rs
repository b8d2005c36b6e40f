//! liverec - live audio recording sessions
//!
//! Captures live audio, detects speech boundaries, transcribes and
//! optionally translates incrementally, and persists the resulting
//! audio/text artifacts while the session is still running.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod calendar;
pub mod config;
pub mod defaults;
pub mod error;
pub mod session;
pub mod storage;
pub mod stt;
pub mod translate;

// Core collaborator traits (capture → segment → transcribe → translate)
pub use audio::device::{AudioCaptureDevice, InputDeviceInfo};
pub use audio::ring_buffer::RingAudioBuffer;
pub use audio::vad::{EnergyVad, SpeechSegment, VoiceActivityDetector};
pub use calendar::CalendarEventSink;
pub use stt::engine::{ModelSelectable, SpeechEngine, Transcription};
pub use translate::TranslationEngine;

// Session orchestration
pub use session::{
    Marker, OutputFormat, RecordingSession, SessionEvent, SessionObserver, SessionOptions,
    SessionResult, SessionTimeouts,
};

// Persistence
pub use storage::archiver::StreamingArchiver;
pub use storage::{FileStorage, LocalFileStorage};

// Error handling
pub use error::{LiverecError, Result};

// Config
pub use config::Config;
