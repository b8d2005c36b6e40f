//! Per-session options and their resolution.

use crate::defaults;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Output format for the finalized recording.
///
/// Compressed formats are produced by an external encoder when available;
/// otherwise the recording stays WAV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Wav,
    Flac,
    Mp3,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
            OutputFormat::Flac => "flac",
            OutputFormat::Mp3 => "mp3",
        }
    }
}

/// Options requested by the caller of `start`.
///
/// Resolution may adjust them (see [`SessionOptions::resolve`]); the session
/// keeps the resolved snapshot for the duration of the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOptions {
    pub transcription_enabled: bool,
    pub translation_enabled: bool,
    pub save_recording: bool,
    pub save_transcript: bool,
    pub save_translation: bool,
    pub save_markers: bool,
    /// Transcription language hint; "auto" requests detection.
    pub language: String,
    pub target_language: String,
    pub output_format: OutputFormat,
    /// Requested model hot-swap, applied before any device I/O.
    pub model: Option<String>,
    pub model_path: Option<PathBuf>,
    /// Explicit sample rate override. None defers to the device.
    pub sample_rate: Option<u32>,
    /// Input device index. None means the backend default.
    pub device_index: Option<usize>,
    pub create_calendar_event: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            transcription_enabled: true,
            translation_enabled: false,
            save_recording: true,
            save_transcript: true,
            save_translation: true,
            save_markers: true,
            language: defaults::AUTO_LANGUAGE.to_string(),
            target_language: "en".to_string(),
            output_format: OutputFormat::Wav,
            model: None,
            model_path: None,
            sample_rate: None,
            device_index: None,
            create_calendar_event: false,
        }
    }
}

impl SessionOptions {
    /// Resolve the effective options for a session.
    ///
    /// Translation depends on the transcript stream, so it is forced off when
    /// transcription is off. Returns the resolved snapshot and any warnings
    /// the caller should surface.
    pub fn resolve(&self) -> (SessionOptions, Vec<String>) {
        let mut resolved = self.clone();
        let mut warnings = Vec::new();

        if resolved.translation_enabled && !resolved.transcription_enabled {
            resolved.translation_enabled = false;
            warnings.push(
                "translation requires transcription; translation disabled".to_string(),
            );
        }

        (resolved, warnings)
    }
}

/// Shutdown and startup deadlines for one session.
///
/// These are configuration, not constants: tests inject short deadlines, and
/// the translation drain is deliberately longer than the processing drain to
/// absorb model cold-start costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    /// How long `start` waits for the first audio chunk.
    pub startup_validation: Duration,
    /// Bounded wait for one queue receive inside the consumer loops.
    pub queue_recv_wait: Duration,
    /// Drain deadline for the segmentation loop at stop.
    pub processing_drain: Duration,
    /// Drain deadline for the translation loop at stop.
    pub translation_drain: Duration,
    /// Grace period after the shutdown sentinel, before forced cancellation.
    pub translation_grace: Duration,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            startup_validation: Duration::from_millis(defaults::STARTUP_VALIDATION_MS),
            queue_recv_wait: Duration::from_millis(defaults::QUEUE_RECV_WAIT_MS),
            processing_drain: Duration::from_secs(defaults::PROCESSING_TIMEOUT_SECS),
            translation_drain: Duration::from_secs(defaults::TRANSLATION_TIMEOUT_SECS),
            translation_grace: Duration::from_secs(defaults::TRANSLATION_GRACE_SECS),
        }
    }
}

impl SessionTimeouts {
    pub fn from_config(config: &crate::config::TimeoutConfig) -> Self {
        Self {
            startup_validation: Duration::from_millis(config.startup_validation_ms),
            queue_recv_wait: Duration::from_millis(defaults::QUEUE_RECV_WAIT_MS),
            processing_drain: Duration::from_secs(config.processing_timeout_secs),
            translation_drain: Duration::from_secs(config.translation_timeout_secs),
            translation_grace: Duration::from_secs(config.translation_grace_secs),
        }
    }
}
