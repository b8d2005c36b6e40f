//! Error types for liverec.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LiverecError {
    // Session startup errors — raised synchronously from `start`
    #[error("No audio capture device is configured")]
    CaptureUnavailable,

    #[error("Audio capture failed to start: {message}")]
    CaptureStartupFailure { message: String },

    #[error("Cannot activate model '{model}': {message}")]
    ModelActivationFailure { model: String, message: String },

    #[error("A recording session is already active")]
    SessionAlreadyActive,

    #[error("Invalid sample rate: {rate}")]
    InvalidSampleRate { rate: u32 },

    // Streaming persistence — recovered locally, never aborts a session
    #[error("Streaming write failed: {message}")]
    StreamingWriteFailure { message: String },

    // Per-chunk pipeline errors — logged and surfaced, never fatal
    #[error("Transcription failed: {message}")]
    Transcription { message: String },

    #[error("Translation failed: {message}")]
    Translation { message: String },

    // Artifact persistence
    #[error("Storage error: {message}")]
    Storage { message: String },

    // Capture backend errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Configuration
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // General I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, LiverecError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_capture_unavailable_display() {
        let error = LiverecError::CaptureUnavailable;
        assert_eq!(error.to_string(), "No audio capture device is configured");
    }

    #[test]
    fn test_capture_startup_failure_display() {
        let error = LiverecError::CaptureStartupFailure {
            message: "no audio received within 1.5s".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Audio capture failed to start: no audio received within 1.5s"
        );
    }

    #[test]
    fn test_model_activation_failure_display() {
        let error = LiverecError::ModelActivationFailure {
            model: "large-v3".to_string(),
            message: "model not downloaded".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Cannot activate model 'large-v3': model not downloaded"
        );
    }

    #[test]
    fn test_streaming_write_failure_display() {
        let error = LiverecError::StreamingWriteFailure {
            message: "disk full".to_string(),
        };
        assert_eq!(error.to_string(), "Streaming write failed: disk full");
    }

    #[test]
    fn test_invalid_sample_rate_display() {
        let error = LiverecError::InvalidSampleRate { rate: 0 };
        assert_eq!(error.to_string(), "Invalid sample rate: 0");
    }

    #[test]
    fn test_transcription_display() {
        let error = LiverecError::Transcription {
            message: "inference failed".to_string(),
        };
        assert_eq!(error.to_string(), "Transcription failed: inference failed");
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: LiverecError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: LiverecError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<LiverecError>();
        assert_sync::<LiverecError>();
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }
}
