use crate::defaults;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub stt: SttConfig,
    pub translation: TranslationConfig,
    pub storage: StorageConfig,
    pub timeouts: TimeoutConfig,
}

/// Audio capture and segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Input device index; None means the system default.
    pub device_index: Option<usize>,
    /// Explicit sample rate; None defers to the device.
    pub sample_rate: Option<u32>,
    pub ring_buffer_secs: f32,
    pub min_segment_secs: f32,
    pub vad_threshold: f32,
    pub vad_window_secs: f32,
}

/// Speech-to-text configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SttConfig {
    pub model: String,
    pub language: String,
}

/// Translation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslationConfig {
    pub enabled: bool,
    pub target_language: String,
}

/// Artifact storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for recordings, transcripts, translations and markers.
    /// None means the platform audio directory.
    pub output_dir: Option<PathBuf>,
}

/// Shutdown and startup deadline configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    pub startup_validation_ms: u64,
    pub processing_timeout_secs: u64,
    pub translation_timeout_secs: u64,
    pub translation_grace_secs: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device_index: None,
            sample_rate: None,
            ring_buffer_secs: defaults::RING_BUFFER_SECS,
            min_segment_secs: defaults::MIN_SEGMENT_SECS,
            vad_threshold: defaults::VAD_THRESHOLD,
            vad_window_secs: defaults::VAD_WINDOW_SECS,
        }
    }
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: "base".to_string(),
            language: defaults::AUTO_LANGUAGE.to_string(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            target_language: "en".to_string(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            startup_validation_ms: defaults::STARTUP_VALIDATION_MS,
            processing_timeout_secs: defaults::PROCESSING_TIMEOUT_SECS,
            translation_timeout_secs: defaults::TRANSLATION_TIMEOUT_SECS,
            translation_grace_secs: defaults::TRANSLATION_GRACE_SECS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file, or return defaults if the file does
    /// not exist
    ///
    /// Invalid TOML is still an error; only a missing file falls back to
    /// defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config: Config = toml::from_str(&contents)?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - LIVEREC_MODEL → stt.model
    /// - LIVEREC_LANGUAGE → stt.language
    /// - LIVEREC_OUTPUT_DIR → storage.output_dir
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("LIVEREC_MODEL") {
            if !model.is_empty() {
                self.stt.model = model;
            }
        }

        if let Ok(language) = std::env::var("LIVEREC_LANGUAGE") {
            if !language.is_empty() {
                self.stt.language = language;
            }
        }

        if let Ok(dir) = std::env::var("LIVEREC_OUTPUT_DIR") {
            if !dir.is_empty() {
                self.storage.output_dir = Some(PathBuf::from(dir));
            }
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/liverec/config.toml on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("liverec").join("config.toml"))
    }

    /// Root directory where session artifacts are written.
    ///
    /// Falls back to the platform audio directory, then to the current
    /// directory.
    pub fn output_root(&self) -> PathBuf {
        if let Some(dir) = &self.storage.output_dir {
            return dir.clone();
        }
        dirs::audio_dir()
            .map(|dir| dir.join("liverec"))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
