//! Voice Activity Detection (VAD).
//!
//! Classifies sub-ranges of an audio buffer as speech or non-speech using
//! RMS-based thresholding over fixed analysis windows.

use std::sync::Arc;

/// A detected speech range, in seconds from the start of the analyzed buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechSegment {
    pub start: f32,
    pub end: f32,
}

/// Trait for voice activity detection.
///
/// This trait allows swapping implementations (energy-based vs model-based).
pub trait VoiceActivityDetector: Send + Sync {
    /// Returns the speech-bearing ranges of `audio`, in seconds.
    fn detect_speech(&self, audio: &[f32], sample_rate: u32) -> Vec<SpeechSegment>;

    /// Concatenates the samples covered by `segments`.
    fn extract_speech(
        &self,
        audio: &[f32],
        segments: &[SpeechSegment],
        sample_rate: u32,
    ) -> Vec<f32> {
        let mut out = Vec::new();
        for segment in segments {
            let start = ((segment.start * sample_rate as f32) as usize).min(audio.len());
            let end = ((segment.end * sample_rate as f32) as usize).min(audio.len());
            out.extend_from_slice(&audio[start..end]);
        }
        out
    }
}

impl<T: VoiceActivityDetector + ?Sized> VoiceActivityDetector for Arc<T> {
    fn detect_speech(&self, audio: &[f32], sample_rate: u32) -> Vec<SpeechSegment> {
        (**self).detect_speech(audio, sample_rate)
    }

    fn extract_speech(
        &self,
        audio: &[f32],
        segments: &[SpeechSegment],
        sample_rate: u32,
    ) -> Vec<f32> {
        (**self).extract_speech(audio, segments, sample_rate)
    }
}

/// Configuration for the energy-based detector.
#[derive(Debug, Clone, Copy)]
pub struct EnergyVadConfig {
    /// RMS threshold for a window to count as speech (0.0 to 1.0).
    pub speech_threshold: f32,
    /// Analysis window length in seconds.
    pub window_secs: f32,
    /// Buffers whose overall RMS is below this are rejected without analysis.
    pub min_energy: f32,
}

impl Default for EnergyVadConfig {
    fn default() -> Self {
        Self {
            speech_threshold: crate::defaults::VAD_THRESHOLD,
            window_secs: crate::defaults::VAD_WINDOW_SECS,
            min_energy: crate::defaults::MIN_SEGMENT_ENERGY,
        }
    }
}

/// RMS-windowed voice activity detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyVad {
    config: EnergyVadConfig,
}

impl EnergyVad {
    pub fn new() -> Self {
        Self::with_config(EnergyVadConfig::default())
    }

    pub fn with_config(config: EnergyVadConfig) -> Self {
        Self { config }
    }
}

impl VoiceActivityDetector for EnergyVad {
    fn detect_speech(&self, audio: &[f32], sample_rate: u32) -> Vec<SpeechSegment> {
        if audio.is_empty() || sample_rate == 0 {
            return Vec::new();
        }
        // Whole-buffer energy gate: skip analysis of truly silent audio.
        if rms(audio) < self.config.min_energy {
            return Vec::new();
        }

        let window_len = ((self.config.window_secs * sample_rate as f32) as usize).max(1);
        let mut segments: Vec<SpeechSegment> = Vec::new();

        for (i, window) in audio.chunks(window_len).enumerate() {
            if rms(window) <= self.config.speech_threshold {
                continue;
            }
            let start = (i * window_len) as f32 / sample_rate as f32;
            let end = (i * window_len + window.len()) as f32 / sample_rate as f32;

            // Merge windows that butt up against the previous segment.
            match segments.last_mut() {
                Some(last) if (last.end - start).abs() < f32::EPSILON => last.end = end,
                _ => segments.push(SpeechSegment { start, end }),
            }
        }
        segments
    }
}

/// Root-mean-square level of a sample slice (0.0 to 1.0 for normalized audio).
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|&s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
