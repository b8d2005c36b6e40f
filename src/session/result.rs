//! The record assembled when a session stops.

use crate::audio::device::InputDeviceInfo;
use crate::defaults;
use crate::session::state::AudioStats;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Peak amplitudes at or below this are treated as silence.
const SILENCE_PEAK: f32 = 1e-6;

/// Audio-level diagnostics for a finished session.
#[derive(Debug, Clone, Serialize)]
pub struct AudioDiagnostics {
    pub chunk_count: u64,
    pub peak_amplitude: f32,
    pub last_rms: f32,
    /// Chunks arrived but the peak amplitude was effectively zero; usually a
    /// muted or misrouted input.
    pub near_silent: bool,
}

impl AudioDiagnostics {
    pub fn from_stats(stats: &AudioStats) -> Self {
        Self {
            chunk_count: stats.chunk_count,
            peak_amplitude: stats.peak_amplitude,
            last_rms: stats.last_rms,
            near_silent: stats.chunk_count > 0 && stats.peak_amplitude <= SILENCE_PEAK,
        }
    }
}

/// Outcome of the optional calendar-event hand-off.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CalendarOutcome {
    NotRequested,
    Created { event_id: String },
    Failed { message: String },
}

/// Everything a caller learns from `stop`.
///
/// Paths are empty strings when the corresponding artifact was not saved.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResult {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub device: Option<InputDeviceInfo>,
    pub diagnostics: AudioDiagnostics,
    pub recording_path: String,
    pub transcript_path: String,
    pub translation_path: String,
    pub markers_path: String,
    pub marker_count: usize,
    pub transcript_preview: String,
    pub translation_preview: String,
    pub calendar: CalendarOutcome,
}

/// Join lines and truncate to the preview character budget, appending an
/// ellipsis when anything was cut.
pub fn preview(lines: &[String]) -> String {
    let joined = lines.join("\n");
    if joined.chars().count() <= defaults::PREVIEW_CHARS {
        return joined;
    }
    let truncated: String = joined.chars().take(defaults::PREVIEW_CHARS).collect();
    format!("{}…", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text_untouched() {
        let lines = vec!["one".to_string(), "two".to_string()];
        assert_eq!(preview(&lines), "one\ntwo");
    }

    #[test]
    fn test_preview_empty_lines() {
        assert_eq!(preview(&[]), "");
    }

    #[test]
    fn test_preview_truncates_with_ellipsis() {
        let lines = vec!["x".repeat(500)];
        let result = preview(&lines);

        assert_eq!(result.chars().count(), defaults::PREVIEW_CHARS + 1);
        assert!(result.ends_with('…'));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        // Multi-byte characters must not be split.
        let lines = vec!["ß".repeat(300)];
        let result = preview(&lines);
        assert!(result.ends_with('…'));
        assert_eq!(result.chars().count(), defaults::PREVIEW_CHARS + 1);
    }

    #[test]
    fn test_near_silent_requires_chunks() {
        let silent = AudioDiagnostics::from_stats(&AudioStats {
            chunk_count: 10,
            peak_amplitude: 0.0,
            last_rms: 0.0,
        });
        assert!(silent.near_silent);

        let no_audio = AudioDiagnostics::from_stats(&AudioStats::default());
        assert!(!no_audio.near_silent);

        let healthy = AudioDiagnostics::from_stats(&AudioStats {
            chunk_count: 10,
            peak_amplitude: 0.6,
            last_rms: 0.2,
        });
        assert!(!healthy.near_silent);
    }
}
