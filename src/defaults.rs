//! Default configuration constants for liverec.
//!
//! Shared across configuration types to keep the session, the loops and the
//! archiver in agreement about timing and audio format.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and keeps segment buffers
/// small while preserving the band that matters for voice.
pub const SAMPLE_RATE: u32 = 16_000;

/// Default capacity of the segmentation ring buffer, in seconds.
///
/// Bounds the audio a session will hold in memory between transcription
/// attempts; older samples are evicted first.
pub const RING_BUFFER_SECS: f32 = 30.0;

/// Minimum buffered audio before a segmentation attempt, in seconds.
///
/// Below this the loop keeps accumulating (unless it is the forced flush at
/// shutdown). 3 seconds gives the speech engine enough context to be useful.
pub const MIN_SEGMENT_SECS: f32 = 3.0;

/// RMS threshold for classifying a VAD window as speech (0.0 to 1.0).
pub const VAD_THRESHOLD: f32 = 0.02;

/// VAD analysis window length in seconds.
pub const VAD_WINDOW_SECS: f32 = 0.25;

/// Minimum RMS energy for a buffered segment to be worth analyzing at all.
///
/// Set well below the speech threshold so only truly silent audio is
/// rejected outright.
pub const MIN_SEGMENT_ENERGY: f32 = 0.001;

/// Length-ratio threshold for the duplicate-transcript heuristic.
///
/// A new transcript is dropped when it equals the previous one, or when one
/// contains the other and their lengths agree within this ratio. Tunable;
/// behavioral compatibility, not a correctness invariant.
pub const DUPLICATE_RATIO: f32 = 0.7;

/// Language value that requests automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Bounded wait for a queue receive inside the consumer loops, in milliseconds.
///
/// On timeout the loop re-checks its running condition, which is how stop
/// requests propagate without a dedicated wakeup.
pub const QUEUE_RECV_WAIT_MS: u64 = 500;

/// Startup validation window, in milliseconds.
///
/// How long `start` waits for the first audio chunk before concluding the
/// device is not delivering data.
pub const STARTUP_VALIDATION_MS: u64 = 1_500;

/// Shutdown deadline for the segmentation loop, in seconds.
pub const PROCESSING_TIMEOUT_SECS: u64 = 10;

/// Shutdown deadline for the translation loop, in seconds.
///
/// Longer than the processing deadline: translation models can have a
/// cold-start cost that an ordinary drain window would not tolerate.
pub const TRANSLATION_TIMEOUT_SECS: u64 = 30;

/// Grace period after sending the translation shutdown sentinel, in seconds.
pub const TRANSLATION_GRACE_SECS: u64 = 5;

/// Raw-audio queue depth (chunks) between the capture thread and the
/// segmentation loop.
pub const RAW_QUEUE_DEPTH: usize = 1_024;

/// Transcript queue depth between the segmentation and translation loops.
pub const TRANSCRIPT_QUEUE_DEPTH: usize = 64;

/// Character budget for the text previews in a session result.
pub const PREVIEW_CHARS: usize = 200;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rate_is_speech_standard() {
        assert_eq!(SAMPLE_RATE, 16_000);
    }

    #[test]
    fn test_segment_energy_below_speech_threshold() {
        assert!(MIN_SEGMENT_ENERGY < VAD_THRESHOLD);
    }

    #[test]
    fn test_translation_deadline_exceeds_processing() {
        assert!(TRANSLATION_TIMEOUT_SECS > PROCESSING_TIMEOUT_SECS);
        assert!(TRANSLATION_GRACE_SECS < TRANSLATION_TIMEOUT_SECS);
    }
}
