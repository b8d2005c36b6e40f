//! Segmentation loop: raw audio queue → VAD → transcription.
//!
//! A cooperative task that drains the raw-audio queue into a local ring
//! buffer, waits for the minimum segment duration, extracts speech-bearing
//! ranges and hands them to the speech engine. Runs strictly sequentially:
//! one segment at a time, in capture order, no overlapping transcription.

use crate::audio::ring_buffer::RingAudioBuffer;
use crate::audio::vad::VoiceActivityDetector;
use crate::defaults;
use crate::session::observer::{self, SessionEvent, SessionObserver};
use crate::session::state::SessionState;
use crate::stt::engine::SpeechEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

/// One accepted transcript, queued for the translation loop.
///
/// `None` on the transcript queue is the shutdown sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptItem {
    pub text: String,
    pub detected_language: Option<String>,
}

/// Tunables for the segmentation loop.
#[derive(Debug, Clone)]
pub struct SegmentationConfig {
    /// Minimum buffered audio before a transcription attempt (skipped on the
    /// forced flush at shutdown).
    pub min_segment_secs: f32,
    /// Language hint for the engine; "auto" requests detection.
    pub language: String,
    /// Length-ratio threshold for the near-duplicate heuristic. Tunable;
    /// behavioral compatibility, not a correctness invariant.
    pub duplicate_ratio: f32,
    /// Bounded wait for one queue receive.
    pub queue_recv_wait: Duration,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            min_segment_secs: defaults::MIN_SEGMENT_SECS,
            language: defaults::AUTO_LANGUAGE.to_string(),
            duplicate_ratio: defaults::DUPLICATE_RATIO,
            queue_recv_wait: Duration::from_millis(defaults::QUEUE_RECV_WAIT_MS),
        }
    }
}

pub struct SegmentationLoop {
    buffer: RingAudioBuffer,
    engine: Arc<dyn SpeechEngine>,
    vad: Arc<dyn VoiceActivityDetector>,
    state: Arc<SessionState>,
    observer: Option<Arc<dyn SessionObserver>>,
    event_tx: Option<crossbeam_channel::Sender<SessionEvent>>,
    /// Present when translation is enabled downstream.
    transcript_tx: Option<mpsc::Sender<Option<TranscriptItem>>>,
    config: SegmentationConfig,
    sample_rate: u32,
    last_accepted: Option<String>,
}

impl SegmentationLoop {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: Arc<dyn SpeechEngine>,
        vad: Arc<dyn VoiceActivityDetector>,
        state: Arc<SessionState>,
        observer: Option<Arc<dyn SessionObserver>>,
        event_tx: Option<crossbeam_channel::Sender<SessionEvent>>,
        transcript_tx: Option<mpsc::Sender<Option<TranscriptItem>>>,
        config: SegmentationConfig,
        sample_rate: u32,
    ) -> Self {
        Self {
            buffer: RingAudioBuffer::new(defaults::RING_BUFFER_SECS, sample_rate),
            engine,
            vad,
            state,
            observer,
            event_tx,
            transcript_tx,
            config,
            sample_rate,
            last_accepted: None,
        }
    }

    /// Drain the raw-audio queue until the session stops and the queue is
    /// empty, then perform one forced flush and send the shutdown sentinel
    /// downstream.
    pub async fn run(mut self, mut raw_rx: mpsc::Receiver<Vec<f32>>) {
        loop {
            match timeout(self.config.queue_recv_wait, raw_rx.recv()).await {
                Ok(Some(chunk)) => {
                    self.buffer.append(&chunk);
                    self.attempt_transcription(false).await;
                }
                // Channel closed: producer released, nothing more will come.
                Ok(None) => break,
                Err(_) => {
                    if !self.state.is_recording() && raw_rx.is_empty() {
                        break;
                    }
                }
            }
        }

        // Forced flush: whatever is buffered goes out, below the minimum
        // duration or not.
        self.attempt_transcription(true).await;

        if let Some(tx) = &self.transcript_tx {
            let _ = tx.send(None).await;
        }
    }

    /// One transcription attempt over the full buffered window.
    ///
    /// The buffer is cleared after every attempt, success or failure, so
    /// memory stays bounded and no audio is reprocessed.
    async fn attempt_transcription(&mut self, forced: bool) {
        let buffered_secs = self.buffer.duration_secs();
        if self.buffer.is_empty() {
            return;
        }
        if !forced && buffered_secs < self.config.min_segment_secs {
            return;
        }

        let audio = self.buffer.latest(buffered_secs);
        self.buffer.clear();

        let segments = self.vad.detect_speech(&audio, self.sample_rate);
        if segments.is_empty() {
            return;
        }
        let speech = self.vad.extract_speech(&audio, &segments, self.sample_rate);
        if speech.is_empty() {
            return;
        }

        let hint = match self.config.language.as_str() {
            lang if lang == defaults::AUTO_LANGUAGE => None,
            lang => Some(lang),
        };

        match self
            .engine
            .transcribe_stream(&speech, hint, self.sample_rate)
            .await
        {
            Ok(transcription) => {
                let text = transcription.text.trim().to_string();
                if text.is_empty() {
                    return;
                }
                if self.is_duplicate(&text) {
                    eprintln!("liverec: dropping near-duplicate transcript");
                    return;
                }
                self.accept(text, transcription.language).await;
            }
            Err(e) => {
                // Per-chunk failure: surfaced, never fatal to the session.
                eprintln!("liverec: transcription failed: {}", e);
                observer::notify(&self.observer, |o| o.on_error(&e.to_string()));
            }
        }
    }

    async fn accept(&mut self, text: String, detected_language: Option<String>) {
        self.last_accepted = Some(text.clone());
        self.state.append_transcript_line(text.clone());
        observer::emit(&self.event_tx, SessionEvent::Transcript(text.clone()));
        observer::notify(&self.observer, |o| o.on_transcript(&text));

        if let Some(tx) = &self.transcript_tx {
            let item = TranscriptItem {
                text,
                detected_language,
            };
            let _ = tx.send(Some(item)).await;
        }
    }

    fn is_duplicate(&self, text: &str) -> bool {
        match &self.last_accepted {
            Some(previous) => is_near_duplicate(previous, text, self.config.duplicate_ratio),
            None => false,
        }
    }
}

/// Near-duplicate heuristic: exact match, or one text contains the other and
/// their lengths agree within `ratio`.
fn is_near_duplicate(previous: &str, current: &str, ratio: f32) -> bool {
    if previous == current {
        return true;
    }
    let (shorter, longer) = if previous.len() <= current.len() {
        (previous, current)
    } else {
        (current, previous)
    };
    if longer.is_empty() || !longer.contains(shorter) {
        return false;
    }
    shorter.len() as f32 / longer.len() as f32 >= ratio
}
