//! Recording session orchestrator.
//!
//! Owns the session lifecycle: option resolution, model hot-swap, sample
//! rate selection, archiver and device startup, startup validation, loop
//! supervision, ordered shutdown with drain deadlines, artifact persistence
//! and result assembly. One session at a time.

use crate::audio::bridge::CaptureBridge;
use crate::audio::device::{AudioCaptureDevice, CaptureErrorCallback, InputDeviceInfo};
use crate::audio::vad::{EnergyVad, VoiceActivityDetector};
use crate::calendar::CalendarEventSink;
use crate::defaults;
use crate::error::{LiverecError, Result};
use crate::session::observer::{self, SessionEvent, SessionObserver};
use crate::session::options::{SessionOptions, SessionTimeouts};
use crate::session::result::{preview, AudioDiagnostics, CalendarOutcome, SessionResult};
use crate::session::segmentation::{SegmentationConfig, SegmentationLoop, TranscriptItem};
use crate::session::state::{Marker, SessionState};
use crate::session::translation::TranslationLoop;
use crate::storage::archiver::StreamingArchiver;
use crate::storage::{TRANSCRIPTS_DIR, TRANSLATIONS_DIR};
use crate::stt::engine::SpeechEngine;
use crate::translate::TranslationEngine;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Per-session resources, alive between `start` and `stop`.
struct ActiveSession {
    options: SessionOptions,
    sample_rate: u32,
    device_info: Option<InputDeviceInfo>,
    bridge: Arc<CaptureBridge>,
    seg_handle: Option<JoinHandle<()>>,
    trans_handle: Option<JoinHandle<()>>,
    transcript_tx: Option<mpsc::Sender<Option<TranscriptItem>>>,
}

/// Orchestrates capture, segmentation, translation and archiving for one
/// recording session at a time.
pub struct RecordingSession {
    device: Option<Arc<dyn AudioCaptureDevice>>,
    speech: Option<Arc<dyn SpeechEngine>>,
    translator: Option<Arc<dyn TranslationEngine>>,
    vad: Arc<dyn VoiceActivityDetector>,
    archiver: Arc<StreamingArchiver>,
    calendar: Option<Arc<dyn CalendarEventSink>>,
    observer: Option<Arc<dyn SessionObserver>>,
    event_tx: Option<crossbeam_channel::Sender<SessionEvent>>,
    timeouts: SessionTimeouts,
    state: Arc<SessionState>,
    active: tokio::sync::Mutex<Option<ActiveSession>>,
}

impl RecordingSession {
    pub fn new(archiver: Arc<StreamingArchiver>) -> Self {
        Self {
            device: None,
            speech: None,
            translator: None,
            vad: Arc::new(EnergyVad::new()),
            archiver,
            calendar: None,
            observer: None,
            event_tx: None,
            timeouts: SessionTimeouts::default(),
            state: Arc::new(SessionState::new()),
            active: tokio::sync::Mutex::new(None),
        }
    }

    pub fn with_device(mut self, device: Arc<dyn AudioCaptureDevice>) -> Self {
        self.device = Some(device);
        self
    }

    pub fn with_speech_engine(mut self, engine: Arc<dyn SpeechEngine>) -> Self {
        self.speech = Some(engine);
        self
    }

    pub fn with_translation_engine(mut self, engine: Arc<dyn TranslationEngine>) -> Self {
        self.translator = Some(engine);
        self
    }

    pub fn with_vad(mut self, vad: Arc<dyn VoiceActivityDetector>) -> Self {
        self.vad = vad;
        self
    }

    pub fn with_calendar_sink(mut self, sink: Arc<dyn CalendarEventSink>) -> Self {
        self.calendar = Some(sink);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Attach a live event stream. Emission is non-blocking; a slow consumer
    /// loses events rather than stalling the pipeline.
    pub fn with_event_sender(mut self, sender: crossbeam_channel::Sender<SessionEvent>) -> Self {
        self.event_tx = Some(sender);
        self
    }

    pub fn with_timeouts(mut self, timeouts: SessionTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn is_recording(&self) -> bool {
        self.state.is_recording()
    }

    /// Start a session with the given options.
    ///
    /// # Errors
    /// `SessionAlreadyActive` when a session is running, `CaptureUnavailable`
    /// when no device is configured, `ModelActivationFailure` when a
    /// requested model cannot be activated, `CaptureStartupFailure` when the
    /// device errors or delivers no audio within the validation window. Any
    /// failure rolls the session back fully before returning.
    pub async fn start(&self, options: SessionOptions) -> Result<()> {
        let mut active = self.active.lock().await;
        if active.is_some() || self.state.is_recording() {
            return Err(LiverecError::SessionAlreadyActive);
        }
        let device = self.device.clone().ok_or(LiverecError::CaptureUnavailable)?;

        match self.start_inner(&device, options).await {
            Ok(session) => {
                *active = Some(session);
                Ok(())
            }
            Err(e) => {
                self.rollback(&device);
                Err(e)
            }
        }
    }

    async fn start_inner(
        &self,
        device: &Arc<dyn AudioCaptureDevice>,
        options: SessionOptions,
    ) -> Result<ActiveSession> {
        let (mut options, warnings) = options.resolve();
        for warning in warnings {
            eprintln!("liverec: {}", warning);
        }
        if options.transcription_enabled && self.speech.is_none() {
            options.transcription_enabled = false;
            options.translation_enabled = false;
            eprintln!("liverec: no speech engine configured, transcription disabled");
        }

        // Model hot-swap is validated before any device I/O; a failure here
        // leaves the previously active model in effect.
        if options.transcription_enabled {
            if let Some(engine) = &self.speech {
                self.apply_model_selection(engine, &options)?;
            }
        }

        // Sample rate precedence: explicit option, then the device default,
        // refined last by the chosen input's native rate.
        let devices = device.list_input_devices().unwrap_or_default();
        let device_info = match options.device_index {
            Some(index) => devices.into_iter().find(|d| d.index == index),
            None => devices.into_iter().next(),
        };
        let sample_rate = match options.sample_rate {
            Some(rate) => rate,
            None => {
                let native = device_info
                    .as_ref()
                    .map(|d| d.default_sample_rate)
                    .filter(|&r| r > 0);
                native.unwrap_or_else(|| device.sample_rate())
            }
        };
        if sample_rate == 0 {
            return Err(LiverecError::InvalidSampleRate { rate: sample_rate });
        }
        device.set_sample_rate(sample_rate);

        let start_time = Utc::now();
        self.state.begin(start_time);

        // Fresh queues for this session.
        let (raw_tx, raw_rx) = if options.transcription_enabled {
            let (tx, rx) = mpsc::channel(defaults::RAW_QUEUE_DEPTH);
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };
        let (transcript_tx, transcript_rx) = if options.translation_enabled {
            let (tx, rx) = mpsc::channel(defaults::TRANSCRIPT_QUEUE_DEPTH);
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        // The archiver opens before the device starts, so no chunk can race
        // ahead of it.
        if options.save_recording {
            self.archiver
                .start_recording_capture(start_time, sample_rate)?;
        }

        let bridge = Arc::new(CaptureBridge::new(
            self.state.clone(),
            options.save_recording.then(|| self.archiver.clone()),
            raw_tx,
            self.observer.clone(),
        ));

        let capture_error: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let error_slot = capture_error.clone();
        let error_observer = self.observer.clone();
        let on_error: CaptureErrorCallback = Arc::new(move |message: String| {
            eprintln!("liverec: capture error: {}", message);
            if let Ok(mut slot) = error_slot.lock() {
                slot.get_or_insert(message.clone());
            }
            observer::notify(&error_observer, |o| o.on_error(&message));
        });

        device.start_capture(options.device_index, bridge.callback(), on_error)?;

        // Startup validation: the device must actually deliver audio before
        // the loops are scheduled.
        let received = bridge
            .first_audio()
            .wait(self.timeouts.startup_validation)
            .await;
        let reported_error = capture_error.lock().ok().and_then(|slot| slot.clone());
        if let Some(message) = reported_error {
            return Err(LiverecError::CaptureStartupFailure { message });
        }
        if !received {
            if device.reports_activity() {
                return Err(LiverecError::CaptureStartupFailure {
                    message: "no audio received within the validation window".to_string(),
                });
            }
            eprintln!("liverec: backend cannot confirm audio flow, proceeding optimistically");
        }

        let mut seg_handle = None;
        if let (Some(engine), Some(rx)) = (&self.speech, raw_rx) {
            if options.transcription_enabled {
                let seg = SegmentationLoop::new(
                    engine.clone(),
                    self.vad.clone(),
                    self.state.clone(),
                    self.observer.clone(),
                    self.event_tx.clone(),
                    transcript_tx.clone(),
                    SegmentationConfig {
                        language: options.language.clone(),
                        queue_recv_wait: self.timeouts.queue_recv_wait,
                        ..Default::default()
                    },
                    sample_rate,
                );
                seg_handle = Some(tokio::spawn(seg.run(rx)));
            }
        }

        let mut trans_handle = None;
        if let Some(rx) = transcript_rx {
            let trans = TranslationLoop::new(
                self.translator.clone(),
                self.state.clone(),
                self.observer.clone(),
                self.event_tx.clone(),
                options.language.clone(),
                options.target_language.clone(),
                self.timeouts.queue_recv_wait,
            );
            trans_handle = Some(tokio::spawn(trans.run(rx)));
        }

        Ok(ActiveSession {
            options,
            sample_rate,
            device_info,
            bridge,
            seg_handle,
            trans_handle,
            transcript_tx,
        })
    }

    fn apply_model_selection(
        &self,
        engine: &Arc<dyn SpeechEngine>,
        options: &SessionOptions,
    ) -> Result<()> {
        if let Some(model) = &options.model {
            match engine.as_model_selectable() {
                Some(selectable) => {
                    if !selectable.is_model_downloaded(model) {
                        return Err(LiverecError::ModelActivationFailure {
                            model: model.clone(),
                            message: "model is not downloaded".to_string(),
                        });
                    }
                    selectable
                        .apply_runtime_model_selection(model, options.model_path.as_deref())?;
                }
                None => {
                    eprintln!(
                        "liverec: engine does not support model selection, ignoring '{}'",
                        model
                    );
                }
            }
        }

        if !engine.is_model_available() {
            return Err(LiverecError::ModelActivationFailure {
                model: options.model.clone().unwrap_or_else(|| "default".to_string()),
                message: "no usable model is loaded".to_string(),
            });
        }
        Ok(())
    }

    /// Undo a partially completed `start`.
    fn rollback(&self, device: &Arc<dyn AudioCaptureDevice>) {
        let _ = device.stop_capture();
        self.state.end();
        self.archiver.abort_recording_capture();
    }

    /// Stop the session and assemble its result.
    ///
    /// Returns `Ok(None)` when no session is active. Shutdown is cooperative
    /// first: loops get their drain deadlines before being aborted, and the
    /// result is assembled from whatever had accumulated by then.
    pub async fn stop(&self) -> Result<Option<SessionResult>> {
        let mut guard = self.active.lock().await;
        let Some(mut active) = guard.take() else {
            return Ok(None);
        };

        // Flipping the flag is the drain signal; stopping the device ends
        // chunk production immediately.
        self.state.end();
        if let Some(device) = &self.device {
            if let Err(e) = device.stop_capture() {
                eprintln!("liverec: failed to stop capture device: {}", e);
            }
        }

        if let Some(mut handle) = active.seg_handle.take() {
            if timeout(self.timeouts.processing_drain, &mut handle)
                .await
                .is_err()
            {
                eprintln!("liverec: segmentation loop missed its drain deadline, aborting");
                handle.abort();
                let _ = handle.await;
            }
        }

        if let Some(mut handle) = active.trans_handle.take() {
            if timeout(self.timeouts.translation_drain, &mut handle)
                .await
                .is_err()
            {
                // Escalate: sentinel first, a short grace, then abort.
                if let Some(tx) = &active.transcript_tx {
                    let _ = tx.try_send(None);
                }
                if timeout(self.timeouts.translation_grace, &mut handle)
                    .await
                    .is_err()
                {
                    eprintln!("liverec: translation loop missed its grace period, aborting");
                    handle.abort();
                    let _ = handle.await;
                }
            }
        }
        drop(active.transcript_tx.take());

        observer::emit(&self.event_tx, SessionEvent::TranscriptClosed);
        observer::emit(&self.event_tx, SessionEvent::TranslationClosed);

        let started_at = self.state.start_time().unwrap_or_else(Utc::now);
        let ended_at = Utc::now();
        let duration_secs = self.state.elapsed_secs();
        let diagnostics = AudioDiagnostics::from_stats(&self.state.audio_stats());
        if diagnostics.near_silent {
            eprintln!("liverec: audio arrived but was near-silent; check the input routing");
        }

        let options = active.options.clone();
        let recording_path = if options.save_recording {
            self.persist_recording(&active, started_at)
        } else {
            String::new()
        };

        let transcript_lines = self.state.transcript_lines();
        let transcript_path = if options.save_transcript {
            self.persist_text(&transcript_lines, started_at, "transcript", TRANSCRIPTS_DIR)
        } else {
            String::new()
        };

        let translation_lines = self.state.translation_lines();
        let translation_path = if options.save_translation {
            let prefix = format!("translation_{}", options.target_language);
            self.persist_text(&translation_lines, started_at, &prefix, TRANSLATIONS_DIR)
        } else {
            String::new()
        };

        let markers = self.state.markers();
        let markers_path = if options.save_markers && !markers.is_empty() {
            match self.archiver.save_markers(&markers, started_at) {
                Ok(path) => path,
                Err(e) => {
                    self.report_persist_error("markers", &e);
                    String::new()
                }
            }
        } else {
            String::new()
        };

        let mut result = SessionResult {
            started_at,
            ended_at,
            duration_secs,
            device: active.device_info.clone(),
            diagnostics,
            recording_path,
            transcript_path,
            translation_path,
            markers_path,
            marker_count: markers.len(),
            transcript_preview: preview(&transcript_lines),
            translation_preview: preview(&translation_lines),
            calendar: CalendarOutcome::NotRequested,
        };

        // Best-effort: a calendar failure is recorded, never raised.
        if options.create_calendar_event {
            if let Some(sink) = &self.calendar {
                result.calendar = match sink.create_event(&result).await {
                    Ok(event_id) => CalendarOutcome::Created { event_id },
                    Err(e) => CalendarOutcome::Failed {
                        message: e.to_string(),
                    },
                };
            }
        }

        // Final safety net for any lingering temp state.
        self.archiver.abort_recording_capture();

        Ok(Some(result))
    }

    fn persist_recording(&self, active: &ActiveSession, started_at: chrono::DateTime<Utc>) -> String {
        let fallback = active.bridge.take_fallback_chunks();
        let outcome = if self.archiver.is_streaming() {
            self.archiver
                .finish_recording_capture(active.options.output_format)
                .map(Some)
        } else if self.archiver.has_failed_prefix() || !fallback.is_empty() {
            self.archiver.save_recording(
                &fallback,
                started_at,
                active.sample_rate,
                active.options.output_format,
            )
        } else {
            Ok(None)
        };

        match outcome {
            Ok(Some(path)) => path.display().to_string(),
            Ok(None) => String::new(),
            Err(e) => {
                self.report_persist_error("recording", &e);
                String::new()
            }
        }
    }

    fn persist_text(
        &self,
        lines: &[String],
        started_at: chrono::DateTime<Utc>,
        prefix: &str,
        subdirectory: &str,
    ) -> String {
        if lines.is_empty() {
            return String::new();
        }
        match self.archiver.save_text(lines, started_at, prefix, subdirectory) {
            Ok(path) => path,
            Err(e) => {
                self.report_persist_error(prefix, &e);
                String::new()
            }
        }
    }

    fn report_persist_error(&self, artifact: &str, error: &LiverecError) {
        eprintln!("liverec: failed to save {}: {}", artifact, error);
        observer::notify(&self.observer, |o| {
            o.on_error(&format!("failed to save {}: {}", artifact, error))
        });
    }

    /// Place a marker at the current offset. Returns `None` when no session
    /// is recording.
    pub fn add_marker(&self, label: &str) -> Option<Marker> {
        let marker = self.state.append_marker(label)?;
        observer::emit(&self.event_tx, SessionEvent::Marker(marker.clone()));
        observer::notify(&self.observer, |o| o.on_marker(&marker));
        Some(marker)
    }
}
