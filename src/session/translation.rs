//! Translation loop: transcript queue → translation engine.

use crate::defaults;
use crate::session::observer::{self, SessionEvent, SessionObserver};
use crate::session::segmentation::TranscriptItem;
use crate::session::state::SessionState;
use crate::translate::TranslationEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

pub struct TranslationLoop {
    engine: Option<Arc<dyn TranslationEngine>>,
    state: Arc<SessionState>,
    observer: Option<Arc<dyn SessionObserver>>,
    event_tx: Option<crossbeam_channel::Sender<SessionEvent>>,
    /// Configured source; "auto" defers to the detected language per item.
    source_language: String,
    target_language: String,
    queue_recv_wait: Duration,
}

impl TranslationLoop {
    pub fn new(
        engine: Option<Arc<dyn TranslationEngine>>,
        state: Arc<SessionState>,
        observer: Option<Arc<dyn SessionObserver>>,
        event_tx: Option<crossbeam_channel::Sender<SessionEvent>>,
        source_language: String,
        target_language: String,
        queue_recv_wait: Duration,
    ) -> Self {
        Self {
            engine,
            state,
            observer,
            event_tx,
            source_language,
            target_language,
            queue_recv_wait,
        }
    }

    /// Consume transcript items until the sentinel arrives or the session
    /// stops with an empty queue.
    pub async fn run(self, mut transcript_rx: mpsc::Receiver<Option<TranscriptItem>>) {
        let Some(engine) = self.engine.clone() else {
            eprintln!("liverec: translation unavailable, loop not running");
            return;
        };

        loop {
            match timeout(self.queue_recv_wait, transcript_rx.recv()).await {
                Ok(Some(Some(item))) => self.translate_item(&engine, item).await,
                // Sentinel: shut down now.
                Ok(Some(None)) => break,
                // Channel closed.
                Ok(None) => break,
                Err(_) => {
                    if !self.state.is_recording() && transcript_rx.is_empty() {
                        break;
                    }
                }
            }
        }
    }

    async fn translate_item(&self, engine: &Arc<dyn TranslationEngine>, item: TranscriptItem) {
        let source = self.effective_source(&item);

        match engine
            .translate(&item.text, &source, &self.target_language)
            .await
        {
            Ok(translated) if !translated.trim().is_empty() => {
                let translated = translated.trim().to_string();
                self.state.append_translation_line(translated.clone());
                observer::emit(&self.event_tx, SessionEvent::Translation(translated.clone()));
                observer::notify(&self.observer, |o| o.on_translation(&translated));
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("liverec: translation failed: {}", e);
                observer::notify(&self.observer, |o| o.on_error(&e.to_string()));
            }
        }
    }

    /// Prefer the detected language when the configured source is "auto".
    fn effective_source(&self, item: &TranscriptItem) -> String {
        if self.source_language == defaults::AUTO_LANGUAGE {
            if let Some(detected) = &item.detected_language {
                return detected.clone();
            }
        }
        self.source_language.clone()
    }
}
