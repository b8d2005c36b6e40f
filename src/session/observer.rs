//! Session observation: callbacks and the live event stream.
//!
//! Observers run on whatever thread produced the event (capture thread for
//! levels, loop tasks for text), so callbacks must be cheap. A panicking
//! observer is isolated and logged; it never takes down the pipeline.

use crate::session::state::Marker;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Callbacks a session host can register. All methods default to no-ops, so
/// implementations override only what they care about.
pub trait SessionObserver: Send + Sync {
    /// A transcript line was accepted.
    fn on_transcript(&self, _text: &str) {}

    /// A translation line was produced.
    fn on_translation(&self, _text: &str) {}

    /// A marker was placed.
    fn on_marker(&self, _marker: &Marker) {}

    /// Per-chunk audio levels, for meters/visualizers.
    fn on_audio_level(&self, _rms: f32, _peak: f32) {}

    /// A non-fatal pipeline error was surfaced.
    fn on_error(&self, _message: &str) {}
}

/// One item on the live session event stream.
///
/// The `*Closed` variants are completion sentinels: `stop` emits them so
/// external consumers know no further items of that kind will arrive.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Transcript(String),
    Translation(String),
    Marker(Marker),
    TranscriptClosed,
    TranslationClosed,
}

/// Invoke an observer callback with panic isolation.
pub(crate) fn notify(observer: &Option<Arc<dyn SessionObserver>>, f: impl FnOnce(&dyn SessionObserver)) {
    if let Some(observer) = observer {
        if catch_unwind(AssertUnwindSafe(|| f(observer.as_ref()))).is_err() {
            eprintln!("liverec: observer callback panicked; continuing");
        }
    }
}

/// Non-blocking emit onto the live event stream. A full or disconnected
/// channel drops the event; the pipeline never waits on a consumer.
pub(crate) fn emit(sender: &Option<crossbeam_channel::Sender<SessionEvent>>, event: SessionEvent) {
    if let Some(sender) = sender {
        let _ = sender.try_send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingObserver {
        transcripts: Mutex<Vec<String>>,
        errors: Mutex<Vec<String>>,
        levels: AtomicUsize,
    }

    impl SessionObserver for RecordingObserver {
        fn on_transcript(&self, text: &str) {
            self.transcripts.lock().unwrap().push(text.to_string());
        }

        fn on_audio_level(&self, _rms: f32, _peak: f32) {
            self.levels.fetch_add(1, Ordering::SeqCst);
        }

        fn on_error(&self, message: &str) {
            self.errors.lock().unwrap().push(message.to_string());
        }
    }

    struct PanickingObserver;

    impl SessionObserver for PanickingObserver {
        fn on_transcript(&self, _text: &str) {
            panic!("observer bug");
        }
    }

    #[test]
    fn test_notify_reaches_observer() {
        let observer = Arc::new(RecordingObserver::default());
        let erased: Option<Arc<dyn SessionObserver>> = Some(observer.clone());

        notify(&erased, |o| o.on_transcript("hello"));
        notify(&erased, |o| o.on_audio_level(0.1, 0.5));

        assert_eq!(observer.transcripts.lock().unwrap().as_slice(), ["hello"]);
        assert_eq!(observer.levels.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_notify_swallows_observer_panic() {
        let erased: Option<Arc<dyn SessionObserver>> = Some(Arc::new(PanickingObserver));
        notify(&erased, |o| o.on_transcript("boom"));
        // Still alive; a second call works the same way.
        notify(&erased, |o| o.on_transcript("boom again"));
    }

    #[test]
    fn test_notify_with_no_observer_is_noop() {
        notify(&None, |o| o.on_error("unseen"));
    }

    #[test]
    fn test_emit_delivers_in_order() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let sender = Some(tx);

        emit(&sender, SessionEvent::Transcript("a".to_string()));
        emit(&sender, SessionEvent::TranscriptClosed);

        assert_eq!(rx.recv().unwrap(), SessionEvent::Transcript("a".to_string()));
        assert_eq!(rx.recv().unwrap(), SessionEvent::TranscriptClosed);
    }

    #[test]
    fn test_emit_drops_when_full() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let sender = Some(tx);

        emit(&sender, SessionEvent::TranscriptClosed);
        emit(&sender, SessionEvent::TranslationClosed); // dropped, channel full

        assert_eq!(rx.recv().unwrap(), SessionEvent::TranscriptClosed);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_emit_ignores_disconnected_receiver() {
        let (tx, rx) = crossbeam_channel::unbounded();
        drop(rx);
        emit(&Some(tx), SessionEvent::TranscriptClosed);
    }
}
