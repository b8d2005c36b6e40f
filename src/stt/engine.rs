//! Speech recognition engine interface.
//!
//! The concrete model implementation lives outside this crate; the session
//! only needs stream transcription plus an optional model hot-swap
//! capability.

use crate::error::{LiverecError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Result of one transcription call.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcription {
    pub text: String,
    /// Language the engine detected, if it reports one.
    pub language: Option<String>,
}

/// Trait for speech-to-text engines.
///
/// This trait allows swapping implementations (real model vs mock).
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Transcribe mono f32 audio at the given sample rate.
    ///
    /// # Arguments
    /// * `audio` - Speech-bearing samples, already VAD-filtered
    /// * `language` - Optional language hint ("auto" means detect)
    /// * `sample_rate` - Sample rate of `audio` in Hz
    async fn transcribe_stream(
        &self,
        audio: &[f32],
        language: Option<&str>,
        sample_rate: u32,
    ) -> Result<Transcription>;

    /// Whether the currently active model is loaded and usable.
    fn is_model_available(&self) -> bool;

    /// Optional model hot-swap capability. Engines that support runtime
    /// model selection return themselves here; the orchestrator checks for
    /// the capability explicitly instead of probing.
    fn as_model_selectable(&self) -> Option<&dyn ModelSelectable> {
        None
    }
}

/// Capability interface for engines that can switch models at runtime.
pub trait ModelSelectable: Send + Sync {
    /// Whether `model_name` is downloaded and ready to activate.
    fn is_model_downloaded(&self, model_name: &str) -> bool;

    /// Activate `model_name`. On failure the previously active model stays
    /// in effect.
    fn apply_runtime_model_selection(
        &self,
        model_name: &str,
        model_path: Option<&Path>,
    ) -> Result<()>;
}

/// Mock speech engine for testing.
pub struct MockSpeechEngine {
    responses: Mutex<Vec<Transcription>>,
    fallback: Transcription,
    should_fail: bool,
    delay: Option<Duration>,
    available: bool,
    call_count: AtomicUsize,
    selectable: bool,
    downloaded_models: Vec<String>,
    active_model: Mutex<Option<(String, Option<PathBuf>)>>,
    audio_lengths: Mutex<Vec<usize>>,
}

impl MockSpeechEngine {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            fallback: Transcription {
                text: "mock transcription".to_string(),
                language: Some("en".to_string()),
            },
            should_fail: false,
            delay: None,
            available: true,
            call_count: AtomicUsize::new(0),
            selectable: false,
            downloaded_models: Vec::new(),
            active_model: Mutex::new(None),
            audio_lengths: Mutex::new(Vec::new()),
        }
    }

    /// Fixed response for every call.
    pub fn with_response(mut self, text: &str) -> Self {
        self.fallback.text = text.to_string();
        self
    }

    /// Detected language reported with each response.
    pub fn with_language(mut self, language: &str) -> Self {
        self.fallback.language = Some(language.to_string());
        self
    }

    /// Queue of responses consumed in order; falls back to the fixed
    /// response once exhausted.
    pub fn with_responses(self, texts: &[&str]) -> Self {
        let language = self.fallback.language.clone();
        *self.responses.lock().unwrap() = texts
            .iter()
            .rev() // popped from the back
            .map(|t| Transcription {
                text: t.to_string(),
                language: language.clone(),
            })
            .collect();
        self
    }

    /// Fail every transcription call.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Sleep before answering, to exercise shutdown deadlines.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report the active model as unavailable.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Expose the ModelSelectable capability with this downloaded set.
    pub fn with_selectable_models(mut self, models: &[&str]) -> Self {
        self.selectable = true;
        self.downloaded_models = models.iter().map(|m| m.to_string()).collect();
        self
    }

    /// Number of transcription calls made so far.
    pub fn transcribe_calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Sample counts of the audio passed to each call.
    pub fn audio_lengths(&self) -> Vec<usize> {
        self.audio_lengths.lock().unwrap().clone()
    }

    /// Model activated through the capability interface, if any.
    pub fn active_model(&self) -> Option<String> {
        self.active_model.lock().unwrap().as_ref().map(|(m, _)| m.clone())
    }
}

impl Default for MockSpeechEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechEngine for MockSpeechEngine {
    async fn transcribe_stream(
        &self,
        audio: &[f32],
        _language: Option<&str>,
        _sample_rate: u32,
    ) -> Result<Transcription> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.audio_lengths.lock().unwrap().push(audio.len());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(LiverecError::Transcription {
                message: "mock transcription failure".to_string(),
            });
        }

        let queued = self.responses.lock().unwrap().pop();
        Ok(queued.unwrap_or_else(|| self.fallback.clone()))
    }

    fn is_model_available(&self) -> bool {
        self.available
    }

    fn as_model_selectable(&self) -> Option<&dyn ModelSelectable> {
        if self.selectable {
            Some(self)
        } else {
            None
        }
    }
}

impl ModelSelectable for MockSpeechEngine {
    fn is_model_downloaded(&self, model_name: &str) -> bool {
        self.downloaded_models.iter().any(|m| m == model_name)
    }

    fn apply_runtime_model_selection(
        &self,
        model_name: &str,
        model_path: Option<&Path>,
    ) -> Result<()> {
        if !self.is_model_downloaded(model_name) {
            return Err(LiverecError::ModelActivationFailure {
                model: model_name.to_string(),
                message: "model not downloaded".to_string(),
            });
        }
        *self.active_model.lock().unwrap() =
            Some((model_name.to_string(), model_path.map(Path::to_path_buf)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_returns_fixed_response() {
        let engine = MockSpeechEngine::new().with_response("hello world");
        let result = engine
            .transcribe_stream(&[0.1; 160], Some("en"), 16_000)
            .await
            .unwrap();

        assert_eq!(result.text, "hello world");
        assert_eq!(result.language.as_deref(), Some("en"));
        assert_eq!(engine.transcribe_calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_response_queue_in_order() {
        let engine = MockSpeechEngine::new()
            .with_response("fallback")
            .with_responses(&["first", "second"]);

        let audio = [0.1; 16];
        let a = engine.transcribe_stream(&audio, None, 16_000).await.unwrap();
        let b = engine.transcribe_stream(&audio, None, 16_000).await.unwrap();
        let c = engine.transcribe_stream(&audio, None, 16_000).await.unwrap();

        assert_eq!(a.text, "first");
        assert_eq!(b.text, "second");
        assert_eq!(c.text, "fallback");
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let engine = MockSpeechEngine::new().with_failure();
        let result = engine.transcribe_stream(&[0.1; 16], None, 16_000).await;

        assert!(matches!(
            result,
            Err(LiverecError::Transcription { .. })
        ));
    }

    #[test]
    fn test_capability_hidden_by_default() {
        let engine = MockSpeechEngine::new();
        assert!(engine.as_model_selectable().is_none());
    }

    #[test]
    fn test_model_selection_rejects_missing_model() {
        let engine = MockSpeechEngine::new().with_selectable_models(&["base"]);
        let selectable = engine.as_model_selectable().unwrap();

        assert!(selectable.is_model_downloaded("base"));
        assert!(!selectable.is_model_downloaded("large-v3"));

        let result = selectable.apply_runtime_model_selection("large-v3", None);
        assert!(matches!(
            result,
            Err(LiverecError::ModelActivationFailure { .. })
        ));
        assert_eq!(engine.active_model(), None);
    }

    #[test]
    fn test_model_selection_activates_downloaded_model() {
        let engine = MockSpeechEngine::new().with_selectable_models(&["base", "small"]);
        let selectable = engine.as_model_selectable().unwrap();

        selectable.apply_runtime_model_selection("small", None).unwrap();
        assert_eq!(engine.active_model().as_deref(), Some("small"));
    }

    #[tokio::test]
    async fn test_audio_lengths_recorded() {
        let engine = MockSpeechEngine::new();
        engine.transcribe_stream(&[0.1; 320], None, 16_000).await.unwrap();
        engine.transcribe_stream(&[0.1; 160], None, 16_000).await.unwrap();

        assert_eq!(engine.audio_lengths(), vec![320, 160]);
    }
}
