//! Machine translation engine interface.

use crate::error::{LiverecError, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Trait for text translation engines.
///
/// This trait allows swapping implementations (real model vs mock).
#[async_trait]
pub trait TranslationEngine: Send + Sync {
    /// Translate `text` from `source_lang` to `target_lang`.
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String>;
}

/// Mock translation engine for testing.
pub struct MockTranslationEngine {
    prefix: String,
    should_fail: bool,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl MockTranslationEngine {
    pub fn new() -> Self {
        Self {
            prefix: "übersetzt".to_string(),
            should_fail: false,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Prefix prepended to the input text in responses.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Fail every translation call.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Sleep before answering, to exercise shutdown deadlines.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// The `(text, source, target)` triples seen so far.
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockTranslationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranslationEngine for MockTranslationEngine {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        self.calls.lock().unwrap().push((
            text.to_string(),
            source_lang.to_string(),
            target_lang.to_string(),
        ));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(LiverecError::Translation {
                message: "mock translation failure".to_string(),
            });
        }
        Ok(format!("{}: {}", self.prefix, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_translates_with_prefix() {
        let engine = MockTranslationEngine::new().with_prefix("de");
        let out = engine.translate("hello", "en", "de").await.unwrap();
        assert_eq!(out, "de: hello");
    }

    #[tokio::test]
    async fn test_mock_records_language_pair() {
        let engine = MockTranslationEngine::new();
        engine.translate("hi", "en", "fr").await.unwrap();

        let calls = engine.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], ("hi".to_string(), "en".to_string(), "fr".to_string()));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let engine = MockTranslationEngine::new().with_failure();
        let result = engine.translate("hi", "en", "de").await;
        assert!(matches!(result, Err(LiverecError::Translation { .. })));
    }
}
