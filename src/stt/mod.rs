//! Speech-to-text engine interface.

pub mod engine;

pub use engine::{ModelSelectable, SpeechEngine, Transcription};
