//! Recording sessions: state, options, loops and the orchestrator.
//!
//! ```text
//! capture thread ──▶ raw queue ──▶ SegmentationLoop ──▶ transcript queue
//!                                        │                     │
//!                                        ▼                     ▼
//!                                  accumulated           TranslationLoop
//!                                  transcript                  │
//!                                                              ▼
//!                                                        accumulated
//!                                                        translation
//! ```
//!
//! `RecordingSession` sequences startup, shutdown and rollback around the
//! two loops.

pub mod observer;
pub mod options;
pub mod result;
pub mod segmentation;
#[allow(clippy::module_inception)]
pub mod session;
pub mod state;
pub mod translation;

pub use observer::{SessionEvent, SessionObserver};
pub use options::{OutputFormat, SessionOptions, SessionTimeouts};
pub use result::{AudioDiagnostics, CalendarOutcome, SessionResult};
pub use segmentation::TranscriptItem;
pub use session::RecordingSession;
pub use state::{AudioStats, Marker, SessionState};
