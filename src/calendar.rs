//! Calendar event hand-off.
//!
//! The session can link a finished recording to an external calendar. The
//! sink is a collaborator; event storage and sync live outside this crate.
//! Failures are recorded in the session result, never raised from `stop`.

use crate::error::{LiverecError, Result};
use crate::session::result::SessionResult;
use async_trait::async_trait;
use std::sync::Mutex;

/// Trait for calendar event creation.
#[async_trait]
pub trait CalendarEventSink: Send + Sync {
    /// Create an event for the finished session. Returns the created event
    /// id, or an empty string when nothing was created.
    async fn create_event(&self, result: &SessionResult) -> Result<String>;
}

/// Mock calendar sink for testing.
pub struct MockCalendarSink {
    event_id: String,
    should_fail: bool,
    calls: Mutex<Vec<f64>>,
}

impl MockCalendarSink {
    pub fn new() -> Self {
        Self {
            event_id: "event-1".to_string(),
            should_fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_event_id(mut self, event_id: &str) -> Self {
        self.event_id = event_id.to_string();
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Durations of the sessions passed in so far.
    pub fn calls(&self) -> Vec<f64> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockCalendarSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CalendarEventSink for MockCalendarSink {
    async fn create_event(&self, result: &SessionResult) -> Result<String> {
        self.calls.lock().unwrap().push(result.duration_secs);

        if self.should_fail {
            return Err(LiverecError::Other(
                "mock calendar failure".to_string(),
            ));
        }
        Ok(self.event_id.clone())
    }
}
