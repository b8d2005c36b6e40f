//! Audio capture, buffering and voice activity detection.
//!
//! ```text
//! ┌──────────────┐ chunk cb ┌───────────────┐ try_send ┌──────────────────┐
//! │ capture      │─────────▶│ CaptureBridge │─────────▶│ raw audio queue  │
//! │ device thread│          │  (stats, VAD  │          │ (segmentation)   │
//! └──────────────┘          │   levels,     │          └──────────────────┘
//!                           │   archiver)   │
//!                           └───────────────┘
//! ```

pub mod bridge;
#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod device;
pub mod ring_buffer;
pub mod vad;
