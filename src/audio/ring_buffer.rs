//! Fixed-capacity ring buffer for audio samples with windowed reads.
//!
//! Holds the most recent `max_duration_secs` of mono f32 audio. Appends evict
//! the oldest samples first; reads hand out copies of time windows counted
//! back from the newest sample. A single mutex guards all access, so every
//! appended sample is observable by the next read unless capacity evicted it.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Circular sample store shared between a producer and the segmentation loop.
pub struct RingAudioBuffer {
    sample_rate: u32,
    max_samples: usize,
    inner: Mutex<Inner>,
}

struct Inner {
    samples: VecDeque<f32>,
    /// Monotonic count of samples ever appended. Never decreases; eviction
    /// and `clear` do not touch it.
    total_samples_added: u64,
}

impl RingAudioBuffer {
    /// Creates a buffer holding at most `max_duration_secs` of audio.
    pub fn new(max_duration_secs: f32, sample_rate: u32) -> Self {
        let max_samples = (max_duration_secs.max(0.0) * sample_rate as f32) as usize;
        Self {
            sample_rate,
            max_samples,
            inner: Mutex::new(Inner {
                samples: VecDeque::with_capacity(max_samples.min(1 << 20)),
                total_samples_added: 0,
            }),
        }
    }

    /// Appends a chunk, evicting the oldest samples on overflow.
    pub fn append(&self, chunk: &[f32]) {
        let mut inner = self.lock();
        inner.total_samples_added += chunk.len() as u64;

        // A chunk larger than capacity keeps only its tail.
        let take = chunk.len().min(self.max_samples);
        let skip = chunk.len() - take;

        let overflow = (inner.samples.len() + take).saturating_sub(self.max_samples);
        inner.samples.drain(..overflow);
        inner.samples.extend(&chunk[skip..]);
    }

    /// Returns up to `duration` seconds of samples ending `offset` seconds
    /// before the newest sample.
    ///
    /// Empty result when the buffer is empty or the offset places the window
    /// entirely outside the available data. A request larger than what is
    /// stored clamps to the available samples.
    pub fn window(&self, duration: f32, offset: f32) -> Vec<f32> {
        if duration <= 0.0 {
            return Vec::new();
        }
        let inner = self.lock();
        let len = inner.samples.len();
        let offset_samples = (offset.max(0.0) * self.sample_rate as f32) as usize;
        if len == 0 || offset_samples >= len {
            return Vec::new();
        }

        let end = len - offset_samples;
        let want = (duration * self.sample_rate as f32) as usize;
        let start = end.saturating_sub(want);
        inner.samples.iter().skip(start).take(end - start).copied().collect()
    }

    /// Returns the most recent `duration` seconds of audio.
    pub fn latest(&self, duration: f32) -> Vec<f32> {
        self.window(duration, 0.0)
    }

    /// Splits the buffered audio into windows of `window_duration` seconds
    /// whose starts step by `window_duration - overlap`.
    ///
    /// Empty when `window_duration <= 0` or `overlap >= window_duration`.
    pub fn sliding_windows(&self, window_duration: f32, overlap: f32) -> Vec<Vec<f32>> {
        if window_duration <= 0.0 || overlap >= window_duration {
            return Vec::new();
        }

        let inner = self.lock();
        let window_len = (window_duration * self.sample_rate as f32) as usize;
        let step = ((window_duration - overlap) * self.sample_rate as f32) as usize;
        if window_len == 0 || step == 0 {
            return Vec::new();
        }

        let samples: Vec<f32> = inner.samples.iter().copied().collect();
        let mut windows = Vec::new();
        let mut start = 0;
        while start + window_len <= samples.len() {
            windows.push(samples[start..start + window_len].to_vec());
            start += step;
        }
        windows
    }

    /// Number of samples currently stored.
    pub fn len(&self) -> usize {
        self.lock().samples.len()
    }

    /// True when no samples are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seconds of audio currently stored.
    pub fn duration_secs(&self) -> f32 {
        self.len() as f32 / self.sample_rate as f32
    }

    /// Monotonic count of samples ever appended.
    pub fn total_samples_added(&self) -> u64 {
        self.lock().total_samples_added
    }

    /// Drops all stored samples. Does not reset `total_samples_added`.
    pub fn clear(&self) {
        self.lock().samples.clear();
    }

    /// Sample rate this buffer was sized for.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Capacity in samples.
    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a panic mid-append; the sample store is still
        // structurally valid, so keep serving it.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
