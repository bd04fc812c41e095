//! Health metrics for the decode pipeline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Health metrics for a decode pipeline
///
/// Tracks counters across the submit and completion paths to monitor
/// pipeline health. All fields use atomic operations for thread-safe
/// access; the completion pump and the submitting thread both record here.
pub struct PipelineHealth {
    /// Number of access units accepted into the decoder
    pub frames_submitted: AtomicU64,

    /// Number of accepted access units tagged as keyframes
    pub keyframes_submitted: AtomicU64,

    /// Total compressed bytes accepted
    pub bytes_submitted: AtomicU64,

    /// Number of decoded frames handed to the renderer
    pub frames_presented: AtomicU64,

    /// Number of decoded frames dropped because the renderer refused them
    pub frame_drops: AtomicU64,

    /// Number of asynchronous hardware errors on the control channel
    pub decode_errors: AtomicU64,

    /// Number of submissions answered with a keyframe request
    pub keyframe_requests: AtomicU64,

    /// Number of in-place pipeline rebuilds triggered by format changes
    pub reconfigures: AtomicU64,

    /// Timestamp (as Unix microseconds) of the last accepted access unit
    pub last_frame_time: AtomicU64,
}

fn now_micros() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_micros() as u64
}

impl PipelineHealth {
    /// Create a new health metrics instance
    pub fn new() -> Self {
        Self {
            frames_submitted: AtomicU64::new(0),
            keyframes_submitted: AtomicU64::new(0),
            bytes_submitted: AtomicU64::new(0),
            frames_presented: AtomicU64::new(0),
            frame_drops: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            keyframe_requests: AtomicU64::new(0),
            reconfigures: AtomicU64::new(0),
            last_frame_time: AtomicU64::new(now_micros()),
        }
    }

    /// Record an access unit accepted by the decoder input port
    pub fn record_submit(&self, size: usize, is_keyframe: bool) {
        self.last_frame_time.store(now_micros(), Ordering::Relaxed);
        self.frames_submitted.fetch_add(1, Ordering::Relaxed);
        self.bytes_submitted.fetch_add(size as u64, Ordering::Relaxed);
        if is_keyframe {
            self.keyframes_submitted.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a decoded frame handed to the renderer
    pub fn record_presented(&self) {
        self.frames_presented.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a decoded frame the renderer refused
    pub fn record_frame_drop(&self) {
        self.frame_drops.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an asynchronous hardware error
    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a submission answered with a keyframe request
    pub fn record_keyframe_request(&self) {
        self.keyframe_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a pipeline rebuild at new dimensions
    pub fn record_reconfigure(&self) {
        self.reconfigures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted.load(Ordering::Relaxed)
    }

    pub fn keyframes_submitted(&self) -> u64 {
        self.keyframes_submitted.load(Ordering::Relaxed)
    }

    pub fn bytes_submitted(&self) -> u64 {
        self.bytes_submitted.load(Ordering::Relaxed)
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented.load(Ordering::Relaxed)
    }

    pub fn frame_drops(&self) -> u64 {
        self.frame_drops.load(Ordering::Relaxed)
    }

    pub fn decode_errors(&self) -> u64 {
        self.decode_errors.load(Ordering::Relaxed)
    }

    pub fn keyframe_requests(&self) -> u64 {
        self.keyframe_requests.load(Ordering::Relaxed)
    }

    pub fn reconfigures(&self) -> u64 {
        self.reconfigures.load(Ordering::Relaxed)
    }

    /// Get the timestamp of the last accepted unit (Unix microseconds)
    pub fn last_frame_time(&self) -> u64 {
        self.last_frame_time.load(Ordering::Relaxed)
    }

    /// Calculate the share of decoded frames lost at the renderer, as a percentage
    pub fn frame_drop_rate(&self) -> f64 {
        let drops = self.frame_drops();
        let shown = self.frames_presented();
        if shown + drops == 0 {
            return 0.0;
        }
        (drops as f64 / (shown + drops) as f64) * 100.0
    }

    /// Check if the pipeline has stalled (no accepted units for given duration)
    pub fn is_stalled(&self, threshold: Duration) -> bool {
        let last_frame = self.last_frame_time();
        let elapsed_micros = now_micros().saturating_sub(last_frame);
        elapsed_micros > threshold.as_micros() as u64
    }

    /// Get a summary of health metrics
    pub fn summary(&self) -> HealthSummary {
        HealthSummary {
            frames_submitted: self.frames_submitted(),
            keyframes_submitted: self.keyframes_submitted(),
            bytes_submitted: self.bytes_submitted(),
            frames_presented: self.frames_presented(),
            frame_drops: self.frame_drops(),
            decode_errors: self.decode_errors(),
            keyframe_requests: self.keyframe_requests(),
            reconfigures: self.reconfigures(),
            frame_drop_rate: self.frame_drop_rate(),
        }
    }
}

impl Default for PipelineHealth {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of health metrics
#[derive(Debug, Clone)]
pub struct HealthSummary {
    pub frames_submitted: u64,
    pub keyframes_submitted: u64,
    pub bytes_submitted: u64,
    pub frames_presented: u64,
    pub frame_drops: u64,
    pub decode_errors: u64,
    pub keyframe_requests: u64,
    pub reconfigures: u64,
    pub frame_drop_rate: f64,
}

impl std::fmt::Display for HealthSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Health: {} units in ({} keyframes, {} bytes), {} frames shown ({} drops, {:.2}%), {} decode errors, {} keyframe requests, {} reconfigures",
            self.frames_submitted,
            self.keyframes_submitted,
            self.bytes_submitted,
            self.frames_presented,
            self.frame_drops,
            self.frame_drop_rate,
            self.decode_errors,
            self.keyframe_requests,
            self.reconfigures
        )
    }
}
