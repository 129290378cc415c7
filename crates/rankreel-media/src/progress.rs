//! FFmpeg progress parsing and reporting.

use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Progress information from FFmpeg.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Current FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Output time as string (HH:MM:SS.microseconds)
    pub out_time: String,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Calculate progress percentage given total duration in milliseconds.
    pub fn percentage(&self, total_duration_ms: i64) -> f64 {
        if total_duration_ms <= 0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / total_duration_ms as f64) * 100.0).clamp(0.0, 100.0)
    }

    /// Estimate time remaining in seconds.
    pub fn eta_seconds(&self, total_duration_ms: i64) -> Option<f64> {
        if self.speed <= 0.0 || self.out_time_ms <= 0 {
            return None;
        }

        let remaining_ms = total_duration_ms - self.out_time_ms;
        if remaining_ms <= 0 {
            return Some(0.0);
        }

        // Time remaining = remaining duration / speed
        Some((remaining_ms as f64 / 1000.0) / self.speed)
    }
}

/// Callback type for progress updates.
pub type ProgressCallback = Box<dyn Fn(FfmpegProgress) + Send + 'static>;

/// Build a callback that logs each quarter of progress once.
///
/// Without a known total duration only completion is logged.
pub fn quarter_logger(label: impl Into<String>, total_duration_ms: Option<i64>) -> ProgressCallback {
    let label = label.into();
    let last_quarter = AtomicU8::new(0);

    Box::new(move |progress: FfmpegProgress| {
        let quarter = match total_duration_ms {
            Some(total) if !progress.is_complete => (progress.percentage(total) / 25.0).floor() as u8,
            _ if progress.is_complete => 4,
            _ => 0,
        };

        if quarter > last_quarter.load(Ordering::Relaxed) {
            last_quarter.store(quarter, Ordering::Relaxed);
            debug!(
                stage = %label,
                percent = quarter as u32 * 25,
                frame = progress.frame,
                speed = progress.speed,
                eta_secs = ?total_duration_ms.and_then(|t| progress.eta_seconds(t)),
                "FFmpeg progress"
            );
        }
    })
}
