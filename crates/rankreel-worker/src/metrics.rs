//! Render metrics.
//!
//! Recorded through the `metrics` facade; installing a recorder is up to
//! the embedding application.

use metrics::{counter, histogram};

use crate::error::ErrorKind;
use crate::stage::RenderStage;

/// Metric names as constants for consistency.
pub mod names {
    pub const RENDERS_TOTAL: &str = "rankreel_renders_total";
    pub const RENDER_DURATION_SECONDS: &str = "rankreel_render_duration_seconds";
    pub const STAGE_DURATION_SECONDS: &str = "rankreel_stage_duration_seconds";
    pub const CLIPS_RENDERED_TOTAL: &str = "rankreel_clips_rendered_total";
    pub const CLEANUP_WARNINGS_TOTAL: &str = "rankreel_cleanup_warnings_total";
}

/// Record a successful render.
pub fn record_render_succeeded(clip_count: usize, duration_secs: f64) {
    let labels = [("status", "success".to_string())];
    counter!(names::RENDERS_TOTAL, &labels).increment(1);
    histogram!(names::RENDER_DURATION_SECONDS, &labels).record(duration_secs);
    counter!(names::CLIPS_RENDERED_TOTAL).increment(clip_count as u64);
}

/// Record a failed render.
pub fn record_render_failed(kind: ErrorKind, stage: RenderStage, duration_secs: f64) {
    let labels = [
        ("status", "failure".to_string()),
        ("kind", kind.as_str().to_string()),
        ("stage", stage.as_str().to_string()),
    ];
    counter!(names::RENDERS_TOTAL, &labels).increment(1);
    let status = [("status", "failure".to_string())];
    histogram!(names::RENDER_DURATION_SECONDS, &status).record(duration_secs);
}

/// Record time spent in a stage.
pub fn record_stage_duration(stage: RenderStage, duration_secs: f64) {
    let labels = [("stage", stage.as_str().to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record temporary artifacts that could not be removed.
pub fn record_cleanup_warnings(count: usize) {
    if count > 0 {
        counter!(names::CLEANUP_WARNINGS_TOTAL).increment(count as u64);
    }
}
