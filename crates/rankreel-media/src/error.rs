//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Segment {index} failed: {source}")]
    SegmentFailed {
        index: usize,
        #[source]
        source: Box<MediaError>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Attach the playback index of the clip that failed.
    pub fn in_segment(self, index: usize) -> Self {
        Self::SegmentFailed {
            index,
            source: Box::new(self),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Captured engine stderr, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::FfmpegFailed { stderr, .. } | Self::FfprobeFailed { stderr, .. } => stderr.as_deref(),
            Self::SegmentFailed { source, .. } => source.stderr(),
            _ => None,
        }
    }

    /// Whether the failure came from the input file rather than the engine.
    pub fn is_input_problem(&self) -> bool {
        match self {
            Self::FileNotFound(_) | Self::InvalidVideo(_) => true,
            Self::SegmentFailed { source, .. } => source.is_input_problem(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_error_keeps_stderr() {
        let err = MediaError::ffmpeg_failed("boom", Some("Invalid data found".into()), Some(1)).in_segment(2);
        assert_eq!(err.stderr(), Some("Invalid data found"));
        assert!(err.to_string().contains("Segment 2"));
        assert!(!err.is_input_problem());
    }

    #[test]
    fn test_input_problem_classification() {
        assert!(MediaError::FileNotFound(PathBuf::from("a.mp4")).is_input_problem());
        assert!(MediaError::InvalidVideo("no stream".into()).in_segment(0).is_input_problem());
        assert!(!MediaError::Timeout(5).is_input_problem());
    }
}
