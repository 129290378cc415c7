//! The media engine seam.
//!
//! Pipeline stages build typed [`FfmpegCommand`]s and hand them to a
//! [`MediaEngine`]. Production uses [`FfmpegEngine`]; tests plug in an
//! in-process engine that writes placeholder files.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::{probe_video, VideoInfo};
use crate::progress::quarter_logger;

/// Default per-invocation timeout.
pub const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 600;

/// Operations the render pipeline needs from a media engine.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Read duration, geometry and audio presence of a source.
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo>;

    /// Execute one command. On success the command's output file exists
    /// and is complete; on failure no usable output is promised.
    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()>;
}

/// Engine backed by the `ffmpeg`/`ffprobe` executables.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    timeout_secs: u64,
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new(DEFAULT_ENGINE_TIMEOUT_SECS)
    }
}

impl FfmpegEngine {
    /// Create an engine that kills any invocation running longer than
    /// `timeout_secs`.
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
        match tokio::time::timeout(Duration::from_secs(self.timeout_secs), probe_video(path)).await {
            Ok(result) => result,
            Err(_) => Err(MediaError::Timeout(self.timeout_secs)),
        }
    }

    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let label = cmd
            .output_path()
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        debug!(output = %label, timeout_secs = self.timeout_secs, "Invoking FFmpeg");

        FfmpegRunner::new()
            .with_timeout(self.timeout_secs)
            .run_with_progress(cmd, quarter_logger(label, cmd.expected_duration_ms()))
            .await
    }
}

/// Wraps another engine and bounds every invocation by `timeout`.
///
/// Expiry drops the inner future; engines that spawn processes with
/// `kill_on_drop` therefore stop the process as well.
pub struct DeadlineEngine<'a, E: MediaEngine + ?Sized> {
    inner: &'a E,
    timeout: Duration,
}

impl<'a, E: MediaEngine + ?Sized> DeadlineEngine<'a, E> {
    pub fn new(inner: &'a E, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    fn expired(&self) -> MediaError {
        MediaError::Timeout(self.timeout.as_secs())
    }
}

#[async_trait]
impl<'a, E: MediaEngine + ?Sized> MediaEngine for DeadlineEngine<'a, E> {
    async fn probe(&self, path: &Path) -> MediaResult<VideoInfo> {
        tokio::time::timeout(self.timeout, self.inner.probe(path))
            .await
            .map_err(|_| self.expired())?
    }

    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        tokio::time::timeout(self.timeout, self.inner.run(cmd))
            .await
            .map_err(|_| self.expired())?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stalled;

    #[async_trait]
    impl MediaEngine for Stalled {
        async fn probe(&self, _path: &Path) -> MediaResult<VideoInfo> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(MediaError::internal("unreachable"))
        }

        async fn run(&self, _cmd: &FfmpegCommand) -> MediaResult<()> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_deadline_engine_times_out() {
        let engine = DeadlineEngine::new(&Stalled, Duration::from_millis(20));
        let cmd = FfmpegCommand::new("/in.mp4", "/out.mp4");

        assert!(matches!(engine.run(&cmd).await, Err(MediaError::Timeout(_))));
        assert!(matches!(
            engine.probe(Path::new("/in.mp4")).await,
            Err(MediaError::Timeout(_))
        ));
    }

    #[test]
    fn test_default_timeout() {
        assert_eq!(FfmpegEngine::default().timeout_secs(), DEFAULT_ENGINE_TIMEOUT_SECS);
        assert_eq!(FfmpegEngine::new(30).timeout_secs(), 30);
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let engine = FfmpegEngine::new(5);
        let result = engine.probe(Path::new("/nonexistent/clip.mp4")).await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
