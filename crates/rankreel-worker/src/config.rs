//! Render configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rankreel_media::{OverlayLayout, ReelFormat};
use rankreel_models::EncodingConfig;
use tracing::warn;

use crate::error::{RenderError, RenderResult};

/// Font used when `RENDER_FONT_FILE` is unset.
pub const DEFAULT_FONT_FILE: &str = "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf";

/// What to do with a source shorter than the per-clip duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortClipPolicy {
    /// Fail the render before any artifact is created.
    #[default]
    Reject,
    /// Hold the last frame (and pad audio with silence) to full length.
    Freeze,
}

impl FromStr for ShortClipPolicy {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "freeze" => Ok(Self::Freeze),
            other => Err(RenderError::config(format!(
                "unknown short clip policy '{}' (expected reject or freeze)",
                other
            ))),
        }
    }
}

impl fmt::Display for ShortClipPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reject => "reject",
            Self::Freeze => "freeze",
        })
    }
}

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Root under which each render gets its own scratch directory
    pub scratch_dir: PathBuf,
    /// Maximum concurrent FFmpeg processes during normalization
    pub max_ffmpeg_processes: usize,
    /// Timeout for each engine invocation
    pub engine_timeout: Duration,
    /// Preferred font file; fontconfig is used when it is missing
    pub font_file: Option<PathBuf>,
    /// Directory that clip `filePath`s are relative to
    pub media_root: Option<PathBuf>,
    pub short_clip_policy: ShortClipPolicy,
    pub format: ReelFormat,
    pub layout: OverlayLayout,
    pub encoding: EncodingConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join("rankreel"),
            max_ffmpeg_processes: 2,
            engine_timeout: Duration::from_secs(600),
            font_file: Some(PathBuf::from(DEFAULT_FONT_FILE)),
            media_root: None,
            short_clip_policy: ShortClipPolicy::Reject,
            format: ReelFormat::default(),
            layout: OverlayLayout::default(),
            encoding: EncodingConfig::default(),
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable environment value");
            None
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}

impl RenderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            scratch_dir: env_path("RENDER_SCRATCH_DIR").unwrap_or(defaults.scratch_dir),
            max_ffmpeg_processes: env_parse("RENDER_MAX_FFMPEG").unwrap_or(defaults.max_ffmpeg_processes),
            engine_timeout: env_parse("RENDER_ENGINE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.engine_timeout),
            font_file: env_path("RENDER_FONT_FILE").or(defaults.font_file),
            media_root: env_path("RENDER_MEDIA_ROOT"),
            short_clip_policy: env_parse("RENDER_SHORT_CLIP_POLICY").unwrap_or_default(),
            ..defaults
        }
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn with_media_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.media_root = Some(root.into());
        self
    }

    pub fn with_max_ffmpeg_processes(mut self, max: usize) -> Self {
        self.max_ffmpeg_processes = max;
        self
    }

    pub fn with_engine_timeout(mut self, timeout: Duration) -> Self {
        self.engine_timeout = timeout;
        self
    }

    pub fn with_short_clip_policy(mut self, policy: ShortClipPolicy) -> Self {
        self.short_clip_policy = policy;
        self
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> RenderResult<()> {
        if self.max_ffmpeg_processes == 0 {
            return Err(RenderError::config("max_ffmpeg_processes must be at least 1"));
        }
        if self.engine_timeout.is_zero() {
            return Err(RenderError::config("engine timeout must be positive"));
        }
        let clip_secs = self.format.clip_duration_secs;
        if clip_secs.is_nan() || clip_secs <= 0.0 {
            return Err(RenderError::config("clip duration must be positive"));
        }
        if self.format.fps == 0 || self.format.width == 0 || self.format.height == 0 {
            return Err(RenderError::config("output geometry and frame rate must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.max_ffmpeg_processes, 2);
        assert_eq!(config.engine_timeout, Duration::from_secs(600));
        assert_eq!(config.short_clip_policy, ShortClipPolicy::Reject);
        assert!(config.scratch_dir.ends_with("rankreel"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("freeze".parse::<ShortClipPolicy>().unwrap(), ShortClipPolicy::Freeze);
        assert_eq!(" Reject ".parse::<ShortClipPolicy>().unwrap(), ShortClipPolicy::Reject);
        assert!("pad".parse::<ShortClipPolicy>().is_err());
        assert_eq!(ShortClipPolicy::Freeze.to_string(), "freeze");
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = RenderConfig::default().with_max_ffmpeg_processes(0);
        assert!(matches!(config.validate(), Err(RenderError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = RenderConfig::default().with_engine_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
