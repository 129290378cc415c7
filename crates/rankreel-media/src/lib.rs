//! FFmpeg CLI wrapper and render stages for ranked reels.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with timeouts and kill-on-drop
//! - Progress parsing from `-progress pipe:2`
//! - Two-level filtergraph escaping and typed drawbox/drawtext filters
//! - The normalize, concat and overlay stages
//! - A per-render scratch workspace with best-effort cleanup
//! - The [`MediaEngine`] trait the stages run against

pub mod command;
pub mod concat;
pub mod engine;
pub mod error;
pub mod escape;
pub mod filters;
pub mod fs_utils;
pub mod layout;
pub mod normalize;
pub mod overlay;
pub mod probe;
pub mod progress;
pub mod workspace;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::ConcatJob;
pub use engine::{DeadlineEngine, FfmpegEngine, MediaEngine, DEFAULT_ENGINE_TIMEOUT_SECS};
pub use error::{MediaError, MediaResult};
pub use filters::{DrawBox, DrawText, FontSpec, TimeGate};
pub use fs_utils::move_file;
pub use layout::{OverlayLayout, ReelFormat};
pub use normalize::{ClipNormalizer, NormalizeJob};
pub use overlay::{OverlayDirective, OverlayJob, OverlayPlan, OverlayScheduler};
pub use probe::{probe_video, VideoInfo};
pub use progress::FfmpegProgress;
pub use workspace::{CleanupWarning, ScratchWorkspace};
