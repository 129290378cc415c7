//! Shared data models for the RankReel renderer.
//!
//! This crate provides Serde-serializable types for:
//! - Projects, ranked clip entries and title specs
//! - Typed RGB colors
//! - Encoding configuration
//! - Playback ordering and overlay windows

pub mod color;
pub mod encoding;
pub mod ordering;
pub mod project;

// Re-export common types
pub use color::{ColorParseError, RgbColor};
pub use encoding::EncodingConfig;
pub use ordering::{OverlayWindow, PlaybackOrder};
pub use project::{ClipEntry, Highlight, Project, ProjectError, ProjectId, TitleSpec};
