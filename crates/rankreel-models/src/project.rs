//! Ranked reel project models.
//!
//! A [`Project`] is what the editing layer hands to the renderer: the title
//! spec plus the clips in original rank order (`videos[0]` is rank 1).

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::RgbColor;

/// Errors raised while loading or validating a project.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project has no videos")]
    Empty,

    #[error("rank {0} appears more than once")]
    DuplicateRank(u32),

    #[error("video at position {index} has rank {found}, expected {expected}")]
    RankOutOfOrder { index: usize, expected: u32, found: u32 },

    #[error("video with rank {rank} has an empty file path")]
    EmptyFilePath { rank: u32 },

    #[error("title has {0} highlights, at most one is supported")]
    TooManyHighlights(usize),

    #[error("invalid project JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Unique identifier for a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Highlighted run of the title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Highlight {
    /// Literal substring of the title text
    pub text: String,

    /// Color used when the highlight matches (`#RRGGBB`)
    #[schemars(with = "String")]
    pub color: RgbColor,
}

/// Title shown in the band at the top of the reel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TitleSpec {
    pub text: String,

    /// At most one highlight is honored
    #[serde(default)]
    pub highlights: Vec<Highlight>,
}

impl TitleSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlights: Vec::new(),
        }
    }

    pub fn with_highlight(mut self, text: impl Into<String>, color: RgbColor) -> Self {
        self.highlights.push(Highlight {
            text: text.into(),
            color,
        });
        self
    }

    /// The first highlight, if its text occurs literally in the title.
    ///
    /// An empty highlight text never matches.
    pub fn active_highlight(&self) -> Option<&Highlight> {
        self.highlights
            .first()
            .filter(|h| !h.text.is_empty() && self.text.contains(h.text.as_str()))
    }

    /// Color for the whole title: the highlight color on a match, else `default`.
    pub fn title_color(&self, default: RgbColor) -> RgbColor {
        self.active_highlight().map(|h| h.color).unwrap_or(default)
    }
}

/// One ranked clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClipEntry {
    pub id: String,

    /// Location of the source video as recorded by the upload layer
    pub file_path: PathBuf,

    /// Original upload filename (display only)
    #[serde(default)]
    pub filename: String,

    /// 1-based rank, 1 is the top entry
    pub rank: u32,

    #[serde(default)]
    pub label: String,

    /// Source duration reported at upload time (informational only)
    #[serde(default, alias = "duration")]
    pub duration_hint: f64,

    /// Thumbnail URL from the upload layer, not used for rendering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl ClipEntry {
    pub fn new(id: impl Into<String>, file_path: impl Into<PathBuf>, rank: u32, label: impl Into<String>) -> Self {
        let file_path = file_path.into();
        let filename = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            id: id.into(),
            file_path,
            filename,
            rank,
            label: label.into(),
            duration_hint: 0.0,
            thumbnail: None,
        }
    }

    /// Resolve the on-disk source path.
    ///
    /// With a media root the leading `/` of upload-style paths
    /// (`/uploads/x.mp4`) is stripped and the remainder joined onto the root.
    /// Without one the path is used as recorded.
    pub fn resolve_source(&self, media_root: Option<&Path>) -> PathBuf {
        match media_root {
            Some(root) => {
                let relative = self
                    .file_path
                    .strip_prefix("/")
                    .unwrap_or(self.file_path.as_path());
                root.join(relative)
            }
            None => self.file_path.clone(),
        }
    }
}

/// A ranked reel project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Project {
    pub id: ProjectId,

    pub title: TitleSpec,

    /// Clips in original rank order
    #[serde(default)]
    pub videos: Vec<ClipEntry>,
}

impl Project {
    pub fn new(id: impl Into<String>, title: TitleSpec, videos: Vec<ClipEntry>) -> Self {
        Self {
            id: ProjectId::from_string(id),
            title,
            videos,
        }
    }

    /// Parse a project from JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ProjectError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Check the invariants the editing layer is expected to maintain.
    pub fn validate(&self) -> Result<(), ProjectError> {
        if self.videos.is_empty() {
            return Err(ProjectError::Empty);
        }

        if self.title.highlights.len() > 1 {
            return Err(ProjectError::TooManyHighlights(self.title.highlights.len()));
        }

        let mut seen = HashSet::with_capacity(self.videos.len());
        for (index, video) in self.videos.iter().enumerate() {
            if !seen.insert(video.rank) {
                return Err(ProjectError::DuplicateRank(video.rank));
            }

            let expected = index as u32 + 1;
            if video.rank != expected {
                return Err(ProjectError::RankOutOfOrder {
                    index,
                    expected,
                    found: video.rank,
                });
            }

            if video.file_path.as_os_str().is_empty() {
                return Err(ProjectError::EmptyFilePath { rank: video.rank });
            }
        }

        Ok(())
    }

    /// JSON Schema describing the project document.
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Project)
    }
}
