//! Render error types.

use std::path::PathBuf;

use rankreel_media::MediaError;
use rankreel_models::ProjectError;
use thiserror::Error;

use crate::stage::RenderStage;

pub type RenderResult<T> = Result<T, RenderError>;

/// Coarse classification surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad project or source files; fix the input and retry.
    Input,
    /// The media engine failed, crashed or timed out.
    EngineInvocation,
    /// Configuration, filesystem or programming errors.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::EngineInvocation => "engine",
            Self::Internal => "internal",
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Project has no clips")]
    EmptyProject,

    #[error("Invalid project: {0}")]
    InvalidProject(#[from] ProjectError),

    #[error("Source for rank {rank} not found: {}", path.display())]
    SourceMissing { rank: u32, path: PathBuf },

    #[error("Source for rank {rank} is unreadable ({}): {source}", path.display())]
    SourceUnreadable {
        rank: u32,
        path: PathBuf,
        #[source]
        source: MediaError,
    },

    #[error(
        "Source for rank {rank} is {duration_secs:.2}s, shorter than the {required_secs:.2}s clip length: {}",
        path.display()
    )]
    ClipTooShort {
        rank: u32,
        path: PathBuf,
        duration_secs: f64,
        required_secs: f64,
    },

    #[error("Engine failed during {stage}: {source}")]
    Engine {
        stage: RenderStage,
        #[source]
        source: MediaError,
    },

    #[error("Failed to prepare scratch workspace: {0}")]
    Workspace(#[source] MediaError),

    #[error("Failed to place output at {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: MediaError,
    },

    #[error("Invalid stage transition {from} -> {to}")]
    InvalidTransition { from: RenderStage, to: RenderStage },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn engine(stage: RenderStage, source: MediaError) -> Self {
        Self::Engine { stage, source }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyProject
            | Self::InvalidProject(_)
            | Self::SourceMissing { .. }
            | Self::SourceUnreadable { .. }
            | Self::ClipTooShort { .. } => ErrorKind::Input,
            Self::Engine { .. } => ErrorKind::EngineInvocation,
            Self::Workspace(_)
            | Self::Output { .. }
            | Self::InvalidTransition { .. }
            | Self::Config(_)
            | Self::Io(_) => ErrorKind::Internal,
        }
    }

    /// Stage the error was raised in, when it came from the engine.
    pub fn stage(&self) -> Option<RenderStage> {
        match self {
            Self::Engine { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Engine stderr tail, when available.
    pub fn engine_stderr(&self) -> Option<&str> {
        match self {
            Self::Engine { source, .. } | Self::SourceUnreadable { source, .. } => source.stderr(),
            _ => None,
        }
    }
}
