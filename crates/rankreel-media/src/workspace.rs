//! Per-render scratch directory.
//!
//! Every render owns one `render-<uuid>` directory under the scratch root.
//! Intermediate files are registered before the engine is asked to write
//! them, so a failure at any point still knows what to delete.

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::MediaResult;
use crate::fs_utils::remove_if_exists;

/// A temporary artifact that could not be deleted. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupWarning {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to remove {}: {}", self.path.display(), self.message)
    }
}

/// Scratch area exclusively owned by one render call.
#[derive(Debug)]
pub struct ScratchWorkspace {
    dir: PathBuf,
    artifacts: Vec<PathBuf>,
    released: bool,
}

impl ScratchWorkspace {
    /// Create a fresh, uniquely named directory under `scratch_root`.
    pub async fn create(scratch_root: impl AsRef<Path>) -> MediaResult<Self> {
        let root = scratch_root.as_ref();
        fs::create_dir_all(root).await?;
        // Absolute, so concat manifests never resolve paths against their
        // own directory. Resolved before the render directory exists so a
        // failure here leaves nothing behind.
        let root = fs::canonicalize(root).await?;
        let dir = root.join(format!("render-{}", Uuid::new_v4()));
        fs::create_dir(&dir).await?;
        debug!(dir = %dir.display(), "Created scratch workspace");

        Ok(Self {
            dir,
            artifacts: Vec::new(),
            released: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Register an artifact named `file_name` and return its path.
    pub fn track(&mut self, file_name: impl AsRef<Path>) -> PathBuf {
        let path = self.dir.join(file_name);
        if !self.artifacts.contains(&path) {
            self.artifacts.push(path.clone());
        }
        path
    }

    /// Path of the normalized segment at playback `index`, registered.
    pub fn segment_path(&mut self, index: usize) -> PathBuf {
        self.track(format!("segment_{:03}.mp4", index))
    }

    /// Registered artifacts in creation order.
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    /// Delete every registered artifact, then the directory itself.
    ///
    /// Each deletion is attempted independently; failures come back as
    /// warnings instead of errors. An artifact that could not be removed is
    /// left in place, together with the directory holding it, so every
    /// returned warning names a path that still exists.
    pub async fn cleanup(mut self) -> Vec<CleanupWarning> {
        self.released = true;
        let mut warnings = Vec::new();
        let mut kept = Vec::new();

        for path in std::mem::take(&mut self.artifacts) {
            if let Err(e) = remove_if_exists(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to remove temporary artifact");
                warnings.push(CleanupWarning {
                    path: path.clone(),
                    message: e.to_string(),
                });
                kept.push(path);
            }
        }

        // Catches anything the engine left behind that was never registered.
        if let Err(e) = sweep(&self.dir, &kept).await {
            warn!(dir = %self.dir.display(), error = %e, "Failed to remove scratch workspace");
            warnings.push(CleanupWarning {
                path: self.dir.clone(),
                message: e.to_string(),
            });
        }

        let mut remaining = Vec::with_capacity(warnings.len());
        for warning in warnings {
            if fs::try_exists(&warning.path).await.unwrap_or(true) {
                remaining.push(warning);
            }
        }

        debug!(dir = %self.dir.display(), warnings = remaining.len(), "Scratch workspace released");
        remaining
    }
}

/// Remove everything under `dir` except `keep`, then `dir` itself.
async fn sweep(dir: &Path, keep: &[PathBuf]) -> std::io::Result<()> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if keep.contains(&path) {
            continue;
        }
        if entry.file_type().await?.is_dir() {
            fs::remove_dir_all(&path).await?;
        } else {
            remove_if_exists(&path).await?;
        }
    }

    fs::remove_dir(dir).await
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        // The render future was dropped before it could clean up.
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(dir = %self.dir.display(), error = %e, "Failed to remove abandoned scratch workspace");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_unique_directories() {
        let root = TempDir::new().unwrap();
        let a = ScratchWorkspace::create(root.path()).await.unwrap();
        let b = ScratchWorkspace::create(root.path()).await.unwrap();

        assert_ne!(a.dir(), b.dir());
        assert!(a.dir().is_dir());
        assert!(a.dir().file_name().unwrap().to_string_lossy().starts_with("render-"));
    }

    #[tokio::test]
    async fn test_segment_paths_are_registered() {
        let root = TempDir::new().unwrap();
        let mut ws = ScratchWorkspace::create(root.path()).await.unwrap();

        let first = ws.segment_path(0);
        let again = ws.segment_path(0);
        let manifest = ws.track("concat.txt");

        assert_eq!(first, again);
        assert!(first.ends_with("segment_000.mp4"));
        assert_eq!(ws.artifacts(), &[first, manifest]);
    }

    #[tokio::test]
    async fn test_cleanup_removes_everything() {
        let root = TempDir::new().unwrap();
        let mut ws = ScratchWorkspace::create(root.path()).await.unwrap();
        let dir = ws.dir().to_path_buf();

        let written = ws.segment_path(0);
        let _never_written = ws.segment_path(1);
        fs::write(&written, b"x").await.unwrap();
        fs::write(dir.join("stray.log"), b"x").await.unwrap();

        let warnings = ws.cleanup().await;

        assert!(warnings.is_empty());
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_drop_without_cleanup_removes_directory() {
        let root = TempDir::new().unwrap();
        let mut ws = ScratchWorkspace::create(root.path()).await.unwrap();
        let dir = ws.dir().to_path_buf();
        fs::write(ws.segment_path(0), b"x").await.unwrap();

        drop(ws);

        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_undeletable_artifact_is_reported_and_kept() {
        let root = TempDir::new().unwrap();
        let mut ws = ScratchWorkspace::create(root.path()).await.unwrap();
        let dir = ws.dir().to_path_buf();

        let ok = ws.segment_path(0);
        let blocked = ws.segment_path(1);
        fs::write(&ok, b"x").await.unwrap();
        fs::create_dir_all(blocked.join("nested")).await.unwrap();
        fs::create_dir_all(dir.join("stray")).await.unwrap();
        fs::write(dir.join("stray.log"), b"x").await.unwrap();

        let warnings = ws.cleanup().await;

        let paths: Vec<&Path> = warnings.iter().map(|w| w.path.as_path()).collect();
        assert_eq!(paths, vec![blocked.as_path(), dir.as_path()]);
        assert!(warnings.iter().all(|w| w.path.exists()));
        assert!(blocked.is_dir());
        assert!(!ok.exists());
        assert!(!dir.join("stray").exists());
        assert!(!dir.join("stray.log").exists());
    }

    #[tokio::test]
    async fn test_create_makes_missing_root() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("var").join("scratch");

        let ws = ScratchWorkspace::create(&nested).await.unwrap();

        let expected = fs::canonicalize(&nested).await.unwrap();
        assert!(ws.dir().is_absolute());
        assert_eq!(ws.dir().parent(), Some(expected.as_path()));
    }

    #[tokio::test]
    async fn test_create_failure_leaves_nothing_behind() {
        let root = TempDir::new().unwrap();
        let not_a_dir = root.path().join("scratch");
        fs::write(&not_a_dir, b"file").await.unwrap();

        assert!(ScratchWorkspace::create(&not_a_dir).await.is_err());

        let entries: Vec<_> = std::fs::read_dir(root.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert!(not_a_dir.is_file());
    }
}
