//! Filesystem helpers for placing rendered files.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// EXDEV ("Invalid cross-device link") on Linux and macOS.
const EXDEV: i32 = 18;

/// Create the parent directory of `path` if it is missing.
pub async fn ensure_parent_dir(path: &Path) -> MediaResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).await?;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Remove a file, treating "already gone" as success.
///
/// Returns whether a file was actually removed.
pub async fn remove_if_exists(path: &Path) -> std::io::Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Move `src` to `dst`, replacing any existing file at `dst`.
///
/// A plain rename is tried first. When the two paths sit on different
/// filesystems the file is copied to a hidden sibling of `dst` and renamed
/// into place, so `dst` never holds a half-written file.
pub async fn move_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if !src.exists() {
        return Err(MediaError::FileNotFound(src.to_path_buf()));
    }
    ensure_parent_dir(dst).await?;

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == Some(EXDEV) => {
            debug!(
                src = %src.display(),
                dst = %dst.display(),
                "Cross-device move, copying instead"
            );
            copy_into_place(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Hidden sibling used while copying across filesystems.
fn partial_path(dst: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(dst.file_name().unwrap_or_default());
    name.push(".partial");
    dst.with_file_name(name)
}

async fn copy_into_place(src: &Path, dst: &Path) -> MediaResult<()> {
    let staging = partial_path(dst);

    let placed = async {
        fs::copy(src, &staging).await?;
        fs::rename(&staging, dst).await
    }
    .await;

    if let Err(e) = placed {
        let _ = remove_if_exists(&staging).await;
        return Err(MediaError::from(e));
    }

    if let Err(e) = fs::remove_file(src).await {
        warn!(src = %src.display(), error = %e, "Failed to remove source after copy");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_move_into_new_directory() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("composited.mp4");
        let dst = dir.path().join("exports").join("reel.mp4");
        fs::write(&src, b"frames").await.unwrap();

        move_file(&src, &dst).await.unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dst).await.unwrap(), b"frames");
    }

    #[tokio::test]
    async fn test_move_replaces_existing_output() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("new.mp4");
        let dst = dir.path().join("reel.mp4");
        fs::write(&src, b"new").await.unwrap();
        fs::write(&dst, b"old").await.unwrap();

        move_file(&src, &dst).await.unwrap();

        assert_eq!(fs::read(&dst).await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_move_missing_source() {
        let dir = TempDir::new().unwrap();
        let result = move_file(dir.path().join("nope.mp4"), dir.path().join("out.mp4")).await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
        assert!(!dir.path().join("out.mp4").exists());
    }

    #[tokio::test]
    async fn test_copy_into_place() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.mp4");
        let dst = dir.path().join("b.mp4");
        fs::write(&src, b"data").await.unwrap();

        copy_into_place(&src, &dst).await.unwrap();

        assert!(!src.exists());
        assert!(!partial_path(&dst).exists());
        assert_eq!(fs::read(&dst).await.unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_remove_if_exists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("segment_000.mp4");
        fs::write(&path, b"x").await.unwrap();

        assert!(remove_if_exists(&path).await.unwrap());
        assert!(!remove_if_exists(&path).await.unwrap());
    }

    #[test]
    fn test_partial_path_is_hidden_sibling() {
        assert_eq!(
            partial_path(Path::new("/out/reel.mp4")),
            PathBuf::from("/out/.reel.mp4.partial")
        );
    }
}
