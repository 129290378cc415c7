//! Stream-copy concatenation of normalized segments.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::command::FfmpegCommand;
use crate::engine::MediaEngine;
use crate::error::{MediaError, MediaResult};
use crate::escape::quote_concat_path;

/// Join segments, in the given order, without re-encoding.
///
/// All segments must share codec parameters, resolution and frame rate;
/// [`crate::normalize`] guarantees this for its output.
#[derive(Debug, Clone)]
pub struct ConcatJob {
    segments: Vec<PathBuf>,
    manifest: PathBuf,
    output: PathBuf,
    expected_secs: Option<f64>,
}

impl ConcatJob {
    pub fn new(segments: Vec<PathBuf>, manifest: impl AsRef<Path>, output: impl AsRef<Path>) -> MediaResult<Self> {
        if segments.is_empty() {
            return Err(MediaError::InvalidVideo("No segments to concatenate".to_string()));
        }
        Ok(Self {
            segments,
            manifest: manifest.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            expected_secs: None,
        })
    }

    /// Declare the joined duration for progress reporting.
    pub fn expect_duration(mut self, secs: f64) -> Self {
        self.expected_secs = Some(secs);
        self
    }

    pub fn segments(&self) -> &[PathBuf] {
        &self.segments
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Concat demuxer manifest: one quoted `file` line per segment.
    pub fn manifest_contents(&self) -> String {
        let mut contents = String::from("ffconcat version 1.0\n");
        for segment in &self.segments {
            contents.push_str("file ");
            contents.push_str(&quote_concat_path(&segment.to_string_lossy()));
            contents.push('\n');
        }
        contents
    }

    pub async fn write_manifest(&self) -> MediaResult<()> {
        tokio::fs::write(&self.manifest, self.manifest_contents()).await?;
        Ok(())
    }

    pub fn to_command(&self) -> FfmpegCommand {
        let cmd = FfmpegCommand::new(&self.manifest, &self.output)
            .input_format("concat")
            .input_args(["-safe", "0"])
            .codec_copy();
        match self.expected_secs {
            Some(secs) => cmd.expect_duration(secs),
            None => cmd,
        }
    }

    /// Write the manifest and run the concatenation.
    pub async fn run<E: MediaEngine + ?Sized>(&self, engine: &E) -> MediaResult<()> {
        self.write_manifest().await?;
        debug!(
            manifest = %self.manifest.display(),
            segments = self.segments.len(),
            "Concat manifest written"
        );

        engine.run(&self.to_command()).await?;

        info!(output = %self.output.display(), segments = self.segments.len(), "Segments concatenated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn job() -> ConcatJob {
        ConcatJob::new(
            vec![
                PathBuf::from("/scratch/segment_000.mp4"),
                PathBuf::from("/scratch/it's/segment_001.mp4"),
            ],
            "/scratch/concat.txt",
            "/scratch/concatenated.mp4",
        )
        .unwrap()
    }

    #[test]
    fn test_empty_segment_list_rejected() {
        let result = ConcatJob::new(Vec::new(), "/m.txt", "/o.mp4");
        assert!(matches!(result, Err(MediaError::InvalidVideo(_))));
    }

    #[test]
    fn test_manifest_keeps_order_and_escapes_quotes() {
        assert_eq!(
            job().manifest_contents(),
            "ffconcat version 1.0\n\
             file '/scratch/segment_000.mp4'\n\
             file '/scratch/it'\\''s/segment_001.mp4'\n"
        );
    }

    #[test]
    fn test_command_is_stream_copy() {
        let args = job().to_command().build_args();
        let joined = args.join(" ");
        assert!(joined.contains("-f concat -safe 0 -i /scratch/concat.txt"));
        assert!(joined.contains("-c copy"));
        assert!(!joined.contains("libx264"));
        assert_eq!(args.last().unwrap(), "/scratch/concatenated.mp4");
    }

    #[tokio::test]
    async fn test_write_manifest() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("concat.txt");
        let job = ConcatJob::new(vec![dir.path().join("segment_000.mp4")], &manifest, dir.path().join("out.mp4")).unwrap();

        job.write_manifest().await.unwrap();

        let written = tokio::fs::read_to_string(&manifest).await.unwrap();
        assert_eq!(written, job.manifest_contents());
    }
}
