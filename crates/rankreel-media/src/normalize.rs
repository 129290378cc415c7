//! Clip normalization: every clip becomes a segment with identical
//! geometry, frame rate, duration and stream parameters.

use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use rankreel_models::EncodingConfig;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::command::FfmpegCommand;
use crate::engine::MediaEngine;
use crate::error::{MediaError, MediaResult};
use crate::filters::{fit_pad_chain, freeze_tail, silent_audio_source, AUDIO_PAD, AUDIO_RESET_PTS};
use crate::layout::ReelFormat;

/// One clip to normalize into one segment.
#[derive(Debug, Clone)]
pub struct NormalizeJob {
    /// Position in playback order.
    pub index: usize,
    pub source: PathBuf,
    pub output: PathBuf,
    pub format: ReelFormat,
    pub encoding: EncodingConfig,
    /// Source carries an audio stream. Without one a silent track is
    /// generated so every segment has the same streams.
    pub has_audio: bool,
    /// Hold the last frame when the source is shorter than the clip
    /// duration.
    pub freeze_tail: bool,
}

impl NormalizeJob {
    pub fn new(index: usize, source: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            index,
            source: source.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            format: ReelFormat::default(),
            encoding: EncodingConfig::default(),
            has_audio: true,
            freeze_tail: false,
        }
    }

    pub fn with_format(mut self, format: ReelFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_audio(mut self, has_audio: bool) -> Self {
        self.has_audio = has_audio;
        self
    }

    pub fn with_freeze_tail(mut self, freeze: bool) -> Self {
        self.freeze_tail = freeze;
        self
    }

    fn video_chain(&self) -> String {
        let mut chain = fit_pad_chain(self.format.width, self.format.height, self.format.fps);
        if self.freeze_tail {
            chain.push(',');
            chain.push_str(&freeze_tail(self.format.clip_duration_secs));
        }
        chain
    }

    /// Build the engine invocation for this segment.
    pub fn to_command(&self) -> FfmpegCommand {
        let clip_secs = self.format.clip_duration_secs;
        // Every clip is taken from the start of its source.
        let mut cmd = FfmpegCommand::new(&self.source, &self.output).seek(0.0);

        let audio_input = if self.has_audio {
            "0:a:0"
        } else {
            cmd = cmd.extra_input(
                ["-f", "lavfi"],
                silent_audio_source(self.encoding.audio_sample_rate, self.encoding.channel_layout()),
            );
            "1:a:0"
        };

        cmd.video_filter(self.video_chain())
            // apad plus -t gives every segment exactly clip-length audio.
            .audio_filter(format!("{},{}", AUDIO_RESET_PTS, AUDIO_PAD))
            .map("0:v:0")
            .map(audio_input)
            .duration(clip_secs)
            .frame_rate(self.format.fps)
            .output_args(self.encoding.to_ffmpeg_args())
            .expect_duration(clip_secs)
    }
}

/// Runs normalization jobs with bounded concurrency and reassembles the
/// resulting segments in playback order.
pub struct ClipNormalizer<'a, E: MediaEngine + ?Sized> {
    engine: &'a E,
    max_concurrent: usize,
}

impl<'a, E: MediaEngine + ?Sized> ClipNormalizer<'a, E> {
    pub fn new(engine: &'a E, max_concurrent: usize) -> Self {
        Self {
            engine,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Normalize every job. The returned paths are ordered by job position,
    /// independent of completion order.
    ///
    /// The first failure aborts the stage; in-flight invocations are
    /// dropped, which kills their engine processes.
    pub async fn normalize_all(&self, jobs: &[NormalizeJob]) -> MediaResult<Vec<PathBuf>> {
        let started = Instant::now();
        let semaphore = Semaphore::new(self.max_concurrent);
        let semaphore = &semaphore;
        let engine = self.engine;

        let mut pending = FuturesUnordered::new();
        for (slot, job) in jobs.iter().enumerate() {
            pending.push(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| MediaError::internal("normalizer semaphore closed"))?;

                debug!(index = job.index, source = %job.source.display(), "Normalizing clip");
                let cmd = job.to_command();
                engine.run(&cmd).await.map_err(|e| e.in_segment(job.index))?;
                debug!(index = job.index, output = %job.output.display(), "Clip normalized");

                Ok::<_, MediaError>(slot)
            });
        }

        let mut slots: Vec<Option<PathBuf>> = vec![None; jobs.len()];
        while let Some(result) = pending.next().await {
            let slot = result?;
            slots[slot] = Some(jobs[slot].output.clone());
        }

        let segments = slots
            .into_iter()
            .enumerate()
            .map(|(slot, path)| {
                path.ok_or_else(|| MediaError::internal(format!("segment {} was never produced", slot)))
            })
            .collect::<MediaResult<Vec<_>>>()?;

        info!(
            segments = segments.len(),
            max_concurrent = self.max_concurrent,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Normalization complete"
        );
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(job: &NormalizeJob) -> Vec<String> {
        job.to_command().build_args()
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Vec<&'a str> {
        args.windows(2)
            .filter(|w| w[0] == flag)
            .map(|w| w[1].as_str())
            .collect()
    }

    #[test]
    fn test_command_targets_fixed_geometry_and_duration() {
        let job = NormalizeJob::new(0, "/in/a.mov", "/scratch/segment_000.mp4");
        let args = args_of(&job);

        assert_eq!(value_after(&args, "-i"), vec!["/in/a.mov"]);
        assert_eq!(value_after(&args, "-ss"), vec!["0.000"]);
        let seek = args.iter().position(|a| a == "-ss").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert!(seek < input);
        assert_eq!(value_after(&args, "-t"), vec!["5.000"]);
        assert_eq!(value_after(&args, "-r"), vec!["30"]);
        assert_eq!(value_after(&args, "-map"), vec!["0:v:0", "0:a:0"]);
        assert_eq!(value_after(&args, "-af"), vec!["asetpts=PTS-STARTPTS,apad"]);
        assert_eq!(value_after(&args, "-c:a"), vec!["aac"]);
        assert_eq!(value_after(&args, "-ar"), vec!["44100"]);
        let vf = value_after(&args, "-vf")[0];
        assert!(vf.contains("scale=1080:1920:force_original_aspect_ratio=decrease"));
        assert!(vf.contains("setpts=PTS-STARTPTS"));
        assert!(!vf.contains("tpad"));
        assert_eq!(args.last().unwrap(), "/scratch/segment_000.mp4");
    }

    #[test]
    fn test_silent_source_gets_generated_audio() {
        let job = NormalizeJob::new(1, "/in/mute.mp4", "/scratch/segment_001.mp4").with_audio(false);
        let args = args_of(&job);

        assert_eq!(
            value_after(&args, "-i"),
            vec!["/in/mute.mp4", "anullsrc=channel_layout=stereo:sample_rate=44100"]
        );
        assert_eq!(value_after(&args, "-f"), vec!["lavfi"]);
        assert_eq!(value_after(&args, "-map"), vec!["0:v:0", "1:a:0"]);
    }

    #[test]
    fn test_freeze_tail_pads_video() {
        let job = NormalizeJob::new(0, "/in/short.mp4", "/out.mp4").with_freeze_tail(true);
        let args = args_of(&job);
        let vf = value_after(&args, "-vf")[0];
        assert!(vf.ends_with(",tpad=stop_mode=clone:stop_duration=5"));
    }

    #[test]
    fn test_concurrency_floor() {
        struct Never;
        #[async_trait::async_trait]
        impl MediaEngine for Never {
            async fn probe(&self, _: &Path) -> MediaResult<crate::probe::VideoInfo> {
                Err(MediaError::internal("unused"))
            }
            async fn run(&self, _: &FfmpegCommand) -> MediaResult<()> {
                Err(MediaError::internal("unused"))
            }
        }
        let engine = Never;
        assert_eq!(ClipNormalizer::new(&engine, 0).max_concurrent, 1);
    }
}
