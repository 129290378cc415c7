//! Render orchestration.
//!
//! One call to [`ReelRenderer::render`] turns a [`Project`] into one output
//! file. Sources are checked before anything is written; every intermediate
//! file lives in a per-call [`ScratchWorkspace`] that is released on every
//! exit path, and the composited reel only reaches `output` after all
//! stages succeed.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rankreel_media::{
    move_file, CleanupWarning, ClipNormalizer, ConcatJob, DeadlineEngine, FontSpec, MediaEngine, MediaError,
    NormalizeJob, OverlayJob, OverlayScheduler, ScratchWorkspace,
};
use rankreel_models::{OverlayWindow, PlaybackOrder, Project, ProjectId};
use tracing::{debug, warn, Instrument};

use crate::config::{RenderConfig, ShortClipPolicy};
use crate::error::{RenderError, RenderResult};
use crate::logging::RenderLogger;
use crate::metrics;
use crate::stage::{RenderStage, StageTiming, StageTracker};

const MANIFEST_FILE: &str = "concat.txt";
const CONCATENATED_FILE: &str = "concatenated.mp4";
const COMPOSITED_FILE: &str = "composited.mp4";

/// Outcome of a successful render.
#[derive(Debug, Clone)]
pub struct RenderReport {
    pub project_id: ProjectId,
    pub output_path: PathBuf,
    pub clip_count: usize,
    pub duration_secs: f64,
    /// Label windows, in playback order.
    pub windows: Vec<OverlayWindow>,
    pub stage_timings: Vec<StageTiming>,
    pub elapsed: Duration,
    /// Artifacts that could not be deleted. Never fatal.
    pub cleanup_warnings: Vec<CleanupWarning>,
}

/// A source that passed preflight, in playback position.
#[derive(Debug, Clone)]
struct PreparedClip {
    index: usize,
    rank: u32,
    source: PathBuf,
    has_audio: bool,
    freeze_tail: bool,
}

/// Drives normalize, concat and overlay for one project at a time.
pub struct ReelRenderer<E> {
    engine: E,
    config: RenderConfig,
}

impl<E: MediaEngine> ReelRenderer<E> {
    pub fn new(engine: E, config: RenderConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Render `project` into `output`.
    ///
    /// On failure nothing is written to `output` and every intermediate
    /// file created by this call has been removed (best effort).
    pub async fn render(&self, project: &Project, output: impl AsRef<Path>) -> RenderResult<RenderReport> {
        let logger = RenderLogger::new(&project.id, "render_reel");
        let span = logger.create_span();
        self.render_logged(project, output.as_ref(), &logger)
            .instrument(span)
            .await
    }

    async fn render_logged(&self, project: &Project, output: &Path, logger: &RenderLogger) -> RenderResult<RenderReport> {
        let started = Instant::now();
        let mut tracker = StageTracker::new();
        let engine = DeadlineEngine::new(&self.engine, self.config.engine_timeout);

        logger.log_start(&format!("{} clips -> {}", project.videos.len(), output.display()));

        match self.render_with(&engine, project, output, logger, &mut tracker).await {
            Ok(mut report) => {
                report.elapsed = started.elapsed();
                report.stage_timings = tracker.timings().to_vec();
                metrics::record_render_succeeded(report.clip_count, report.elapsed.as_secs_f64());
                logger.log_completion(&format!(
                    "{} ({:.1}s reel) in {:.2}s, {} cleanup warnings",
                    report.output_path.display(),
                    report.duration_secs,
                    report.elapsed.as_secs_f64(),
                    report.cleanup_warnings.len()
                ));
                Ok(report)
            }
            Err(err) => {
                let stage = tracker.fail();
                logger.log_failure(stage, &err.to_string());
                metrics::record_render_failed(err.kind(), stage, started.elapsed().as_secs_f64());
                Err(err)
            }
        }
    }

    async fn render_with(
        &self,
        engine: &DeadlineEngine<'_, E>,
        project: &Project,
        output: &Path,
        logger: &RenderLogger,
        tracker: &mut StageTracker,
    ) -> RenderResult<RenderReport> {
        if project.videos.is_empty() {
            return Err(RenderError::EmptyProject);
        }

        let order = PlaybackOrder::resolve(&project.videos);
        let clips = self.preflight(engine, &order).await?;

        let mut workspace = ScratchWorkspace::create(&self.config.scratch_dir)
            .await
            .map_err(RenderError::Workspace)?;
        debug!(dir = %workspace.dir().display(), "Render workspace ready");

        let staged = self
            .run_stages(engine, project, &order, &clips, &mut workspace, tracker, logger)
            .await;
        let placed = match staged {
            Ok(composited) => move_file(&composited, output)
                .await
                .map_err(|source| RenderError::Output {
                    path: output.to_path_buf(),
                    source,
                }),
            Err(err) => Err(err),
        };

        let cleanup_warnings = workspace.cleanup().await;
        for warning in &cleanup_warnings {
            logger.log_cleanup_warning(warning);
        }
        metrics::record_cleanup_warnings(cleanup_warnings.len());

        placed?;
        tracker.advance(RenderStage::Done)?;

        let clip_secs = self.config.format.clip_duration_secs;
        Ok(RenderReport {
            project_id: project.id.clone(),
            output_path: output.to_path_buf(),
            clip_count: order.len(),
            duration_secs: order.total_duration(clip_secs),
            windows: order.windows(clip_secs),
            stage_timings: Vec::new(),
            elapsed: Duration::ZERO,
            cleanup_warnings,
        })
    }

    /// Resolve, probe and length-check every source in playback order.
    /// Runs before the workspace exists, so input errors leave nothing
    /// behind.
    async fn preflight(
        &self,
        engine: &DeadlineEngine<'_, E>,
        order: &PlaybackOrder<'_>,
    ) -> RenderResult<Vec<PreparedClip>> {
        let format = &self.config.format;
        // One frame of slack for container rounding.
        let min_secs = format.clip_duration_secs - 1.0 / format.fps as f64;
        let mut prepared = Vec::with_capacity(order.len());

        for (index, clip) in order.entries().iter().enumerate() {
            let source = clip.resolve_source(self.config.media_root.as_deref());
            match tokio::fs::try_exists(&source).await {
                Ok(true) => {}
                Ok(false) => {
                    return Err(RenderError::SourceMissing {
                        rank: clip.rank,
                        path: source,
                    });
                }
                Err(e) => {
                    return Err(RenderError::SourceUnreadable {
                        rank: clip.rank,
                        path: source,
                        source: MediaError::Io(e),
                    });
                }
            }

            let info = engine.probe(&source).await.map_err(|e| match e {
                MediaError::FileNotFound(_) => RenderError::SourceMissing {
                    rank: clip.rank,
                    path: source.clone(),
                },
                MediaError::Timeout(_) | MediaError::FfprobeNotFound => RenderError::engine(RenderStage::Start, e),
                other => RenderError::SourceUnreadable {
                    rank: clip.rank,
                    path: source.clone(),
                    source: other,
                },
            })?;

            let short = info.duration < min_secs;
            if short {
                match self.config.short_clip_policy {
                    ShortClipPolicy::Reject => {
                        return Err(RenderError::ClipTooShort {
                            rank: clip.rank,
                            path: source,
                            duration_secs: info.duration,
                            required_secs: format.clip_duration_secs,
                        });
                    }
                    ShortClipPolicy::Freeze => warn!(
                        rank = clip.rank,
                        duration_secs = info.duration,
                        "Source shorter than clip length, holding last frame"
                    ),
                }
            }

            debug!(
                index,
                rank = clip.rank,
                duration_secs = info.duration,
                width = info.width,
                height = info.height,
                has_audio = info.has_audio,
                "Source probed"
            );
            prepared.push(PreparedClip {
                index,
                rank: clip.rank,
                source,
                has_audio: info.has_audio,
                freeze_tail: short,
            });
        }

        Ok(prepared)
    }

    /// Normalize, concatenate and composite. Returns the composited file,
    /// still inside the workspace.
    #[allow(clippy::too_many_arguments)]
    async fn run_stages(
        &self,
        engine: &DeadlineEngine<'_, E>,
        project: &Project,
        order: &PlaybackOrder<'_>,
        clips: &[PreparedClip],
        workspace: &mut ScratchWorkspace,
        tracker: &mut StageTracker,
        logger: &RenderLogger,
    ) -> RenderResult<PathBuf> {
        let config = &self.config;
        let total_secs = config.format.total_duration_secs(clips.len());

        tracker.advance(RenderStage::Normalizing)?;
        logger.log_stage(
            RenderStage::Normalizing,
            &format!("{} clips, up to {} at once", clips.len(), config.max_ffmpeg_processes),
        );
        let jobs: Vec<NormalizeJob> = clips
            .iter()
            .map(|clip| {
                debug!(index = clip.index, rank = clip.rank, "Scheduling clip");
                NormalizeJob::new(clip.index, &clip.source, workspace.segment_path(clip.index))
                    .with_format(config.format.clone())
                    .with_encoding(config.encoding.clone())
                    .with_audio(clip.has_audio)
                    .with_freeze_tail(clip.freeze_tail)
            })
            .collect();
        let segments = ClipNormalizer::new(engine, config.max_ffmpeg_processes)
            .normalize_all(&jobs)
            .await
            .map_err(|e| normalize_failure(clips, e))?;

        tracker.advance(RenderStage::Concatenating)?;
        logger.log_stage(RenderStage::Concatenating, &format!("{} segments", segments.len()));
        let manifest = workspace.track(MANIFEST_FILE);
        let concatenated = workspace.track(CONCATENATED_FILE);
        ConcatJob::new(segments, &manifest, &concatenated)
            .map_err(|e| RenderError::engine(RenderStage::Concatenating, e))?
            .expect_duration(total_secs)
            .run(engine)
            .await
            .map_err(|e| RenderError::engine(RenderStage::Concatenating, e))?;

        tracker.advance(RenderStage::Overlaying)?;
        let font = FontSpec::resolve(config.font_file.as_deref());
        let plan = OverlayScheduler::new(config.layout.clone(), font, config.format.clip_duration_secs)
            .plan(project, order);
        logger.log_stage(
            RenderStage::Overlaying,
            &format!("{} overlay directives", plan.directives().len()),
        );
        let composited = workspace.track(COMPOSITED_FILE);
        let job = OverlayJob::new(&concatenated, &composited).with_encoding(config.encoding.clone());
        engine
            .run(&job.to_command(&plan))
            .await
            .map_err(|e| RenderError::engine(RenderStage::Overlaying, e))?;

        Ok(composited)
    }
}

/// A segment that failed because its source is broken is an input error;
/// anything else is blamed on the engine.
fn normalize_failure(clips: &[PreparedClip], err: MediaError) -> RenderError {
    if err.is_input_problem() {
        if let MediaError::SegmentFailed { index, .. } = &err {
            if let Some(clip) = clips.iter().find(|c| c.index == *index) {
                return RenderError::SourceUnreadable {
                    rank: clip.rank,
                    path: clip.source.clone(),
                    source: err,
                };
            }
        }
    }
    RenderError::engine(RenderStage::Normalizing, err)
}
