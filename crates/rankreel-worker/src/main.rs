//! Ranked reel render CLI.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use rankreel_media::FfmpegEngine;
use rankreel_models::{PlaybackOrder, Project};
use rankreel_worker::{init_tracing, ErrorKind, ReelRenderer, RenderConfig, ShortClipPolicy};

#[derive(Debug, Parser)]
#[command(name = "rankreel-render", version, about = "Render ranked vertical video reels")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a project file into an MP4 reel
    Render(RenderArgs),
    /// Validate a project file and print its playback schedule
    Validate {
        /// Project JSON file
        project: PathBuf,
    },
    /// Print the project JSON Schema
    Schema,
}

#[derive(Debug, Args)]
struct RenderArgs {
    /// Project JSON file
    project: PathBuf,

    /// Output file (default: exports/ranked_video_<timestamp>.mp4)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory clip file paths are relative to
    #[arg(long)]
    media_root: Option<PathBuf>,

    /// Hold the last frame of clips shorter than the clip length
    #[arg(long)]
    allow_short_clips: bool,

    /// Maximum concurrent FFmpeg processes
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Timeout per engine invocation
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Root for per-render scratch directories
    #[arg(long)]
    scratch_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    match cli.command {
        Command::Render(args) => render(args).await,
        Command::Validate { project } => {
            validate(&project).await?;
            Ok(0)
        }
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&Project::json_schema())?);
            Ok(0)
        }
    }
}

async fn load_project(path: &Path) -> anyhow::Result<Project> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read project file {}", path.display()))?;
    let project = Project::from_json_slice(&bytes).with_context(|| format!("failed to parse {}", path.display()))?;
    project
        .validate()
        .with_context(|| format!("invalid project {}", path.display()))?;
    Ok(project)
}

fn default_output() -> PathBuf {
    PathBuf::from("exports").join(format!(
        "ranked_video_{}.mp4",
        Utc::now().format("%Y%m%dT%H%M%S%3fZ")
    ))
}

async fn render(args: RenderArgs) -> anyhow::Result<u8> {
    let project = load_project(&args.project).await?;

    let mut config = RenderConfig::from_env();
    if let Some(root) = args.media_root {
        config = config.with_media_root(root);
    }
    if let Some(dir) = args.scratch_dir {
        config = config.with_scratch_dir(dir);
    }
    if let Some(jobs) = args.jobs {
        config = config.with_max_ffmpeg_processes(jobs);
    }
    if let Some(secs) = args.timeout {
        config = config.with_engine_timeout(Duration::from_secs(secs));
    }
    if args.allow_short_clips {
        config = config.with_short_clip_policy(ShortClipPolicy::Freeze);
    }
    config.validate()?;
    info!("Render config: {:?}", config);

    let output = args.output.unwrap_or_else(default_output);
    let engine = FfmpegEngine::new(config.engine_timeout.as_secs().max(1));
    let renderer = ReelRenderer::new(engine, config);

    match renderer.render(&project, &output).await {
        Ok(report) => {
            for warning in &report.cleanup_warnings {
                eprintln!("warning: {}", warning);
            }
            println!("{}", report.output_path.display());
            Ok(0)
        }
        Err(err) => {
            error!(kind = err.kind().as_str(), "{}", err);
            if let Some(stderr) = err.engine_stderr() {
                eprintln!("{}", stderr);
            }
            Ok(match err.kind() {
                ErrorKind::Input => 2,
                ErrorKind::EngineInvocation => 3,
                ErrorKind::Internal => 1,
            })
        }
    }
}

async fn validate(path: &Path) -> anyhow::Result<()> {
    let project = load_project(path).await?;
    let config = RenderConfig::from_env();
    let clip_secs = config.format.clip_duration_secs;
    let order = PlaybackOrder::resolve(&project.videos);

    println!(
        "{}: \"{}\", {} clips, {:.1}s",
        project.id,
        project.title.text,
        order.len(),
        order.total_duration(clip_secs)
    );
    if let Some(highlight) = project.title.active_highlight() {
        println!("title color {} (highlight \"{}\")", highlight.color, highlight.text);
    }
    for window in order.windows(clip_secs) {
        let source = project
            .videos
            .iter()
            .find(|clip| clip.rank == window.rank)
            .map(|clip| clip.resolve_source(config.media_root.as_deref()))
            .unwrap_or_default();
        println!(
            "{:>6.1}s - {:>6.1}s  #{:<3} {:<24} {}",
            window.start_secs,
            window.end_secs,
            window.rank,
            window.label,
            source.display()
        );
    }
    Ok(())
}
