//! Ranked reel render orchestrator.
//!
//! This crate provides:
//! - The render orchestrator and its stage state machine
//! - Environment-driven configuration
//! - Structured render logging and metrics
//! - The `rankreel-render` CLI and `render-selfcheck` binaries

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod render_job;
pub mod stage;

pub use config::{RenderConfig, ShortClipPolicy};
pub use error::{ErrorKind, RenderError, RenderResult};
pub use logging::RenderLogger;
pub use render_job::{ReelRenderer, RenderReport};
pub use stage::{RenderStage, StageTiming, StageTracker};

/// Initialize tracing: JSON when `LOG_FORMAT=json`, colored text otherwise.
/// `RUST_LOG` refines the default `rankreel=info` filter.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rankreel=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}
