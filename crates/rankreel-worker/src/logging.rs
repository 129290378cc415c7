//! Structured render logging.
//!
//! Every lifecycle event of a render carries the project ID and the
//! operation name, so one render can be followed through interleaved logs.

use tracing::{error, info, warn, Span};

use rankreel_media::CleanupWarning;
use rankreel_models::ProjectId;

use crate::stage::RenderStage;

/// Logger stamping `project_id` and `operation` on render events.
#[derive(Debug, Clone)]
pub struct RenderLogger {
    project_id: String,
    operation: String,
}

impl RenderLogger {
    pub fn new(project_id: &ProjectId, operation: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            project_id = %self.project_id,
            operation = %self.operation,
            "Render started: {}", message
        );
    }

    pub fn log_stage(&self, stage: RenderStage, message: &str) {
        info!(
            project_id = %self.project_id,
            operation = %self.operation,
            stage = %stage,
            "Render progress: {}", message
        );
    }

    pub fn log_cleanup_warning(&self, warning: &CleanupWarning) {
        warn!(
            project_id = %self.project_id,
            operation = %self.operation,
            path = %warning.path.display(),
            "Cleanup warning: {}", warning.message
        );
    }

    pub fn log_failure(&self, stage: RenderStage, message: &str) {
        error!(
            project_id = %self.project_id,
            operation = %self.operation,
            stage = %stage,
            "Render failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            project_id = %self.project_id,
            operation = %self.operation,
            "Render completed: {}", message
        );
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span wrapping the whole render.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "render",
            project_id = %self.project_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_logger_fields() {
        let logger = RenderLogger::new(&ProjectId::from("proj-42"), "render_reel");

        assert_eq!(logger.project_id(), "proj-42");
        assert_eq!(logger.operation(), "render_reel");
    }
}
