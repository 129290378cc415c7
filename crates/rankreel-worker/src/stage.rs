//! Render stage state machine.
//!
//! `Start -> Normalizing -> Concatenating -> Overlaying -> Done`, with any
//! non-terminal stage allowed to move to `Failed`. No retries, no skipping.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::error::{RenderError, RenderResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStage {
    Start,
    Normalizing,
    Concatenating,
    Overlaying,
    Done,
    Failed,
}

impl RenderStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Normalizing => "normalizing",
            Self::Concatenating => "concatenating",
            Self::Overlaying => "overlaying",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// The only forward successor of this stage.
    pub fn next(&self) -> Option<RenderStage> {
        match self {
            Self::Start => Some(Self::Normalizing),
            Self::Normalizing => Some(Self::Concatenating),
            Self::Concatenating => Some(Self::Overlaying),
            Self::Overlaying => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn can_transition_to(&self, to: RenderStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == RenderStage::Failed || self.next() == Some(to)
    }
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time spent in one stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StageTiming {
    pub stage: RenderStage,
    pub elapsed: Duration,
}

/// Tracks the current stage of one render and how long each took.
#[derive(Debug)]
pub struct StageTracker {
    current: RenderStage,
    entered_at: Instant,
    timings: Vec<StageTiming>,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            current: RenderStage::Start,
            entered_at: Instant::now(),
            timings: Vec::new(),
        }
    }

    pub fn current(&self) -> RenderStage {
        self.current
    }

    /// Stages left so far, in order.
    pub fn timings(&self) -> &[StageTiming] {
        &self.timings
    }

    /// Move to `to`, recording the time spent in the stage being left.
    pub fn advance(&mut self, to: RenderStage) -> RenderResult<()> {
        if !self.current.can_transition_to(to) {
            return Err(RenderError::InvalidTransition {
                from: self.current,
                to,
            });
        }

        let timing = StageTiming {
            stage: self.current,
            elapsed: self.entered_at.elapsed(),
        };
        info!(
            from = %self.current,
            to = %to,
            stage_ms = timing.elapsed.as_millis() as u64,
            "Render stage transition"
        );
        crate::metrics::record_stage_duration(timing.stage, timing.elapsed.as_secs_f64());

        self.timings.push(timing);
        self.current = to;
        self.entered_at = Instant::now();
        Ok(())
    }

    /// Move to `Failed` unless already terminal. Returns the stage that
    /// failed.
    pub fn fail(&mut self) -> RenderStage {
        let failed_in = self.current;
        if !self.current.is_terminal() {
            let _ = self.advance(RenderStage::Failed);
        }
        failed_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_progression() {
        let mut tracker = StageTracker::new();
        for stage in [
            RenderStage::Normalizing,
            RenderStage::Concatenating,
            RenderStage::Overlaying,
            RenderStage::Done,
        ] {
            tracker.advance(stage).unwrap();
        }
        assert_eq!(tracker.current(), RenderStage::Done);
        let left: Vec<_> = tracker.timings().iter().map(|t| t.stage).collect();
        assert_eq!(
            left,
            vec![
                RenderStage::Start,
                RenderStage::Normalizing,
                RenderStage::Concatenating,
                RenderStage::Overlaying
            ]
        );
    }

    #[test]
    fn test_skipping_a_stage_is_rejected() {
        let mut tracker = StageTracker::new();
        let err = tracker.advance(RenderStage::Concatenating).unwrap_err();
        assert!(matches!(
            err,
            RenderError::InvalidTransition {
                from: RenderStage::Start,
                to: RenderStage::Concatenating
            }
        ));
        assert_eq!(tracker.current(), RenderStage::Start);
    }

    #[test]
    fn test_fail_from_any_running_stage() {
        let mut tracker = StageTracker::new();
        tracker.advance(RenderStage::Normalizing).unwrap();
        assert_eq!(tracker.fail(), RenderStage::Normalizing);
        assert_eq!(tracker.current(), RenderStage::Failed);
        assert!(tracker.advance(RenderStage::Concatenating).is_err());
    }

    #[test]
    fn test_terminal_stages_do_not_move() {
        assert!(!RenderStage::Done.can_transition_to(RenderStage::Failed));
        assert!(!RenderStage::Failed.can_transition_to(RenderStage::Start));
        assert_eq!(RenderStage::Overlaying.next(), Some(RenderStage::Done));
    }
}
