//! Playback ordering for ranked reels.
//!
//! A reel counts down: the lowest-ranked clip plays first and rank 1 plays
//! last, so the reel builds toward its top entry. Playback order is therefore
//! the reverse of rank order. Everything that needs to know *when* a clip is
//! on screen goes through [`PlaybackOrder`]; everything that needs to know
//! *where* a clip's badge sits uses rank order directly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::project::ClipEntry;

/// Time interval during which a clip is on screen, `[start_secs, end_secs)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayWindow {
    pub clip_id: String,
    pub rank: u32,
    pub label: String,
    pub start_secs: f64,
    pub end_secs: f64,
}

impl OverlayWindow {
    /// Whether `t` falls inside the window (end exclusive).
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_secs && t < self.end_secs
    }
}

/// Clips in the order they play, with the inverse `rank -> index` lookup.
#[derive(Debug, Clone)]
pub struct PlaybackOrder<'a> {
    entries: Vec<&'a ClipEntry>,
    index_by_rank: HashMap<u32, usize>,
}

impl<'a> PlaybackOrder<'a> {
    /// `playback = reverse(rank order)`.
    ///
    /// `videos` must already be in rank order; ranks are not re-validated.
    pub fn resolve(videos: &'a [ClipEntry]) -> Self {
        let entries: Vec<&ClipEntry> = videos.iter().rev().collect();
        let index_by_rank = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.rank, index))
            .collect();

        Self {
            entries,
            index_by_rank,
        }
    }

    /// Clips in playback order.
    pub fn entries(&self) -> &[&'a ClipEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of the clip with `rank` in playback order.
    pub fn playback_index(&self, rank: u32) -> Option<usize> {
        self.index_by_rank.get(&rank).copied()
    }

    /// On-screen window of the clip with `rank`.
    pub fn window_for(&self, rank: u32, per_clip_secs: f64) -> Option<OverlayWindow> {
        let index = self.playback_index(rank)?;
        let entry = self.entries[index];
        let start_secs = index as f64 * per_clip_secs;

        Some(OverlayWindow {
            clip_id: entry.id.clone(),
            rank: entry.rank,
            label: entry.label.clone(),
            start_secs,
            end_secs: start_secs + per_clip_secs,
        })
    }

    /// One window per clip, in playback order.
    pub fn windows(&self, per_clip_secs: f64) -> Vec<OverlayWindow> {
        self.entries
            .iter()
            .filter_map(|entry| self.window_for(entry.rank, per_clip_secs))
            .collect()
    }

    /// Total reel length.
    pub fn total_duration(&self, per_clip_secs: f64) -> f64 {
        self.entries.len() as f64 * per_clip_secs
    }
}
