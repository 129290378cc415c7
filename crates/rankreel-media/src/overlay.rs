//! Overlay scheduling and the compositing pass.
//!
//! Two orderings meet here. A clip's badge and label sit in the slot for
//! its **rank** (rank 1 at the top), while the label is only visible during
//! the clip's **playback** window. The scheduler joins the two by rank
//! through [`PlaybackOrder::window_for`].

use std::fmt;
use std::path::{Path, PathBuf};

use rankreel_models::{EncodingConfig, OverlayWindow, PlaybackOrder, Project};
use tracing::debug;

use crate::command::FfmpegCommand;
use crate::filters::{DrawBox, DrawText, FontSpec, TimeGate};
use crate::layout::OverlayLayout;

/// One element drawn by the compositing pass.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayDirective {
    /// Opaque band behind the title.
    Band(DrawBox),
    /// Centered title, visible throughout.
    Title(DrawText),
    /// `"{rank}."` in the rank's slot, visible throughout.
    Badge { rank: u32, text: DrawText },
    /// Clip label in the rank's slot, visible only during `window`.
    Label {
        rank: u32,
        window: OverlayWindow,
        text: DrawText,
    },
}

impl fmt::Display for OverlayDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayDirective::Band(band) => fmt::Display::fmt(band, f),
            OverlayDirective::Title(text)
            | OverlayDirective::Badge { text, .. }
            | OverlayDirective::Label { text, .. } => fmt::Display::fmt(text, f),
        }
    }
}

/// The full overlay schedule for one render.
#[derive(Debug, Clone)]
pub struct OverlayPlan {
    directives: Vec<OverlayDirective>,
    windows: Vec<OverlayWindow>,
    total_duration_secs: f64,
}

impl OverlayPlan {
    /// Directives in drawing order: band, title, badges, labels.
    pub fn directives(&self) -> &[OverlayDirective] {
        &self.directives
    }

    /// One window per clip, in playback order.
    pub fn windows(&self) -> &[OverlayWindow] {
        &self.windows
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.total_duration_secs
    }

    pub fn badge(&self, rank: u32) -> Option<&DrawText> {
        self.directives.iter().find_map(|d| match d {
            OverlayDirective::Badge { rank: r, text } if *r == rank => Some(text),
            _ => None,
        })
    }

    pub fn label(&self, rank: u32) -> Option<&DrawText> {
        self.directives.iter().find_map(|d| match d {
            OverlayDirective::Label { rank: r, text, .. } if *r == rank => Some(text),
            _ => None,
        })
    }

    pub fn title(&self) -> Option<&DrawText> {
        self.directives.iter().find_map(|d| match d {
            OverlayDirective::Title(text) => Some(text),
            _ => None,
        })
    }

    /// Serialize as a single `-vf` filter chain.
    pub fn filter_graph(&self) -> String {
        self.directives
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Builds [`OverlayPlan`]s from a project and its playback order.
#[derive(Debug, Clone)]
pub struct OverlayScheduler {
    layout: OverlayLayout,
    font: FontSpec,
    clip_duration_secs: f64,
}

impl OverlayScheduler {
    pub fn new(layout: OverlayLayout, font: FontSpec, clip_duration_secs: f64) -> Self {
        Self {
            layout,
            font,
            clip_duration_secs,
        }
    }

    pub fn layout(&self) -> &OverlayLayout {
        &self.layout
    }

    pub fn plan(&self, project: &Project, order: &PlaybackOrder<'_>) -> OverlayPlan {
        let layout = &self.layout;
        let mut directives = Vec::with_capacity(2 + project.videos.len() * 2);

        directives.push(OverlayDirective::Band(DrawBox::top_band(
            layout.band_height,
            layout.band_color,
        )));

        // drawtext rejects empty text, so blank titles and labels are omitted.
        if !project.title.text.trim().is_empty() {
            let title = DrawText::new(
                project.title.text.clone(),
                self.font.clone(),
                layout.title_font_size,
                project.title.title_color(layout.title_color),
            )
            .centered_at(layout.title_y.to_string())
            .outlined(layout.title_border_width, layout.border_color);
            directives.push(OverlayDirective::Title(title));
        }

        // Slots follow rank order: videos[i] sits in slot i.
        for (slot, clip) in project.videos.iter().enumerate() {
            let badge = DrawText::new(
                format!("{}.", clip.rank),
                self.font.clone(),
                layout.rank_font_size,
                layout.rank_color,
            )
            .at(layout.rank_x.to_string(), layout.slot_y(slot).to_string())
            .outlined(layout.rank_border_width, layout.border_color);
            directives.push(OverlayDirective::Badge {
                rank: clip.rank,
                text: badge,
            });
        }

        for (slot, clip) in project.videos.iter().enumerate() {
            if clip.label.trim().is_empty() {
                continue;
            }
            let Some(window) = order.window_for(clip.rank, self.clip_duration_secs) else {
                continue;
            };
            let label = DrawText::new(
                clip.label.clone(),
                self.font.clone(),
                layout.label_font_size,
                layout.label_color,
            )
            .at(layout.label_x.to_string(), layout.label_y(slot).to_string())
            .outlined(layout.label_border_width, layout.border_color)
            .gated(TimeGate::new(window.start_secs, window.end_secs));
            directives.push(OverlayDirective::Label {
                rank: clip.rank,
                window,
                text: label,
            });
        }

        let plan = OverlayPlan {
            directives,
            windows: order.windows(self.clip_duration_secs),
            total_duration_secs: order.total_duration(self.clip_duration_secs),
        };
        debug!(
            directives = plan.directives.len(),
            windows = plan.windows.len(),
            "Overlay plan built"
        );
        plan
    }
}

/// The single compositing invocation applying an [`OverlayPlan`].
#[derive(Debug, Clone)]
pub struct OverlayJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub encoding: EncodingConfig,
}

impl OverlayJob {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            encoding: EncodingConfig::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    /// Video is re-encoded with the overlays burned in; audio is copied.
    pub fn to_command(&self, plan: &OverlayPlan) -> FfmpegCommand {
        FfmpegCommand::new(&self.input, &self.output)
            .video_filter(plan.filter_graph())
            .output_args(self.encoding.video_args())
            .audio_codec("copy")
            .faststart()
            .expect_duration(plan.total_duration_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankreel_models::{ClipEntry, RgbColor, TitleSpec};

    fn project(ranks: &[u32], title: TitleSpec) -> Project {
        let videos = ranks
            .iter()
            .map(|&rank| ClipEntry::new(format!("vid_{rank}"), format!("{rank}.mp4"), rank, format!("Label {rank}")))
            .collect();
        Project::new("p1", title, videos)
    }

    fn scheduler() -> OverlayScheduler {
        OverlayScheduler::new(OverlayLayout::default(), FontSpec::default(), 5.0)
    }

    #[test]
    fn test_badges_in_rank_order() {
        let project = project(&[1, 2, 3], TitleSpec::new("Top 3"));
        let order = PlaybackOrder::resolve(&project.videos);
        let plan = scheduler().plan(&project, &order);

        assert_eq!(plan.badge(1).unwrap().y, "400");
        assert_eq!(plan.badge(2).unwrap().y, "550");
        assert_eq!(plan.badge(3).unwrap().y, "700");
        assert_eq!(plan.badge(1).unwrap().text, "1.");
        assert!(plan.badge(1).unwrap().gate.is_none());
    }

    #[test]
    fn test_label_position_by_rank_window_by_playback() {
        let project = project(&[1, 2, 3], TitleSpec::new("Top 3"));
        let order = PlaybackOrder::resolve(&project.videos);
        let plan = scheduler().plan(&project, &order);

        let bottom = plan.label(3).unwrap();
        assert_eq!(bottom.y, "730");
        assert_eq!(bottom.gate, Some(TimeGate::new(0.0, 5.0)));

        let top = plan.label(1).unwrap();
        assert_eq!(top.y, "430");
        assert_eq!(top.gate, Some(TimeGate::new(10.0, 15.0)));

        assert_eq!(plan.total_duration_secs(), 15.0);
        assert_eq!(plan.windows()[0].rank, 3);
    }

    #[test]
    fn test_title_highlight_colors_whole_title() {
        let red = RgbColor::new(0xFF, 0, 0);
        let project = project(&[1, 2], TitleSpec::new("Top Picks").with_highlight("Top", red));
        let order = PlaybackOrder::resolve(&project.videos);
        let plan = scheduler().plan(&project, &order);

        let title = plan.title().unwrap();
        assert_eq!(title.text, "Top Picks");
        assert_eq!(title.color, red);
    }

    #[test]
    fn test_title_highlight_not_found_uses_default() {
        let project = project(&[1], TitleSpec::new("Top Picks").with_highlight("Best", RgbColor::GOLD));
        let order = PlaybackOrder::resolve(&project.videos);
        let plan = scheduler().plan(&project, &order);

        assert_eq!(plan.title().unwrap().color, RgbColor::WHITE);
    }

    #[test]
    fn test_blank_label_and_title_omitted() {
        let mut project = project(&[1, 2], TitleSpec::new("  "));
        project.videos[0].label.clear();
        let order = PlaybackOrder::resolve(&project.videos);
        let plan = scheduler().plan(&project, &order);

        assert!(plan.title().is_none());
        assert!(plan.label(1).is_none());
        assert!(plan.label(2).is_some());
        assert_eq!(plan.windows().len(), 2);
    }

    #[test]
    fn test_filter_graph_order() {
        let project = project(&[1, 2], TitleSpec::new("Top: Picks"));
        let order = PlaybackOrder::resolve(&project.videos);
        let graph = scheduler().plan(&project, &order).filter_graph();

        assert!(graph.starts_with("drawbox=x=0:y=0:w=iw:h=200:color=0x000000:t=fill,drawtext="));
        assert!(graph.contains("text=Top\\\\: Picks:"));
        assert_eq!(graph.matches("drawtext=").count(), 5);
        assert!(graph.contains("enable='gte(t,0)*lt(t,5)'"));
        assert!(graph.contains("enable='gte(t,5)*lt(t,10)'"));
    }

    #[test]
    fn test_overlay_command_copies_audio() {
        let project = project(&[1], TitleSpec::new("One"));
        let order = PlaybackOrder::resolve(&project.videos);
        let plan = scheduler().plan(&project, &order);
        let args = OverlayJob::new("/s/concatenated.mp4", "/s/composited.mp4")
            .to_command(&plan)
            .build_args()
            .join(" ");

        assert!(args.contains("-c:v libx264 -preset fast -crf 23"));
        assert!(args.contains("-c:a copy"));
        assert!(args.ends_with("/s/composited.mp4"));
    }
}
