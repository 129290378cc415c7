//! Output format and overlay geometry for ranked reels.

use rankreel_models::RgbColor;

/// Output frame, rate and per-clip duration of a reel.
#[derive(Debug, Clone, PartialEq)]
pub struct ReelFormat {
    /// Output width in pixels (default: 1080 for 9:16 portrait).
    pub width: u32,
    /// Output height in pixels (default: 1920 for 9:16 portrait).
    pub height: u32,
    /// Constant output frame rate (default: 30).
    pub fps: u32,
    /// Duration every clip is trimmed to, in seconds (default: 5.0).
    pub clip_duration_secs: f64,
}

impl Default for ReelFormat {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            clip_duration_secs: 5.0,
        }
    }
}

impl ReelFormat {
    /// Total reel duration for `clip_count` clips.
    pub fn total_duration_secs(&self, clip_count: usize) -> f64 {
        self.clip_duration_secs * clip_count as f64
    }

    /// Per-clip duration in milliseconds, for progress reporting.
    pub fn clip_duration_ms(&self) -> i64 {
        (self.clip_duration_secs * 1000.0).round() as i64
    }
}

/// Positions, sizes and colors of the title band and rank list.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayout {
    /// Height of the opaque band behind the title (default: 200).
    pub band_height: u32,
    pub band_color: RgbColor,
    /// Baseline offset of the title from the top (default: 100).
    pub title_y: u32,
    pub title_font_size: u32,
    pub title_color: RgbColor,
    pub title_border_width: u32,
    /// Left edge of the rank numbers (default: 40).
    pub rank_x: u32,
    /// Y of the first rank slot (default: 400).
    pub list_top: u32,
    /// Vertical distance between consecutive rank slots (default: 150).
    pub slot_spacing: u32,
    pub rank_font_size: u32,
    pub rank_color: RgbColor,
    pub rank_border_width: u32,
    /// Left edge of the labels (default: 180).
    pub label_x: u32,
    /// Label offset below its rank number (default: 30).
    pub label_offset_y: u32,
    pub label_font_size: u32,
    pub label_color: RgbColor,
    pub label_border_width: u32,
    /// Outline color for all text.
    pub border_color: RgbColor,
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self {
            band_height: 200,
            band_color: RgbColor::BLACK,
            title_y: 100,
            title_font_size: 70,
            title_color: RgbColor::WHITE,
            title_border_width: 5,
            rank_x: 40,
            list_top: 400,
            slot_spacing: 150,
            rank_font_size: 100,
            rank_color: RgbColor::GOLD,
            rank_border_width: 5,
            label_x: 180,
            label_offset_y: 30,
            label_font_size: 50,
            label_color: RgbColor::WHITE,
            label_border_width: 4,
            border_color: RgbColor::BLACK,
        }
    }
}

impl OverlayLayout {
    /// Y of the rank number in the given slot (0 = top of the list).
    pub fn slot_y(&self, slot: usize) -> u32 {
        self.list_top + slot as u32 * self.slot_spacing
    }

    /// Y of the label text in the given slot.
    pub fn label_y(&self, slot: usize) -> u32 {
        self.slot_y(slot) + self.label_offset_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format() {
        let format = ReelFormat::default();
        assert_eq!((format.width, format.height, format.fps), (1080, 1920, 30));
        assert_eq!(format.total_duration_secs(3), 15.0);
        assert_eq!(format.clip_duration_ms(), 5000);
    }

    #[test]
    fn test_slot_positions() {
        let layout = OverlayLayout::default();
        assert_eq!(layout.slot_y(0), 400);
        assert_eq!(layout.slot_y(2), 700);
        assert_eq!(layout.label_y(1), 580);
    }
}
