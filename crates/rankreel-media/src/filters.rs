//! Typed FFmpeg filter builders.
//!
//! Every piece of user text passes through [`escape_filter_value`] when a
//! filter is serialized; nothing here interpolates raw strings.

use std::fmt;
use std::path::{Path, PathBuf};

use rankreel_models::RgbColor;

use crate::escape::escape_filter_value;

/// Fontconfig pattern used when no font file is available.
pub const FALLBACK_FONT_FAMILY: &str = "Sans:style=Bold";

/// Format seconds for filter expressions: at most millisecond precision,
/// trailing zeros dropped.
pub fn format_secs(secs: f64) -> String {
    let s = format!("{:.3}", secs);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Font selection for drawtext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSpec {
    /// A font file on disk (`fontfile=`).
    File(PathBuf),
    /// A fontconfig pattern (`font=`).
    Family(String),
}

impl FontSpec {
    /// Use `preferred` when it exists on disk, otherwise fall back to a
    /// bold sans family resolved by fontconfig.
    pub fn resolve(preferred: Option<&Path>) -> Self {
        match preferred {
            Some(path) if path.is_file() => FontSpec::File(path.to_path_buf()),
            _ => FontSpec::Family(FALLBACK_FONT_FAMILY.to_string()),
        }
    }

    fn to_option(&self) -> String {
        match self {
            FontSpec::File(path) => {
                format!("fontfile={}", escape_filter_value(&path.to_string_lossy()))
            }
            FontSpec::Family(family) => format!("font={}", escape_filter_value(family)),
        }
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        FontSpec::Family(FALLBACK_FONT_FAMILY.to_string())
    }
}

/// Half-open visibility window `[start, end)` on output time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGate {
    pub start_secs: f64,
    pub end_secs: f64,
}

impl TimeGate {
    pub fn new(start_secs: f64, end_secs: f64) -> Self {
        Self {
            start_secs,
            end_secs,
        }
    }

    /// The `enable` option. The quotes protect the expression's comma from
    /// the filtergraph parser.
    pub fn to_option(&self) -> String {
        format!(
            "enable='gte(t,{})*lt(t,{})'",
            format_secs(self.start_secs),
            format_secs(self.end_secs)
        )
    }
}

/// Filled rectangle (`drawbox`).
#[derive(Debug, Clone, PartialEq)]
pub struct DrawBox {
    pub x: u32,
    pub y: u32,
    /// Width expression; `iw` spans the full frame.
    pub width: String,
    pub height: u32,
    pub color: RgbColor,
}

impl DrawBox {
    /// Opaque band across the full width at the top of the frame.
    pub fn top_band(height: u32, color: RgbColor) -> Self {
        Self {
            x: 0,
            y: 0,
            width: "iw".to_string(),
            height,
            color,
        }
    }
}

impl fmt::Display for DrawBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "drawbox=x={}:y={}:w={}:h={}:color={}:t=fill",
            self.x,
            self.y,
            self.width,
            self.height,
            self.color.to_ffmpeg()
        )
    }
}

/// Positioned, outlined text (`drawtext`).
#[derive(Debug, Clone, PartialEq)]
pub struct DrawText {
    pub text: String,
    pub font: FontSpec,
    pub font_size: u32,
    pub color: RgbColor,
    /// X expression, e.g. `40` or `(w-text_w)/2`.
    pub x: String,
    /// Y expression.
    pub y: String,
    pub border_width: u32,
    pub border_color: RgbColor,
    pub gate: Option<TimeGate>,
}

impl DrawText {
    pub fn new(text: impl Into<String>, font: FontSpec, font_size: u32, color: RgbColor) -> Self {
        Self {
            text: text.into(),
            font,
            font_size,
            color,
            x: "0".to_string(),
            y: "0".to_string(),
            border_width: 0,
            border_color: RgbColor::BLACK,
            gate: None,
        }
    }

    pub fn at(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x = x.into();
        self.y = y.into();
        self
    }

    /// Center horizontally in the frame.
    pub fn centered_at(self, y: impl Into<String>) -> Self {
        self.at("(w-text_w)/2", y)
    }

    pub fn outlined(mut self, width: u32, color: RgbColor) -> Self {
        self.border_width = width;
        self.border_color = color;
        self
    }

    pub fn gated(mut self, gate: TimeGate) -> Self {
        self.gate = Some(gate);
        self
    }
}

impl fmt::Display for DrawText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // expansion=none keeps '%' literal in user text.
        write!(
            f,
            "drawtext=expansion=none:text={}:{}:fontsize={}:fontcolor={}:x={}:y={}",
            escape_filter_value(&self.text),
            self.font.to_option(),
            self.font_size,
            self.color.to_ffmpeg(),
            self.x,
            self.y
        )?;
        if self.border_width > 0 {
            write!(
                f,
                ":borderw={}:bordercolor={}",
                self.border_width,
                self.border_color.to_ffmpeg()
            )?;
        }
        if let Some(gate) = &self.gate {
            write!(f, ":{}", gate.to_option())?;
        }
        Ok(())
    }
}

/// Fit inside `width`x`height` preserving aspect ratio, pad centered with
/// black, square pixels, constant frame rate, timestamps from zero.
pub fn fit_pad_chain(width: u32, height: u32, fps: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black,\
         setsar=1,fps={fps},setpts=PTS-STARTPTS",
        w = width,
        h = height,
        fps = fps
    )
}

/// Extend the video by cloning its last frame.
pub fn freeze_tail(secs: f64) -> String {
    format!("tpad=stop_mode=clone:stop_duration={}", format_secs(secs))
}

/// Reset audio timestamps to zero.
pub const AUDIO_RESET_PTS: &str = "asetpts=PTS-STARTPTS";

/// Pad audio with silence past its end.
pub const AUDIO_PAD: &str = "apad";

/// Silent lavfi audio source matching the reel's audio parameters.
pub fn silent_audio_source(sample_rate: u32, channel_layout: &str) -> String {
    format!(
        "anullsrc=channel_layout={}:sample_rate={}",
        channel_layout, sample_rate
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_secs() {
        assert_eq!(format_secs(0.0), "0");
        assert_eq!(format_secs(5.0), "5");
        assert_eq!(format_secs(2.5), "2.5");
        assert_eq!(format_secs(0.1 + 0.2), "0.3");
    }

    #[test]
    fn test_time_gate_half_open() {
        let gate = TimeGate::new(5.0, 10.0);
        assert_eq!(gate.to_option(), "enable='gte(t,5)*lt(t,10)'");
    }

    #[test]
    fn test_drawbox_band() {
        let band = DrawBox::top_band(200, RgbColor::BLACK);
        assert_eq!(
            band.to_string(),
            "drawbox=x=0:y=0:w=iw:h=200:color=0x000000:t=fill"
        );
    }

    #[test]
    fn test_drawtext_escapes_text() {
        let text = DrawText::new("Rank: it's [1]", FontSpec::default(), 50, RgbColor::WHITE)
            .at("180", "430")
            .outlined(4, RgbColor::BLACK)
            .gated(TimeGate::new(0.0, 5.0));
        let rendered = text.to_string();
        assert!(rendered.starts_with("drawtext=expansion=none:text=Rank\\\\: it\\\\\\'s \\[1\\]:"));
        assert!(rendered.contains(":font=Sans\\\\:style=Bold:"));
        assert!(rendered.contains(":fontsize=50:fontcolor=0xFFFFFF:x=180:y=430"));
        assert!(rendered.contains(":borderw=4:bordercolor=0x000000"));
        assert!(rendered.ends_with(":enable='gte(t,0)*lt(t,5)'"));
    }

    #[test]
    fn test_drawtext_without_border_or_gate() {
        let text = DrawText::new("1.", FontSpec::default(), 100, RgbColor::GOLD);
        let rendered = text.to_string();
        assert!(!rendered.contains("borderw"));
        assert!(!rendered.contains("enable"));
    }

    #[test]
    fn test_font_resolve_falls_back_when_missing() {
        let font = FontSpec::resolve(Some(Path::new("/definitely/not/here.ttf")));
        assert_eq!(font, FontSpec::Family(FALLBACK_FONT_FAMILY.to_string()));
        assert_eq!(FontSpec::resolve(None), FontSpec::default());
    }

    #[test]
    fn test_font_resolve_uses_existing_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(
            FontSpec::resolve(Some(file.path())),
            FontSpec::File(file.path().to_path_buf())
        );
    }

    #[test]
    fn test_fit_pad_chain() {
        let chain = fit_pad_chain(1080, 1920, 30);
        assert!(chain.starts_with("scale=1080:1920:force_original_aspect_ratio=decrease,"));
        assert!(chain.contains("pad=1080:1920:(ow-iw)/2:(oh-ih)/2:color=black"));
        assert!(chain.ends_with("setsar=1,fps=30,setpts=PTS-STARTPTS"));
    }
}
