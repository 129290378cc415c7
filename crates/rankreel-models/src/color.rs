//! RGB color values as used by title highlights and overlay text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing a color string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("color must be #RRGGBB or 0xRRGGBB, got '{0}'")]
    InvalidFormat(String),

    #[error("invalid hex digits in color '{0}'")]
    InvalidHex(String),
}

/// 24-bit RGB color.
///
/// Serialized as `#RRGGBB`; parsing also accepts the `0xRRGGBB` form the
/// engine uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const WHITE: RgbColor = RgbColor::new(0xFF, 0xFF, 0xFF);
    pub const BLACK: RgbColor = RgbColor::new(0x00, 0x00, 0x00);
    pub const GOLD: RgbColor = RgbColor::new(0xFF, 0xD7, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Engine notation, e.g. `0xFF0000`.
    pub fn to_ffmpeg(&self) -> String {
        format!("0x{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for RgbColor {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| ColorParseError::InvalidFormat(s.to_string()))?;

        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ColorParseError::InvalidFormat(s.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ColorParseError::InvalidHex(s.to_string()))
        };

        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for RgbColor {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RgbColor> for String {
    fn from(color: RgbColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hash_notation() {
        let color: RgbColor = "#FF0000".parse().unwrap();
        assert_eq!(color, RgbColor::new(255, 0, 0));
    }

    #[test]
    fn test_parse_engine_notation_and_lowercase() {
        let color: RgbColor = "0xffd700".parse().unwrap();
        assert_eq!(color, RgbColor::GOLD);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            "red".parse::<RgbColor>(),
            Err(ColorParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            "#FF00".parse::<RgbColor>(),
            Err(ColorParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            "#GG0000".parse::<RgbColor>(),
            Err(ColorParseError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_ffmpeg_notation() {
        assert_eq!(RgbColor::new(255, 0, 0).to_ffmpeg(), "0xFF0000");
        assert_eq!(RgbColor::WHITE.to_ffmpeg(), "0xFFFFFF");
    }

    #[test]
    fn test_serde_uses_hex_string() {
        let json = serde_json::to_string(&RgbColor::new(0x12, 0xAB, 0x00)).unwrap();
        assert_eq!(json, "\"#12AB00\"");

        let parsed: RgbColor = serde_json::from_str("\"#12ab00\"").unwrap();
        assert_eq!(parsed, RgbColor::new(0x12, 0xAB, 0x00));

        assert!(serde_json::from_str::<RgbColor>("\"blue\"").is_err());
    }
}
