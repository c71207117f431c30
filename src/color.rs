use std::str::FromStr;

use anyhow::{Result, anyhow};
use palette::Srgb;
use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Hex colour parsing
// ---------------------------------------------------------------------------

/// Parse `#rrggbb` / `rrggbb` / `#rgb` into a plotters colour.
pub fn parse_hex(hex: &str) -> Result<RGBColor> {
    let rgb = Srgb::<u8>::from_str(hex.trim())
        .map_err(|e| anyhow!("invalid colour '{hex}': {e}"))?;
    Ok(RGBColor(rgb.red, rgb.green, rgb.blue))
}

// ---------------------------------------------------------------------------
// Figure colours
// ---------------------------------------------------------------------------

/// Resolved colours for one figure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigurePalette {
    pub background_line: RGBColor,
    pub data: RGBColor,
    /// Fill for the 1σ–2σ bands.
    pub outer_band: RGBColor,
    /// Fill for the ±1σ band.
    pub inner_band: RGBColor,
}
