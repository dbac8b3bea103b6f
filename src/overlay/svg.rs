//! SVG markup for the text overlay.

use anyhow::anyhow;

use crate::constants::{OVERLAY_CANVAS_SIZE, OVERLAY_FONT_FAMILY, OVERLAY_PADDING};

/// Largest magnitude an f64 holds with integer precision.
const MAX_EXACT_F64: f64 = 9_007_199_254_740_992.0;

/// Escapes `&` and `<` only.
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;")
}

/// `round(font_size * 1.25)` with halves rounded up, or `None` when it doesn't fit an integer.
pub fn line_height(font_size: f64) -> Option<i64> {
    let rounded = (font_size * 1.25 + 0.5).floor();
    (rounded.is_finite() && rounded.abs() <= MAX_EXACT_F64).then_some(rounded as i64)
}

/// Builds the 1080x1080 overlay: a bottom-anchored gradient bar with the
/// non-empty lines of `text` stacked upwards from the bottom padding.
///
/// Fails when the font size puts the layout outside integer range.
pub fn build_overlay_svg(text: &str, font_size: f64, color: &str) -> anyhow::Result<String> {
    let size = OVERLAY_CANVAS_SIZE;
    let padding = OVERLAY_PADDING;
    let center = size / 2;
    let out_of_range = || anyhow!("font size {font_size} is out of range for the overlay");

    let safe_text = escape_text(text);
    let lines: Vec<&str> = safe_text.split('\n').filter(|line| !line.is_empty()).collect();
    let line_height = line_height(font_size).ok_or_else(out_of_range)?;
    let count = lines.len() as i64;

    let baselines = (0..count)
        .rev()
        .map(|rank| {
            rank.checked_mul(line_height)
                .and_then(|offset| (size - padding).checked_sub(offset))
        })
        .collect::<Option<Vec<i64>>>()
        .ok_or_else(out_of_range)?;
    let spans = lines
        .iter()
        .zip(baselines)
        .map(|(line, y)| format!(r#"<tspan x="{center}" y="{y}">{line}</tspan>"#))
        .collect::<String>();

    let bar_height = count
        .checked_mul(line_height)
        .and_then(|height| height.checked_add(padding * 2))
        .ok_or_else(out_of_range)?;
    let bar_y = size.checked_sub(bar_height).ok_or_else(out_of_range)?;

    Ok(format!(
        r#"<svg width="{size}" height="{size}" viewBox="0 0 {size} {size}" xmlns="http://www.w3.org/2000/svg">
  <defs>
    <linearGradient id="textBg" x1="0" y1="0" x2="0" y2="1">
      <stop offset="0%" stop-color="rgba(0,0,0,0.55)"/>
      <stop offset="100%" stop-color="rgba(0,0,0,0.85)"/>
    </linearGradient>
  </defs>
  <rect x="0" y="{bar_y}" width="{size}" height="{bar_height}" fill="url(#textBg)"/>
  <text
    x="{center}"
    text-anchor="middle"
    fill="{color}"
    font-family="{OVERLAY_FONT_FAMILY}"
    font-size="{font_size}"
    font-weight="600">
    {spans}
  </text>
</svg>"#
    ))
}
