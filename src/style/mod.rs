//! # Style System
//!
//! The handful of style properties the resume tree needs for block flow and
//! for the wireframe rasterizer: box margins and padding, an explicit height,
//! typography sizes, and colors.
//!
//! Margins come in two layers, mirroring how a browser resolves them. The
//! stylesheet margin lives in [`Style::margin`]; an inline override of the top
//! margin is kept as a raw CSS string on the node, because export mutates that
//! string and must be able to put it back exactly as it found it.

use serde::{Deserialize, Serialize};

/// CSS pixels per inch.
pub const CSS_PX_PER_INCH: f64 = 96.0;

/// Root font size used to resolve `em`/`rem` lengths.
pub const ROOT_FONT_SIZE_PX: f64 = 16.0;

/// The style properties for a node. All lengths are CSS pixels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    /// Margin outside the border.
    #[serde(default)]
    pub margin: Option<Edges>,
    /// Padding inside the border.
    #[serde(default)]
    pub padding: Option<Edges>,
    /// Explicit border-box height. Overrides content height.
    pub height: Option<f64>,

    pub font_size: Option<f64>,
    /// Line height as a multiple of the font size.
    pub line_height: Option<f64>,

    pub color: Option<Color>,
    pub background_color: Option<Color>,
}

impl Style {
    pub fn margin(&self) -> Edges {
        self.margin.unwrap_or_default()
    }

    pub fn padding(&self) -> Edges {
        self.padding.unwrap_or_default()
    }

    pub fn font_size(&self) -> f64 {
        self.font_size.unwrap_or(ROOT_FONT_SIZE_PX)
    }

    /// Height of one line box in pixels.
    pub fn line_box(&self) -> f64 {
        self.font_size() * self.line_height.unwrap_or(1.4)
    }
}

/// Edge values (top, right, bottom, left) used for margin and padding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    #[serde(default = "opaque")]
    pub a: f64,
}

fn opaque() -> f64 {
    1.0
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim_start_matches('#');
        let (r, g, b) = match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).unwrap_or(0);
                (r, g, b)
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
                (r, g, b)
            }
            _ => (0, 0, 0),
        };
        Self::rgb(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
    }

    /// Composite this color over `under` and return 8-bit RGB.
    pub fn blend_over(&self, under: [u8; 3]) -> [u8; 3] {
        let a = self.a.clamp(0.0, 1.0);
        let mix = |c: f64, u: u8| -> u8 {
            let v = c.clamp(0.0, 1.0) * 255.0 * a + u as f64 * (1.0 - a);
            v.round() as u8
        };
        [mix(self.r, under[0]), mix(self.g, under[1]), mix(self.b, under[2])]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Resolve a CSS length string to pixels.
///
/// Accepts `px`, `pt`, `mm`, `cm`, `in`, `em`, `rem` and unitless numbers.
/// Returns `None` for anything else, which callers treat the way a browser
/// treats an invalid declaration: ignored.
pub fn parse_length(value: &str) -> Option<f64> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    let split = v
        .find(|c: char| c.is_ascii_alphabetic() || c == '%')
        .unwrap_or(v.len());
    let (number, unit) = v.split_at(split);
    let n: f64 = number.trim().parse().ok()?;
    if !n.is_finite() {
        return None;
    }
    let px = match unit {
        "" | "px" => n,
        "pt" => n * CSS_PX_PER_INCH / 72.0,
        "mm" => n * CSS_PX_PER_INCH / 25.4,
        "cm" => n * CSS_PX_PER_INCH / 2.54,
        "in" => n * CSS_PX_PER_INCH,
        "em" | "rem" => n * ROOT_FONT_SIZE_PX,
        _ => return None,
    };
    Some(px)
}

/// Format a pixel value the way it is written back into an inline style.
pub fn format_px(value: f64) -> String {
    if value == 0.0 {
        return "0px".to_string();
    }
    format!("{}px", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_length_units() {
        assert_eq!(parse_length("12px"), Some(12.0));
        assert_eq!(parse_length(" 8 "), Some(8.0));
        assert_eq!(parse_length("72pt"), Some(96.0));
        assert_eq!(parse_length("1in"), Some(96.0));
        assert_eq!(parse_length("1.5em"), Some(24.0));
        assert!((parse_length("25.4mm").unwrap() - 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_length_rejects_garbage() {
        assert_eq!(parse_length(""), None);
        assert_eq!(parse_length("auto"), None);
        assert_eq!(parse_length("10%"), None);
        assert_eq!(parse_length("12vh"), None);
    }

    #[test]
    fn test_format_px() {
        assert_eq!(format_px(12.0), "12px");
        assert_eq!(format_px(12.5), "12.5px");
        assert_eq!(format_px(-0.0), "0px");
    }

    #[test]
    fn test_hex_color() {
        let c = Color::hex("#ff8000");
        assert!((c.r - 1.0).abs() < 0.001);
        assert!((c.g - 0.502).abs() < 0.01);
        assert!((c.b - 0.0).abs() < 0.001);
        assert_eq!(Color::hex("#fff"), Color::WHITE);
    }

    #[test]
    fn test_blend_over() {
        assert_eq!(Color::BLACK.blend_over([255, 255, 255]), [0, 0, 0]);
        let half = Color { a: 0.5, ..Color::BLACK };
        assert_eq!(half.blend_over([255, 255, 255]), [128, 128, 128]);
    }
}
