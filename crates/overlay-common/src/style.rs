//! Colors and value-keyed color resolution.

use serde::{Deserialize, Serialize};

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a `#RRGGBB` or `RRGGBB` hex string.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::rgb(r, g, b))
    }
}

/// How a layer colors its content: a literal color or a value-keyed scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpec {
    /// Single color for everything.
    Fixed(Color),
    /// Piecewise-constant scale: the color of the band the value falls in.
    ///
    /// `thresholds` are ascending band edges; `colors[i]` covers values in
    /// `[thresholds[i], thresholds[i + 1])`.
    Scale {
        thresholds: Vec<f64>,
        colors: Vec<Color>,
    },
}

impl ColorSpec {
    /// Resolve the color for a value. Falls back to `default` when the value
    /// is missing, below the scale, or the scale is malformed.
    pub fn resolve(&self, value: Option<f64>, default: Color) -> Color {
        match self {
            ColorSpec::Fixed(c) => *c,
            ColorSpec::Scale { thresholds, colors } => {
                let value = match value {
                    Some(v) => v,
                    None => return default,
                };
                // Band index: last threshold not exceeding the value.
                let band = thresholds.iter().take_while(|&&t| t <= value).count();
                if band == 0 {
                    return default;
                }
                colors.get(band - 1).copied().unwrap_or(default)
            }
        }
    }
}

impl Default for ColorSpec {
    fn default() -> Self {
        ColorSpec::Fixed(Color::BLACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Color::from_hex("#FF0000"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::from_hex("00FF00"), Some(Color::rgb(0, 255, 0)));
        assert_eq!(Color::from_hex("#GGGGGG"), None);
        assert_eq!(Color::from_hex("#FFF"), None);
    }

    #[test]
    fn test_scale_resolution() {
        let spec = ColorSpec::Scale {
            thresholds: vec![0.0, 10.0, 20.0],
            colors: vec![
                Color::rgb(0, 0, 255),
                Color::rgb(0, 255, 0),
                Color::rgb(255, 0, 0),
            ],
        };
        assert_eq!(spec.resolve(Some(5.0), Color::BLACK), Color::rgb(0, 0, 255));
        assert_eq!(
            spec.resolve(Some(10.0), Color::BLACK),
            Color::rgb(0, 255, 0)
        );
        assert_eq!(
            spec.resolve(Some(99.0), Color::BLACK),
            Color::rgb(255, 0, 0)
        );
        // Below the scale and missing values fall back.
        assert_eq!(spec.resolve(Some(-1.0), Color::BLACK), Color::BLACK);
        assert_eq!(spec.resolve(None, Color::BLACK), Color::BLACK);
    }

    #[test]
    fn test_fixed_ignores_value() {
        let spec = ColorSpec::Fixed(Color::rgb(1, 2, 3));
        assert_eq!(spec.resolve(Some(42.0), Color::BLACK), Color::rgb(1, 2, 3));
        assert_eq!(spec.resolve(None, Color::BLACK), Color::rgb(1, 2, 3));
    }
}
