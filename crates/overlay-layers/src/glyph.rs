//! Wind barb glyphs.
//!
//! Barbs are drawn as vector paths into small offscreen pixmaps and cached
//! per (speed level, color, size). A glyph is built pointing north; the
//! layer rotates it into the wind direction when compositing.

use std::collections::HashMap;

use overlay_canvas::{FillStyle, RasterCanvas, StrokeStyle};
use overlay_common::{Color, OverlayResult, ScreenPoint};

/// Speed ranges in m/s mapped to the barb level in knots.
const SPEED_RANGES_MS: &[(f64, f64, u16)] = &[
    (0.0, 1.0, 0),
    (1.0, 2.5, 2),
    (2.5, 5.0, 5),
    (5.0, 7.5, 10),
    (7.5, 10.0, 15),
    (10.0, 12.5, 20),
    (12.5, 15.0, 25),
    (15.0, 17.5, 30),
    (17.5, 20.0, 35),
    (20.0, 22.5, 40),
    (22.5, 25.0, 45),
    (25.0, 27.5, 50),
    (27.5, 30.0, 55),
    (30.0, 32.5, 60),
    (32.5, 35.0, 65),
    (35.0, 37.5, 70),
    (37.5, 40.0, 75),
    (40.0, 42.5, 80),
    (42.5, 45.0, 85),
    (45.0, 47.5, 90),
    (47.5, 50.0, 95),
    (50.0, 52.5, 100),
    (52.5, 55.0, 105),
    (55.0, 57.5, 110),
    (57.5, 60.0, 115),
    (60.0, 62.5, 120),
    (62.5, 65.0, 125),
    (65.0, 67.5, 130),
    (67.5, 70.0, 135),
    (70.0, 72.5, 140),
    (72.5, 75.0, 145),
    (75.0, 77.5, 150),
    (77.5, 80.0, 155),
    (80.0, 82.5, 160),
    (82.5, 85.0, 165),
    (85.0, 87.5, 170),
    (87.5, 90.0, 175),
    (90.0, 92.5, 180),
    (92.5, 95.0, 185),
];

/// Barb level in knots for a wind speed in m/s.
///
/// Speeds beyond the table saturate at the top level.
pub fn wind_level(speed_ms: f64) -> u16 {
    for &(min, max, knots) in SPEED_RANGES_MS {
        if speed_ms >= min && speed_ms < max {
            return knots;
        }
    }
    190
}

type GlyphKey = (u16, [u8; 4], u32);

/// Cache of rendered barb glyphs.
///
/// Distinct wind speeds collapse onto few levels, so a full redraw touches
/// the path rasterizer only a handful of times.
pub struct BarbGlyphs {
    cache: HashMap<GlyphKey, RasterCanvas>,
}

impl BarbGlyphs {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Glyph pixmap for a wind speed, rendering and caching it on first use.
    pub fn glyph(
        &mut self,
        speed_ms: f64,
        color: Color,
        size: u32,
    ) -> OverlayResult<&RasterCanvas> {
        let level = wind_level(speed_ms);
        let key = (level, [color.r, color.g, color.b, color.a], size);
        if !self.cache.contains_key(&key) {
            let glyph = render_barb(level, color, size)?;
            self.cache.insert(key, glyph);
        }
        // Just inserted above when missing.
        Ok(&self.cache[&key])
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

impl Default for BarbGlyphs {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw one north-pointing barb into a `size`-square pixmap.
///
/// Station point at the pixmap center, staff extending up; pennants and
/// feathers hang off the right of the staff from the tip down.
fn render_barb(level: u16, color: Color, size: u32) -> OverlayResult<RasterCanvas> {
    let mut canvas = RasterCanvas::new(size.max(4), size.max(4))?;
    let s = f64::from(size.max(4));
    let c = s / 2.0;

    let stroke = StrokeStyle::new(color, (s * 0.05).max(1.0));

    // Calm: a small open circle, no staff.
    if level == 0 {
        canvas.stroke_circle(c, c, s * 0.1, &stroke);
        return Ok(canvas);
    }

    let tip_y = c - s * 0.38;
    canvas.stroke_polyline(
        &[ScreenPoint::new(c, c), ScreenPoint::new(c, tip_y)],
        false,
        &stroke,
    );

    let pennants = level / 50;
    let mut remainder = level % 50;
    let fulls = remainder / 10;
    remainder %= 10;
    let half = remainder >= 5;

    let feather_len = s * 0.2;
    let feather_rise = s * 0.09;
    let step = s * 0.09;

    let mut y = tip_y;
    for _ in 0..pennants {
        let pennant = [
            ScreenPoint::new(c, y),
            ScreenPoint::new(c + feather_len, y - feather_rise),
            ScreenPoint::new(c, y + step),
        ];
        canvas.fill_polygon(
            &pennant,
            &FillStyle::new(color),
            overlay_canvas::Composite::SourceOver,
        );
        y += step * 1.4;
    }
    for _ in 0..fulls {
        canvas.stroke_polyline(
            &[
                ScreenPoint::new(c, y),
                ScreenPoint::new(c + feather_len, y - feather_rise),
            ],
            false,
            &stroke,
        );
        y += step;
    }
    if half {
        // A lone half feather sits one step in from the tip.
        if pennants == 0 && fulls == 0 {
            y += step;
        }
        canvas.stroke_polyline(
            &[
                ScreenPoint::new(c, y),
                ScreenPoint::new(c + feather_len / 2.0, y - feather_rise / 2.0),
            ],
            false,
            &stroke,
        );
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wind_level_buckets() {
        assert_eq!(wind_level(0.0), 0);
        assert_eq!(wind_level(1.5), 2);
        assert_eq!(wind_level(3.0), 5);
        assert_eq!(wind_level(6.0), 10);
        assert_eq!(wind_level(26.0), 50);
        assert_eq!(wind_level(100.0), 190);
    }

    #[test]
    fn test_glyphs_paint_content() {
        let mut glyphs = BarbGlyphs::new();
        for speed in [0.0, 3.0, 12.0, 28.0, 60.0] {
            let glyph = glyphs.glyph(speed, Color::BLACK, 40).unwrap();
            assert!(glyph.has_content());
        }
    }

    #[test]
    fn test_cache_collapses_same_level() {
        let mut glyphs = BarbGlyphs::new();
        // All three speeds fall into the 20 kt bucket.
        glyphs.glyph(10.0, Color::BLACK, 40).unwrap();
        glyphs.glyph(11.0, Color::BLACK, 40).unwrap();
        glyphs.glyph(12.4, Color::BLACK, 40).unwrap();
        assert_eq!(glyphs.cached_count(), 1);

        // Different color or size is a separate glyph.
        glyphs.glyph(10.0, Color::WHITE, 40).unwrap();
        glyphs.glyph(10.0, Color::BLACK, 60).unwrap();
        assert_eq!(glyphs.cached_count(), 3);
    }
}
