//! Raster drawing surface backed by tiny-skia.

use overlay_common::{Color, OverlayError, OverlayResult, ScreenPoint};
use tiny_skia::{
    BlendMode, FillRule, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, StrokeDash,
    Transform,
};

/// Alpha compositing mode for draw operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    /// Normal painting.
    SourceOver,
    /// Keep existing content only where the new content is opaque.
    DestinationIn,
}

impl Composite {
    fn blend_mode(self) -> BlendMode {
        match self {
            Composite::SourceOver => BlendMode::SourceOver,
            Composite::DestinationIn => BlendMode::DestinationIn,
        }
    }
}

/// Fill styling.
#[derive(Debug, Clone, Copy)]
pub struct FillStyle {
    pub color: Color,
    pub opacity: f64,
}

impl FillStyle {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            opacity: 1.0,
        }
    }

    pub fn with_opacity(color: Color, opacity: f64) -> Self {
        Self { color, opacity }
    }
}

/// Stroke styling.
#[derive(Debug, Clone)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
    pub opacity: f64,
    /// Dash pattern in pixels; `None` draws solid lines.
    pub dash: Option<Vec<f32>>,
}

impl StrokeStyle {
    pub fn new(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            opacity: 1.0,
            dash: None,
        }
    }
}

/// A 2D raster surface the layers paint into.
///
/// Wraps a premultiplied RGBA pixmap and exposes the subset of canvas
/// operations the overlay layers need: path fill/stroke, rectangles,
/// circles, composited blits and small numeric labels.
pub struct RasterCanvas {
    pixmap: Pixmap,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> OverlayResult<Self> {
        let pixmap =
            Pixmap::new(width, height).ok_or(OverlayError::SurfaceAllocation { width, height })?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Reallocate to a new size, clearing all content.
    pub fn resize(&mut self, width: u32, height: u32) -> OverlayResult<()> {
        if width != self.pixmap.width() || height != self.pixmap.height() {
            self.pixmap = Pixmap::new(width, height)
                .ok_or(OverlayError::SurfaceAllocation { width, height })?;
        } else {
            self.clear();
        }
        Ok(())
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha color of a pixel, for inspection in tests.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let p = self.pixmap.pixel(x, y)?;
        let c = p.demultiply();
        Some(Color::rgba(c.red(), c.green(), c.blue(), c.alpha()))
    }

    /// True when any pixel has non-zero alpha.
    pub fn has_content(&self) -> bool {
        self.pixmap.pixels().iter().any(|p| p.alpha() != 0)
    }

    fn paint(color: Color, opacity: f64, composite: Composite) -> Paint<'static> {
        let mut paint = Paint::default();
        let alpha = (f64::from(color.a) * opacity.clamp(0.0, 1.0)).round() as u8;
        paint.set_color_rgba8(color.r, color.g, color.b, alpha);
        paint.anti_alias = true;
        paint.blend_mode = composite.blend_mode();
        paint
    }

    fn build_path(points: &[ScreenPoint], closed: bool) -> Option<Path> {
        if points.len() < 2 {
            return None;
        }
        let mut pb = PathBuilder::new();
        pb.move_to(points[0].x as f32, points[0].y as f32);
        for p in &points[1..] {
            pb.line_to(p.x as f32, p.y as f32);
        }
        if closed {
            pb.close();
        }
        pb.finish()
    }

    /// Fill a polygon given by its projected vertices.
    pub fn fill_polygon(&mut self, points: &[ScreenPoint], style: &FillStyle, composite: Composite) {
        self.fill_rings(std::slice::from_ref(&points.to_vec()), style, composite);
    }

    /// Fill several rings as one even-odd path, so inner rings cut holes.
    ///
    /// With [`Composite::DestinationIn`] the rings act as a whole-surface
    /// mask: everything outside them is erased, matching canvas-style
    /// destination-in compositing. tiny-skia blends only under path
    /// coverage, so the mask is realized by clearing the even-odd
    /// complement (the rings plus a full-surface rectangle).
    pub fn fill_rings(
        &mut self,
        rings: &[Vec<ScreenPoint>],
        style: &FillStyle,
        composite: Composite,
    ) {
        let mut pb = PathBuilder::new();
        let mut any = false;
        if composite == Composite::DestinationIn {
            if let Some(rect) = Rect::from_xywh(
                0.0,
                0.0,
                self.pixmap.width() as f32,
                self.pixmap.height() as f32,
            ) {
                pb.push_rect(rect);
            }
        }
        for ring in rings {
            if ring.len() < 3 {
                continue;
            }
            pb.move_to(ring[0].x as f32, ring[0].y as f32);
            for p in &ring[1..] {
                pb.line_to(p.x as f32, p.y as f32);
            }
            pb.close();
            any = true;
        }
        if !any {
            return;
        }
        let Some(path) = pb.finish() else {
            return;
        };
        let paint = match composite {
            Composite::SourceOver => Self::paint(style.color, style.opacity, composite),
            Composite::DestinationIn => {
                let mut paint = Paint::default();
                paint.anti_alias = true;
                paint.blend_mode = BlendMode::Clear;
                paint
            }
        };
        self.pixmap
            .fill_path(&path, &paint, FillRule::EvenOdd, Transform::identity(), None);
    }

    /// Stroke a polyline.
    pub fn stroke_polyline(&mut self, points: &[ScreenPoint], closed: bool, style: &StrokeStyle) {
        let Some(path) = Self::build_path(points, closed) else {
            return;
        };
        let paint = Self::paint(style.color, style.opacity, Composite::SourceOver);
        let mut stroke = Stroke {
            width: style.width as f32,
            ..Stroke::default()
        };
        stroke.line_cap = tiny_skia::LineCap::Round;
        stroke.line_join = tiny_skia::LineJoin::Round;
        if let Some(dash) = &style.dash {
            stroke.dash = StrokeDash::new(dash.clone(), 0.0);
        }
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: &FillStyle) {
        let Some(rect) = Rect::from_xywh(x as f32, y as f32, w as f32, h as f32) else {
            return;
        };
        let paint = Self::paint(style.color, style.opacity, Composite::SourceOver);
        self.pixmap
            .fill_rect(rect, &paint, Transform::identity(), None);
    }

    pub fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, style: &FillStyle) {
        if radius <= 0.0 {
            return;
        }
        let mut pb = PathBuilder::new();
        pb.push_circle(cx as f32, cy as f32, radius as f32);
        if let Some(path) = pb.finish() {
            let paint = Self::paint(style.color, style.opacity, Composite::SourceOver);
            self.pixmap
                .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    }

    pub fn stroke_circle(&mut self, cx: f64, cy: f64, radius: f64, style: &StrokeStyle) {
        if radius <= 0.0 {
            return;
        }
        let mut pb = PathBuilder::new();
        pb.push_circle(cx as f32, cy as f32, radius as f32);
        if let Some(path) = pb.finish() {
            let paint = Self::paint(style.color, style.opacity, Composite::SourceOver);
            let stroke = Stroke {
                width: style.width as f32,
                ..Stroke::default()
            };
            self.pixmap
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    /// Blit another pixmap at `dst`, uniformly scaled.
    ///
    /// A [`Composite::DestinationIn`] blit masks the whole surface: pixels
    /// outside the blit rectangle are cleared as well, since the blend only
    /// runs under the source rectangle.
    pub fn blit(&mut self, src: &Pixmap, dst: ScreenPoint, scale: f64, composite: Composite) {
        let paint = PixmapPaint {
            blend_mode: composite.blend_mode(),
            ..PixmapPaint::default()
        };
        let transform = Transform::from_row(
            scale as f32,
            0.0,
            0.0,
            scale as f32,
            dst.x as f32,
            dst.y as f32,
        );
        self.pixmap
            .draw_pixmap(0, 0, src.as_ref(), &paint, transform, None);

        if composite == Composite::DestinationIn {
            let w = f64::from(src.width()) * scale;
            let h = f64::from(src.height()) * scale;
            let cw = f64::from(self.pixmap.width());
            let ch = f64::from(self.pixmap.height());
            self.clear_rect(0.0, 0.0, cw, dst.y);
            self.clear_rect(0.0, dst.y + h, cw, ch - dst.y - h);
            self.clear_rect(0.0, dst.y, dst.x, h);
            self.clear_rect(dst.x + w, dst.y, cw - dst.x - w, h);
        }
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let Some(rect) = Rect::from_xywh(x as f32, y as f32, w as f32, h as f32) else {
            return;
        };
        let mut paint = Paint::default();
        paint.blend_mode = BlendMode::Clear;
        self.pixmap
            .fill_rect(rect, &paint, Transform::identity(), None);
    }

    /// Blit another pixmap rotated around its own center, centered on `at`.
    pub fn blit_rotated(&mut self, src: &Pixmap, at: ScreenPoint, angle_rad: f64) {
        let half_w = src.width() as f32 / 2.0;
        let half_h = src.height() as f32 / 2.0;
        let transform = Transform::from_translate(at.x as f32 - half_w, at.y as f32 - half_h)
            .post_concat(Transform::from_rotate_at(
                angle_rad.to_degrees() as f32,
                at.x as f32,
                at.y as f32,
            ));
        self.pixmap
            .draw_pixmap(0, 0, src.as_ref(), &PixmapPaint::default(), transform, None);
    }

    /// Draw a numeric label horizontally centered at `at`.
    ///
    /// Characters are rendered as stroked segments (digits, minus, dot); a
    /// font asset is deliberately not carried.
    pub fn draw_label(&mut self, text: &str, at: ScreenPoint, font_size: f64, color: Color) {
        let font_size = font_size as f32;
        let char_width = font_size * 0.6;
        let advance = char_width + font_size * 0.1;
        let total = Self::measure_label(text, f64::from(font_size)) as f32;

        let paint = Self::paint(color, 1.0, Composite::SourceOver);
        let mut stroke = Stroke {
            width: (font_size * 0.12).max(1.0),
            ..Stroke::default()
        };
        stroke.line_cap = tiny_skia::LineCap::Round;
        stroke.line_join = tiny_skia::LineJoin::Round;

        let mut x = at.x as f32 - total / 2.0 + char_width / 2.0;
        for ch in text.chars() {
            draw_segment_char(
                &mut self.pixmap,
                ch,
                x,
                at.y as f32,
                char_width,
                font_size,
                &paint,
                &stroke,
            );
            x += advance;
        }
    }

    /// Width in pixels a label will occupy.
    pub fn measure_label(text: &str, font_size: f64) -> f64 {
        let n = text.chars().count() as f64;
        if n == 0.0 {
            return 0.0;
        }
        n * font_size * 0.6 + (n - 1.0) * font_size * 0.1
    }
}

// Seven-segment flags: top, top-right, bottom-right, bottom, bottom-left,
// top-left, middle.
const SEG_A: u8 = 0b0000_0001;
const SEG_B: u8 = 0b0000_0010;
const SEG_C: u8 = 0b0000_0100;
const SEG_D: u8 = 0b0000_1000;
const SEG_E: u8 = 0b0001_0000;
const SEG_F: u8 = 0b0010_0000;
const SEG_G: u8 = 0b0100_0000;

fn segments_for(ch: char) -> Option<u8> {
    Some(match ch {
        '0' => SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F,
        '1' => SEG_B | SEG_C,
        '2' => SEG_A | SEG_B | SEG_G | SEG_E | SEG_D,
        '3' => SEG_A | SEG_B | SEG_G | SEG_C | SEG_D,
        '4' => SEG_F | SEG_G | SEG_B | SEG_C,
        '5' => SEG_A | SEG_F | SEG_G | SEG_C | SEG_D,
        '6' => SEG_A | SEG_F | SEG_G | SEG_E | SEG_C | SEG_D,
        '7' => SEG_A | SEG_B | SEG_C,
        '8' => SEG_A | SEG_B | SEG_C | SEG_D | SEG_E | SEG_F | SEG_G,
        '9' => SEG_A | SEG_B | SEG_C | SEG_D | SEG_F | SEG_G,
        '-' => SEG_G,
        _ => return None,
    })
}

/// Stroke one character centered at `(cx, cy)`.
#[allow(clippy::too_many_arguments)]
fn draw_segment_char(
    pixmap: &mut Pixmap,
    ch: char,
    cx: f32,
    cy: f32,
    width: f32,
    height: f32,
    paint: &Paint<'_>,
    stroke: &Stroke,
) {
    let half_w = width / 2.0 * 0.8;
    let half_h = height / 2.0 * 0.8;

    if ch == '.' {
        let mut pb = PathBuilder::new();
        pb.push_circle(cx, cy + half_h, stroke.width);
        if let Some(path) = pb.finish() {
            pixmap.fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
        }
        return;
    }

    let Some(mask) = segments_for(ch) else {
        return;
    };

    // Segment endpoints relative to the character center.
    let lines: [(u8, (f32, f32), (f32, f32)); 7] = [
        (SEG_A, (-half_w, -half_h), (half_w, -half_h)),
        (SEG_B, (half_w, -half_h), (half_w, 0.0)),
        (SEG_C, (half_w, 0.0), (half_w, half_h)),
        (SEG_D, (-half_w, half_h), (half_w, half_h)),
        (SEG_E, (-half_w, 0.0), (-half_w, half_h)),
        (SEG_F, (-half_w, -half_h), (-half_w, 0.0)),
        (SEG_G, (-half_w, 0.0), (half_w, 0.0)),
    ];

    let mut pb = PathBuilder::new();
    for (flag, from, to) in lines {
        if mask & flag != 0 {
            pb.move_to(cx + from.0, cy + from.1);
            pb.line_to(cx + to.0, cy + to.1);
        }
    }
    if let Some(path) = pb.finish() {
        pixmap.stroke_path(&path, paint, stroke, Transform::identity(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero_size() {
        assert!(RasterCanvas::new(0, 10).is_err());
        assert!(RasterCanvas::new(100, 100).is_ok());
    }

    #[test]
    fn test_fill_polygon_paints_pixels() {
        let mut canvas = RasterCanvas::new(50, 50).unwrap();
        assert!(!canvas.has_content());
        let square = [
            ScreenPoint::new(10.0, 10.0),
            ScreenPoint::new(40.0, 10.0),
            ScreenPoint::new(40.0, 40.0),
            ScreenPoint::new(10.0, 40.0),
        ];
        canvas.fill_polygon(&square, &FillStyle::new(Color::rgb(255, 0, 0)), Composite::SourceOver);
        let center = canvas.pixel(25, 25).unwrap();
        assert_eq!(center.r, 255);
        assert_eq!(center.a, 255);
        assert_eq!(canvas.pixel(5, 5).unwrap().a, 0);
    }

    #[test]
    fn test_destination_in_masks_content() {
        let mut canvas = RasterCanvas::new(50, 50).unwrap();
        let full = [
            ScreenPoint::new(0.0, 0.0),
            ScreenPoint::new(50.0, 0.0),
            ScreenPoint::new(50.0, 50.0),
            ScreenPoint::new(0.0, 50.0),
        ];
        canvas.fill_polygon(&full, &FillStyle::new(Color::BLACK), Composite::SourceOver);

        // Mask to the left half.
        let left = [
            ScreenPoint::new(0.0, 0.0),
            ScreenPoint::new(25.0, 0.0),
            ScreenPoint::new(25.0, 50.0),
            ScreenPoint::new(0.0, 50.0),
        ];
        canvas.fill_polygon(&left, &FillStyle::new(Color::BLACK), Composite::DestinationIn);

        assert_ne!(canvas.pixel(10, 25).unwrap().a, 0);
        assert_eq!(canvas.pixel(40, 25).unwrap().a, 0);
    }

    #[test]
    fn test_blit_scale() {
        let mut mask = RasterCanvas::new(10, 10).unwrap();
        mask.fill_rect(0.0, 0.0, 10.0, 10.0, &FillStyle::new(Color::BLACK));

        let mut canvas = RasterCanvas::new(40, 40).unwrap();
        canvas.blit(
            mask.pixmap(),
            ScreenPoint::new(0.0, 0.0),
            2.0,
            Composite::SourceOver,
        );
        // Scaled 2x: pixel (15, 15) covered, (25, 25) not.
        assert_ne!(canvas.pixel(15, 15).unwrap().a, 0);
        assert_eq!(canvas.pixel(25, 25).unwrap().a, 0);
    }

    #[test]
    fn test_measure_label() {
        assert_eq!(RasterCanvas::measure_label("", 10.0), 0.0);
        let one = RasterCanvas::measure_label("7", 10.0);
        let three = RasterCanvas::measure_label("123", 10.0);
        assert!((one - 6.0).abs() < 1e-9);
        assert!((three - (3.0 * 6.0 + 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_draw_label_paints() {
        let mut canvas = RasterCanvas::new(60, 30).unwrap();
        canvas.draw_label("42", ScreenPoint::new(30.0, 15.0), 12.0, Color::BLACK);
        assert!(canvas.has_content());
    }

    #[test]
    fn test_resize_clears(){
        let mut canvas = RasterCanvas::new(20, 20).unwrap();
        canvas.fill_rect(0.0, 0.0, 20.0, 20.0, &FillStyle::new(Color::BLACK));
        canvas.resize(20, 20).unwrap();
        assert!(!canvas.has_content());
        canvas.resize(30, 10).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (30, 10));
    }
}
