//! Host map viewport abstraction.

use overlay_common::{GeoBounds, LatLng, ScreenPoint};

/// The host map widget boundary.
///
/// The host owns projection and pan/zoom state; layers only ever convert
/// between geographic and container-pixel coordinates through this trait.
pub trait Viewport {
    /// Current visible extent in degrees.
    fn bounds(&self) -> GeoBounds;

    /// Current zoom level (log2 scale, map-widget convention).
    fn zoom(&self) -> f64;

    /// Container size in pixels.
    fn size(&self) -> (u32, u32);

    fn latlng_to_screen(&self, p: LatLng) -> ScreenPoint;

    fn screen_to_latlng(&self, p: ScreenPoint) -> LatLng;

    /// Degrees of longitude/latitude spanned by a pixel offset from the
    /// container origin.
    fn degrees_per_pixels(&self, px: [f64; 2]) -> [f64; 2] {
        let a = self.screen_to_latlng(ScreenPoint::new(0.0, 0.0));
        let b = self.screen_to_latlng(ScreenPoint::new(px[0], px[1]));
        [(b.lng - a.lng).abs(), (b.lat - a.lat).abs()]
    }
}

/// Linear (equirectangular) viewport.
///
/// Pixels map linearly onto degrees across the visible bounds. Good enough
/// as the reference host for tests and demos; a real map widget supplies its
/// own projection.
#[derive(Debug, Clone)]
pub struct FlatViewport {
    bounds: GeoBounds,
    width: u32,
    height: u32,
    zoom: f64,
}

impl FlatViewport {
    pub fn new(bounds: GeoBounds, width: u32, height: u32, zoom: f64) -> Self {
        Self {
            bounds,
            width,
            height,
            zoom,
        }
    }

    /// Shift the visible extent by degrees.
    pub fn pan(&mut self, d_lng: f64, d_lat: f64) {
        self.bounds = GeoBounds::new(
            self.bounds.north + d_lat,
            self.bounds.south + d_lat,
            self.bounds.east + d_lng,
            self.bounds.west + d_lng,
        );
    }

    /// Scale the visible extent around its center; `factor > 1` zooms in.
    pub fn zoom_by(&mut self, factor: f64) {
        let cx = (self.bounds.east + self.bounds.west) / 2.0;
        let cy = (self.bounds.north + self.bounds.south) / 2.0;
        let half_w = self.bounds.width() / 2.0 / factor;
        let half_h = self.bounds.height() / 2.0 / factor;
        self.bounds = GeoBounds::new(cy + half_h, cy - half_h, cx + half_w, cx - half_w);
        self.zoom += factor.log2();
    }
}

impl Viewport for FlatViewport {
    fn bounds(&self) -> GeoBounds {
        self.bounds
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn latlng_to_screen(&self, p: LatLng) -> ScreenPoint {
        let w = self.bounds.width();
        let h = self.bounds.height();
        if w == 0.0 || h == 0.0 {
            return ScreenPoint::new(0.0, 0.0);
        }
        ScreenPoint::new(
            (p.lng - self.bounds.west) / w * self.width as f64,
            (self.bounds.north - p.lat) / h * self.height as f64,
        )
    }

    fn screen_to_latlng(&self, p: ScreenPoint) -> LatLng {
        let w = self.bounds.width();
        let h = self.bounds.height();
        LatLng::new(
            self.bounds.north - p.y / self.height.max(1) as f64 * h,
            self.bounds.west + p.x / self.width.max(1) as f64 * w,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> FlatViewport {
        FlatViewport::new(GeoBounds::new(10.0, 0.0, 10.0, 0.0), 500, 500, 5.0)
    }

    #[test]
    fn test_corner_mapping() {
        let v = view();
        let nw = v.latlng_to_screen(LatLng::new(10.0, 0.0));
        assert_eq!(nw, ScreenPoint::new(0.0, 0.0));
        let se = v.latlng_to_screen(LatLng::new(0.0, 10.0));
        assert_eq!(se, ScreenPoint::new(500.0, 500.0));
    }

    #[test]
    fn test_screen_roundtrip() {
        let v = view();
        let p = LatLng::new(3.25, 7.5);
        let back = v.screen_to_latlng(v.latlng_to_screen(p));
        assert!((back.lat - p.lat).abs() < 1e-9);
        assert!((back.lng - p.lng).abs() < 1e-9);
    }

    #[test]
    fn test_degrees_per_pixels() {
        let v = view();
        // 500 px span 10 degrees, so 50 px span 1 degree.
        let [dx, dy] = v.degrees_per_pixels([50.0, 50.0]);
        assert!((dx - 1.0).abs() < 1e-9);
        assert!((dy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_by_halves_extent() {
        let mut v = view();
        v.zoom_by(2.0);
        assert!((v.bounds().width() - 5.0).abs() < 1e-9);
        assert!((v.bounds().height() - 5.0).abs() < 1e-9);
        assert!((v.zoom() - 6.0).abs() < 1e-9);
    }
}
