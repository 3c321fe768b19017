//! Polygon-clip compositing.
//!
//! Masks rendered content to a geographic boundary. Two strategies share
//! one contract: a cached offscreen mask recomposed per draw (cheap,
//! approximate during animated zoom) and an exact per-frame path fill.

use overlay_canvas::{Composite, FillStyle, RasterCanvas, Viewport};
use overlay_common::{Boundary, Color, LatLng, ScreenPoint};
use serde::{Deserialize, Serialize};

/// Clip strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipMode {
    /// Cached offscreen mask, repositioned and rescaled between rebuilds.
    #[default]
    Fuzzy,
    /// Exact per-frame polygon path recomputation.
    Fine,
}

impl ClipMode {
    pub fn strategy(self) -> Box<dyn ClipStrategy> {
        match self {
            ClipMode::Fuzzy => Box::new(CachedMaskClip::new()),
            ClipMode::Fine => Box::new(LivePathClip),
        }
    }
}

/// Masks a layer's painted content to a boundary.
///
/// A non-raster target could supply a third implementation of the same
/// contract.
pub trait ClipStrategy {
    /// Rebuild cached state for the boundary under the current viewport.
    fn rebuild(&mut self, boundary: &Boundary, view: &dyn Viewport);

    /// True while the strategy has no cached state for the current boundary.
    /// Stateless strategies never need one.
    fn needs_rebuild(&self) -> bool {
        false
    }

    /// Composite the boundary over freshly painted content.
    fn apply(&mut self, canvas: &mut RasterCanvas, boundary: &Boundary, view: &dyn Viewport);

    /// One tick of an animated zoom with its incremental scale factor.
    fn zoom_tick(&mut self, scale: f64);
}

/// Fuzzy mode: rasterize the boundary once into an offscreen mask, then
/// blit it with destination-in compositing on every draw.
///
/// Between rebuilds the mask is only repositioned and rescaled, so it can
/// drift slightly during a continuous zoom; the next rebuild corrects it.
pub struct CachedMaskClip {
    mask: Option<RasterCanvas>,
    /// Geographic position of the mask's top-left corner.
    origin: LatLng,
    accumulated_scale: f64,
}

impl CachedMaskClip {
    pub fn new() -> Self {
        Self {
            mask: None,
            origin: LatLng::new(0.0, 0.0),
            accumulated_scale: 1.0,
        }
    }

    pub fn accumulated_scale(&self) -> f64 {
        self.accumulated_scale
    }

    pub fn has_mask(&self) -> bool {
        self.mask.is_some()
    }
}

impl Default for CachedMaskClip {
    fn default() -> Self {
        Self::new()
    }
}

impl ClipStrategy for CachedMaskClip {
    fn rebuild(&mut self, boundary: &Boundary, view: &dyn Viewport) {
        self.mask = None;
        self.accumulated_scale = 1.0;

        let Some(bbox) = boundary.bbox() else {
            return;
        };
        self.origin = bbox.north_west();

        let north_east = view.latlng_to_screen(LatLng::new(bbox.north, bbox.east));
        let south_west = view.latlng_to_screen(LatLng::new(bbox.south, bbox.west));
        let width = (north_east.x - south_west.x).ceil().max(1.0) as u32;
        let height = (south_west.y - north_east.y).ceil().max(1.0) as u32;

        let mut mask = match RasterCanvas::new(width, height) {
            Ok(mask) => mask,
            Err(err) => {
                tracing::warn!(%err, width, height, "clip mask allocation failed");
                return;
            }
        };

        // Rasterize every polygon, shifted so the bbox corner lands at the
        // mask origin. Holes are cut by the even-odd fill.
        let style = FillStyle::new(Color::BLACK);
        for polygon in &boundary.polygons {
            let rings: Vec<Vec<ScreenPoint>> = polygon
                .rings()
                .map(|ring| {
                    ring.iter()
                        .map(|&p| {
                            let s = view.latlng_to_screen(p);
                            ScreenPoint::new(s.x - south_west.x, s.y - north_east.y)
                        })
                        .collect()
                })
                .collect();
            mask.fill_rings(&rings, &style, Composite::SourceOver);
        }
        self.mask = Some(mask);
    }

    fn needs_rebuild(&self) -> bool {
        self.mask.is_none()
    }

    fn apply(&mut self, canvas: &mut RasterCanvas, _boundary: &Boundary, view: &dyn Viewport) {
        let Some(mask) = &self.mask else {
            return;
        };
        let offset = view.latlng_to_screen(self.origin);
        canvas.blit(
            mask.pixmap(),
            offset,
            self.accumulated_scale,
            Composite::DestinationIn,
        );
    }

    fn zoom_tick(&mut self, scale: f64) {
        self.accumulated_scale *= scale;
    }
}

/// Fine mode: re-project every boundary ring and fill it directly on each
/// draw. Always exact, O(boundary size) per draw.
pub struct LivePathClip;

impl ClipStrategy for LivePathClip {
    fn rebuild(&mut self, _boundary: &Boundary, _view: &dyn Viewport) {}

    fn apply(&mut self, canvas: &mut RasterCanvas, boundary: &Boundary, view: &dyn Viewport) {
        let rings: Vec<Vec<ScreenPoint>> = boundary
            .polygons
            .iter()
            .flat_map(|polygon| polygon.rings())
            .map(|ring| ring.iter().map(|&p| view.latlng_to_screen(p)).collect())
            .collect();
        if rings.is_empty() {
            return;
        }
        canvas.fill_rings(&rings, &FillStyle::new(Color::BLACK), Composite::DestinationIn);
    }

    fn zoom_tick(&mut self, _scale: f64) {}
}
