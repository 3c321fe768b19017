//! Fixed-resolution bucket index for pointer hit-testing.
//!
//! Rebuilt from scratch on every draw; lookup scans a single bucket. The
//! indexed extent is the viewport expanded by one decimation interval per
//! side so points just outside the frame stay hit-testable during a pan.

use overlay_canvas::{PointerEvent, Viewport};
use overlay_common::{GeoBounds, LatLng, Located, ScreenPoint};

/// Bucket grid resolution (columns, rows).
const GRID_SIZE: (usize, usize) = (10, 10);

/// Pointer tolerance settings for hit-testing.
#[derive(Debug, Clone)]
pub struct HitOptions {
    /// Default marker size in pixels; per-point overrides win.
    pub size: [f64; 2],
    /// Fixed tolerance margin around the marker box.
    pub margin: f64,
    /// Extra headroom above the marker when value labels are drawn
    /// (the label font size).
    pub label_pad: Option<f64>,
}

impl Default for HitOptions {
    fn default() -> Self {
        Self {
            size: [30.0, 30.0],
            margin: 10.0,
            label_pad: None,
        }
    }
}

/// A bucket grid over the expanded viewport extent.
#[derive(Debug, Clone)]
pub struct SpatialIndex<T> {
    buckets: Vec<Vec<T>>,
    cols: usize,
    rows: usize,
    extent: GeoBounds,
}

impl<T: Located + Clone> SpatialIndex<T> {
    /// Partition `points` into buckets spanning the viewport expanded by
    /// `interval_px` (converted to degrees through the viewport).
    pub fn build(points: &[T], view: &dyn Viewport, interval_px: [f64; 2]) -> Self {
        let [dx, dy] = view.degrees_per_pixels(interval_px);
        let extent = view.bounds().expanded(dx, dy);
        let (cols, rows) = GRID_SIZE;

        let mut index = Self {
            buckets: vec![Vec::new(); cols * rows],
            cols,
            rows,
            extent,
        };
        for p in points {
            let (row, col) = index.locate(p.latlng());
            index.buckets[row * cols + col].push(p.clone());
        }
        index
    }

    /// An index holding no points; every lookup misses.
    pub fn empty() -> Self {
        let (cols, rows) = GRID_SIZE;
        Self {
            buckets: vec![Vec::new(); cols * rows],
            cols,
            rows,
            extent: GeoBounds::new(0.0, 0.0, 0.0, 0.0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|b| b.is_empty())
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.len()).sum()
    }

    /// Bucket position of a geographic coordinate, clamped to the grid.
    fn locate(&self, p: LatLng) -> (usize, usize) {
        let cell_w = self.extent.width() / self.cols as f64;
        let cell_h = self.extent.height() / self.rows as f64;
        if cell_w <= 0.0 || cell_h <= 0.0 {
            return (0, 0);
        }
        let col = (((p.lng - self.extent.west) / cell_w).floor().max(0.0) as usize)
            .min(self.cols - 1);
        let row = (((self.extent.north - p.lat) / cell_h).floor().max(0.0) as usize)
            .min(self.rows - 1);
        (row, col)
    }

    /// Find the first indexed point whose screen-space box contains the
    /// pointer. Only the pointer's bucket is scanned.
    pub fn hit_test(
        &self,
        pointer: &PointerEvent,
        view: &dyn Viewport,
        opts: &HitOptions,
    ) -> Option<&T> {
        let (row, col) = self.locate(pointer.latlng);
        let bucket = &self.buckets[row * self.cols + col];
        bucket.iter().find(|point| {
            let size = point.size_override().unwrap_or(opts.size);
            let range = active_range(pointer.screen, size, opts);
            let pos = view.latlng_to_screen(point.latlng());
            pos.x > range[0] && pos.x < range[1] && pos.y > range[2] && pos.y < range[3]
        })
    }
}

/// Screen-space box `[left, right, top, bottom]` around the pointer that a
/// marker's center must fall in to count as hit.
fn active_range(e: ScreenPoint, size: [f64; 2], opts: &HitOptions) -> [f64; 4] {
    let m = opts.margin;
    let mut range = [
        e.x - size[0] / 2.0 - m,
        e.x + size[0] / 2.0 + m,
        e.y - size[1] / 2.0 - m,
        e.y + size[1] + 5.0,
    ];
    if let Some(pad) = opts.label_pad {
        range[2] = e.y - size[1] / 2.0 - m - pad;
    }
    range
}
