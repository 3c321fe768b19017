//! Event payloads delivered by the host map widget.

use overlay_common::{LatLng, ScreenPoint};

/// Viewport-change events, delivered in arrival order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewEvent {
    /// Continuous pan/zoom motion.
    Move,
    /// Motion settled.
    MoveEnd,
    /// One tick of an animated zoom transition.
    ///
    /// `scale` is the incremental zoom factor for this tick; `offset` is the
    /// translation of the existing rendered bitmap in container pixels.
    ZoomAnim { scale: f64, offset: ScreenPoint },
}

/// A pointer event with both geographic and container positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub latlng: LatLng,
    pub screen: ScreenPoint,
}

impl PointerEvent {
    pub fn new(latlng: LatLng, screen: ScreenPoint) -> Self {
        Self { latlng, screen }
    }
}
